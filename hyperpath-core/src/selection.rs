//! Selection-set AST and its translation into a [`Shape`].
//!
//! A selection with a nested selection set becomes a relation; a bare
//! selection becomes a property. Purely structural: nothing is resolved.

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};
use crate::shape::Shape;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDocument {
    pub definitions: Vec<OperationDefinition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationDefinition {
    pub name: Option<String>,
    pub selection_set: SelectionSet,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSet {
    pub selections: Vec<Selection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub name: String,
    pub selection_set: Option<SelectionSet>,
}

impl Selection {
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selection_set: None,
        }
    }

    pub fn nested(name: impl Into<String>, selections: Vec<Selection>) -> Self {
        Self {
            name: name.into(),
            selection_set: Some(SelectionSet { selections }),
        }
    }
}

/// Translate every definition of `document` into one merged shape.
pub fn translate(document: &QueryDocument) -> Result<Shape> {
    let mut shape = Shape::new();
    for definition in &document.definitions {
        shape.merge(translate_selection_set(&definition.selection_set)?);
    }
    Ok(shape)
}

pub fn translate_selection_set(selection_set: &SelectionSet) -> Result<Shape> {
    let mut shape = Shape::new();
    for selection in &selection_set.selections {
        if selection.name.is_empty() {
            return Err(QueryError::MalformedQuery(
                "selection has no name".to_string(),
            ));
        }
        let translated = match &selection.selection_set {
            Some(nested) => {
                Shape::new().relate(selection.name.clone(), translate_selection_set(nested)?)
            }
            None => Shape::new().property(selection.name.clone()),
        };
        shape.merge(translated);
    }
    Ok(shape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn document(selections: Vec<Selection>) -> QueryDocument {
        QueryDocument {
            definitions: vec![OperationDefinition {
                name: None,
                selection_set: SelectionSet { selections },
            }],
        }
    }

    #[test]
    fn test_translate_properties_and_related() {
        let doc = document(vec![
            Selection::field("version"),
            Selection::nested(
                "user",
                vec![Selection::field("firstName"), Selection::field("lastName")],
            ),
        ]);

        let expected = Shape::new().property("version").relate(
            "user",
            Shape::new().property("firstName").property("lastName"),
        );
        assert_eq!(translate(&doc).unwrap(), expected);
    }

    #[test]
    fn test_translate_merges_definitions() {
        let mut doc = document(vec![Selection::field("a")]);
        doc.definitions.push(OperationDefinition {
            name: Some("Second".into()),
            selection_set: SelectionSet {
                selections: vec![Selection::field("b"), Selection::field("a")],
            },
        });

        assert_eq!(translate(&doc).unwrap().properties, vec!["a", "b"]);
    }

    #[test]
    fn test_translate_rejects_unnamed_selection() {
        let doc = document(vec![Selection::nested("order", vec![Selection::field("")])]);
        assert_eq!(
            translate(&doc),
            Err(QueryError::MalformedQuery("selection has no name".into()))
        );
    }

    #[test]
    fn test_empty_nested_selection_is_still_a_relation() {
        let doc = document(vec![Selection::nested("order", vec![])]);
        let shape = translate(&doc).unwrap();
        assert!(shape.properties.is_empty());
        assert!(shape.related["order"].is_empty());
    }
}
