//! Selection-text parser
//!
//! Accepts the GraphQL-style selection syntax used to describe shapes:
//!
//! ```text
//! query Customer {
//!   customer_number
//!   order {          # relation
//!     order_number,
//!     total
//!   }
//! }
//! ```
//!
//! The `query` keyword and operation name are optional. Commas and `#` line
//! comments are insignificant. Aliases, arguments, fragments and directives
//! are not part of the language and fail to parse.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{alpha1, alphanumeric1, char, multispace1},
    combinator::{all_consuming, cut, opt, recognize, value, verify},
    error::{context, convert_error, VerboseError},
    multi::{many0, many1},
    sequence::{pair, preceded, terminated},
    IResult,
};

use crate::error::QueryError;
use crate::selection::{OperationDefinition, QueryDocument, Selection, SelectionSet};

type Res<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

// ============================================================================
// Public API
// ============================================================================

/// Parse selection text into a [`QueryDocument`].
pub fn parse_query(input: &str) -> Result<QueryDocument, QueryError> {
    match all_consuming(document)(input) {
        Ok((_, doc)) => Ok(doc),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            Err(QueryError::Parse(convert_error(input, e)))
        }
        Err(nom::Err::Incomplete(_)) => Err(QueryError::Parse("Incomplete input".to_string())),
    }
}

// ============================================================================
// Internal Parsers
// ============================================================================

fn document(input: &str) -> Res<'_, QueryDocument> {
    let (input, _) = ignored(input)?;
    let (input, definitions) = many1(terminated(definition, ignored))(input)?;
    Ok((input, QueryDocument { definitions }))
}

fn definition(input: &str) -> Res<'_, OperationDefinition> {
    let (input, name) = opt(operation_header)(input)?;
    let (input, selection_set) = context("selection set", selection_set)(input)?;
    Ok((
        input,
        OperationDefinition {
            name: name.flatten(),
            selection_set,
        },
    ))
}

/// `query` keyword with an optional operation name.
fn operation_header(input: &str) -> Res<'_, Option<String>> {
    let (input, _) = verify(name, |keyword: &str| keyword == "query")(input)?;
    let (input, _) = ignored(input)?;
    let (input, operation) = opt(terminated(name, ignored))(input)?;
    Ok((input, operation.map(str::to_string)))
}

fn selection_set(input: &str) -> Res<'_, SelectionSet> {
    let (input, _) = char('{')(input)?;
    let (input, _) = ignored(input)?;
    let (input, selections) = many0(terminated(selection, ignored))(input)?;
    let (input, _) = cut(context("closing brace", char('}')))(input)?;
    Ok((input, SelectionSet { selections }))
}

fn selection(input: &str) -> Res<'_, Selection> {
    let (input, field) = name(input)?;
    let (input, _) = ignored(input)?;
    let (input, selection_set) = opt(selection_set)(input)?;
    Ok((
        input,
        Selection {
            name: field.to_string(),
            selection_set,
        },
    ))
}

fn name(input: &str) -> Res<'_, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(input)
}

// ============================================================================
// Whitespace
// ============================================================================

/// Whitespace, commas and comments.
fn ignored(input: &str) -> Res<'_, ()> {
    value(
        (),
        many0(alt((value((), multispace1), value((), char(',')), comment))),
    )(input)
}

fn comment(input: &str) -> Res<'_, ()> {
    value((), preceded(char('#'), take_while(|c| c != '\n')))(input)
}
