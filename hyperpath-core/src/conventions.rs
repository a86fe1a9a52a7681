//! Document conventions
//!
//! Links and collections are conventions over plain keys, not types:
//!
//! ```json
//! { "customer_url": "/customers?page=1" }            // `customer` is a link
//! { "$item": [ {...}, {...} ], "next_url": "/p/2" }  // included collection, paginated
//! { "$item_url": ["/c/1", "/c/2"] }                  // linked collection
//! { "price": 10, "price__latest": 12 }               // latest override for `price`
//! ```
//!
//! Everything here is a pure predicate or lookup over a mapping.

use serde_json::{Map, Value};

/// Reserved key carrying the items of a collection.
pub const ITEM_KEY: &str = "$item";

/// Reserved logical key of the next-page link.
pub const NEXT_KEY: &str = "next";

pub const SNAKE_LINK_SUFFIX: &str = "_url";
pub const CAMEL_LINK_SUFFIX: &str = "Url";
pub const LATEST_SUFFIX: &str = "__latest";

/// True iff `<key>_url` or `<key>Url` is present.
pub fn has_link(map: &Map<String, Value>, key: &str) -> bool {
    link_name(map, key).is_some()
}

/// Name of the sibling key holding the link for `key`.
///
/// snake_case wins when both forms are present.
pub fn link_name(map: &Map<String, Value>, key: &str) -> Option<String> {
    let snake = format!("{key}{SNAKE_LINK_SUFFIX}");
    if map.contains_key(&snake) {
        return Some(snake);
    }
    let camel = format!("{key}{CAMEL_LINK_SUFFIX}");
    map.contains_key(&camel).then_some(camel)
}

/// Sibling key consulted in latest mode.
pub fn latest_key(key: &str) -> String {
    format!("{key}{LATEST_SUFFIX}")
}

pub fn is_included_collection(map: &Map<String, Value>) -> bool {
    map.contains_key(ITEM_KEY)
}

pub fn is_linked_collection(map: &Map<String, Value>) -> bool {
    has_link(map, ITEM_KEY)
}

pub fn has_next_page(map: &Map<String, Value>) -> bool {
    has_link(map, NEXT_KEY)
}
