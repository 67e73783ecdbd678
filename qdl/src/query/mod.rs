//! Query description language.
//!
//! # Syntax Overview
//!
//! Full pattern: `objectType [(key: value, ...)] [{ field, field { nested } }]`
//!
//! - **Object type**: leading identifier naming the queried entity
//! - **Filters**: `(id: 6, type: 3)`, kept in insertion order
//! - **Fields**: `{ a, b { c } }`, nested to any depth
//!
//! Identifiers match `[A-Za-z_][A-Za-z0-9_]*`. Whitespace between tokens is
//! insignificant. [`format_query`] renders the canonical form, which always
//! parses back to an equal [`Query`].

mod format;
mod model;
mod parser;

pub use format::format_query;
pub use model::{is_identifier, Filters, Query, QueryField};
pub use parser::{parse_query, parse_query_with, ParseOptions, TrailingContent};
