//! QDL: Query Description Language
//!
//! Parser and canonical formatter for queries of the form
//! `user (id: 6) { first_name, address { city } }`.

pub mod config;
pub mod error;
pub mod query;

pub use config::{Config, OutputFormat, TrailingPolicy};
pub use error::{Error, Excerpt, Result, SyntaxError};
pub use query::{
    format_query, is_identifier, parse_query, parse_query_with, Filters, ParseOptions, Query,
    QueryField, TrailingContent,
};
