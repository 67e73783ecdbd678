//! Single-pass parser for the query description language.
//!
//! Whitespace between tokens is space, tab, carriage return, or newline only;
//! other Unicode spaces (such as U+00A0) are ordinary characters.

use log::{debug, trace};

use super::model::{is_ident_continue, is_ident_start, is_ws, Filters, Query, QueryField};
use crate::error::SyntaxError;

/// What to do with input left over after the top-level clauses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TrailingContent {
    /// Fail with "unexpected trailing content".
    #[default]
    Reject,
    /// Stop at the first unconsumed character.
    Ignore,
}

/// Parser settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub trailing: TrailingContent,
}

/// Parse query text with default options.
pub fn parse_query(input: &str) -> Result<Query, SyntaxError> {
    parse_query_with(input, &ParseOptions::default())
}

/// Parse query text.
///
/// Builds a fresh [`Query`] and returns it only if the whole input matched.
pub fn parse_query_with(input: &str, options: &ParseOptions) -> Result<Query, SyntaxError> {
    debug!("parsing query ({} bytes)", input.len());
    let mut cursor = Cursor::new(input);

    cursor.skip_ws();
    let object_type = cursor
        .identifier()
        .ok_or_else(|| cursor.error("expected object type identifier"))?;

    let mut filters = Filters::new();
    cursor.skip_ws();
    if cursor.eat('(') {
        parse_filter_clause(&mut cursor, &mut filters)?;
    }

    let mut fields = Vec::new();
    cursor.skip_ws();
    if cursor.eat('{') {
        fields = parse_field_clause(&mut cursor)?;
    }

    cursor.skip_ws();
    if !cursor.at_end() {
        match options.trailing {
            TrailingContent::Reject => return Err(cursor.error("unexpected trailing content")),
            TrailingContent::Ignore => {
                debug!("ignoring trailing content at offset {}", cursor.pos);
            }
        }
    }

    let query = Query::from_parts(object_type.to_string(), filters, fields);
    debug!(
        "parsed query '{}': {} filter(s), {} field(s)",
        query.object_type(),
        query.filters.len(),
        query.fields.len()
    );
    Ok(query)
}

/// Parse the body of a filter clause; the opening `(` is already consumed.
fn parse_filter_clause(cursor: &mut Cursor<'_>, filters: &mut Filters) -> Result<(), SyntaxError> {
    cursor.skip_ws();
    if cursor.eat(')') {
        return Ok(());
    }
    if cursor.at_end() {
        return Err(cursor.error("expected ')'"));
    }

    loop {
        cursor.skip_ws();
        let key = cursor
            .identifier()
            .ok_or_else(|| cursor.error("expected filter key identifier"))?;

        cursor.skip_ws();
        if !cursor.eat(':') {
            return Err(cursor.error("expected ':' in filter"));
        }

        cursor.skip_ws();
        let value = cursor.take_until(|c| c == ',' || c == ')').trim_end_matches(is_ws);
        if value.is_empty() {
            return Err(cursor.error("expected filter value"));
        }
        trace!("filter {}: {}", key, value);
        filters.insert_unchecked(key.to_string(), value.to_string());

        if cursor.eat(',') {
            continue;
        }
        if cursor.eat(')') {
            return Ok(());
        }
        return Err(cursor.error("expected ')'"));
    }
}

/// Parse the body of a field clause; the opening `{` is already consumed.
///
/// Nested clauses are tracked on a heap stack of open parents, so depth is
/// bounded by memory rather than by the native stack.
fn parse_field_clause<'a>(cursor: &mut Cursor<'a>) -> Result<Vec<QueryField>, SyntaxError> {
    // Each frame holds an open field's name and the siblings read before it.
    let mut parents: Vec<(&'a str, Vec<QueryField>)> = Vec::new();
    let mut fields = Vec::new();
    let mut at_clause_start = true;

    loop {
        cursor.skip_ws();
        let mut closing = at_clause_start && cursor.eat('}');
        if !closing {
            let name = cursor
                .identifier()
                .ok_or_else(|| cursor.error("expected field name"))?;
            trace!("field {} at offset {} (depth {})", name, cursor.pos, parents.len() + 1);

            cursor.skip_ws();
            if cursor.eat('{') {
                parents.push((name, std::mem::take(&mut fields)));
                at_clause_start = true;
                continue;
            }
            fields.push(QueryField::from_parts(name.to_string(), Vec::new()));
        }

        // A separator, or a closing brace that may finish several levels.
        loop {
            if !closing {
                cursor.skip_ws();
                if cursor.eat(',') {
                    break;
                }
                if !cursor.eat('}') {
                    return Err(cursor.error("expected '}'"));
                }
            }
            closing = false;

            match parents.pop() {
                Some((name, siblings)) => {
                    let nested_fields = std::mem::replace(&mut fields, siblings);
                    fields.push(QueryField::from_parts(name.to_string(), nested_fields));
                }
                None => return Ok(fields),
            }
        }
        at_clause_start = false;
    }
}

/// Position within the source text.
struct Cursor<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start_matches(is_ws).len();
    }

    /// Consume `c` if it is the next character.
    fn eat(&mut self, c: char) -> bool {
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    /// Consume an identifier, or nothing if none starts here.
    fn identifier(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        if !rest.starts_with(is_ident_start) {
            return None;
        }
        let end = rest.find(|c: char| !is_ident_continue(c)).unwrap_or(rest.len());
        self.pos += end;
        Some(&rest[..end])
    }

    /// Consume up to (not including) the first character matching `stop`.
    fn take_until(&mut self, stop: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let end = rest.find(stop).unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    fn error(&self, message: &str) -> SyntaxError {
        SyntaxError::at(self.source, self.pos, message)
    }
}

impl std::str::FromStr for Query {
    type Err = SyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_query(s)
    }
}
