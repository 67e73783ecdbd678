//! Canonical text rendering.
//!
//! `user (id: 6) { first_name, address { street, city } }`

use std::fmt;

use super::model::{Query, QueryField};

/// Render a query in canonical form.
pub fn format_query(query: &Query) -> String {
    query.to_string()
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.object_type())?;

        if !self.filters.is_empty() {
            f.write_str(" (")?;
            for (i, (key, value)) in self.filters.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}: {}", key, value)?;
            }
            f.write_str(")")?;
        }

        if !self.fields.is_empty() {
            f.write_str(" ")?;
            write_field_list(f, &self.fields)?;
        }

        Ok(())
    }
}

impl fmt::Display for QueryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())?;
        if !self.is_leaf() {
            f.write_str(" ")?;
            write_field_list(f, &self.nested_fields)?;
        }
        Ok(())
    }
}

/// Write `{ a, b { c } }`. Callers skip empty lists.
///
/// Walks the tree with a stack of sibling iterators instead of recursing.
fn write_field_list(f: &mut fmt::Formatter<'_>, fields: &[QueryField]) -> fmt::Result {
    f.write_str("{ ")?;
    let mut open = vec![fields.iter()];
    let mut first = true;
    while let Some(siblings) = open.last_mut() {
        match siblings.next() {
            Some(field) => {
                if !first {
                    f.write_str(", ")?;
                }
                f.write_str(field.name())?;
                if field.is_leaf() {
                    first = false;
                } else {
                    f.write_str(" { ")?;
                    open.push(field.nested_fields.iter());
                    first = true;
                }
            }
            None => {
                open.pop();
                f.write_str(" }")?;
                first = false;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str) -> QueryField {
        QueryField::new(name).unwrap()
    }

    #[test]
    fn test_object_type_only() {
        let query = Query::new("test").unwrap();
        assert_eq!(format_query(&query), "test");
    }

    #[test]
    fn test_filters_only() {
        let query = Query::new("test")
            .unwrap()
            .with_filter("id", "1")
            .unwrap()
            .with_filter("type", "3")
            .unwrap();
        assert_eq!(format_query(&query), "test (id: 1, type: 3)");
    }

    #[test]
    fn test_fields_only() {
        let query = Query::new("test").unwrap().with_field(field("foo")).with_field(field("bar"));
        assert_eq!(query.to_string(), "test { foo, bar }");
    }

    #[test]
    fn test_user_example() {
        let query = Query::new("user")
            .unwrap()
            .with_filter("id", "6")
            .unwrap()
            .with_field(field("first_name"))
            .with_field(field("last_name"))
            .with_field(
                field("address")
                    .with_nested(field("street"))
                    .with_nested(field("city"))
                    .with_nested(field("state"))
                    .with_nested(field("zip")),
            );
        assert_eq!(
            format_query(&query),
            "user (id: 6) { first_name, last_name, address { street, city, state, zip } }"
        );
    }

    #[test]
    fn test_field_display() {
        assert_eq!(field("leaf").to_string(), "leaf");
        let nested = field("a").with_nested(field("b").with_nested(field("c")));
        assert_eq!(nested.to_string(), "a { b { c } }");
    }

    #[test]
    fn test_overwritten_filter_renders_in_first_position() {
        let mut query = Query::new("test").unwrap();
        query.filters.insert("a", "1").unwrap();
        query.filters.insert("b", "2").unwrap();
        query.filters.insert("a", "3").unwrap();
        assert_eq!(query.to_string(), "test (a: 3, b: 2)");
    }
}
