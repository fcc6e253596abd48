//! Safe navigation of GraphQL response documents.
//!
//! Paths are dot separated. A segment made only of ASCII digits indexes into an array, any other
//! segment is an object key. Lookups never panic, whatever the shape of the document.

use serde_json::Value;

/// The result of walking a path through a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<'a> {
    Found(&'a Value),
    /// The key or index at `segment` does not exist.
    Missing { segment: String },
    /// The value at `segment` is an explicit `null`.
    Null { segment: String },
    /// The value before `segment` cannot be indexed by it.
    TypeMismatch { segment: String },
}

impl<'a> Lookup<'a> {
    pub fn found(self) -> Option<&'a Value> {
        match self {
            Lookup::Found(value) => Some(value),
            _ => None,
        }
    }
}

/// Walk `path` through `document`, reporting why the walk stopped if it did not reach the end.
pub fn lookup<'a>(document: &'a Value, path: &str) -> Lookup<'a> {
    let mut current = document;
    for segment in path.split('.') {
        let next = match current {
            Value::Object(fields) => fields.get(segment),
            Value::Array(items) if is_index(segment) => {
                // Indexes too large for usize can't exist in the array anyway
                segment.parse::<usize>().ok().and_then(|i| items.get(i))
            }
            _ => {
                return Lookup::TypeMismatch {
                    segment: segment.to_string(),
                }
            }
        };

        match next {
            None => {
                return Lookup::Missing {
                    segment: segment.to_string(),
                }
            }
            Some(Value::Null) => {
                return Lookup::Null {
                    segment: segment.to_string(),
                }
            }
            Some(value) => current = value,
        }
    }

    Lookup::Found(current)
}

/// Get the value at `path`, or `None` if anything along the way is missing, null or the wrong type.
pub fn extract<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    lookup(document, path).found()
}

fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn catalog_doc() -> Value {
        json!({
            "data": {
                "products": {
                    "edges": [
                        { "node": { "id": "p1", "variants": [{ "id": "v1" }, { "id": "v2" }] } },
                        { "node": { "id": "p2", "variants": null } }
                    ]
                }
            }
        })
    }

    #[test]
    fn walks_objects_and_arrays() {
        let doc = catalog_doc();

        assert_eq!(
            Some(&json!("v2")),
            extract(&doc, "data.products.edges.0.node.variants.1.id")
        );
        assert_eq!(Some(&json!("p2")), extract(&doc, "data.products.edges.1.node.id"));
        assert!(extract(&doc, "data.products.edges").unwrap().is_array());
    }

    #[test]
    fn reports_why_a_lookup_stopped() {
        let doc = catalog_doc();

        assert_eq!(
            Lookup::Missing {
                segment: "orders".to_string()
            },
            lookup(&doc, "data.orders.edges")
        );
        assert_eq!(
            Lookup::Missing {
                segment: "5".to_string()
            },
            lookup(&doc, "data.products.edges.5.node")
        );
        assert_eq!(
            Lookup::Null {
                segment: "variants".to_string()
            },
            lookup(&doc, "data.products.edges.1.node.variants.0.id")
        );
        assert_eq!(
            Lookup::TypeMismatch {
                segment: "first".to_string()
            },
            lookup(&doc, "data.products.edges.first")
        );
        assert_eq!(
            Lookup::TypeMismatch {
                segment: "id".to_string()
            },
            lookup(&doc, "data.products.edges.0.node.id.id")
        );
    }

    #[test]
    fn digit_keys_still_index_objects() {
        let doc = json!({ "items": { "0": "zero" } });

        assert_eq!(Some(&json!("zero")), extract(&doc, "items.0"));
    }

    #[test]
    fn null_leaf_is_absent() {
        let doc = json!({ "data": { "checkoutCreate": { "checkout": null } } });

        assert_eq!(None, extract(&doc, "data.checkoutCreate.checkout"));
        assert_eq!(None, extract(&doc, "data.checkoutCreate.checkout.id"));
    }

    #[test]
    fn total_over_odd_inputs() {
        let docs = [
            Value::Null,
            json!(true),
            json!(42),
            json!("text"),
            json!([]),
            json!([[1, 2], { "a": null }]),
            json!({}),
            catalog_doc(),
        ];
        let paths = [
            "",
            ".",
            "..",
            "0",
            "a",
            "data..products",
            "0.1",
            "1.a",
            "99999999999999999999999999",
            "data.products.edges.-1",
            "data.products.edges.0.node.variants.0.id.x",
        ];

        for doc in &docs {
            for path in paths {
                // Must not panic, and a lookup is idempotent
                assert_eq!(lookup(doc, path), lookup(doc, path));
                assert_eq!(extract(doc, path).is_some(), lookup(doc, path).found().is_some());
            }
        }
    }

    #[test]
    fn nested_array_index() {
        let doc = json!([[1, 2], { "a": null }]);

        assert_eq!(Some(&json!(2)), extract(&doc, "0.1"));
        assert_eq!(
            Lookup::Null {
                segment: "a".to_string()
            },
            lookup(&doc, "1.a")
        );
    }
}
