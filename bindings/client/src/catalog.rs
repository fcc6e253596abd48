use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::Value;

use crate::error::StepFailure;
use crate::extract::{lookup, Lookup};

/// The first page of products in a channel, with the ids of their variants.
pub const PRODUCTS_QUERY: &str = r#"
  query Products($channel: String!) {
    products(first: 20, channel: $channel) {
      edges {
        node {
          id
          variants { id }
        }
      }
    }
  }
"#;

/// A product from the catalog page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEdge {
    pub product_id: String,
    pub variant_ids: Vec<String>,
}

/// The variant chosen to put in a checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSelection {
    pub product_id: String,
    pub variant_id: String,
}

/// Read the raw product edges out of a catalog response body.
///
/// A body that isn't JSON, or that doesn't contain `data.products.edges` as a list, is a
/// [StepFailure::Parse]. The edges themselves are only read once one has been chosen, see
/// [select_variant].
pub fn parse_catalog(body: &str) -> Result<Vec<Value>, StepFailure> {
    let document: Value = serde_json::from_str(body)
        .map_err(|e| StepFailure::parse(format!("catalog body is not JSON: {e}")))?;

    match lookup(&document, "data.products.edges") {
        Lookup::Found(Value::Array(edges)) => Ok(edges.clone()),
        Lookup::Found(_) => Err(StepFailure::parse("catalog edges is not a list")),
        absent => Err(StepFailure::parse(format!(
            "catalog edges not found: {absent:?}"
        ))),
    }
}

impl CatalogEdge {
    /// Read one product edge. A product with `null` variants has no variants.
    pub fn from_value(edge: &Value) -> Result<Self, StepFailure> {
        let product_id = lookup(edge, "node.id")
            .found()
            .and_then(Value::as_str)
            .ok_or_else(|| StepFailure::parse("catalog edge has no product id"))?
            .to_string();

        let variant_ids = match lookup(edge, "node.variants") {
            Lookup::Found(Value::Array(variants)) => variants
                .iter()
                .map(|variant| {
                    lookup(variant, "id")
                        .found()
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .ok_or_else(|| {
                            StepFailure::parse(format!(
                                "product {product_id} has a variant without id"
                            ))
                        })
                })
                .collect::<Result<Vec<_>, _>>()?,
            Lookup::Null { .. } => Vec::new(),
            _ => {
                return Err(StepFailure::parse(format!(
                    "product {product_id} has no variant list"
                )))
            }
        };

        Ok(CatalogEdge {
            product_id,
            variant_ids,
        })
    }
}

/// Pick a product uniformly at random from the raw edges and take its first variant.
///
/// Only the chosen edge is read, so a malformed product elsewhere on the page does not stop the
/// others being bought. No products, or a chosen product without variants, is
/// [StepFailure::NoUsableData]. A malformed chosen product is a [StepFailure::Parse].
pub fn select_variant<R: Rng + ?Sized>(
    edges: &[Value],
    rng: &mut R,
) -> Result<CatalogSelection, StepFailure> {
    let edge = CatalogEdge::from_value(edges.choose(rng).ok_or(StepFailure::NoUsableData)?)?;
    let variant_id = edge
        .variant_ids
        .first()
        .cloned()
        .ok_or(StepFailure::NoUsableData)?;

    Ok(CatalogSelection {
        product_id: edge.product_id,
        variant_id,
    })
}
