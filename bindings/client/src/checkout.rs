use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StepFailure;
use crate::extract::extract;

/// Create a guest checkout holding one unit of a variant.
pub const CHECKOUT_MUTATION: &str = r#"
  mutation CreateCheckout($channel: String!, $variantId: ID!, $email: String!) {
    checkoutCreate(
      input: {
        channel: $channel,
        email: $email,
        lines: [{quantity: 1, variantId: $variantId}]
      }
    ) {
      checkout { id }
      errors { field message code }
    }
  }
"#;

/// A reason the target gave for refusing to create a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckoutError {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

/// What a checkout mutation responded with.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CheckoutResult {
    pub checkout_id: Option<String>,
    pub errors: Vec<CheckoutError>,
}

impl CheckoutResult {
    /// A checkout id means success, even if errors were reported alongside it.
    pub fn into_checkout_id(self) -> Result<String, StepFailure> {
        match self.checkout_id {
            Some(id) => Ok(id),
            None if !self.errors.is_empty() => Err(StepFailure::Business(self.errors)),
            None => Err(StepFailure::parse(
                "checkout response has neither a checkout id nor errors",
            )),
        }
    }
}

/// Read a checkout mutation response body.
///
/// Errors are collected from both `data.checkoutCreate.errors` and the top-level GraphQL `errors`.
/// A top-level error has its code read from `extensions.code`. Error fields that are not strings
/// are left empty.
pub fn parse_checkout(body: &str) -> Result<CheckoutResult, StepFailure> {
    let document: Value = serde_json::from_str(body)
        .map_err(|e| StepFailure::parse(format!("checkout body is not JSON: {e}")))?;

    let checkout_id = extract(&document, "data.checkoutCreate.checkout.id")
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut errors = Vec::new();
    // Entries are read field by field so that an oddly shaped error never hides a checkout id
    if let Some(Value::Array(mutation_errors)) = extract(&document, "data.checkoutCreate.errors") {
        errors.extend(mutation_errors.iter().map(|error| CheckoutError {
            field: text(error, "field"),
            message: text(error, "message"),
            code: text(error, "code"),
        }));
    }
    if let Some(Value::Array(graphql_errors)) = extract(&document, "errors") {
        errors.extend(graphql_errors.iter().map(|error| CheckoutError {
            field: None,
            message: text(error, "message"),
            code: text(error, "extensions.code"),
        }));
    }

    Ok(CheckoutResult {
        checkout_id,
        errors,
    })
}

fn text(value: &Value, path: &str) -> Option<String> {
    extract(value, path)
        .and_then(Value::as_str)
        .map(str::to_string)
}
