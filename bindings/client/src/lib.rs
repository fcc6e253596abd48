mod catalog;
mod checkout;
mod client;
mod error;
mod extract;
mod transport;

pub mod prelude {
    pub use crate::catalog::{parse_catalog, select_variant, CatalogEdge, CatalogSelection};
    pub use crate::checkout::{parse_checkout, CheckoutError, CheckoutResult};
    pub use crate::client::{CommerceClient, CATALOG_OPERATION, CHECKOUT_OPERATION};
    pub use crate::error::{StepFailure, TransportFault};
    pub use crate::extract::{extract, lookup, Lookup};
    pub use crate::transport::{GraphQlRequest, GraphQlTransport, RawResponse, ReqwestTransport};
}
