mod common;

mod context;
mod runner_context;

pub mod prelude {
    /// Common operations for storefront scenarios.
    ///
    /// This is a good place to start if you are getting started writing scenarios.
    pub use crate::common::*;

    pub use crate::context::CommerceAgentContext;
    pub use crate::runner_context::CommerceRunnerContext;

    /// Re-export of the `gale_runner` prelude.
    ///
    /// This is for convenience so that you can depend on a single crate for the runner in your scenarios.
    pub use gale_runner::prelude::*;

    /// Re-export of the instrumented client for convenience.
    pub use commerce_client_instrumented::prelude::*;
}
