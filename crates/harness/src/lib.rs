//! Conduit test harness
//!
//! Reusable pieces behind the browser-driven E2E suite for the Conduit
//! demo application:
//!
//! - an [`intercept::InterceptProxy`] the browser's API traffic is routed
//!   through, which stubs matched calls from fixtures or inline literals,
//!   rewrites forwarded responses in flight, and records aliased exchanges
//!   for later inspection;
//! - a [`session`] bootstrap that performs the real login call once and
//!   hands the token to the browser layer, so the UI starts authenticated
//!   without ever exercising the login form;
//! - a thin [`api::ConduitClient`] for creating and verifying articles
//!   against the real backend.

pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod fixture;
pub mod intercept;
pub mod session;

pub use config::HarnessConfig;
pub use context::TestContext;
pub use error::{HarnessError, HarnessResult};
pub use fixture::FixtureStore;
pub use intercept::{InterceptProxy, InterceptRule, RecordedExchange, RequestData, ResponseData};
pub use session::Credentials;
