//! Browser-driven E2E scenarios for the Conduit demo application
//!
//! The suite drives a real browser against a live application while every
//! API call the page makes is routed through a local interception proxy,
//! so stubbing, spying, and in-flight rewrites all happen on the Rust side.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  Scenario runner (Rust)                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Harness                                                     │
//! │    ├── login_to_application() -> TestContext (token)         │
//! │    ├── page(ctx)  -> PageSession (storage seed + reroute)    │
//! │    └── api(ctx)   -> ConduitClient                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │  PageSession                                                 │
//! │    renders one Playwright script per scenario, runs `node`   │
//! ├──────────────────────────────────────────────────────────────┤
//! │  InterceptProxy (conduit-harness)                            │
//! │    browser ── page.route ──► proxy ──► fixtures / upstream   │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod browser;
pub mod error;
pub mod runner;
pub mod scenarios;

pub use browser::{Browser, BrowserConfig, PageSession, PageStep};
pub use error::{E2eError, E2eResult};
pub use runner::{Harness, ScenarioRunner, SuiteResult};
pub use scenarios::Scenario;
