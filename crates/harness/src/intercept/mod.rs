//! Network interception
//!
//! Rules pair an HTTP method and a URL glob with a response policy: answer
//! from a fixture or inline literal without touching the network, or let
//! the real upstream answer and optionally rewrite the response before the
//! application sees it. Matched exchanges are recorded under their alias
//! and can be waited on and inspected after the fact.

mod exchange;
mod proxy;
mod rule;

pub use exchange::{RecordedExchange, RequestData, ResponseData};
pub use proxy::InterceptProxy;
pub use rule::{InterceptRule, ResponseSource, ResponseTransform, UrlPattern};
