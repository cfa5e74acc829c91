//! Per-test context
//!
//! Replaces a stringly-keyed alias map with typed fields: a context only
//! exists once the bootstrap has written every field, so a read before the
//! write cannot be expressed.

/// State shared by the steps of one test case. Write-once, read-many.
#[derive(Debug, Clone)]
pub struct TestContext {
    /// Session token captured by the bootstrap login
    pub token: String,
}

impl TestContext {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}
