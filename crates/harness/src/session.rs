//! Session bootstrap
//!
//! Performs the real login call once and hands the token to the browser
//! layer, which seeds it into local storage before the application boots.
//! The UI login form is never exercised.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{HarnessError, HarnessResult};

/// Login credentials, passed explicitly rather than read from ambient
/// process state.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Issue `POST {api_url}/users/login` and extract `user.token`.
///
/// Fails fast on any non-2xx response or a missing token; no retry is
/// performed, so a broken backend aborts the dependent test immediately.
pub async fn login(api_url: &str, credentials: &Credentials) -> HarnessResult<String> {
    let url = format!("{}/users/login", api_url.trim_end_matches('/'));
    let body = serde_json::json!({
        "user": { "email": credentials.email, "password": credentials.password }
    });

    let client = reqwest::Client::new();
    let response = client.post(&url).json(&body).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(HarnessError::Auth(format!("login returned {}", status)));
    }

    let body: Value = response.json().await?;
    let token = body
        .pointer("/user/token")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if token.is_empty() {
        return Err(HarnessError::Auth(
            "login response carried no token".to_string(),
        ));
    }

    debug!("authenticated as {}", credentials.email);
    Ok(token.to_string())
}
