//! Session bootstrap behavior against a mock authentication endpoint.

use mockito::{Matcher, Server};
use serde_json::json;

use conduit_harness::{session, Credentials, HarnessError};

fn credentials() -> Credentials {
    Credentials {
        email: "user@example.com".to_string(),
        password: "hunter2".to_string(),
    }
}

#[tokio::test]
async fn login_posts_the_wrapped_credentials_and_extracts_the_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/users/login")
        .match_body(Matcher::Json(json!({
            "user": { "email": "user@example.com", "password": "hunter2" }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"user":{"email":"user@example.com","username":"user","token":"jwt-123"}}"#)
        .create_async()
        .await;

    let token = session::login(&server.url(), &credentials())
        .await
        .expect("login");

    assert_eq!(token, "jwt-123");
    mock.assert_async().await;
}

#[tokio::test]
async fn a_rejected_login_is_an_auth_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/users/login")
        .with_status(403)
        .with_body(r#"{"errors":{"email or password":["is invalid"]}}"#)
        .create_async()
        .await;

    let err = session::login(&server.url(), &credentials())
        .await
        .expect_err("must fail");

    match err {
        HarnessError::Auth(reason) => assert!(reason.contains("403")),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn a_response_without_a_token_is_an_auth_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/users/login")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"user":{"email":"user@example.com","username":"user"}}"#)
        .create_async()
        .await;

    let err = session::login(&server.url(), &credentials())
        .await
        .expect_err("must fail");

    assert!(matches!(err, HarnessError::Auth(_)));
}
