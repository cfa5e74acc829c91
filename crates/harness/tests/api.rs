//! Conduit API client behavior against a mock backend.

use mockito::{Matcher, Server};

use conduit_harness::api::{ConduitClient, NewArticle};

fn new_article() -> NewArticle {
    NewArticle {
        title: "Request from API".to_string(),
        description: "API testing is easy".to_string(),
        body: "End-to-end testing is cool".to_string(),
        tag_list: vec![],
    }
}

#[tokio::test]
async fn create_article_sends_the_token_header_with_a_space() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/articles")
        .match_header("authorization", "Token jwt-123")
        .match_body(Matcher::PartialJsonString(
            r#"{"article":{"title":"Request from API"}}"#.to_string(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"article":{"slug":"request-from-api","title":"Request from API"}}"#)
        .create_async()
        .await;

    let client = ConduitClient::new(server.url()).with_token("jwt-123");
    let article = client.create_article(&new_article()).await.expect("create");

    assert_eq!(article.slug, "request-from-api");
    mock.assert_async().await;
}

#[tokio::test]
async fn list_articles_passes_limit_and_offset() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/articles")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("limit".into(), "10".into()),
            Matcher::UrlEncoded("offset".into(), "0".into()),
        ]))
        .match_header("authorization", "Token jwt-123")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "articles": [
                    {"slug": "a", "title": "A", "favoritesCount": 1},
                    {"slug": "b", "title": "B", "favoritesCount": 5}
                ],
                "articlesCount": 2
            }"#,
        )
        .create_async()
        .await;

    let client = ConduitClient::new(server.url()).with_token("jwt-123");
    let list = client.list_articles(10, 0).await.expect("list");

    assert_eq!(list.articles_count, 2);
    assert_eq!(list.articles[0].favorites_count, 1);
    assert_eq!(list.articles[1].favorites_count, 5);
    mock.assert_async().await;
}

#[tokio::test]
async fn delete_article_targets_the_slug_path() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("DELETE", "/articles/request-from-api")
        .match_header("authorization", "Token jwt-123")
        .with_status(204)
        .create_async()
        .await;

    let client = ConduitClient::new(server.url()).with_token("jwt-123");
    client
        .delete_article("request-from-api")
        .await
        .expect("delete");

    mock.assert_async().await;
}

#[tokio::test]
async fn login_parses_the_user_envelope() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/users/login")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"user":{"email":"user@example.com","username":"user","token":"jwt-123"}}"#)
        .create_async()
        .await;

    let client = ConduitClient::new(server.url());
    let user = client
        .login(&conduit_harness::Credentials {
            email: "user@example.com".to_string(),
            password: "hunter2".to_string(),
        })
        .await
        .expect("login");

    assert_eq!(user.token, "jwt-123");
    assert_eq!(user.username, "user");
}
