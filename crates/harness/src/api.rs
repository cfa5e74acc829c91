//! Thin client for the Conduit REST API
//!
//! Used by scenarios that create or verify articles against the real
//! backend. Authenticated requests carry `Authorization: Token <token>`;
//! the separating space is required by the API.

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, HarnessResult};
use crate::session::Credentials;

#[derive(Debug, Clone)]
pub struct ConduitClient {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewArticle {
    pub title: String,
    pub description: String,
    pub body: String,
    #[serde(rename = "tagList")]
    pub tag_list: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Article {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub body: String,
    #[serde(rename = "favoritesCount", default)]
    pub favorites_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArticleList {
    pub articles: Vec<Article>,
    #[serde(rename = "articlesCount")]
    pub articles_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub email: String,
    pub token: String,
    pub username: String,
}

#[derive(Deserialize)]
struct ArticleBody {
    article: Article,
}

#[derive(Deserialize)]
struct UserBody {
    user: User,
}

impl ConduitClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_header(&self) -> HarnessResult<String> {
        match &self.token {
            Some(token) => Ok(format!("Token {}", token)),
            None => Err(HarnessError::Auth("client has no session token".to_string())),
        }
    }

    pub async fn login(&self, credentials: &Credentials) -> HarnessResult<User> {
        let body = serde_json::json!({
            "user": { "email": credentials.email, "password": credentials.password }
        });
        let response = self
            .client
            .post(self.url("/users/login"))
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(HarnessError::Auth(format!(
                "login returned {}",
                response.status()
            )));
        }
        Ok(response.json::<UserBody>().await?.user)
    }

    pub async fn create_article(&self, article: &NewArticle) -> HarnessResult<Article> {
        let body = serde_json::json!({ "article": article });
        let response = self
            .client
            .post(self.url("/articles"))
            .header("Authorization", self.auth_header()?)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(HarnessError::Api(format!(
                "POST /articles returned {}: {}",
                status, text
            )));
        }
        Ok(response.json::<ArticleBody>().await?.article)
    }

    pub async fn list_articles(&self, limit: u32, offset: u32) -> HarnessResult<ArticleList> {
        let response = self
            .client
            .get(self.url(&format!("/articles?limit={}&offset={}", limit, offset)))
            .header("Authorization", self.auth_header()?)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(HarnessError::Api(format!(
                "GET /articles returned {}",
                status
            )));
        }
        Ok(response.json().await?)
    }

    pub async fn delete_article(&self, slug: &str) -> HarnessResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("/articles/{}", slug)))
            .header("Authorization", self.auth_header()?)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(HarnessError::Api(format!(
                "DELETE /articles/{} returned {}",
                slug, status
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_list_parses_wire_field_names() {
        let json = r#"{
            "articles": [
                {"slug": "a", "title": "A", "favoritesCount": 1},
                {"slug": "b", "title": "B", "favoritesCount": 5}
            ],
            "articlesCount": 2
        }"#;
        let list: ArticleList = serde_json::from_str(json).unwrap();
        assert_eq!(list.articles_count, 2);
        assert_eq!(list.articles[1].favorites_count, 5);
    }

    #[test]
    fn missing_token_is_an_auth_error() {
        let client = ConduitClient::new("https://api.example.com/api");
        match client.auth_header() {
            Err(HarnessError::Auth(_)) => {}
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn auth_header_separates_scheme_and_token_with_a_space() {
        let client = ConduitClient::new("https://api.example.com/api").with_token("jwt-123");
        assert_eq!(client.auth_header().unwrap(), "Token jwt-123");
    }
}
