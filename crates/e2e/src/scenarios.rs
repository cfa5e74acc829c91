//! The Conduit scenarios
//!
//! Each scenario boots an authenticated page, optionally stubs or spies on
//! API calls through the interception proxy, drives the UI, and asserts on
//! rendered content and recorded exchanges.

use std::future::Future;
use std::pin::Pin;

use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use conduit_harness::api::NewArticle;
use conduit_harness::InterceptRule;

use crate::browser::PageStep;
use crate::error::{E2eError, E2eResult};
use crate::runner::Harness;

pub type ScenarioFuture<'a> = Pin<Box<dyn Future<Output = E2eResult<()>> + 'a>>;
pub type ScenarioFn = for<'a> fn(&'a Harness) -> ScenarioFuture<'a>;

/// A named scenario the runner can execute.
#[derive(Clone, Copy)]
pub struct Scenario {
    pub name: &'static str,
    pub run: ScenarioFn,
}

/// Every scenario, in the order the suite runs them.
pub fn all() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "tags-are-stubbed",
            run: run_tags_are_stubbed,
        },
        Scenario {
            name: "global-feed-likes",
            run: run_global_feed_likes,
        },
        Scenario {
            name: "create-article-exchange",
            run: run_create_article_exchange,
        },
        Scenario {
            name: "rewrite-article-description",
            run: run_rewrite_article_description,
        },
        Scenario {
            name: "delete-article-from-feed",
            run: run_delete_article_from_feed,
        },
    ]
}

fn run_tags_are_stubbed(h: &Harness) -> ScenarioFuture<'_> {
    Box::pin(tags_are_stubbed(h))
}

fn run_global_feed_likes(h: &Harness) -> ScenarioFuture<'_> {
    Box::pin(global_feed_likes(h))
}

fn run_create_article_exchange(h: &Harness) -> ScenarioFuture<'_> {
    Box::pin(create_article_exchange(h))
}

fn run_rewrite_article_description(h: &Harness) -> ScenarioFuture<'_> {
    Box::pin(rewrite_article_description(h))
}

fn run_delete_article_from_feed(h: &Harness) -> ScenarioFuture<'_> {
    Box::pin(delete_article_from_feed(h))
}

/// Stub the tag listing and check the rendered tag cloud.
async fn tags_are_stubbed(h: &Harness) -> E2eResult<()> {
    h.proxy
        .register(InterceptRule::get("**/tags")?.fixture("tags"))
        .await;

    let context = h.login_to_application().await?;
    h.page(&context)
        .step(PageStep::Navigate { path: "/".into() })
        .step(PageStep::AssertTextContains {
            selector: ".tag-list".into(),
            needle: "cypress".into(),
        })
        .step(PageStep::AssertTextContains {
            selector: ".tag-list".into(),
            needle: "automation".into(),
        })
        .step(PageStep::AssertTextContains {
            selector: ".tag-list".into(),
            needle: "testing".into(),
        })
        .run()
        .await
}

/// Stub the personal feed empty and the global article list from a
/// fixture, then favorite the second article and watch its count move.
async fn global_feed_likes(h: &Harness) -> E2eResult<()> {
    h.proxy
        .register(
            InterceptRule::get("**/articles/feed*")?
                .literal(json!({ "articles": [], "articlesCount": 0 })),
        )
        .await;
    h.proxy
        .register(InterceptRule::get("**/articles*")?.fixture("articles"))
        .await;

    // The favorite call answers with the same canned list the article
    // fixture carries; the rendered "6" comes from the UI's own update.
    let articles = h.proxy.fixtures().load("articles")?;
    let slug = articles
        .pointer("/articles/1/slug")
        .and_then(Value::as_str)
        .ok_or_else(|| E2eError::Assertion("articles fixture has no second slug".into()))?
        .to_string();
    h.proxy
        .register(
            InterceptRule::post(&format!("**/articles/{}/favorite", slug))?
                .literal(articles.clone()),
        )
        .await;

    let context = h.login_to_application().await?;
    h.page(&context)
        .step(PageStep::Navigate { path: "/".into() })
        .step(PageStep::ClickText {
            text: "Global Feed".into(),
        })
        .step(PageStep::AssertNthTextContains {
            selector: "app-article-list button".into(),
            index: 0,
            needle: "1".into(),
        })
        .step(PageStep::AssertNthTextContains {
            selector: "app-article-list button".into(),
            index: 1,
            needle: "5".into(),
        })
        .step(PageStep::ClickNth {
            selector: "app-article-list button".into(),
            index: 1,
        })
        .step(PageStep::AssertNthTextContains {
            selector: "app-article-list button".into(),
            index: 1,
            needle: "6".into(),
        })
        .run()
        .await
}

/// Publish an article through the UI and inspect the real exchange.
async fn create_article_exchange(h: &Harness) -> E2eResult<()> {
    h.proxy
        .register(InterceptRule::post("**/articles")?.aliased("postArticles"))
        .await;

    let context = h.login_to_application().await?;
    publish_article(h, &context, "This is a description").await?;

    let exchange = h.proxy.wait_for("postArticles", h.default_timeout()).await?;
    if exchange.response.status != 200 {
        return Err(E2eError::Assertion(format!(
            "expected 200 from the publish call, got {}",
            exchange.response.status
        )));
    }

    let request = exchange.request.body_json()?;
    let response = exchange.response.body_json()?;
    expect_json(&request, "/article/body", "This is a body of the Article")?;
    expect_json(&response, "/article/description", "This is a description")?;

    cleanup_created_article(h, &context, &response).await;
    Ok(())
}

/// Rewrite the publish response in flight: the page and the recorded
/// response carry the overwritten description, the recorded request keeps
/// the original one.
async fn rewrite_article_description(h: &Harness) -> E2eResult<()> {
    h.proxy
        .register(
            InterceptRule::post("**/articles")?
                .transform(|_request, response| {
                    if let Ok(mut body) = response.body_json() {
                        if let Some(description) = body.pointer_mut("/article/description") {
                            *description = Value::String("This is a description 2".into());
                        }
                        response.set_body_json(&body);
                    }
                })
                .aliased("postArticles"),
        )
        .await;

    let context = h.login_to_application().await?;
    publish_article(h, &context, "This is a description").await?;

    let exchange = h.proxy.wait_for("postArticles", h.default_timeout()).await?;
    if exchange.response.status != 200 {
        return Err(E2eError::Assertion(format!(
            "expected 200 from the publish call, got {}",
            exchange.response.status
        )));
    }

    let request = exchange.request.body_json()?;
    let response = exchange.response.body_json()?;
    expect_json(&request, "/article/description", "This is a description")?;
    expect_json(&response, "/article/description", "This is a description 2")?;

    cleanup_created_article(h, &context, &response).await;
    Ok(())
}

/// Create an article over the API, delete it through the UI, and verify
/// it is gone from the listing.
async fn delete_article_from_feed(h: &Harness) -> E2eResult<()> {
    let context = h.login_to_application().await?;
    let api = h.api(&context);

    let created = api
        .create_article(&NewArticle {
            title: "Request from API".into(),
            description: "API testing is easy".into(),
            body: "End-to-end testing is cool".into(),
            tag_list: vec![],
        })
        .await?;
    info!("created article {}", created.slug);

    h.page(&context)
        .step(PageStep::Navigate { path: "/".into() })
        .step(PageStep::ClickText {
            text: "Global Feed".into(),
        })
        .step(PageStep::ClickNth {
            selector: ".article-preview".into(),
            index: 0,
        })
        .step(PageStep::ClickText {
            text: "Delete Article".into(),
        })
        .step(PageStep::Sleep { ms: 1000 })
        .run()
        .await?;

    let listing = api.list_articles(10, 0).await?;
    if listing
        .articles
        .iter()
        .any(|article| article.title == "Request from API")
    {
        return Err(E2eError::Assertion(
            "deleted article still present in the listing".into(),
        ));
    }
    Ok(())
}

async fn publish_article(
    h: &Harness,
    context: &conduit_harness::TestContext,
    description: &str,
) -> E2eResult<()> {
    let title = format!("This is a title - {}", Uuid::new_v4());
    h.page(context)
        .step(PageStep::Navigate { path: "/".into() })
        .step(PageStep::ClickText {
            text: "New Article".into(),
        })
        .step(PageStep::Fill {
            selector: "[formcontrolname=\"title\"]".into(),
            value: title,
        })
        .step(PageStep::Fill {
            selector: "[formcontrolname=\"description\"]".into(),
            value: description.into(),
        })
        .step(PageStep::Fill {
            selector: "[formcontrolname=\"body\"]".into(),
            value: "This is a body of the Article".into(),
        })
        .step(PageStep::ClickText {
            text: "Publish Article".into(),
        })
        .step(PageStep::WaitSelector {
            selector: ".article-page".into(),
            timeout_ms: 10_000,
        })
        .run()
        .await
}

/// Best-effort removal of an article a scenario published against the
/// real backend; scenarios never fail on cleanup.
async fn cleanup_created_article(
    h: &Harness,
    context: &conduit_harness::TestContext,
    response: &Value,
) {
    if let Some(slug) = response.pointer("/article/slug").and_then(Value::as_str) {
        if let Err(e) = h.api(context).delete_article(slug).await {
            info!("cleanup of article {} failed: {}", slug, e);
        }
    }
}

fn expect_json(value: &Value, pointer: &str, expected: &str) -> E2eResult<()> {
    let actual = value.pointer(pointer).and_then(Value::as_str).unwrap_or_default();
    if actual != expected {
        return Err(E2eError::Assertion(format!(
            "{} was {:?}, expected {:?}",
            pointer, actual, expected
        )));
    }
    Ok(())
}
