//! Scenario orchestration
//!
//! Bundles the interception proxy, API client, and browser configuration
//! behind one handle, runs scenarios sequentially, and writes a JSON
//! summary of the suite.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use conduit_harness::api::ConduitClient;
use conduit_harness::{session, FixtureStore, HarnessConfig, InterceptProxy, TestContext};

use crate::browser::{BrowserConfig, PageSession};
use crate::error::{E2eError, E2eResult};
use crate::scenarios::Scenario;

/// Everything a scenario needs.
pub struct Harness {
    pub config: HarnessConfig,
    pub proxy: InterceptProxy,
    pub browser: BrowserConfig,
}

impl Harness {
    /// Start the interception proxy and assemble the harness.
    pub async fn start(config: HarnessConfig, browser: BrowserConfig) -> E2eResult<Self> {
        let fixtures = FixtureStore::new(&config.fixtures_dir);
        let proxy = InterceptProxy::start(config.api_url.clone(), fixtures).await?;
        Ok(Self {
            config,
            proxy,
            browser,
        })
    }

    /// Authenticate against the real API and hand back the typed context.
    ///
    /// The UI login form is never driven; [`Harness::page`] seeds the token
    /// into local storage, so the first navigation already renders an
    /// authenticated page.
    pub async fn login_to_application(&self) -> E2eResult<TestContext> {
        let token = session::login(&self.config.api_url, &self.config.credentials()).await?;
        Ok(TestContext::new(token))
    }

    /// A page session wired to this harness: API traffic rerouted through
    /// the proxy and the session token seeded before load.
    pub fn page(&self, context: &TestContext) -> PageSession {
        PageSession::new(self.browser.clone(), self.config.app_url.clone())
            .route_api_through(self.proxy.url())
            .seed_local_storage("jwtToken", &context.token)
    }

    /// API client authenticated with the context token.
    pub fn api(&self, context: &TestContext) -> ConduitClient {
        ConduitClient::new(self.config.api_url.clone()).with_token(&context.token)
    }

    pub fn default_timeout(&self) -> Duration {
        self.config.default_timeout
    }
}

/// Result of running a single scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Result of running the whole suite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

pub struct ScenarioRunner {
    harness: Harness,
    output_dir: PathBuf,
}

impl ScenarioRunner {
    pub fn new(harness: Harness, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            harness,
            output_dir: output_dir.into(),
        }
    }

    /// Probe the application root until it answers, or give up.
    pub async fn wait_until_reachable(&self, timeout: Duration) -> E2eResult<()> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;
        let url = &self.harness.config.app_url;

        let start = Instant::now();
        let mut attempts = 0;
        while start.elapsed() < timeout {
            attempts += 1;
            match client.get(url).send().await {
                Ok(response) if response.status().is_success() => return Ok(()),
                Ok(response) => warn!("application answered {}", response.status()),
                Err(e) => {
                    if attempts == 1 {
                        info!("waiting for the application at {}...", url);
                    }
                    // connection refused is expected while it is starting
                    if !e.is_connect() {
                        warn!("reachability probe failed: {}", e);
                    }
                }
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }

        Err(E2eError::AppUnreachable {
            url: url.clone(),
            attempts,
        })
    }

    /// Run scenarios one after another, resetting the interception rules
    /// between them. A failed scenario never stops the suite.
    pub async fn run(&self, scenarios: &[Scenario]) -> SuiteResult {
        let start = Instant::now();
        let mut results = Vec::new();
        let mut passed = 0;
        let mut failed = 0;

        info!(
            "running {} scenario(s) against {}",
            scenarios.len(),
            self.harness.config.app_url
        );

        for scenario in scenarios {
            self.harness.proxy.reset().await;

            let step_start = Instant::now();
            let outcome = (scenario.run)(&self.harness).await;
            let duration_ms = step_start.elapsed().as_millis() as u64;

            match outcome {
                Ok(()) => {
                    passed += 1;
                    info!("✓ {} ({} ms)", scenario.name, duration_ms);
                    results.push(ScenarioResult {
                        name: scenario.name.to_string(),
                        success: true,
                        duration_ms,
                        error: None,
                    });
                }
                Err(e) => {
                    failed += 1;
                    error!("✗ {} - {}", scenario.name, e);
                    results.push(ScenarioResult {
                        name: scenario.name.to_string(),
                        success: false,
                        duration_ms,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!("{} passed, {} failed ({} ms)", passed, failed, duration_ms);

        SuiteResult {
            total: scenarios.len(),
            passed,
            failed,
            duration_ms,
            results,
        }
    }

    /// Write the suite summary as JSON.
    pub fn write_results(&self, suite: &SuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join("e2e-results.json");
        std::fs::write(&path, serde_json::to_string_pretty(suite)?)?;
        info!("results written to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suite_result_serializes_for_the_results_file() {
        let suite = SuiteResult {
            total: 1,
            passed: 0,
            failed: 1,
            duration_ms: 42,
            results: vec![ScenarioResult {
                name: "tags-are-stubbed".to_string(),
                success: false,
                duration_ms: 42,
                error: Some("assertion failed".to_string()),
            }],
        };
        let json = serde_json::to_value(&suite).unwrap();
        assert_eq!(json["failed"], 1);
        assert_eq!(json["results"][0]["name"], "tags-are-stubbed");
    }
}
