//! The interception proxy
//!
//! A local HTTP server the browser's API traffic is routed through.
//! Matched requests are answered from fixtures or literals without touching
//! the network, or forwarded upstream and rewritten in flight; every
//! matched exchange is recorded under its alias for later inspection.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{HarnessError, HarnessResult};
use crate::fixture::FixtureStore;
use crate::intercept::exchange::{RecordedExchange, RequestData, ResponseData};
use crate::intercept::rule::{InterceptRule, ResponseSource};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct InterceptProxy {
    addr: SocketAddr,
    shared: Arc<ProxyState>,
    server: JoinHandle<()>,
}

struct ProxyState {
    upstream: String,
    client: reqwest::Client,
    fixtures: FixtureStore,
    rules: Mutex<Vec<InterceptRule>>,
    exchanges: Mutex<Vec<RecordedExchange>>,
}

impl InterceptProxy {
    /// Bind on a free local port and start serving.
    ///
    /// `upstream` is the real API base the forwarded traffic goes to; a
    /// leading `/api` on incoming paths is folded into it, so the proxy
    /// accepts requests shaped exactly as the application issues them.
    pub async fn start(upstream: impl Into<String>, fixtures: FixtureStore) -> HarnessResult<Self> {
        let shared = Arc::new(ProxyState {
            upstream: upstream.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            fixtures,
            rules: Mutex::new(Vec::new()),
            exchanges: Mutex::new(Vec::new()),
        });

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let app = Router::new().fallback(handle).with_state(shared.clone());
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                warn!("intercept proxy exited: {}", e);
            }
        });

        debug!("intercept proxy listening on {}", addr);
        Ok(Self {
            addr,
            shared,
            server,
        })
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn fixtures(&self) -> &FixtureStore {
        &self.shared.fixtures
    }

    /// Register a rule. When several rules match a call, the
    /// last-registered one wins.
    pub async fn register(&self, rule: InterceptRule) {
        self.shared.rules.lock().await.push(rule);
    }

    /// Suspend until an exchange tagged with `alias` has completed its full
    /// round trip, including any in-flight rewrite.
    pub async fn wait_for(&self, alias: &str, timeout: Duration) -> HarnessResult<RecordedExchange> {
        let start = Instant::now();
        loop {
            if let Some(found) = self.shared.find_exchange(alias).await {
                return Ok(found);
            }
            if start.elapsed() >= timeout {
                return Err(HarnessError::Timeout {
                    what: format!("intercepted exchange '{}'", alias),
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// All completed exchanges recorded under `alias`, oldest first.
    pub async fn exchanges(&self, alias: &str) -> Vec<RecordedExchange> {
        self.shared
            .exchanges
            .lock()
            .await
            .iter()
            .filter(|e| e.alias.as_deref() == Some(alias))
            .cloned()
            .collect()
    }

    /// Drop all rules and recorded exchanges. Rules live for one test.
    pub async fn reset(&self) {
        self.shared.rules.lock().await.clear();
        self.shared.exchanges.lock().await.clear();
    }
}

impl Drop for InterceptProxy {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn handle(State(state): State<Arc<ProxyState>>, request: Request) -> Response {
    match state.process(request).await {
        Ok(response) => response,
        Err(e) => {
            warn!("intercept proxy error: {}", e);
            Response::builder()
                .status(StatusCode::BAD_GATEWAY)
                .body(Body::from(e.to_string()))
                .unwrap_or_default()
        }
    }
}

impl ProxyState {
    async fn process(&self, request: Request) -> HarnessResult<Response> {
        let (parts, body) = request.into_parts();
        let bytes = axum::body::to_bytes(body, usize::MAX)
            .await
            .map_err(|e| HarnessError::Proxy(e.to_string()))?;
        let uri = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        let request = RequestData {
            method: parts.method.to_string(),
            uri,
            headers: header_pairs(&parts.headers),
            body: String::from_utf8_lossy(&bytes).into_owned(),
        };

        let rule = self.matching_rule(&request).await;

        let response = match rule.as_ref().map(InterceptRule::source) {
            Some(ResponseSource::Fixture(name)) => {
                let value = self.fixtures.load(name)?;
                debug!(
                    "{} {} answered from fixture '{}'",
                    request.method, request.uri, name
                );
                stub_response(&value)
            }
            Some(ResponseSource::Literal(value)) => {
                debug!("{} {} answered inline", request.method, request.uri);
                stub_response(value)
            }
            Some(ResponseSource::Transform(transform)) => {
                let mut delivered = self.forward(&request).await?;
                transform(&request, &mut delivered);
                delivered
            }
            Some(ResponseSource::Passthrough) | None => self.forward(&request).await?,
        };

        // Record after any transform has run, so a waiter never observes a
        // half-rewritten exchange.
        if let Some(rule) = rule {
            self.record(RecordedExchange {
                alias: rule.alias().map(str::to_string),
                request,
                response: response.clone(),
            })
            .await;
        }

        build_response(&response)
    }

    async fn matching_rule(&self, request: &RequestData) -> Option<InterceptRule> {
        let rules = self.rules.lock().await;
        rules
            .iter()
            .rev()
            .find(|r| r.matches(&request.method, &request.uri))
            .cloned()
    }

    async fn forward(&self, request: &RequestData) -> HarnessResult<ResponseData> {
        let path = request.uri.strip_prefix("/api").unwrap_or(&request.uri);
        let url = format!("{}{}", self.upstream, path);
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|_| HarnessError::Proxy(format!("invalid method {}", request.method)))?;

        let mut builder = self.client.request(method, &url);
        for (name, value) in &request.headers {
            if is_hop_by_hop(name) {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        Ok(ResponseData {
            status,
            headers,
            body,
        })
    }

    async fn record(&self, exchange: RecordedExchange) {
        self.exchanges.lock().await.push(exchange);
    }

    async fn find_exchange(&self, alias: &str) -> Option<RecordedExchange> {
        self.exchanges
            .lock()
            .await
            .iter()
            .find(|e| e.alias.as_deref() == Some(alias))
            .cloned()
    }
}

fn stub_response(value: &Value) -> ResponseData {
    let mut headers = HashMap::new();
    headers.insert(
        "content-type".to_string(),
        "application/json".to_string(),
    );
    ResponseData {
        status: 200,
        headers,
        body: value.to_string(),
    }
}

fn build_response(data: &ResponseData) -> HarnessResult<Response> {
    let mut builder = Response::builder().status(data.status);
    if let Some(headers) = builder.headers_mut() {
        for (name, value) in &data.headers {
            // the body may have been rewritten, so framing headers are
            // recomputed by the server
            if name.eq_ignore_ascii_case("content-length")
                || name.eq_ignore_ascii_case("transfer-encoding")
            {
                continue;
            }
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                HarnessError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                }
            })?;
            let value =
                HeaderValue::from_str(value).map_err(|e| HarnessError::InvalidHeader {
                    name: name.to_string(),
                    reason: e.to_string(),
                })?;
            headers.append(name, value);
        }
    }
    builder
        .body(Body::from(data.body.clone()))
        .map_err(|e| HarnessError::Proxy(e.to_string()))
}

fn header_pairs(headers: &HeaderMap) -> HashMap<String, String> {
    // header values with opaque bytes are dropped
    headers
        .iter()
        .filter_map(|(k, v)| {
            v.to_str()
                .ok()
                .map(|v| (k.as_str().to_string(), v.to_string()))
        })
        .collect()
}

fn is_hop_by_hop(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "host" | "connection" | "content-length" | "transfer-encoding" | "accept-encoding"
    )
}
