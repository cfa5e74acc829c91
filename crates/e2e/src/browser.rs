//! Browser automation
//!
//! Scenario steps are collected into a typed list and rendered as one
//! self-contained Playwright script, executed with `node`. The script
//! seeds local storage before any page script runs and reroutes the
//! application's API calls through the interception proxy, so every
//! network decision stays on the Rust side.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use tokio::process::Command as TokioCommand;
use tracing::debug;

use crate::error::{E2eError, E2eResult};

/// Browser engine to drive.
#[derive(Debug, Clone, Copy, Default)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }

    pub fn parse(name: &str) -> Self {
        match name {
            "firefox" => Browser::Firefox,
            "webkit" => Browser::Webkit,
            _ => Browser::Chromium,
        }
    }
}

/// A single page interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PageStep {
    /// Open a path relative to the application root
    Navigate { path: String },

    /// Click the first element matching a selector
    Click { selector: String },

    /// Click the first element containing the given text
    ClickText { text: String },

    /// Click the nth element matching a selector
    ClickNth { selector: String, index: usize },

    /// Fill an input field
    Fill { selector: String, value: String },

    /// Wait for a selector to become visible
    WaitSelector { selector: String, timeout_ms: u64 },

    /// Assert that an element's text contains a needle, polling until the
    /// step timeout elapses
    AssertTextContains { selector: String, needle: String },

    /// Assert that the nth matching element's text contains a needle
    AssertNthTextContains {
        selector: String,
        index: usize,
        needle: String,
    },

    /// Capture a full-page screenshot
    Screenshot { name: String },

    /// Fixed delay (use sparingly)
    Sleep { ms: u64 },
}

impl PageStep {
    fn name(&self) -> String {
        match self {
            PageStep::Navigate { path } => format!("navigate:{}", path),
            PageStep::Click { selector } => format!("click:{}", selector),
            PageStep::ClickText { text } => format!("click-text:{}", text),
            PageStep::ClickNth { selector, index } => format!("click:{}[{}]", selector, index),
            PageStep::Fill { selector, .. } => format!("fill:{}", selector),
            PageStep::WaitSelector { selector, .. } => format!("wait:{}", selector),
            PageStep::AssertTextContains { selector, needle } => {
                format!("assert:{} contains {}", selector, needle)
            }
            PageStep::AssertNthTextContains {
                selector,
                index,
                needle,
            } => format!("assert:{}[{}] contains {}", selector, index, needle),
            PageStep::Screenshot { name } => format!("screenshot:{}", name),
            PageStep::Sleep { ms } => format!("sleep:{}ms", ms),
        }
    }
}

/// Browser-side configuration.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub screenshot_dir: PathBuf,
    pub step_timeout_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            screenshot_dir: PathBuf::from("test-results/screenshots"),
            step_timeout_ms: 10_000,
        }
    }
}

/// One browser run: local storage seeds, API rerouting, then steps.
pub struct PageSession {
    config: BrowserConfig,
    app_url: String,
    proxy_url: Option<String>,
    local_storage: Vec<(String, String)>,
    steps: Vec<PageStep>,
}

impl PageSession {
    pub fn new(config: BrowserConfig, app_url: impl Into<String>) -> Self {
        Self {
            config,
            app_url: app_url.into().trim_end_matches('/').to_string(),
            proxy_url: None,
            local_storage: Vec::new(),
            steps: Vec::new(),
        }
    }

    /// Route every `**/api/**` request the page makes through the
    /// interception proxy. The page keeps seeing the original URL.
    pub fn route_api_through(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy_url = Some(proxy_url.into().trim_end_matches('/').to_string());
        self
    }

    /// Write a local storage key before any page script runs.
    pub fn seed_local_storage(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.local_storage.push((key.into(), value.into()));
        self
    }

    pub fn step(mut self, step: PageStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Render the Playwright script for this session.
    pub fn build_script(&self) -> String {
        let mut script = String::new();
        script.push_str(&format!(
            r#"const {{ chromium, firefox, webkit }} = require('playwright');

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
"#,
            browser = self.config.browser.as_str(),
            headless = self.config.headless,
            width = self.config.viewport_width,
            height = self.config.viewport_height,
        ));

        for (key, value) in &self.local_storage {
            script.push_str(&format!(
                "  await context.addInitScript(() => {{ window.localStorage.setItem('{}', '{}'); }});\n",
                js_str(key),
                js_str(value)
            ));
        }

        script.push_str("  const page = await context.newPage();\n");

        if let Some(proxy) = &self.proxy_url {
            script.push_str(&format!(
                r#"  await page.route('**/api/**', (route) => {{
    const original = new URL(route.request().url());
    route.continue({{ url: '{}' + original.pathname + original.search }});
  }});
"#,
                js_str(proxy)
            ));
        }

        script.push_str("\n  try {\n");
        for (i, step) in self.steps.iter().enumerate() {
            script.push_str(&format!("    // step {}: {}\n", i + 1, step.name()));
            script.push_str(&self.step_js(step));
            script.push('\n');
        }
        script.push_str(
            r#"    console.log(JSON.stringify({ success: true }));
  } catch (error) {
    console.error(JSON.stringify({ success: false, error: error.message }));
    process.exitCode = 1;
  } finally {
    await browser.close();
  }
})();
"#,
        );

        script
    }

    fn step_js(&self, step: &PageStep) -> String {
        let timeout = self.config.step_timeout_ms;
        match step {
            PageStep::Navigate { path } => format!(
                "    await page.goto('{}{}', {{ waitUntil: 'networkidle' }});",
                js_str(&self.app_url),
                js_str(path)
            ),
            PageStep::Click { selector } => format!(
                "    await page.click('{}', {{ timeout: {} }});",
                js_str(selector),
                timeout
            ),
            PageStep::ClickText { text } => format!(
                "    await page.getByText('{}').first().click({{ timeout: {} }});",
                js_str(text),
                timeout
            ),
            PageStep::ClickNth { selector, index } => format!(
                "    await page.locator('{}').nth({}).click({{ timeout: {} }});",
                js_str(selector),
                index,
                timeout
            ),
            PageStep::Fill { selector, value } => format!(
                "    await page.fill('{}', '{}', {{ timeout: {} }});",
                js_str(selector),
                js_str(value),
                timeout
            ),
            PageStep::WaitSelector {
                selector,
                timeout_ms,
            } => format!(
                "    await page.waitForSelector('{}', {{ timeout: {} }});",
                js_str(selector),
                timeout_ms
            ),
            PageStep::AssertTextContains { selector, needle } => {
                assert_text_js(&js_str(selector), "first()", &js_str(needle), timeout)
            }
            PageStep::AssertNthTextContains {
                selector,
                index,
                needle,
            } => assert_text_js(
                &js_str(selector),
                &format!("nth({})", index),
                &js_str(needle),
                timeout,
            ),
            PageStep::Screenshot { name } => {
                let path = self.config.screenshot_dir.join(format!("{}.png", name));
                format!(
                    "    await page.screenshot({{ path: '{}', fullPage: true }});",
                    js_str(&path.to_string_lossy())
                )
            }
            PageStep::Sleep { ms } => format!("    await page.waitForTimeout({});", ms),
        }
    }

    /// Execute the rendered script with `node`.
    pub async fn run(&self) -> E2eResult<()> {
        let script = self.build_script();
        let dir = tempfile::tempdir()?;
        let script_path = dir.path().join("scenario.js");
        std::fs::write(&script_path, &script)?;
        std::fs::create_dir_all(&self.config.screenshot_dir)?;

        debug!("running browser script {}", script_path.display());

        let output = TokioCommand::new("node")
            .arg(&script_path)
            .output()
            .await?;

        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(E2eError::Script(format!(
                "stdout: {}\nstderr: {}",
                stdout.trim(),
                stderr.trim()
            )));
        }
        Ok(())
    }
}

// Text content can settle after a click (optimistic UI updates), so the
// assertion polls instead of reading once.
fn assert_text_js(selector: &str, pick: &str, needle: &str, timeout_ms: u64) -> String {
    format!(
        r#"    {{
      const target = page.locator('{selector}').{pick};
      await target.waitFor({{ state: 'visible', timeout: {timeout_ms} }});
      const deadline = Date.now() + {timeout_ms};
      for (;;) {{
        const text = await target.innerText();
        if (text.includes('{needle}')) break;
        if (Date.now() > deadline) {{
          throw new Error("expected '{selector}' ({pick}) to contain '{needle}', got: " + text);
        }}
        await page.waitForTimeout(100);
      }}
    }}"#
    )
}

/// Escape a string for inclusion in a single-quoted JS literal.
fn js_str(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'").replace('\n', "\\n")
}

/// Check that `node` can resolve Playwright.
pub fn browser_available() -> bool {
    Command::new("node")
        .args(["-e", "require('playwright')"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> PageSession {
        PageSession::new(BrowserConfig::default(), "http://localhost:4200")
    }

    #[test]
    fn storage_seed_runs_before_the_first_navigation() {
        let script = session()
            .seed_local_storage("jwtToken", "jwt-123")
            .step(PageStep::Navigate { path: "/".into() })
            .build_script();

        let seed = script
            .find("localStorage.setItem('jwtToken', 'jwt-123')")
            .expect("seed present");
        let goto = script.find("page.goto").expect("goto present");
        assert!(seed < goto, "seed must precede navigation");
        assert!(script.contains("addInitScript"));
    }

    #[test]
    fn api_traffic_is_rerouted_to_the_proxy() {
        let script = session()
            .route_api_through("http://127.0.0.1:5555")
            .build_script();

        assert!(script.contains("page.route('**/api/**'"));
        assert!(script.contains("'http://127.0.0.1:5555' + original.pathname + original.search"));
    }

    #[test]
    fn steps_render_in_order() {
        let script = session()
            .step(PageStep::Navigate { path: "/".into() })
            .step(PageStep::ClickText {
                text: "Global Feed".into(),
            })
            .step(PageStep::ClickNth {
                selector: "app-article-list button".into(),
                index: 1,
            })
            .build_script();

        let goto = script.find("page.goto").expect("goto");
        let text = script.find("getByText('Global Feed')").expect("click text");
        let nth = script.find(".nth(1).click").expect("click nth");
        assert!(goto < text && text < nth);
    }

    #[test]
    fn single_quotes_in_values_are_escaped() {
        let script = session()
            .step(PageStep::Fill {
                selector: "[formcontrolname=\"title\"]".into(),
                value: "it's a title".into(),
            })
            .build_script();

        assert!(script.contains("it\\'s a title"));
    }
}
