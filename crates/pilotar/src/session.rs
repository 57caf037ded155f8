//! Browser session control.
//!
//! One browser process, one browsing context, one active page, owned by the
//! suite runner for the lifetime of a run. When compiled with the `browser`
//! feature this drives a real chromium instance over the Chrome DevTools
//! Protocol via chromiumoxide; without the feature a mock session with the
//! same async API is provided for unit testing.

use crate::config::SuiteConfig;
use crate::result::{PilotarError, PilotarResult};

/// Default timeout for `wait_for_selector`, matching the Playwright default.
pub const DEFAULT_SELECTOR_TIMEOUT_MS: u64 = 30_000;

// ============================================================================
// Real CDP implementation (when `browser` feature is enabled)
// ============================================================================

#[cfg(feature = "browser")]
mod cdp {
    use super::{PilotarError, PilotarResult, SuiteConfig};
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::page::{
        CaptureScreenshotFormat, CaptureScreenshotParams,
    };
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use std::path::Path;
    use std::time::Duration;

    /// Browser session with a live CDP connection
    #[derive(Debug)]
    pub struct BrowserSession {
        browser: CdpBrowser,
        page: CdpPage,
        #[allow(dead_code)]
        handle: tokio::task::JoinHandle<()>,
    }

    impl BrowserSession {
        /// Launch chromium and open a blank page.
        pub async fn launch(config: &SuiteConfig) -> PilotarResult<Self> {
            let mut builder =
                CdpConfig::builder().window_size(config.viewport_width, config.viewport_height);

            if !config.headless {
                builder = builder.with_head();
            }
            if !config.sandbox {
                builder = builder.no_sandbox();
            }

            let cdp_config = builder.build().map_err(|e| PilotarError::BrowserLaunch {
                message: e.to_string(),
            })?;

            let (browser, mut handler) =
                CdpBrowser::launch(cdp_config)
                    .await
                    .map_err(|e| PilotarError::BrowserLaunch {
                        message: e.to_string(),
                    })?;

            let handle = tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| PilotarError::page(e.to_string()))?;

            Ok(Self {
                browser,
                page,
                handle,
            })
        }

        /// Navigate the active page and wait until the load settles.
        pub async fn goto(&mut self, url: &str) -> PilotarResult<()> {
            self.page
                .goto(url)
                .await
                .map_err(|e| PilotarError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            self.page
                .wait_for_navigation()
                .await
                .map_err(|e| PilotarError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            Ok(())
        }

        /// Click the first element matching `selector`.
        pub async fn click(&mut self, selector: &str) -> PilotarResult<()> {
            let element = self.page.find_element(selector).await.map_err(|e| {
                PilotarError::SelectorNotFound {
                    selector: selector.to_string(),
                    message: e.to_string(),
                }
            })?;
            element
                .click()
                .await
                .map_err(|e| PilotarError::page(e.to_string()))?;
            Ok(())
        }

        /// Replace the value of the first matching input with `text`.
        pub async fn fill(&mut self, selector: &str, text: &str) -> PilotarResult<()> {
            let element = self.page.find_element(selector).await.map_err(|e| {
                PilotarError::SelectorNotFound {
                    selector: selector.to_string(),
                    message: e.to_string(),
                }
            })?;
            // Clear any existing value before typing. The selector is embedded
            // via JSON so quotes inside it survive.
            let script = format!(
                "(() => {{ const e = document.querySelector({}); if (e) e.value = ''; }})()",
                serde_json::to_string(selector).unwrap_or_else(|_| "\"\"".to_string())
            );
            self.page
                .evaluate(script)
                .await
                .map_err(|e| PilotarError::page(e.to_string()))?;
            element
                .click()
                .await
                .map_err(|e| PilotarError::page(e.to_string()))?;
            element
                .type_str(text)
                .await
                .map_err(|e| PilotarError::page(e.to_string()))?;
            Ok(())
        }

        /// Type `text` key-by-key into the first matching element.
        pub async fn type_text(&mut self, selector: &str, text: &str) -> PilotarResult<()> {
            let element = self.page.find_element(selector).await.map_err(|e| {
                PilotarError::SelectorNotFound {
                    selector: selector.to_string(),
                    message: e.to_string(),
                }
            })?;
            element
                .click()
                .await
                .map_err(|e| PilotarError::page(e.to_string()))?;
            element
                .type_str(text)
                .await
                .map_err(|e| PilotarError::page(e.to_string()))?;
            Ok(())
        }

        /// Poll the DOM until `selector` matches or `timeout_ms` elapses.
        pub async fn wait_for_selector(
            &mut self,
            selector: &str,
            timeout_ms: u64,
        ) -> PilotarResult<()> {
            let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
            loop {
                if self.page.find_element(selector).await.is_ok() {
                    return Ok(());
                }
                if tokio::time::Instant::now() >= deadline {
                    return Err(PilotarError::Timeout { ms: timeout_ms });
                }
                tokio::time::sleep(Duration::from_millis(250)).await;
            }
        }

        /// Capture a PNG screenshot of the active page to `path`.
        pub async fn screenshot(&mut self, path: &Path, full_page: bool) -> PilotarResult<()> {
            let params = CaptureScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .capture_beyond_viewport(full_page)
                .build();

            let shot = self
                .page
                .execute(params)
                .await
                .map_err(|e| PilotarError::screenshot(e.to_string()))?;

            use base64::Engine;
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(&shot.data)
                .map_err(|e| PilotarError::screenshot(e.to_string()))?;
            tokio::fs::write(path, bytes)
                .await
                .map_err(|e| PilotarError::screenshot(e.to_string()))?;
            Ok(())
        }

        /// Inner text of the first matching element.
        pub async fn inner_text(&mut self, selector: &str) -> PilotarResult<String> {
            let element = self.page.find_element(selector).await.map_err(|e| {
                PilotarError::SelectorNotFound {
                    selector: selector.to_string(),
                    message: e.to_string(),
                }
            })?;
            let text = element
                .inner_text()
                .await
                .map_err(|e| PilotarError::page(e.to_string()))?;
            Ok(text.unwrap_or_default())
        }

        /// Current page title.
        pub async fn title(&mut self) -> PilotarResult<String> {
            let title = self
                .page
                .get_title()
                .await
                .map_err(|e| PilotarError::page(e.to_string()))?;
            Ok(title.unwrap_or_default())
        }

        /// Close the browser. Called on every run exit path.
        pub async fn close(mut self) -> PilotarResult<()> {
            self.browser
                .close()
                .await
                .map_err(|e| PilotarError::page(e.to_string()))?;
            Ok(())
        }
    }
}

// ============================================================================
// Mock implementation (when `browser` feature is NOT enabled)
// ============================================================================

#[cfg(not(feature = "browser"))]
mod mock {
    use super::{PilotarError, PilotarResult, SuiteConfig};
    use std::path::Path;
    use std::time::Duration;

    // Smallest valid PNG signature; enough for a stand-in artifact.
    const PNG_STUB: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

    /// In-memory browser session used when the `browser` feature is disabled.
    ///
    /// Element actions succeed once a page has been loaded and fail with
    /// selector errors before that, which is enough to exercise the executor
    /// and runner contracts in unit tests.
    #[derive(Debug)]
    pub struct BrowserSession {
        /// URL of the loaded page, if any
        pub current_url: Option<String>,
        /// Page title (navigation sets it to the URL; tests may overwrite)
        pub title: String,
        /// Whole-document text
        pub body_text: String,
    }

    impl BrowserSession {
        /// "Launch" a mock session.
        pub async fn launch(_config: &SuiteConfig) -> PilotarResult<Self> {
            Ok(Self {
                current_url: None,
                title: String::new(),
                body_text: String::new(),
            })
        }

        /// Record a navigation.
        pub async fn goto(&mut self, url: &str) -> PilotarResult<()> {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(PilotarError::Navigation {
                    url: url.to_string(),
                    message: "invalid URL".to_string(),
                });
            }
            self.current_url = Some(url.to_string());
            self.title = url.to_string();
            self.body_text = format!("content of {url}");
            Ok(())
        }

        fn require_page(&self, selector: &str) -> PilotarResult<()> {
            if self.current_url.is_none() {
                return Err(PilotarError::SelectorNotFound {
                    selector: selector.to_string(),
                    message: "no page loaded".to_string(),
                });
            }
            Ok(())
        }

        /// Click succeeds once a page is loaded.
        pub async fn click(&mut self, selector: &str) -> PilotarResult<()> {
            self.require_page(selector)
        }

        /// Fill succeeds once a page is loaded.
        pub async fn fill(&mut self, selector: &str, _text: &str) -> PilotarResult<()> {
            self.require_page(selector)
        }

        /// Type succeeds once a page is loaded.
        pub async fn type_text(&mut self, selector: &str, _text: &str) -> PilotarResult<()> {
            self.require_page(selector)
        }

        /// Resolves immediately when a page is loaded, times out otherwise.
        pub async fn wait_for_selector(
            &mut self,
            selector: &str,
            timeout_ms: u64,
        ) -> PilotarResult<()> {
            if self.current_url.is_some() {
                Ok(())
            } else {
                tokio::time::sleep(Duration::from_millis(timeout_ms)).await;
                let _ = selector;
                Err(PilotarError::Timeout { ms: timeout_ms })
            }
        }

        /// Write a stub PNG to `path`.
        pub async fn screenshot(&mut self, path: &Path, _full_page: bool) -> PilotarResult<()> {
            tokio::fs::write(path, PNG_STUB)
                .await
                .map_err(|e| PilotarError::screenshot(e.to_string()))?;
            Ok(())
        }

        /// Whole-document or per-selector text.
        pub async fn inner_text(&mut self, selector: &str) -> PilotarResult<String> {
            self.require_page(selector)?;
            Ok(self.body_text.clone())
        }

        /// Current title. Cannot fail.
        pub async fn title(&mut self) -> PilotarResult<String> {
            Ok(self.title.clone())
        }

        /// Close the session.
        pub async fn close(self) -> PilotarResult<()> {
            Ok(())
        }
    }
}

// Re-export based on feature
#[cfg(feature = "browser")]
pub use cdp::BrowserSession;

#[cfg(not(feature = "browser"))]
pub use mock::BrowserSession;
