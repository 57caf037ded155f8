//! Browser action requests, results, and the execution dispatch.
//!
//! `ActionRequest` is the closed vocabulary of everything the runner can ask
//! the browser to do. `execute` dispatches a request against the session and
//! converts every underlying fault into a failed [`ActionResult`]; nothing on
//! this path returns `Err`, so the step loop only ever inspects result values.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::session::{BrowserSession, DEFAULT_SELECTOR_TIMEOUT_MS};

/// A single browser action to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionRequest {
    /// Load a URL in the active page
    Navigate {
        /// Absolute URL to load
        url: String,
    },
    /// Click the first element matching a CSS selector
    Click {
        /// CSS selector (may contain comma-separated fallbacks)
        selector: String,
    },
    /// Replace an input's value with the given text
    Fill {
        /// CSS selector of the input
        selector: String,
        /// Text to set
        text: String,
    },
    /// Type text key-by-key into an element
    TypeText {
        /// CSS selector of the element
        selector: String,
        /// Text to type
        text: String,
    },
    /// Pause for a fixed duration
    WaitFixed {
        /// Pause length in milliseconds
        timeout_ms: u64,
    },
    /// Wait until a selector matches something in the DOM
    WaitForSelector {
        /// CSS selector to wait for
        selector: String,
        /// Deadline in milliseconds (30 000 when omitted)
        #[serde(default = "default_selector_timeout")]
        timeout_ms: u64,
    },
    /// Capture a screenshot of the active page
    Screenshot {
        /// Output file path
        path: PathBuf,
        /// Capture beyond the viewport
        full_page: bool,
    },
    /// Read text content from the page
    GetText {
        /// CSS selector; `None` reads the whole document
        selector: Option<String>,
    },
    /// Read the current page title
    GetTitle,
}

const fn default_selector_timeout() -> u64 {
    DEFAULT_SELECTOR_TIMEOUT_MS
}

impl ActionRequest {
    /// Short action name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Navigate { .. } => "navigate",
            Self::Click { .. } => "click",
            Self::Fill { .. } => "fill",
            Self::TypeText { .. } => "type_text",
            Self::WaitFixed { .. } => "wait_fixed",
            Self::WaitForSelector { .. } => "wait_for_selector",
            Self::Screenshot { .. } => "screenshot",
            Self::GetText { .. } => "get_text",
            Self::GetTitle => "get_title",
        }
    }
}

/// Data returned by a read action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionPayload {
    /// Element or document text from `GetText`
    Text(String),
    /// Page title from `GetTitle`
    Title(String),
}

/// Outcome of one action dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    /// Whether the action succeeded
    pub success: bool,
    /// Human-readable success message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Failure description (set iff `success` is false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Data produced by a read action
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<ActionPayload>,
}

impl ActionResult {
    /// Successful result with a message
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            payload: None,
        }
    }

    /// Successful result carrying read data
    #[must_use]
    pub fn ok_with_payload(message: impl Into<String>, payload: ActionPayload) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            payload: Some(payload),
        }
    }

    /// Failed result with an error description
    #[must_use]
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            payload: None,
        }
    }
}

/// Execute one action against the session.
///
/// With no session every request fails with `"browser session not
/// initialized"`. All session faults are absorbed into the returned value.
pub async fn execute(
    request: &ActionRequest,
    session: Option<&mut BrowserSession>,
) -> ActionResult {
    let Some(session) = session else {
        return ActionResult::fail("browser session not initialized");
    };

    tracing::debug!(action = request.kind(), "dispatching action");

    match request {
        ActionRequest::Navigate { url } => match session.goto(url).await {
            Ok(()) => ActionResult::ok(format!("navigated to {url}")),
            Err(e) => ActionResult::fail(e.to_string()),
        },
        ActionRequest::Click { selector } => match session.click(selector).await {
            Ok(()) => ActionResult::ok(format!("clicked {selector}")),
            Err(e) => ActionResult::fail(e.to_string()),
        },
        ActionRequest::Fill { selector, text } => match session.fill(selector, text).await {
            Ok(()) => ActionResult::ok(format!("filled {selector} with {text:?}")),
            Err(e) => ActionResult::fail(e.to_string()),
        },
        ActionRequest::TypeText { selector, text } => {
            match session.type_text(selector, text).await {
                Ok(()) => ActionResult::ok(format!("typed {text:?} into {selector}")),
                Err(e) => ActionResult::fail(e.to_string()),
            }
        }
        ActionRequest::WaitFixed { timeout_ms } => {
            tokio::time::sleep(Duration::from_millis(*timeout_ms)).await;
            ActionResult::ok(format!("step executed (waited {timeout_ms}ms)"))
        }
        ActionRequest::WaitForSelector {
            selector,
            timeout_ms,
        } => match session.wait_for_selector(selector, *timeout_ms).await {
            Ok(()) => ActionResult::ok(format!("element {selector} appeared")),
            Err(e) => ActionResult::fail(e.to_string()),
        },
        ActionRequest::Screenshot { path, full_page } => {
            match session.screenshot(path, *full_page).await {
                Ok(()) => ActionResult::ok(format!("screenshot saved to {}", path.display())),
                Err(e) => ActionResult::fail(e.to_string()),
            }
        }
        ActionRequest::GetText { selector } => {
            let target = selector.as_deref().unwrap_or("body");
            match session.inner_text(target).await {
                Ok(text) => ActionResult::ok_with_payload(
                    format!("read text from {target}"),
                    ActionPayload::Text(text),
                ),
                Err(e) => ActionResult::fail(e.to_string()),
            }
        }
        ActionRequest::GetTitle => match session.title().await {
            Ok(title) => ActionResult::ok_with_payload(
                format!("page title: {title}"),
                ActionPayload::Title(title),
            ),
            Err(e) => ActionResult::fail(e.to_string()),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    #[cfg(not(feature = "browser"))]
    use crate::config::SuiteConfig;

    #[test]
    fn test_result_constructors() {
        let ok = ActionResult::ok("done");
        assert!(ok.success);
        assert_eq!(ok.message.as_deref(), Some("done"));
        assert!(ok.error.is_none());

        let fail = ActionResult::fail("boom");
        assert!(!fail.success);
        assert_eq!(fail.error.as_deref(), Some("boom"));
        assert!(fail.message.is_none());
    }

    #[test]
    fn test_request_serializes_tagged() {
        let request = ActionRequest::Navigate {
            url: "https://example.com".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["action"], "navigate");
        assert_eq!(json["url"], "https://example.com");
    }

    #[test]
    fn test_wait_for_selector_timeout_defaults_when_omitted() {
        let request: ActionRequest =
            serde_json::from_str(r##"{"action":"wait_for_selector","selector":"#app"}"##).unwrap();
        assert_eq!(
            request,
            ActionRequest::WaitForSelector {
                selector: "#app".to_string(),
                timeout_ms: DEFAULT_SELECTOR_TIMEOUT_MS,
            }
        );
    }

    #[test]
    fn test_wait_for_selector_explicit_timeout_wins() {
        let request: ActionRequest = serde_json::from_str(
            r##"{"action":"wait_for_selector","selector":"#app","timeout_ms":500}"##,
        )
        .unwrap();
        assert!(matches!(
            request,
            ActionRequest::WaitForSelector { timeout_ms: 500, .. }
        ));
    }

    #[tokio::test]
    async fn test_execute_without_session_fails() {
        let request = ActionRequest::GetTitle;
        let result = execute(&request, None).await;
        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("browser session not initialized")
        );
    }

    #[cfg(not(feature = "browser"))]
    #[tokio::test(start_paused = true)]
    async fn test_execute_wait_fixed_reports_generic_outcome() {
        let mut session = BrowserSession::launch(&SuiteConfig::default()).await.unwrap();
        let result = execute(&ActionRequest::WaitFixed { timeout_ms: 1000 }, Some(&mut session))
            .await;
        assert!(result.success);
        assert!(result.message.unwrap().contains("step executed"));
    }

    #[cfg(not(feature = "browser"))]
    #[tokio::test]
    async fn test_execute_navigate_then_title_payload() {
        let mut session = BrowserSession::launch(&SuiteConfig::default()).await.unwrap();
        let nav = execute(
            &ActionRequest::Navigate {
                url: "https://example.com".to_string(),
            },
            Some(&mut session),
        )
        .await;
        assert!(nav.success);

        let title = execute(&ActionRequest::GetTitle, Some(&mut session)).await;
        assert_eq!(
            title.payload,
            Some(ActionPayload::Title("https://example.com".to_string()))
        );
    }

    #[cfg(not(feature = "browser"))]
    #[tokio::test]
    async fn test_execute_click_fault_becomes_failed_result() {
        let mut session = BrowserSession::launch(&SuiteConfig::default()).await.unwrap();
        let result = execute(
            &ActionRequest::Click {
                selector: "#missing".to_string(),
            },
            Some(&mut session),
        )
        .await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("#missing"));
    }
}
