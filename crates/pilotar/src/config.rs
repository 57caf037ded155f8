//! Runner and AI-provider configuration.
//!
//! Provider selection and credentials are resolved exactly once, at process
//! start (`AiConfig::from_env`), and passed by reference from there on. No
//! component reads environment variables on its own.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::result::{PilotarError, PilotarResult};

/// Supported AI advisory providers.
///
/// All of them expose an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    /// DeepSeek (default)
    DeepSeek,
    /// Alibaba Qwen via the DashScope compatible-mode endpoint
    Qwen,
    /// GitHub Copilot
    Copilot,
    /// OpenAI or any other OpenAI-compatible service
    OpenAi,
}

impl AiProvider {
    /// Parse a provider name as given in `AI_PROVIDER` or on the CLI.
    pub fn parse(name: &str) -> PilotarResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "deepseek" => Ok(Self::DeepSeek),
            "qwen" => Ok(Self::Qwen),
            "copilot" => Ok(Self::Copilot),
            "openai" => Ok(Self::OpenAi),
            other => Err(PilotarError::config(format!(
                "Unsupported AI provider: {other}. Supported: deepseek, qwen, copilot, openai"
            ))),
        }
    }

    /// Default chat-completions base URL for this provider.
    #[must_use]
    pub const fn default_base_url(self) -> &'static str {
        match self {
            Self::DeepSeek => "https://api.deepseek.com/v1",
            Self::Qwen => "https://dashscope.aliyuncs.com/compatible-mode/v1",
            Self::Copilot => "https://api.githubcopilot.com/v1",
            Self::OpenAi => "https://api.openai.com/v1",
        }
    }

    /// Default model for this provider.
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::DeepSeek => "deepseek-chat",
            Self::Qwen => "qwen-turbo",
            Self::Copilot => "gpt-4",
            Self::OpenAi => "gpt-4",
        }
    }

    /// Display name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DeepSeek => "deepseek",
            Self::Qwen => "qwen",
            Self::Copilot => "copilot",
            Self::OpenAi => "openai",
        }
    }

    const fn env_prefix(self) -> &'static str {
        match self {
            Self::DeepSeek => "DEEPSEEK",
            Self::Qwen => "QWEN",
            Self::Copilot => "COPILOT",
            Self::OpenAi => "OPENAI",
        }
    }
}

/// AI advisory collaborator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Which provider to talk to
    pub provider: AiProvider,
    /// API key (bearer token)
    pub api_key: String,
    /// Base URL up to and including the API version segment
    pub base_url: String,
    /// Model identifier sent with every request
    pub model: String,
}

impl AiConfig {
    /// Build a config explicitly (tests, embedding).
    pub fn new(
        provider: AiProvider,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    /// Resolve the config from the environment for the given provider.
    ///
    /// Reads `<PROVIDER>_API_KEY` (Qwen also accepts `DASHSCOPE_API_KEY`),
    /// with `<PROVIDER>_BASE_URL` and `<PROVIDER>_MODEL` overriding the
    /// provider defaults. A missing key is a fatal configuration error: the
    /// run never begins without one.
    pub fn from_env(provider: AiProvider) -> PilotarResult<Self> {
        let prefix = provider.env_prefix();
        let api_key = std::env::var(format!("{prefix}_API_KEY"))
            .ok()
            .or_else(|| {
                // DashScope's historical variable name still works for Qwen.
                (provider == AiProvider::Qwen)
                    .then(|| std::env::var("DASHSCOPE_API_KEY").ok())
                    .flatten()
            })
            .ok_or_else(|| {
                PilotarError::config(format!("{prefix}_API_KEY environment variable not set"))
            })?;

        let base_url = std::env::var(format!("{prefix}_BASE_URL"))
            .unwrap_or_else(|_| provider.default_base_url().to_string());
        let model = std::env::var(format!("{prefix}_MODEL"))
            .unwrap_or_else(|_| provider.default_model().to_string());

        Ok(Self {
            provider,
            api_key,
            base_url,
            model,
        })
    }
}

/// Fixed selector fallbacks used by the click/fill interpretation rules.
///
/// The defaults target the reference site's markup (Baidu's search page) and
/// are not derived from step text; point them elsewhere when testing another
/// site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorHeuristics {
    /// Where a "search … input" step types its quoted term
    pub search_box: String,
    /// What a "click search/button" step clicks
    pub submit_button: String,
    /// What a bare "click" step clicks
    pub generic_clickable: String,
    /// Substrings accepted by title verification (matched case-insensitively)
    pub title_markers: Vec<String>,
}

impl Default for SelectorHeuristics {
    fn default() -> Self {
        Self {
            search_box: "input[name='wd'], input#kw".to_string(),
            submit_button: "input[type='submit'], button, #su".to_string(),
            generic_clickable: "button, a".to_string(),
            title_markers: vec!["百度".to_string(), "playwright".to_string()],
        }
    }
}

/// Suite-wide runner configuration.
#[derive(Debug, Clone)]
pub struct SuiteConfig {
    /// Run the browser in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// Directory scanned for test-case JSON documents
    pub testcase_dir: PathBuf,
    /// Root directory for reports and failure screenshots
    pub reports_dir: PathBuf,
    /// Pause between consecutive test cases
    pub case_delay: std::time::Duration,
    /// Selector fallbacks for the interpretation rules
    pub selectors: SelectorHeuristics,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1920,
            viewport_height: 1080,
            sandbox: true,
            testcase_dir: PathBuf::from("testcase"),
            reports_dir: PathBuf::from("reports"),
            case_delay: std::time::Duration::from_secs(2),
            selectors: SelectorHeuristics::default(),
        }
    }
}

impl SuiteConfig {
    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    /// Set the test-case directory
    #[must_use]
    pub fn with_testcase_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.testcase_dir = dir.into();
        self
    }

    /// Set the reports directory
    #[must_use]
    pub fn with_reports_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.reports_dir = dir.into();
        self
    }

    /// Set the inter-case pacing delay
    #[must_use]
    pub const fn with_case_delay(mut self, delay: std::time::Duration) -> Self {
        self.case_delay = delay;
        self
    }

    /// Override the selector heuristics
    #[must_use]
    pub fn with_selectors(mut self, selectors: SelectorHeuristics) -> Self {
        self.selectors = selectors;
        self
    }

    /// Directory where failure screenshots are written
    #[must_use]
    pub fn screenshots_dir(&self) -> PathBuf {
        self.reports_dir.join("screenshots")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parse() {
        assert_eq!(AiProvider::parse("deepseek").unwrap(), AiProvider::DeepSeek);
        assert_eq!(AiProvider::parse("QWEN").unwrap(), AiProvider::Qwen);
        assert_eq!(AiProvider::parse("openai").unwrap(), AiProvider::OpenAi);
        assert!(AiProvider::parse("claude").is_err());
    }

    #[test]
    fn test_provider_defaults() {
        assert!(AiProvider::DeepSeek
            .default_base_url()
            .contains("deepseek.com"));
        assert_eq!(AiProvider::DeepSeek.default_model(), "deepseek-chat");
        assert_eq!(AiProvider::Qwen.default_model(), "qwen-turbo");
    }

    #[test]
    fn test_ai_config_new() {
        let config = AiConfig::new(AiProvider::OpenAi, "sk-test", "http://localhost:8081/v1", "m");
        assert_eq!(config.base_url, "http://localhost:8081/v1");
        assert_eq!(config.model, "m");
    }

    #[test]
    fn test_selector_defaults_target_reference_site() {
        let selectors = SelectorHeuristics::default();
        assert!(selectors.search_box.contains("input#kw"));
        assert!(selectors.submit_button.contains("#su"));
        assert!(selectors.title_markers.iter().any(|m| m == "百度"));
    }

    #[test]
    fn test_suite_config_builder() {
        let config = SuiteConfig::default()
            .with_headless(false)
            .with_viewport(1280, 720)
            .with_testcase_dir("cases")
            .with_reports_dir("out")
            .with_case_delay(std::time::Duration::from_millis(500));

        assert!(!config.headless);
        assert_eq!(config.viewport_width, 1280);
        assert_eq!(config.testcase_dir, PathBuf::from("cases"));
        assert_eq!(config.screenshots_dir(), PathBuf::from("out/screenshots"));
        assert_eq!(config.case_delay.as_millis(), 500);
    }
}
