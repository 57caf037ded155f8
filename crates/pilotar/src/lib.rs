//! Pilotar: natural-language browser test execution.
//!
//! Pilotar runs JSON-defined test cases whose steps are written as free-text
//! descriptions. A deterministic keyword interpreter maps each step to one of
//! a fixed set of browser actions, which execute sequentially against a
//! single chromium session driven over the Chrome DevTools Protocol. An AI
//! chat endpoint is consulted once per case for an advisory plan; the reply
//! is logged but never drives execution.
//!
//! # Architecture
//!
//! - [`interpret::StepInterpreter`] — pure text-to-action mapping
//! - [`action`] — the action vocabulary and the never-throw executor
//! - [`session::BrowserSession`] — CDP browser control (mock without the
//!   `browser` feature)
//! - [`advisor`] — OpenAI-compatible advisory client
//! - [`runner`] — per-case state machine and the sequential suite loop
//! - [`report`] — JSON result publication
//!
//! # Example
//!
//! ```no_run
//! use pilotar::{
//!     AiConfig, AiProvider, JsonReporter, LlmClient, Reporter, SuiteConfig,
//!     TestSuiteRunner, load_test_cases,
//! };
//!
//! # async fn run() -> pilotar::PilotarResult<()> {
//! let config = SuiteConfig::default();
//! let ai = AiConfig::from_env(AiProvider::DeepSeek)?;
//! let cases = load_test_cases(&config.testcase_dir)?;
//!
//! let reporter = JsonReporter::new(&config.reports_dir);
//! let runner = TestSuiteRunner::new(config, Box::new(LlmClient::from_config(&ai)));
//! let results = runner.run(&cases).await?;
//! reporter.publish(&results)?;
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod advisor;
pub mod config;
pub mod interpret;
pub mod report;
pub mod result;
pub mod runner;
pub mod session;
pub mod testcase;

pub use action::{execute, ActionPayload, ActionRequest, ActionResult};
pub use advisor::{
    advisory_messages, advisory_prompt, AdvisoryClient, ChatMessage, LlmClient, Role,
};
pub use config::{AiConfig, AiProvider, SelectorHeuristics, SuiteConfig};
pub use interpret::StepInterpreter;
pub use report::{read_report, JsonReporter, Reporter, RunSummary};
pub use result::{PilotarError, PilotarResult};
pub use runner::{CaseState, StepResult, TestCaseResult, TestCaseRunner, TestSuiteRunner};
pub use session::{BrowserSession, DEFAULT_SELECTOR_TIMEOUT_MS};
pub use testcase::{default_test_cases, load_test_cases, TestCase};
