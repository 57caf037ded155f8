//! Case and suite execution.
//!
//! `TestCaseRunner` drives one case through its lifecycle: advisory request,
//! fail-fast step loop, title verification, failure screenshot.
//! `TestSuiteRunner` owns the browser session for the whole run and executes
//! cases strictly in input order with a fixed pacing delay between them.

use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::action::{self, ActionPayload, ActionRequest, ActionResult};
use crate::advisor::{advisory_messages, AdvisoryClient, ADVISORY_TEMPERATURE};
use crate::config::SuiteConfig;
use crate::interpret::StepInterpreter;
use crate::result::PilotarResult;
use crate::session::BrowserSession;
use crate::testcase::TestCase;

/// Lifecycle of a single test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseState {
    /// Not started
    Idle,
    /// Advisory call in flight
    AdvisoryRequested,
    /// Step loop running
    Executing,
    /// All steps succeeded
    Passed,
    /// A step, the advisory call, or verification failed
    Failed,
    /// Result value assembled
    Reported,
}

fn advance(case_id: &str, state: &mut CaseState, next: CaseState) {
    tracing::debug!(case = case_id, from = ?state, to = ?next, "case state");
    *state = next;
}

/// Outcome of one executed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    /// 1-based position in the case's step list
    pub index: usize,
    /// The step text as written
    pub description: String,
    /// Whether the step succeeded
    pub success: bool,
    /// Success message from the action
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Failure description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Final record for one test case.
///
/// Contains one [`StepResult`] per executed step. On failure the list is
/// truncated at the failing step; steps after it were never attempted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCaseResult {
    /// Case identifier
    pub id: String,
    /// Case name
    pub name: String,
    /// Case description
    pub description: String,
    /// Whether every executed step succeeded
    pub success: bool,
    /// Wall-clock duration in seconds
    pub duration: f64,
    /// First failure description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Failure screenshot, relative to the reports root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<PathBuf>,
    /// Executed steps in order
    pub steps: Vec<StepResult>,
    /// When the case started
    pub start_time: DateTime<Utc>,
    /// When the case finished
    pub end_time: DateTime<Utc>,
}

/// Executes a single test case against the shared session.
pub struct TestCaseRunner<'a> {
    interpreter: StepInterpreter,
    advisor: &'a dyn AdvisoryClient,
    config: &'a SuiteConfig,
}

impl<'a> TestCaseRunner<'a> {
    /// Build a case runner over the suite's advisor and configuration.
    #[must_use]
    pub fn new(config: &'a SuiteConfig, advisor: &'a dyn AdvisoryClient) -> Self {
        Self {
            interpreter: StepInterpreter::new(config.selectors.clone()),
            advisor,
            config,
        }
    }

    /// Run one case to completion and assemble its result.
    ///
    /// Never fails: every fault inside the case becomes a failed result.
    pub async fn run_case(
        &self,
        case: &TestCase,
        mut session: Option<&mut BrowserSession>,
    ) -> TestCaseResult {
        tracing::info!(case = %case.id, name = %case.name, "running test case");

        let mut state = CaseState::Idle;
        let start_time = Utc::now();
        let started = Instant::now();

        let mut steps = Vec::new();
        let mut error = None;

        // Advisory call first. The reply is logged and otherwise unused, but
        // a failed call fails the case before any step executes.
        advance(&case.id, &mut state, CaseState::AdvisoryRequested);
        match self
            .advisor
            .chat_completion(advisory_messages(case), Some(ADVISORY_TEMPERATURE))
            .await
        {
            Ok(plan) => {
                tracing::info!(case = %case.id, plan = %plan, "advisory plan");
                advance(&case.id, &mut state, CaseState::Executing);
                for (i, step) in case.steps.iter().enumerate() {
                    let step_result = self
                        .run_step(i + 1, step, session.as_deref_mut())
                        .await;
                    let failed = !step_result.success;
                    if failed {
                        error.clone_from(&step_result.error);
                    }
                    steps.push(step_result);
                    if failed {
                        break;
                    }
                }
            }
            Err(e) => {
                tracing::warn!(case = %case.id, error = %e, "advisory call failed");
                error = Some(e.to_string());
            }
        }

        let success = error.is_none() && steps.iter().all(|s| s.success);
        advance(
            &case.id,
            &mut state,
            if success {
                CaseState::Passed
            } else {
                CaseState::Failed
            },
        );

        let screenshot = if success {
            None
        } else {
            self.capture_failure_screenshot(&case.id, session.as_deref_mut())
                .await
        };

        let end_time = Utc::now();
        let duration = started.elapsed().as_secs_f64();
        advance(&case.id, &mut state, CaseState::Reported);

        tracing::info!(
            case = %case.id,
            success,
            duration_s = format!("{duration:.2}"),
            "test case finished"
        );

        TestCaseResult {
            id: case.id.clone(),
            name: case.name.clone(),
            description: case.description.clone(),
            success,
            duration,
            error,
            screenshot,
            steps,
            start_time,
            end_time,
        }
    }

    async fn run_step(
        &self,
        index: usize,
        description: &str,
        session: Option<&mut BrowserSession>,
    ) -> StepResult {
        let request = self.interpreter.interpret(description);
        tracing::debug!(step = index, action = request.kind(), "executing step");

        let mut result = action::execute(&request, session).await;
        if request == ActionRequest::GetTitle {
            result = self.verify_title(result);
        }

        StepResult {
            index,
            description: description.to_string(),
            success: result.success,
            message: result.message,
            error: result.error,
        }
    }

    /// Title steps pass only when the page title contains one of the
    /// configured markers (case-insensitive).
    fn verify_title(&self, result: ActionResult) -> ActionResult {
        if !result.success {
            return result;
        }
        let title = match &result.payload {
            Some(ActionPayload::Title(title)) => title.clone(),
            _ => String::new(),
        };
        let lowered = title.to_lowercase();
        let matched = self
            .config
            .selectors
            .title_markers
            .iter()
            .any(|marker| lowered.contains(&marker.to_lowercase()));
        if matched {
            result
        } else {
            ActionResult::fail(format!("title verification failed: {title}"))
        }
    }

    /// Best effort: a screenshot failure is logged, never fatal.
    async fn capture_failure_screenshot(
        &self,
        case_id: &str,
        session: Option<&mut BrowserSession>,
    ) -> Option<PathBuf> {
        let dir = self.config.screenshots_dir();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            tracing::warn!(error = %e, "cannot create screenshot directory");
            return None;
        }

        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("{case_id}_{timestamp}.png"));
        let request = ActionRequest::Screenshot {
            path: path.clone(),
            full_page: true,
        };
        let result = action::execute(&request, session).await;
        if result.success {
            // Stored relative to the reports root, matching how the report
            // file refers to it.
            let relative = path
                .strip_prefix(&self.config.reports_dir)
                .map(PathBuf::from)
                .unwrap_or(path);
            Some(relative)
        } else {
            tracing::warn!(
                case = case_id,
                error = result.error.as_deref().unwrap_or("unknown"),
                "failure screenshot not captured"
            );
            None
        }
    }
}

/// Runs a whole suite over one browser session.
pub struct TestSuiteRunner {
    config: SuiteConfig,
    advisor: Box<dyn AdvisoryClient>,
}

impl TestSuiteRunner {
    /// Build a suite runner.
    #[must_use]
    pub fn new(config: SuiteConfig, advisor: Box<dyn AdvisoryClient>) -> Self {
        Self { config, advisor }
    }

    /// Suite configuration.
    #[must_use]
    pub const fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Execute all cases strictly in input order.
    ///
    /// The browser session is acquired once up front; a launch failure aborts
    /// the run before any case executes. The session is closed at the end
    /// regardless of outcome, and results keep input order either way.
    pub async fn run(&self, cases: &[TestCase]) -> PilotarResult<Vec<TestCaseResult>> {
        tracing::info!(cases = cases.len(), "starting test run");

        let mut session = BrowserSession::launch(&self.config).await?;
        let case_runner = TestCaseRunner::new(&self.config, self.advisor.as_ref());

        let mut results = Vec::with_capacity(cases.len());
        for (i, case) in cases.iter().enumerate() {
            let result = case_runner.run_case(case, Some(&mut session)).await;
            results.push(result);

            if i + 1 < cases.len() {
                tokio::time::sleep(self.config.case_delay).await;
            }
        }

        if let Err(e) = session.close().await {
            tracing::warn!(error = %e, "browser session did not close cleanly");
        }

        let passed = results.iter().filter(|r| r.success).count();
        tracing::info!(
            total = results.len(),
            passed,
            failed = results.len() - passed,
            "test run finished"
        );
        Ok(results)
    }
}
