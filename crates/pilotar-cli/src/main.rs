//! Pilotar CLI: run natural-language browser test suites.
//!
//! ## Usage
//!
//! ```bash
//! pilotar                              # Run cases from ./testcase
//! pilotar --provider qwen              # Use a different AI provider
//! pilotar --testcase-dir cases --headed
//! RUST_LOG=debug pilotar               # Verbose logging
//! ```

mod error;

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use pilotar::{
    load_test_cases, AiConfig, AiProvider, JsonReporter, LlmClient, Reporter, SuiteConfig,
    TestSuiteRunner,
};

use crate::error::{CliError, CliResult};

/// Natural-language browser test runner
#[derive(Debug, Parser)]
#[command(name = "pilotar", version, about)]
struct Cli {
    /// AI provider for advisory plans (deepseek, qwen, copilot, openai)
    #[arg(long, env = "AI_PROVIDER", default_value = "deepseek")]
    provider: String,

    /// Directory scanned for test-case JSON files
    #[arg(long, default_value = "testcase")]
    testcase_dir: String,

    /// Output directory for reports and screenshots
    #[arg(long, default_value = "reports")]
    reports_dir: String,

    /// Run the browser with a visible window
    #[arg(long)]
    headed: bool,

    /// Disable the chromium sandbox (containers, CI)
    #[arg(long)]
    no_sandbox: bool,

    /// Viewport width in pixels
    #[arg(long, default_value_t = 1920)]
    viewport_width: u32,

    /// Viewport height in pixels
    #[arg(long, default_value_t = 1080)]
    viewport_height: u32,

    /// Pause between consecutive test cases, in milliseconds
    #[arg(long, default_value_t = 2000)]
    case_delay_ms: u64,
}

fn main() -> ExitCode {
    match run() {
        Ok(failed) if failed == 0 => ExitCode::SUCCESS,
        Ok(failed) => {
            eprintln!("{failed} test case(s) failed");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<usize> {
    let cli = Cli::parse();
    init_tracing();

    let provider = AiProvider::parse(&cli.provider)?;
    let ai_config = AiConfig::from_env(provider)?;
    let suite_config = build_suite_config(&cli);

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::runtime(e.to_string()))?;
    runtime.block_on(run_suite(suite_config, ai_config))
}

async fn run_suite(config: SuiteConfig, ai_config: AiConfig) -> CliResult<usize> {
    let cases = load_test_cases(&config.testcase_dir)?;
    tracing::info!(
        provider = ai_config.provider.name(),
        model = %ai_config.model,
        cases = cases.len(),
        "starting pilotar run"
    );

    let reporter = JsonReporter::new(&config.reports_dir);
    let advisor = LlmClient::from_config(&ai_config);
    let runner = TestSuiteRunner::new(config, Box::new(advisor));

    let results = runner.run(&cases).await?;

    // Reporting problems are logged, never fatal: the run already happened.
    match reporter.publish(&results) {
        Ok(path) => println!("Report: {}", path.display()),
        Err(e) => tracing::warn!(error = %e, "report not written"),
    }

    for result in &results {
        let status = if result.success { "PASS" } else { "FAIL" };
        println!("[{status}] {} - {} ({:.2}s)", result.id, result.name, result.duration);
    }

    Ok(results.iter().filter(|r| !r.success).count())
}

fn build_suite_config(cli: &Cli) -> SuiteConfig {
    let mut config = SuiteConfig::default()
        .with_headless(!cli.headed)
        .with_viewport(cli.viewport_width, cli.viewport_height)
        .with_testcase_dir(&cli.testcase_dir)
        .with_reports_dir(&cli.reports_dir)
        .with_case_delay(Duration::from_millis(cli.case_delay_ms));
    if cli.no_sandbox {
        config = config.with_no_sandbox();
    }
    config
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
