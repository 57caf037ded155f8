//! Test-case model and JSON directory loading.
//!
//! Cases come from `*.json` documents in a directory. Each document may be a
//! plain list of cases, an object wrapping them under `test_cases`, or a
//! single case. Files that fail to parse are logged and skipped; a missing or
//! empty source falls back to the built-in sample pair so a fresh checkout
//! can run end to end.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::result::{PilotarError, PilotarResult};

/// A named sequence of natural-language steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// Stable identifier, used for artifact naming
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// What the case verifies
    #[serde(default)]
    pub description: String,
    /// Step descriptions, executed in order
    #[serde(default)]
    pub steps: Vec<String>,
}

/// Accepted top-level shapes of a test-case JSON document.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CaseDocument {
    List(Vec<TestCase>),
    Wrapper { test_cases: Vec<TestCase> },
    Single(TestCase),
}

impl CaseDocument {
    fn into_cases(self) -> Vec<TestCase> {
        match self {
            Self::List(cases) | Self::Wrapper { test_cases: cases } => cases,
            Self::Single(case) => vec![case],
        }
    }
}

/// Load all test cases from `*.json` files under `dir`.
///
/// Files are visited in name order and their cases concatenated. Unreadable
/// or malformed files are skipped with a warning. When the directory is
/// missing or yields no cases, the built-in defaults are returned.
pub fn load_test_cases(dir: &Path) -> PilotarResult<Vec<TestCase>> {
    if !dir.is_dir() {
        tracing::info!(dir = %dir.display(), "test-case directory not found, using defaults");
        return Ok(default_test_cases());
    }

    let mut json_files: Vec<_> = std::fs::read_dir(dir)
        .map_err(|e| PilotarError::TestCaseLoad {
            message: format!("cannot read {}: {e}", dir.display()),
        })?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    json_files.sort();

    let mut cases = Vec::new();
    for path in &json_files {
        match load_file(path) {
            Ok(file_cases) => {
                tracing::info!(
                    file = %path.display(),
                    count = file_cases.len(),
                    "loaded test-case file"
                );
                cases.extend(file_cases);
            }
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "skipping test-case file");
            }
        }
    }

    if cases.is_empty() {
        tracing::info!("no test cases found, using defaults");
        return Ok(default_test_cases());
    }
    Ok(cases)
}

fn load_file(path: &Path) -> PilotarResult<Vec<TestCase>> {
    let contents = std::fs::read_to_string(path)?;
    let document: CaseDocument = serde_json::from_str(&contents)?;
    Ok(document.into_cases())
}

/// Built-in sample pair targeting the reference site.
#[must_use]
pub fn default_test_cases() -> Vec<TestCase> {
    vec![
        TestCase {
            id: "TC001".to_string(),
            name: "访问百度首页".to_string(),
            description: "打开百度网站首页，验证页面标题包含'百度'".to_string(),
            steps: vec![
                "导航到 https://www.baidu.com".to_string(),
                "验证页面标题包含'百度'".to_string(),
            ],
        },
        TestCase {
            id: "TC002".to_string(),
            name: "搜索功能测试".to_string(),
            description: "在百度搜索框中输入'Playwright'并搜索，验证搜索结果页面".to_string(),
            steps: vec![
                "导航到 https://www.baidu.com".to_string(),
                "找到搜索框并输入'Playwright'".to_string(),
                "点击搜索按钮".to_string(),
                "等待搜索结果加载".to_string(),
                "验证搜索结果页面包含相关内容".to_string(),
            ],
        },
    ]
}
