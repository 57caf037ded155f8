//! Step interpretation: free-text descriptions to browser actions.
//!
//! A fixed, ordered chain of keyword rules maps each step description to
//! exactly one [`ActionRequest`]. Interpretation is pure and total: the same
//! text always yields the same request, and text no rule recognizes yields a
//! short fixed wait rather than an error. Keyword sets are bilingual because
//! the step corpus this grew up on is written in Chinese.

use regex::Regex;

use crate::action::ActionRequest;
use crate::config::SelectorHeuristics;

/// Fixed wait issued by the explicit wait rule.
pub const WAIT_STEP_MS: u64 = 3_000;
/// Fixed wait issued by a verify step that does not mention the title.
pub const VERIFY_SETTLE_MS: u64 = 2_000;
/// Fixed wait issued when no rule matches.
pub const FALLBACK_WAIT_MS: u64 = 1_000;

const NAVIGATE_KEYWORDS: &[&str] = &["导航", "打开", "访问", "navigate", "open", "visit"];
const SEARCH_KEYWORDS: &[&str] = &["搜索", "search"];
const INPUT_KEYWORDS: &[&str] = &["输入", "input", "enter"];
const CLICK_KEYWORDS: &[&str] = &["点击", "click"];
const BUTTON_KEYWORDS: &[&str] = &["按钮", "button"];
const VERIFY_KEYWORDS: &[&str] = &["验证", "检查", "verify", "check"];
const TITLE_KEYWORDS: &[&str] = &["标题", "title"];
const WAIT_KEYWORDS: &[&str] = &["等待", "wait"];

/// The interpretation rules, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    /// Navigation keyword plus a URL in the text
    Navigate,
    /// Search keyword plus an input keyword plus a quoted term
    SearchFill,
    /// Click keyword, submit-button or generic target
    Click,
    /// Verify keyword: title read or settle wait
    Verify,
    /// Explicit wait keyword
    Wait,
}

const RULE_ORDER: &[Rule] = &[
    Rule::Navigate,
    Rule::SearchFill,
    Rule::Click,
    Rule::Verify,
    Rule::Wait,
];

/// Maps a step description to one [`ActionRequest`].
#[derive(Debug, Clone)]
pub struct StepInterpreter {
    selectors: SelectorHeuristics,
    url_re: Regex,
    quote_re: Regex,
}

impl Default for StepInterpreter {
    fn default() -> Self {
        Self::new(SelectorHeuristics::default())
    }
}

impl StepInterpreter {
    /// Build an interpreter with the given selector heuristics.
    ///
    /// Both regexes are compiled here, never per call.
    #[must_use]
    pub fn new(selectors: SelectorHeuristics) -> Self {
        // The URL run stops at whitespace, closing brackets, and both ASCII
        // and fullwidth punctuation, so trailing prose never sticks to it.
        #[allow(clippy::unwrap_used)]
        let url_re = Regex::new(r"https?://[^\s)）,，。]+").unwrap();
        #[allow(clippy::unwrap_used)]
        let quote_re = Regex::new(r#"['"]([^'"]+)['"]"#).unwrap();
        Self {
            selectors,
            url_re,
            quote_re,
        }
    }

    /// Map one step description to an action.
    ///
    /// Pure, deterministic, and total: never fails, never touches the
    /// browser, and unrecognized text produces the no-op fallback wait.
    #[must_use]
    pub fn interpret(&self, text: &str) -> ActionRequest {
        let lowered = text.to_lowercase();

        for rule in RULE_ORDER {
            match rule {
                Rule::Navigate if contains_any(&lowered, NAVIGATE_KEYWORDS) => {
                    // A navigation step without a URL is a no-op, not a parse
                    // error: fall straight to the default wait.
                    return match self.url_re.find(text) {
                        Some(m) => ActionRequest::Navigate {
                            url: m.as_str().to_string(),
                        },
                        None => fallback(),
                    };
                }
                Rule::SearchFill
                    if contains_any(&lowered, SEARCH_KEYWORDS)
                        && contains_any(&lowered, INPUT_KEYWORDS) =>
                {
                    // Without a quoted term there is nothing to type; let the
                    // later rules have a look at the text.
                    if let Some(caps) = self.quote_re.captures(text) {
                        if let Some(term) = caps.get(1) {
                            return ActionRequest::Fill {
                                selector: self.selectors.search_box.clone(),
                                text: term.as_str().to_string(),
                            };
                        }
                    }
                }
                Rule::Click if contains_any(&lowered, CLICK_KEYWORDS) => {
                    let selector = if contains_any(&lowered, SEARCH_KEYWORDS)
                        || contains_any(&lowered, BUTTON_KEYWORDS)
                    {
                        self.selectors.submit_button.clone()
                    } else {
                        self.selectors.generic_clickable.clone()
                    };
                    return ActionRequest::Click { selector };
                }
                Rule::Verify if contains_any(&lowered, VERIFY_KEYWORDS) => {
                    return if contains_any(&lowered, TITLE_KEYWORDS) {
                        ActionRequest::GetTitle
                    } else {
                        ActionRequest::WaitFixed {
                            timeout_ms: VERIFY_SETTLE_MS,
                        }
                    };
                }
                Rule::Wait if contains_any(&lowered, WAIT_KEYWORDS) => {
                    return ActionRequest::WaitFixed {
                        timeout_ms: WAIT_STEP_MS,
                    };
                }
                _ => {}
            }
        }

        fallback()
    }

    /// Selector heuristics this interpreter was built with.
    #[must_use]
    pub const fn selectors(&self) -> &SelectorHeuristics {
        &self.selectors
    }
}

const fn fallback() -> ActionRequest {
    ActionRequest::WaitFixed {
        timeout_ms: FALLBACK_WAIT_MS,
    }
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn interpreter() -> StepInterpreter {
        StepInterpreter::default()
    }

    #[test]
    fn test_navigate_with_chinese_keyword() {
        let request = interpreter().interpret("导航到 https://example.com");
        assert_eq!(
            request,
            ActionRequest::Navigate {
                url: "https://example.com".to_string()
            }
        );
    }

    #[test]
    fn test_navigate_url_stops_at_fullwidth_punctuation() {
        let request = interpreter().interpret("访问 https://example.com，然后等待页面加载");
        assert_eq!(
            request,
            ActionRequest::Navigate {
                url: "https://example.com".to_string()
            }
        );
    }

    #[test]
    fn test_navigate_url_stops_at_ascii_comma() {
        let request = interpreter().interpret("Open https://example.com/a?b=1, then continue");
        assert_eq!(
            request,
            ActionRequest::Navigate {
                url: "https://example.com/a?b=1".to_string()
            }
        );
    }

    #[test]
    fn test_navigate_without_url_falls_back() {
        let request = interpreter().interpret("打开首页");
        assert_eq!(
            request,
            ActionRequest::WaitFixed {
                timeout_ms: FALLBACK_WAIT_MS
            }
        );
    }

    #[test]
    fn test_search_fill_extracts_quoted_term() {
        let request = interpreter().interpret("在搜索框输入 'Playwright'");
        assert_eq!(
            request,
            ActionRequest::Fill {
                selector: SelectorHeuristics::default().search_box,
                text: "Playwright".to_string()
            }
        );
    }

    #[test]
    fn test_search_fill_double_quotes() {
        let request = interpreter().interpret(r#"search box, input "rust testing""#);
        assert!(matches!(
            request,
            ActionRequest::Fill { text, .. } if text == "rust testing"
        ));
    }

    #[test]
    fn test_search_without_quoted_term_falls_through() {
        // No quote, no other rule keyword: lands on the default wait.
        let request = interpreter().interpret("搜索框输入关键词");
        assert_eq!(
            request,
            ActionRequest::WaitFixed {
                timeout_ms: FALLBACK_WAIT_MS
            }
        );
    }

    #[test]
    fn test_click_search_button_uses_submit_selector() {
        let request = interpreter().interpret("点击搜索按钮");
        assert_eq!(
            request,
            ActionRequest::Click {
                selector: SelectorHeuristics::default().submit_button
            }
        );
    }

    #[test]
    fn test_click_generic_target() {
        let request = interpreter().interpret("点击第一个链接");
        assert_eq!(
            request,
            ActionRequest::Click {
                selector: SelectorHeuristics::default().generic_clickable
            }
        );
    }

    #[test]
    fn test_verify_title_yields_get_title() {
        assert_eq!(interpreter().interpret("验证页面标题"), ActionRequest::GetTitle);
        assert_eq!(
            interpreter().interpret("Verify the page title contains Baidu"),
            ActionRequest::GetTitle
        );
    }

    #[test]
    fn test_verify_without_title_settles() {
        let request = interpreter().interpret("检查搜索结果");
        assert_eq!(
            request,
            ActionRequest::WaitFixed {
                timeout_ms: VERIFY_SETTLE_MS
            }
        );
    }

    #[test]
    fn test_wait_keyword() {
        let request = interpreter().interpret("等待页面加载");
        assert_eq!(
            request,
            ActionRequest::WaitFixed {
                timeout_ms: WAIT_STEP_MS
            }
        );
    }

    #[test]
    fn test_unrecognized_text_falls_back() {
        let request = interpreter().interpret("做点什么");
        assert_eq!(
            request,
            ActionRequest::WaitFixed {
                timeout_ms: FALLBACK_WAIT_MS
            }
        );
    }

    #[test]
    fn test_custom_selectors_flow_through() {
        let selectors = SelectorHeuristics {
            search_box: "#q".to_string(),
            submit_button: "#go".to_string(),
            generic_clickable: "a".to_string(),
            title_markers: vec!["example".to_string()],
        };
        let interpreter = StepInterpreter::new(selectors);
        assert_eq!(
            interpreter.interpret("搜索框输入 'x'"),
            ActionRequest::Fill {
                selector: "#q".to_string(),
                text: "x".to_string()
            }
        );
        assert_eq!(
            interpreter.interpret("click the button"),
            ActionRequest::Click {
                selector: "#go".to_string()
            }
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Interpretation is total and deterministic over arbitrary text.
            #[test]
            fn interpret_never_panics_and_is_pure(text in ".{0,200}") {
                let interpreter = StepInterpreter::default();
                let first = interpreter.interpret(&text);
                let second = interpreter.interpret(&text);
                prop_assert_eq!(first, second);
            }
        }
    }
}
