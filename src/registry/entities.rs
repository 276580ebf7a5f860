// * Registry Entities - scrape targets and alert rules

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    // * Anything outside [a-z0-9-] is stripped from rule names after lowercasing
    static ref RULE_NAME_STRIP: Regex =
        Regex::new(r"[^a-z0-9-]").expect("! CRITICAL: Failed to compile rule name regex");
}

/// A named service the engine discovers through DNS and polls for metrics
///
/// The default value (empty name, port 0) stands for "no target" in responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeTarget {
    pub name: String,
    pub port: u16,
}

impl ScrapeTarget {
    pub fn new(name: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            port,
        }
    }
}

/// A named alert condition evaluated by the engine
///
/// `source` is empty when the caller did not specify one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRule {
    pub name: String,
    pub condition: String,
    pub source: String,
}

impl AlertRule {
    // * Builds a rule with its name already normalized
    pub fn new(name: &str, condition: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: normalize_rule_name(name),
            condition: condition.into(),
            source: source.into(),
        }
    }

    pub fn has_source(&self) -> bool {
        !self.source.is_empty()
    }
}

/// Lowercases `raw` and strips every character outside `[a-z0-9-]`.
pub fn normalize_rule_name(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    RULE_NAME_STRIP.replace_all(&lowered, "").into_owned()
}
