// * In-memory Registry of scrape targets and alert rules
// * Entries live for the lifetime of the process; there is no removal path

pub mod entities;

pub use entities::{normalize_rule_name, AlertRule, ScrapeTarget};

use std::collections::BTreeMap;
use tracing::debug;

/// Named scrape targets and alert rules
///
/// Both maps are `BTreeMap`s so iteration is ordered by key, which is what
/// gives rendering its deterministic output. Every key equals the stored
/// entity's `name` (the normalized name for rules).
#[derive(Debug, Clone, Default)]
pub struct Registry {
    targets: BTreeMap<String, ScrapeTarget>,
    rules: BTreeMap<String, AlertRule>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or fully replaces the target called `name`.
    ///
    /// Returns the stored target, or `None` (and leaves the registry
    /// untouched) when `name` is empty.
    pub fn upsert_target(&mut self, name: &str, port: u16) -> Option<ScrapeTarget> {
        if name.is_empty() {
            return None;
        }

        let target = ScrapeTarget::new(name, port);
        if let Some(previous) = self.targets.insert(name.to_string(), target.clone()) {
            debug!(service = name, previous_port = previous.port, port, "Scrape target replaced");
        }
        Some(target)
    }

    /// Inserts or fully replaces the rule whose normalized name matches `name`.
    ///
    /// Returns the stored rule, or `None` when normalization leaves nothing.
    pub fn upsert_rule(&mut self, name: &str, condition: &str, source: &str) -> Option<AlertRule> {
        let rule = AlertRule::new(name, condition, source);
        if rule.name.is_empty() {
            return None;
        }

        if self.rules.insert(rule.name.clone(), rule.clone()).is_some() {
            debug!(rule = %rule.name, "Alert rule replaced");
        }
        Some(rule)
    }

    // * Targets in key order
    pub fn targets(&self) -> impl Iterator<Item = &ScrapeTarget> {
        self.targets.values()
    }

    // * Rules in key order
    pub fn rules(&self) -> impl Iterator<Item = &AlertRule> {
        self.rules.values()
    }

    pub fn target(&self, name: &str) -> Option<&ScrapeTarget> {
        self.targets.get(name)
    }

    pub fn rule(&self, name: &str) -> Option<&AlertRule> {
        self.rules.get(name)
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty() && self.rules.is_empty()
    }
}
