//! Keyword classification rules.
//!
//! An ordered rule table maps inbound event descriptors to a worker
//! category. Matching is case-insensitive substring matching via compiled
//! regexes; the first matching rule wins, so rule order is significant and
//! fixed. Events that match nothing fall back to the general worker —
//! logged at debug level so blind fallthrough stays visible.

use regex::Regex;
use tracing::debug;

use crate::dispatch::task::TaskKind;

/// A single classification rule with a compiled regex.
#[derive(Debug, Clone)]
pub struct ClassifyRule {
    /// Human-readable pattern description.
    pub pattern: String,
    /// Compiled regex for matching.
    pub regex: Regex,
    /// Category assigned on match.
    pub kind: TaskKind,
    /// Worker queue routed to on match.
    pub target_worker: String,
}

/// Ordered keyword rule table.
pub struct Classifier {
    rules: Vec<ClassifyRule>,
    fallback_worker: String,
}

impl Classifier {
    /// Create a classifier with the default rule table.
    pub fn default_rules() -> Self {
        let rules = vec![
            ClassifyRule {
                pattern: "payment|invoice".into(),
                regex: Regex::new(r"(?i)(payment|invoice)").unwrap(),
                kind: TaskKind::Financial,
                target_worker: "finance-worker".into(),
            },
            ClassifyRule {
                pattern: "design|ui".into(),
                regex: Regex::new(r"(?i)(design|ui)").unwrap(),
                kind: TaskKind::Design,
                target_worker: "design-worker".into(),
            },
            ClassifyRule {
                pattern: "customer|support".into(),
                regex: Regex::new(r"(?i)(customer|support)").unwrap(),
                kind: TaskKind::Support,
                target_worker: "support-worker".into(),
            },
            ClassifyRule {
                pattern: "marketing|campaign".into(),
                regex: Regex::new(r"(?i)(marketing|campaign)").unwrap(),
                kind: TaskKind::Marketing,
                target_worker: "marketing-worker".into(),
            },
        ];

        Self {
            rules,
            fallback_worker: "general-worker".into(),
        }
    }

    /// Create an empty classifier (for testing — everything falls back).
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            fallback_worker: "general-worker".into(),
        }
    }

    /// Append a custom rule. Evaluated after all existing rules.
    pub fn add_rule(
        &mut self,
        pattern: &str,
        kind: TaskKind,
        target_worker: &str,
    ) -> Result<(), regex::Error> {
        self.rules.push(ClassifyRule {
            pattern: pattern.into(),
            regex: Regex::new(&format!("(?i){pattern}"))?,
            kind,
            target_worker: target_worker.into(),
        });
        Ok(())
    }

    /// Classify an event descriptor into `(kind, target_worker)`.
    ///
    /// Deterministic: the same descriptor always yields the same pair.
    pub fn classify(&self, descriptor: &str) -> (TaskKind, &str) {
        for rule in &self.rules {
            if rule.regex.is_match(descriptor) {
                return (rule.kind, &rule.target_worker);
            }
        }

        debug!(
            descriptor = %descriptor,
            worker = %self.fallback_worker,
            "No classification rule matched, falling back to general"
        );
        (TaskKind::General, &self.fallback_worker)
    }
}
