//! Rule descriptors and check results

use crate::image::TrustConfig;
use crate::instruction::Dockerfile;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Everything a rule may look at
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    pub dockerfile: &'a Dockerfile,
    pub trust: &'a TrustConfig,
}

impl<'a> CheckContext<'a> {
    pub fn new(dockerfile: &'a Dockerfile, trust: &'a TrustConfig) -> Self {
        Self { dockerfile, trust }
    }
}

/// What a rule found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Value shown next to the rule title (may be empty)
    pub observed: String,
    pub passed: bool,
}

impl Outcome {
    pub fn pass() -> Self {
        Self::from_bool(true)
    }

    pub fn fail() -> Self {
        Self::from_bool(false)
    }

    pub fn from_bool(passed: bool) -> Self {
        Self {
            observed: String::new(),
            passed,
        }
    }

    pub fn with_observed(mut self, observed: impl Into<String>) -> Self {
        self.observed = observed.into();
        self
    }
}

/// Signature every rule implements
pub type CheckFn = fn(&CheckContext<'_>) -> Outcome;

/// A registered rule
#[derive(Clone, Copy)]
pub struct Rule {
    /// Stable identifier (e.g., "trusted-base-image")
    pub id: &'static str,

    /// Human-readable title shown in reports
    pub title: &'static str,

    /// Why the rule exists
    pub description: &'static str,

    check: CheckFn,
}

impl Rule {
    pub const fn new(
        id: &'static str,
        title: &'static str,
        description: &'static str,
        check: CheckFn,
    ) -> Self {
        Self {
            id,
            title,
            description,
            check,
        }
    }

    /// Run the rule and label the outcome
    pub fn evaluate(&self, ctx: &CheckContext<'_>) -> CheckResult {
        let outcome = (self.check)(ctx);
        CheckResult {
            rule_id: self.id.to_string(),
            title: self.title.to_string(),
            observed_value: outcome.observed,
            passed: outcome.passed,
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("title", &self.title)
            .finish()
    }
}

/// One evaluated rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub rule_id: String,
    pub title: String,
    pub observed_value: String,
    pub passed: bool,
}

impl CheckResult {
    pub fn failed(&self) -> bool {
        !self.passed
    }
}
