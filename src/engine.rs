//! Rule engine

use crate::config::EngineConfig;
use crate::image::TrustConfig;
use crate::instruction::{Dockerfile, ParseError};
use crate::rule::{CheckContext, CheckResult, Rule};
use crate::rules::builtin_rules;
use log::debug;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Results for one Dockerfile
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    /// File that was checked
    pub file: PathBuf,

    /// One result per rule, in rule order
    pub results: Vec<CheckResult>,
}

impl CheckReport {
    /// Number of failed checks
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| r.failed()).count()
    }

    /// Check if every rule passed
    pub fn is_clean(&self) -> bool {
        self.failed_count() == 0
    }
}

/// Results for every file of one invocation
#[derive(Debug, Default)]
pub struct CheckRun {
    /// Reports in input order
    pub reports: Vec<CheckReport>,

    /// Processing duration
    pub duration: Duration,
}

impl CheckRun {
    pub fn files_checked(&self) -> usize {
        self.reports.len()
    }

    /// Failed checks across all files
    pub fn failed_count(&self) -> usize {
        self.reports.iter().map(CheckReport::failed_count).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.failed_count() == 0
    }

    /// Get exit code (0 = all checks passed, 1 = at least one failed)
    pub fn exit_code(&self) -> i32 {
        if self.is_clean() {
            0
        } else {
            1
        }
    }
}

/// Runs the rule battery over parsed Dockerfiles
pub struct Engine {
    trust: TrustConfig,
    rules: Vec<Rule>,
    settings: EngineConfig,
}

impl Engine {
    /// Create an engine with the built-in rules
    pub fn new(trust: TrustConfig) -> Self {
        Self::with_rules(trust, builtin_rules())
    }

    /// Create an engine with a custom rule list
    pub fn with_rules(trust: TrustConfig, rules: Vec<Rule>) -> Self {
        Self {
            trust,
            rules,
            settings: EngineConfig::default(),
        }
    }

    /// Apply parallelism settings
    pub fn with_settings(mut self, settings: EngineConfig) -> Self {
        self.settings = settings;
        self
    }

    /// Registered rules, in report order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Evaluate every rule against one parsed Dockerfile
    pub fn check(&self, dockerfile: &Dockerfile) -> Vec<CheckResult> {
        let ctx = CheckContext::new(dockerfile, &self.trust);
        self.rules
            .iter()
            .map(|rule| {
                let result = rule.evaluate(&ctx);
                debug!(
                    "rule {}: {}",
                    rule.id,
                    if result.passed { "passed" } else { "failed" }
                );
                result
            })
            .collect()
    }

    /// Check Dockerfile text
    pub fn check_source(&self, content: &str, path: &Path) -> CheckReport {
        CheckReport {
            file: path.to_path_buf(),
            results: self.check(&Dockerfile::parse(content)),
        }
    }

    /// Read and check a single file
    pub fn check_file(&self, path: &Path) -> Result<CheckReport, ParseError> {
        debug!("checking {}", path.display());
        let dockerfile = Dockerfile::parse_file(path)?;
        Ok(CheckReport {
            file: path.to_path_buf(),
            results: self.check(&dockerfile),
        })
    }

    /// Check several files; an unreadable file aborts the run
    pub fn check_files(&self, files: &[PathBuf]) -> Result<CheckRun, ParseError> {
        let start = Instant::now();

        let reports = if self.settings.parallel && files.len() > 1 {
            let jobs = if self.settings.jobs > 0 {
                self.settings.jobs
            } else {
                num_cpus::get()
            };
            match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
                Ok(pool) => pool.install(|| {
                    files
                        .par_iter()
                        .map(|f| self.check_file(f))
                        .collect::<Result<Vec<_>, _>>()
                })?,
                Err(e) => {
                    debug!("thread pool unavailable ({}), checking sequentially", e);
                    self.check_sequential(files)?
                }
            }
        } else {
            self.check_sequential(files)?
        };

        Ok(CheckRun {
            reports,
            duration: start.elapsed(),
        })
    }

    fn check_sequential(&self, files: &[PathBuf]) -> Result<Vec<CheckReport>, ParseError> {
        files.iter().map(|f| self.check_file(f)).collect()
    }
}
