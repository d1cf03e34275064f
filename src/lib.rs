//! check-dockerfile - Dockerfile best-practice linter
//!
//! Parses a Dockerfile into its instructions and runs a fixed battery of
//! rules over them: trusted base image, explicit tag, non-root user, apt
//! hygiene and secret hygiene.
//!
//! # Architecture
//!
//! ```text
//! CLI -> Config -> Engine -> Rules -> Dockerfile
//! ```
//!
//! # Example
//!
//! ```
//! use check_dockerfile::{Config, Dockerfile, Engine};
//!
//! let engine = Engine::new(Config::default().trust());
//! let dockerfile = Dockerfile::parse("FROM alpine:3.18\nUSER app\n");
//! let results = engine.check(&dockerfile);
//!
//! assert_eq!(results.len(), 8);
//! assert!(results.iter().all(|r| r.passed));
//! ```

pub mod config;
pub mod engine;
pub mod image;
pub mod instruction;
pub mod output;
pub mod rule;
pub mod rules;

// Re-export main types
pub use config::{Config, ConfigError};
pub use engine::{CheckReport, CheckRun, Engine};
pub use image::{BaseImageReference, TrustConfig};
pub use instruction::{Dockerfile, Instruction, ParseError};
pub use output::{JsonFormatter, OutputFormatter, TextFormatter};
pub use rule::{CheckContext, CheckResult, Outcome, Rule};
