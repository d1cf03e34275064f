//! Built-in Dockerfile rules
//!
//! Each rule is a plain function over a [`CheckContext`]. Matching is literal
//! and case-sensitive: no regular expressions, no shell tokenization.

use crate::instruction::Instruction;
use crate::rule::{CheckContext, Outcome, Rule};

/// Observed value for a base image without a tag
pub const MISSING_TAG: &str = "-";

const APT_UPDATE: &str = "apt-get update";
const APT_UPGRADE: &str = "apt-get upgrade";
const APT_INSTALL: &str = "apt-get install";
const APT_INSTALL_ASSUME_YES: &str = "apt-get -y install";
const NO_INSTALL_RECOMMENDS: &str = "--no-install-recommends";
const APT_LISTS_CLEANUP: &str = "rm -rf /var/lib/apt/lists/*";
const DEBUG_TOOLS: [&str; 3] = ["vim", "less", "nano"];
const SECRET_NAMES: [&str; 2] = ["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY"];

/// The rule battery, in report order
pub fn builtin_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            "trusted-base-image",
            "Use a trusted base image",
            "The final stage must start from an image listed in trusted_images.",
            trusted_base_image,
        ),
        Rule::new(
            "base-image-tag",
            "A tag for the base image is set",
            "Untagged base images float to whatever 'latest' is at build time.",
            base_image_tag,
        ),
        Rule::new(
            "non-root-user",
            "Executes as non-root",
            "A USER instruction should drop root privileges.",
            non_root_user,
        ),
        Rule::new(
            "copy-after-apt-update",
            "COPY added after apt-get update",
            "Package installation should come before COPY so source changes keep the apt layer cached.",
            copy_after_apt_update,
        ),
        Rule::new(
            "apt-update-paired",
            "'apt-get update' always has upgrade/install in same command",
            "A lone 'apt-get update' layer goes stale and later installs use outdated lists.",
            apt_update_paired,
        ),
        Rule::new(
            "no-unneeded-packages",
            "Only install dependencies you're really using",
            "Use --no-install-recommends and keep debugging tools (vim, less, nano) out of the image.",
            no_unneeded_packages,
        ),
        Rule::new(
            "apt-cache-cleaned",
            "apt-caches are cleaned",
            "Remove /var/lib/apt/lists/* in the same RUN that installs packages.",
            apt_cache_cleaned,
        ),
        Rule::new(
            "no-secret-env",
            "Don't put secrets as ENV variables in the image",
            "Pass credentials with RUN --mount=type=secret instead of baking them into layers.",
            no_secret_env,
        ),
    ]
}

fn runs<'a>(ctx: &CheckContext<'a>) -> impl Iterator<Item = &'a Instruction> + 'a {
    ctx.dockerfile.with_name("RUN")
}

fn is_apt_install(value: &str) -> bool {
    value.contains(APT_INSTALL) || value.contains(APT_INSTALL_ASSUME_YES)
}

/// Rule 1: base image is trusted
pub fn trusted_base_image(ctx: &CheckContext<'_>) -> Outcome {
    match ctx.dockerfile.base_image() {
        Some(image) => Outcome::from_bool(ctx.trust.is_trusted(&image)).with_observed(image.raw),
        None => Outcome::fail(),
    }
}

/// Rule 2: base image names a tag
pub fn base_image_tag(ctx: &CheckContext<'_>) -> Outcome {
    match ctx.dockerfile.base_image().and_then(|image| image.tag) {
        Some(tag) => Outcome::pass().with_observed(tag),
        None => Outcome::fail().with_observed(MISSING_TAG),
    }
}

/// Rule 3: some USER instruction exists
pub fn non_root_user(ctx: &CheckContext<'_>) -> Outcome {
    Outcome::from_bool(ctx.dockerfile.with_name("USER").next().is_some())
}

/// Rule 4: the first apt RUN comes before the first COPY
pub fn copy_after_apt_update(ctx: &CheckContext<'_>) -> Outcome {
    let first_apt = runs(ctx)
        .filter(|run| {
            run.value.contains(APT_UPDATE)
                || run.value.contains(APT_UPGRADE)
                || run.value.contains(APT_INSTALL)
        })
        .map(|run| run.line)
        .min();
    let first_copy = ctx.dockerfile.with_name("COPY").map(|copy| copy.line).min();

    match (first_apt, first_copy) {
        (Some(apt), Some(copy)) => Outcome::from_bool(apt < copy),
        _ => Outcome::pass(),
    }
}

/// Rule 5: every `apt-get update` is followed by an upgrade or install
pub fn apt_update_paired(ctx: &CheckContext<'_>) -> Outcome {
    Outcome::from_bool(runs(ctx).all(|run| {
        !run.value.contains(APT_UPDATE)
            || run.value.contains(APT_UPGRADE)
            || run.value.contains(APT_INSTALL)
    }))
}

/// Rule 6: installs skip recommends and debugging tools
pub fn no_unneeded_packages(ctx: &CheckContext<'_>) -> Outcome {
    Outcome::from_bool(
        runs(ctx)
            .filter(|run| is_apt_install(&run.value))
            .all(|run| {
                run.value.contains(NO_INSTALL_RECOMMENDS)
                    && !DEBUG_TOOLS.iter().any(|tool| run.value.contains(tool))
            }),
    )
}

/// Rule 7: installs clean the apt lists
pub fn apt_cache_cleaned(ctx: &CheckContext<'_>) -> Outcome {
    Outcome::from_bool(
        runs(ctx)
            .filter(|run| is_apt_install(&run.value))
            .all(|run| run.value.contains(APT_LISTS_CLEANUP)),
    )
}

/// Rule 8: AWS credential names stay out of instructions.
///
/// ENV instructions themselves are not scanned.
pub fn no_secret_env(ctx: &CheckContext<'_>) -> Outcome {
    Outcome::from_bool(
        !ctx.dockerfile
            .instructions()
            .iter()
            .filter(|instruction| !instruction.is("ENV"))
            .any(|instruction| {
                SECRET_NAMES
                    .iter()
                    .any(|name| instruction.value.contains(name))
            }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::TrustConfig;
    use crate::instruction::{Dockerfile, Instruction};

    fn default_trust() -> TrustConfig {
        TrustConfig::new(&["alpine", "python", "node", "ubuntu"])
    }

    fn check(rule: fn(&CheckContext<'_>) -> Outcome, content: &str) -> Outcome {
        let dockerfile = Dockerfile::parse(content);
        let trust = default_trust();
        rule(&CheckContext::new(&dockerfile, &trust))
    }

    fn check_instructions(
        rule: fn(&CheckContext<'_>) -> Outcome,
        instructions: Vec<Instruction>,
    ) -> Outcome {
        let dockerfile = Dockerfile::from(instructions);
        let trust = default_trust();
        rule(&CheckContext::new(&dockerfile, &trust))
    }

    fn trusted_with(entries: &[&str], base: &str) -> Outcome {
        let dockerfile = Dockerfile::parse(&format!("FROM {}", base));
        let trust = TrustConfig::new(entries);
        trusted_base_image(&CheckContext::new(&dockerfile, &trust))
    }

    #[test]
    fn test_builtin_rule_order() {
        let ids: Vec<_> = builtin_rules().iter().map(|r| r.id).collect();
        assert_eq!(
            ids,
            vec![
                "trusted-base-image",
                "base-image-tag",
                "non-root-user",
                "copy-after-apt-update",
                "apt-update-paired",
                "no-unneeded-packages",
                "apt-cache-cleaned",
                "no-secret-env",
            ]
        );
    }

    #[test]
    fn test_trusted_wildcard_entry() {
        assert!(trusted_with(&["alpine"], "alpine:3.18").passed);
        assert!(trusted_with(&["alpine"], "alpine:edge").passed);
    }

    #[test]
    fn test_trusted_exact_tag_entry() {
        assert!(!trusted_with(&["python:3.11"], "python:3.10").passed);
        assert!(trusted_with(&["python:3.11"], "python:3.11").passed);
    }

    #[test]
    fn test_trusted_observed_is_raw_reference() {
        let outcome = check(trusted_base_image, "FROM --platform=linux/arm64 debian:12 AS base");
        assert!(!outcome.passed);
        assert_eq!(outcome.observed, "debian:12");
    }

    #[test]
    fn test_trusted_missing_from() {
        let outcome = check(trusted_base_image, "RUN echo hi");
        assert!(!outcome.passed);
        assert_eq!(outcome.observed, "");
    }

    #[test]
    fn test_tag_absent() {
        let outcome = check(base_image_tag, "FROM ubuntu");
        assert!(!outcome.passed);
        assert_eq!(outcome.observed, "-");
    }

    #[test]
    fn test_tag_present() {
        let outcome = check(base_image_tag, "FROM ubuntu:22.04");
        assert!(outcome.passed);
        assert_eq!(outcome.observed, "22.04");
    }

    #[test]
    fn test_tag_missing_from() {
        let outcome = check(base_image_tag, "");
        assert!(!outcome.passed);
        assert_eq!(outcome.observed, MISSING_TAG);
    }

    #[test]
    fn test_non_root_without_user() {
        let outcome = check(non_root_user, "FROM alpine\nRUN echo\nCOPY . /app");
        assert!(!outcome.passed);
    }

    #[test]
    fn test_non_root_user_anywhere() {
        assert!(check(non_root_user, "FROM alpine\nUSER app\nRUN echo\nCOPY . /app").passed);
        assert!(check(non_root_user, "USER root").passed);
    }

    #[test]
    fn test_copy_after_update_in_order() {
        let outcome = check_instructions(
            copy_after_apt_update,
            vec![
                Instruction::new("RUN", "apt-get update", 2),
                Instruction::new("COPY", ". /app", 5),
            ],
        );
        assert!(outcome.passed);
    }

    #[test]
    fn test_copy_before_update() {
        let outcome = check_instructions(
            copy_after_apt_update,
            vec![
                Instruction::new("COPY", ". /app", 1),
                Instruction::new("RUN", "apt-get update", 3),
            ],
        );
        assert!(!outcome.passed);
    }

    #[test]
    fn test_copy_only_is_vacuous_pass() {
        assert!(check(copy_after_apt_update, "FROM alpine\nCOPY . /app").passed);
        assert!(check(copy_after_apt_update, "RUN apt-get install -y curl").passed);
    }

    #[test]
    fn test_copy_compares_earliest_lines() {
        let content = "FROM ubuntu\nRUN apt-get update && apt-get install -y curl\nCOPY a /a\nRUN apt-get install -y git\nCOPY b /b";
        assert!(check(copy_after_apt_update, content).passed);
    }

    #[test]
    fn test_update_alone_fails() {
        assert!(!check(apt_update_paired, "RUN apt-get update && echo done").passed);
    }

    #[test]
    fn test_update_with_install_passes() {
        assert!(check(apt_update_paired, "RUN apt-get update && apt-get install -y curl").passed);
        assert!(check(apt_update_paired, "RUN apt-get update && apt-get upgrade -y").passed);
    }

    #[test]
    fn test_update_scans_every_run() {
        let content = "RUN apt-get update && apt-get install -y curl\nRUN apt-get update";
        assert!(!check(apt_update_paired, content).passed);
    }

    #[test]
    fn test_install_without_flag() {
        assert!(!check(no_unneeded_packages, "RUN apt-get install -y curl").passed);
        assert!(!check(no_unneeded_packages, "RUN apt-get -y install curl").passed);
    }

    #[test]
    fn test_install_with_flag() {
        let content = "RUN apt-get install --no-install-recommends -y curl";
        assert!(check(no_unneeded_packages, content).passed);
    }

    #[test]
    fn test_install_debug_tool_despite_flag() {
        let content = "RUN apt-get install --no-install-recommends vim";
        assert!(!check(no_unneeded_packages, content).passed);
    }

    #[test]
    fn test_non_install_runs_ignored() {
        assert!(check(no_unneeded_packages, "RUN vim --version").passed);
        assert!(check(apt_cache_cleaned, "RUN echo nano").passed);
    }

    #[test]
    fn test_cache_cleaned() {
        let content =
            "RUN apt-get install --no-install-recommends curl && rm -rf /var/lib/apt/lists/*";
        assert!(check(apt_cache_cleaned, content).passed);
    }

    #[test]
    fn test_cache_not_cleaned() {
        let content = "RUN apt-get install --no-install-recommends curl";
        assert!(!check(apt_cache_cleaned, content).passed);
    }

    #[test]
    fn test_secret_outside_env_fails() {
        assert!(!check(no_secret_env, "ARG AWS_ACCESS_KEY_ID").passed);
        assert!(!check(no_secret_env, "RUN echo $AWS_SECRET_ACCESS_KEY").passed);
    }

    #[test]
    fn test_secret_in_env_not_scanned() {
        assert!(check(no_secret_env, "ENV AWS_ACCESS_KEY_ID=abc").passed);
    }

    #[test]
    fn test_every_rule_on_empty_file() {
        let dockerfile = Dockerfile::default();
        let trust = default_trust();
        let ctx = CheckContext::new(&dockerfile, &trust);
        let passed: Vec<bool> = builtin_rules()
            .iter()
            .map(|rule| rule.evaluate(&ctx).passed)
            .collect();

        assert_eq!(
            passed,
            vec![false, false, false, true, true, true, true, true]
        );
    }
}
