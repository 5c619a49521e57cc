//! Formatted output helpers for CLI commands.
//!
//! Provides one-line step summaries for `plan`, shortened digests, and
//! the separator rule used under headings.

use quokka_common::types::Digest;
use quokka_compiler::realize::CommandForm;
use quokka_compiler::{ResolvedStep, StepAction};

/// Number of encoded digest characters shown in summaries.
const SHORT_DIGEST_LEN: usize = 12;

/// Longest command summary before it is cut with an ellipsis.
const MAX_SUMMARY_CHARS: usize = 60;

/// Shortens a digest for display, e.g. `sha256:9f86d081884c`.
#[must_use]
pub fn short_digest(digest: &Digest) -> String {
    let encoded: String = digest.encoded().chars().take(SHORT_DIGEST_LEN).collect();
    format!("{}:{encoded}", digest.algorithm())
}

/// A horizontal rule as wide as `heading`.
#[must_use]
pub fn rule(heading: &str) -> String {
    "\u{2550}".repeat(heading.chars().count())
}

/// Summarizes what a step does on a single line.
#[must_use]
pub fn describe_action(action: &StepAction) -> String {
    match action {
        StepAction::Base(def) | StepAction::Dependency(def) => {
            format!("{}:{} ({})", def.name, def.version, short_digest(&def.digest))
        }
        StepAction::Run(form) | StepAction::Cmd(form) | StepAction::Entrypoint(form) => {
            describe_command(form)
        }
        StepAction::Env(pairs) | StepAction::Label(pairs) => pairs
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(", "),
        StepAction::Workdir(value) | StepAction::User(value) => value.clone(),
        StepAction::Copy {
            sources,
            destination,
        } => format!("{} -> {destination}", sources.join(" ")),
        StepAction::Expose(port) => port.to_string(),
    }
}

/// Formats one row of the `plan` listing.
#[must_use]
pub fn plan_row(index: usize, step: &ResolvedStep) -> String {
    let mut row = format!(
        "{index:>4}  {:<8} {:<10} {}",
        step.position.to_string(),
        step.action.kind(),
        describe_action(&step.action)
    );
    if let Some(group) = &step.group {
        row.push_str(&format!("  [step {group}]"));
    }
    row
}

/// Formats the canonical reference shown under a `base` or `dep` row.
#[must_use]
pub fn canonical_row(canonical: &str) -> String {
    format!("      -> {canonical}")
}

fn describe_command(form: &CommandForm) -> String {
    let text = match form {
        CommandForm::Shell(command) => {
            let mut lines = command.trim().lines();
            let first = lines.next().unwrap_or_default().to_string();
            if lines.next().is_some() {
                format!("{first} ...")
            } else {
                first
            }
        }
        CommandForm::Exec(args) => format!("[{}]", args.join(", ")),
    };
    truncate(&text, MAX_SUMMARY_CHARS)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('\u{2026}');
    cut
}
