//! Structural validation of literal instructions.
//!
//! Checks the shape and content of each `run`, `copy`, `env`... declaration
//! and converts it into the concrete [`StepAction`] it stands for. No
//! library lookups happen here.

use quokka_common::error::{QuokkaError, Result, SemanticRule};
use quokka_common::types::SourcePosition;

use super::{CommandForm, StepAction};
use crate::parser::ast::{BlockKeyword, Entry, Keyword, Value};

/// Validates a literal instruction and builds its action.
///
/// # Checks performed
///
/// 1. The value has the shape the keyword accepts.
/// 2. Commands, paths and names are non-empty.
/// 3. Single-line fields contain no newline.
/// 4. Ports lie within 1-65535.
///
/// # Errors
///
/// Returns `QuokkaError::Semantic` with `missing-argument` or
/// `invalid-argument` when a check fails.
pub fn instruction(keyword: Keyword, value: &Value, position: SourcePosition) -> Result<StepAction> {
    match keyword {
        Keyword::Run => command(keyword, value, position, true).map(StepAction::Run),
        Keyword::Cmd => command(keyword, value, position, false).map(StepAction::Cmd),
        Keyword::Entrypoint => {
            command(keyword, value, position, false).map(StepAction::Entrypoint)
        }
        Keyword::Workdir => single_line(keyword, value, position).map(StepAction::Workdir),
        Keyword::User => match value {
            Value::Integer(uid) if *uid >= 0 => Ok(StepAction::User(uid.to_string())),
            _ => single_line(keyword, value, position).map(StepAction::User),
        },
        Keyword::Copy => copy(value, position),
        Keyword::Expose => expose(value, position),
    }
}

/// Validates an `env` or `label` block and builds its action.
///
/// # Errors
///
/// Returns `QuokkaError::Semantic` for an empty block, an invalid
/// environment variable name, or a key or value spanning several lines.
pub fn block(keyword: BlockKeyword, entries: &[Entry], position: SourcePosition) -> Result<StepAction> {
    if entries.is_empty() {
        return Err(missing(position, format!("`{}` block has no entries", keyword.as_str())));
    }

    let mut pairs = Vec::with_capacity(entries.len());
    for entry in entries {
        match keyword {
            BlockKeyword::Env if !is_env_name(&entry.key) => {
                return Err(invalid(
                    entry.position,
                    format!("`{}` is not a valid environment variable name", entry.key),
                ));
            }
            BlockKeyword::Label if entry.key.is_empty() => {
                return Err(missing(entry.position, "label key is empty"));
            }
            _ => {}
        }
        if entry.key.contains('\n') || entry.value.contains('\n') {
            return Err(invalid(
                entry.position,
                format!("`{}` entry `{}` spans several lines", keyword.as_str(), entry.key),
            ));
        }
        pairs.push((entry.key.clone(), entry.value.clone()));
    }

    Ok(match keyword {
        BlockKeyword::Env => StepAction::Env(pairs),
        BlockKeyword::Label => StepAction::Label(pairs),
    })
}

fn command(
    keyword: Keyword,
    value: &Value,
    position: SourcePosition,
    multiline: bool,
) -> Result<CommandForm> {
    match value {
        Value::String(cmd) if cmd.trim().is_empty() => Err(missing(
            position,
            format!("`{}` command is empty", keyword.as_str()),
        )),
        Value::String(cmd) if !multiline && cmd.contains('\n') => Err(invalid(
            position,
            format!("`{}` command must fit on one line", keyword.as_str()),
        )),
        Value::String(cmd) => Ok(CommandForm::Shell(cmd.clone())),
        Value::List(args) if args.first().is_none_or(|a| a.trim().is_empty()) => Err(missing(
            position,
            format!("`{}` exec form needs a program", keyword.as_str()),
        )),
        Value::List(args) => Ok(CommandForm::Exec(args.clone())),
        Value::Integer(_) => Err(wrong_shape(keyword, "a string or a list", value, position)),
    }
}

fn single_line(keyword: Keyword, value: &Value, position: SourcePosition) -> Result<String> {
    let Value::String(text) = value else {
        return Err(wrong_shape(keyword, "a string", value, position));
    };
    if text.trim().is_empty() {
        return Err(missing(position, format!("`{}` is empty", keyword.as_str())));
    }
    if text.contains('\n') {
        return Err(invalid(
            position,
            format!("`{}` must fit on one line", keyword.as_str()),
        ));
    }
    Ok(text.clone())
}

fn copy(value: &Value, position: SourcePosition) -> Result<StepAction> {
    let Value::List(paths) = value else {
        return Err(wrong_shape(Keyword::Copy, "a list of paths", value, position));
    };
    let Some((destination, sources)) = paths.split_last() else {
        return Err(missing(position, "`copy` needs a source and a destination"));
    };
    if sources.is_empty() {
        return Err(missing(position, "`copy` needs a source and a destination"));
    }
    if paths.iter().any(|p| p.trim().is_empty()) {
        return Err(missing(position, "`copy` path is empty"));
    }
    if paths.iter().any(|p| p.contains('\n')) {
        return Err(invalid(position, "`copy` path must fit on one line"));
    }
    Ok(StepAction::Copy {
        sources: sources.to_vec(),
        destination: destination.clone(),
    })
}

fn expose(value: &Value, position: SourcePosition) -> Result<StepAction> {
    let Value::Integer(port) = value else {
        return Err(wrong_shape(Keyword::Expose, "an integer port", value, position));
    };
    match u16::try_from(*port) {
        Ok(port) if port > 0 => Ok(StepAction::Expose(port)),
        _ => Err(invalid(
            position,
            format!("port {port} is outside 1-65535"),
        )),
    }
}

/// Whether `key` is a portable environment variable name
/// (`[A-Za-z_][A-Za-z0-9_]*`).
#[must_use]
pub fn is_env_name(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn wrong_shape(keyword: Keyword, expected: &str, found: &Value, position: SourcePosition) -> QuokkaError {
    invalid(
        position,
        format!(
            "`{}` expects {expected}, found {}",
            keyword.as_str(),
            found.shape()
        ),
    )
}

pub(super) fn missing(position: SourcePosition, message: impl Into<String>) -> QuokkaError {
    semantic(position, SemanticRule::MissingArgument, message)
}

fn invalid(position: SourcePosition, message: impl Into<String>) -> QuokkaError {
    semantic(position, SemanticRule::InvalidArgument, message)
}

pub(super) fn semantic(
    position: SourcePosition,
    rule: SemanticRule,
    message: impl Into<String>,
) -> QuokkaError {
    QuokkaError::Semantic {
        position,
        rule,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AT: SourcePosition = SourcePosition::new(3, 1);

    fn rule_of(err: QuokkaError) -> SemanticRule {
        match err {
            QuokkaError::Semantic { rule, .. } => rule,
            other => panic!("expected semantic error, got {other}"),
        }
    }

    fn entry(key: &str, value: &str) -> Entry {
        Entry {
            position: AT,
            key: key.into(),
            value: value.into(),
        }
    }

    #[test]
    fn run_accepts_shell_and_exec_forms() {
        let shell = instruction(Keyword::Run, &Value::String("make\nmake test".into()), AT).unwrap();
        assert_eq!(
            shell,
            StepAction::Run(CommandForm::Shell("make\nmake test".into()))
        );

        let exec = instruction(Keyword::Run, &Value::List(vec!["make".into()]), AT).unwrap();
        assert_eq!(exec, StepAction::Run(CommandForm::Exec(vec!["make".into()])));
    }

    #[test]
    fn empty_command_is_missing_argument() {
        let err = instruction(Keyword::Run, &Value::String("   ".into()), AT).unwrap_err();
        assert_eq!(rule_of(err), SemanticRule::MissingArgument);

        let err = instruction(Keyword::Cmd, &Value::List(Vec::new()), AT).unwrap_err();
        assert_eq!(rule_of(err), SemanticRule::MissingArgument);
    }

    #[test]
    fn cmd_must_be_single_line() {
        let err = instruction(Keyword::Cmd, &Value::String("a\nb".into()), AT).unwrap_err();
        assert_eq!(rule_of(err), SemanticRule::InvalidArgument);
    }

    #[test]
    fn integer_command_is_invalid_argument() {
        let err = instruction(Keyword::Entrypoint, &Value::Integer(1), AT).unwrap_err();
        assert_eq!(err.position(), Some(AT));
        assert!(err.to_string().contains("found an integer"), "got: {err}");
    }

    #[test]
    fn copy_splits_sources_and_destination() {
        let value = Value::List(vec!["a".into(), "b".into(), "/dst/".into()]);
        assert_eq!(
            instruction(Keyword::Copy, &value, AT).unwrap(),
            StepAction::Copy {
                sources: vec!["a".into(), "b".into()],
                destination: "/dst/".into(),
            }
        );
    }

    #[test]
    fn copy_needs_two_paths() {
        let err = instruction(Keyword::Copy, &Value::List(vec!["a".into()]), AT).unwrap_err();
        assert_eq!(rule_of(err), SemanticRule::MissingArgument);

        let err = instruction(Keyword::Copy, &Value::String("a b".into()), AT).unwrap_err();
        assert_eq!(rule_of(err), SemanticRule::InvalidArgument);
    }

    #[test]
    fn expose_port_range() {
        assert_eq!(
            instruction(Keyword::Expose, &Value::Integer(65535), AT).unwrap(),
            StepAction::Expose(65535)
        );
        for port in [0, 65536, -1] {
            let err = instruction(Keyword::Expose, &Value::Integer(port), AT).unwrap_err();
            assert_eq!(rule_of(err), SemanticRule::InvalidArgument, "port {port}");
        }
    }

    #[test]
    fn user_accepts_name_or_uid() {
        assert_eq!(
            instruction(Keyword::User, &Value::Integer(1000), AT).unwrap(),
            StepAction::User("1000".into())
        );
        assert_eq!(
            instruction(Keyword::User, &Value::String("app".into()), AT).unwrap(),
            StepAction::User("app".into())
        );
    }

    #[test]
    fn workdir_rejects_list() {
        let err = instruction(Keyword::Workdir, &Value::List(vec!["/a".into()]), AT).unwrap_err();
        assert_eq!(rule_of(err), SemanticRule::InvalidArgument);
    }

    #[test]
    fn env_block_validates_names() {
        let ok = block(BlockKeyword::Env, &[entry("_PATH2", "/bin")], AT).unwrap();
        assert_eq!(ok, StepAction::Env(vec![("_PATH2".into(), "/bin".into())]));

        for bad in ["2X", "A-B", "a.b", ""] {
            let err = block(BlockKeyword::Env, &[entry(bad, "v")], AT).unwrap_err();
            assert_eq!(rule_of(err), SemanticRule::InvalidArgument, "key {bad:?}");
        }
    }

    #[test]
    fn label_block_allows_dotted_keys() {
        let ok = block(BlockKeyword::Label, &[entry("org.example.team", "core")], AT).unwrap();
        assert_eq!(
            ok,
            StepAction::Label(vec![("org.example.team".into(), "core".into())])
        );
    }

    #[test]
    fn empty_block_is_missing_argument() {
        let err = block(BlockKeyword::Label, &[], AT).unwrap_err();
        assert_eq!(rule_of(err), SemanticRule::MissingArgument);
    }

    #[test]
    fn multiline_block_value_is_rejected() {
        let err = block(BlockKeyword::Env, &[entry("A", "1\n2")], AT).unwrap_err();
        assert_eq!(rule_of(err), SemanticRule::InvalidArgument);
    }
}
