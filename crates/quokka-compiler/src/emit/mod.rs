//! Rendering a realization as a Dockerfile.
//!
//! Each resolved step maps to one or more Dockerfile lines through a fixed
//! template keyed by the step kind, so identical realizations always render
//! to identical bytes. The whole script is rendered into memory before
//! anything is written to the sink.

pub mod quote;

use std::fmt::Write as _;
use std::io::Write;

use quokka_common::error::{QuokkaError, Result};
use quokka_common::types::SourcePosition;
use quokka_library::{LibraryClient, ResolvedDefinition};

use crate::realize::validator::is_env_name;
use crate::realize::{CommandForm, Realization, ResolvedStep, StepAction};

/// The emission stage: realization in, target script out.
pub trait Emit: Send + Sync {
    /// Renders `realization` and writes it to `sink`.
    ///
    /// # Errors
    ///
    /// Returns `QuokkaError::Emission` if a step cannot be rendered and
    /// `QuokkaError::OutputSink` if the sink rejects the write. Nothing is
    /// written when rendering fails.
    fn emit(
        &self,
        realization: &Realization,
        library: &dyn LibraryClient,
        sink: &mut dyn Write,
    ) -> Result<()>;
}

/// The default Dockerfile emitter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Emitter;

impl Emitter {
    /// Creates an emitter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Renders `realization` to a string without writing it anywhere.
    ///
    /// # Errors
    ///
    /// Returns `QuokkaError::Emission` for the first step that cannot be
    /// rendered.
    pub fn render(&self, realization: &Realization, library: &dyn LibraryClient) -> Result<String> {
        let mut script = Script::default();
        let mut current_group: Option<&str> = None;

        for step in realization.steps() {
            let group = step.group.as_deref();
            if let Some(name) = group {
                if current_group != Some(name) {
                    script.line(format_args!("# step {name}"));
                }
            }
            current_group = group;
            render_step(&mut script, step, library)?;
        }

        tracing::debug!(
            steps = realization.len(),
            bytes = script.text.len(),
            "rendered target script"
        );
        Ok(script.text)
    }
}

impl Emit for Emitter {
    fn emit(
        &self,
        realization: &Realization,
        library: &dyn LibraryClient,
        sink: &mut dyn Write,
    ) -> Result<()> {
        let script = self.render(realization, library)?;
        sink.write_all(script.as_bytes())
            .and_then(|()| sink.flush())
            .map_err(|source| QuokkaError::OutputSink { source })?;
        tracing::info!(bytes = script.len(), "emitted target script");
        Ok(())
    }
}

#[derive(Default)]
struct Script {
    text: String,
}

impl Script {
    fn line(&mut self, args: std::fmt::Arguments<'_>) {
        // Writing into a String cannot fail.
        let _ = self.text.write_fmt(args);
        self.text.push('\n');
    }
}

fn render_step(script: &mut Script, step: &ResolvedStep, library: &dyn LibraryClient) -> Result<()> {
    let position = step.position;
    match &step.action {
        StepAction::Base(def) => {
            let canonical = canonical(library, def, position)?;
            script.line(format_args!("FROM {canonical}"));
        }
        StepAction::Dependency(def) => render_dependency(script, def, library, position)?,
        StepAction::Run(form) => render_command(script, "RUN", form, position)?,
        StepAction::Cmd(form) => render_command(script, "CMD", form, position)?,
        StepAction::Entrypoint(form) => render_command(script, "ENTRYPOINT", form, position)?,
        StepAction::Env(pairs) => {
            non_empty(pairs, "ENV", position)?;
            for (key, value) in pairs {
                script.line(format_args!("ENV {key}={}", quote::double_quoted(value)));
            }
        }
        StepAction::Label(pairs) => {
            non_empty(pairs, "LABEL", position)?;
            for (key, value) in pairs {
                script.line(format_args!(
                    "LABEL {}={}",
                    quote::double_quoted(key),
                    quote::double_quoted(value)
                ));
            }
        }
        StepAction::Workdir(path) => {
            script.line(format_args!("WORKDIR {}", single_line(path, position)?));
        }
        StepAction::User(user) => {
            script.line(format_args!("USER {}", single_line(user, position)?));
        }
        StepAction::Expose(port) => script.line(format_args!("EXPOSE {port}")),
        StepAction::Copy {
            sources,
            destination,
        } => {
            non_empty(sources, "COPY", position)?;
            let mut paths = sources.clone();
            paths.push(destination.clone());
            if paths.iter().any(|p| quote::needs_exec_form(p)) {
                script.line(format_args!("COPY {}", exec_form(&paths, position)?));
            } else {
                script.line(format_args!("COPY {}", paths.join(" ")));
            }
        }
    }
    Ok(())
}

fn render_dependency(
    script: &mut Script,
    def: &ResolvedDefinition,
    library: &dyn LibraryClient,
    position: SourcePosition,
) -> Result<()> {
    match def.install_template() {
        Some(template) => {
            let command = template
                .replace("{name}", &def.name)
                .replace("{version}", &def.version)
                .replace("{digest}", &def.digest.to_string());
            if command.trim().is_empty() {
                return Err(emission_err(
                    position,
                    format!("install command of `{}` is empty", def.name),
                ));
            }
            script.line(format_args!("RUN {}", quote::shell_continued(&command)));
        }
        None => {
            let canonical = canonical(library, def, position)?;
            script.line(format_args!("COPY --from={canonical} / /"));
        }
    }
    for (key, value) in def.exported_env() {
        if !is_env_name(key) {
            return Err(emission_err(
                position,
                format!("`{}` exports invalid environment variable name {key:?}", def.name),
            ));
        }
        if value.contains(['\n', '\r']) {
            return Err(emission_err(
                position,
                format!("`{}` exports {key} with a value that spans several lines", def.name),
            ));
        }
        script.line(format_args!("ENV {key}={}", quote::double_quoted(value)));
    }
    Ok(())
}

fn render_command(
    script: &mut Script,
    instruction: &str,
    form: &CommandForm,
    position: SourcePosition,
) -> Result<()> {
    match form {
        CommandForm::Shell(command) if command.trim().is_empty() => Err(emission_err(
            position,
            format!("{instruction} command is empty"),
        )),
        CommandForm::Shell(command) => {
            script.line(format_args!(
                "{instruction} {}",
                quote::shell_continued(command)
            ));
            Ok(())
        }
        CommandForm::Exec(args) => {
            non_empty(args, instruction, position)?;
            script.line(format_args!("{instruction} {}", exec_form(args, position)?));
            Ok(())
        }
    }
}

fn canonical(
    library: &dyn LibraryClient,
    def: &ResolvedDefinition,
    position: SourcePosition,
) -> Result<String> {
    library.canonical_reference(def).map_err(|e| {
        emission_err(
            position,
            format!("cannot canonicalize `{}`: {e}", def.name),
        )
    })
}

fn exec_form(args: &[String], position: SourcePosition) -> Result<String> {
    quote::exec_form(args).map_err(|e| emission_err(position, format!("exec form: {e}")))
}

fn single_line(value: &str, position: SourcePosition) -> Result<&str> {
    if value.is_empty() || value.contains('\n') {
        return Err(emission_err(
            position,
            format!("{value:?} cannot be written on one line"),
        ));
    }
    Ok(value)
}

fn non_empty<T>(items: &[T], instruction: &str, position: SourcePosition) -> Result<()> {
    if items.is_empty() {
        return Err(emission_err(
            position,
            format!("{instruction} has no arguments"),
        ));
    }
    Ok(())
}

fn emission_err(position: SourcePosition, message: impl Into<String>) -> QuokkaError {
    QuokkaError::Emission {
        position,
        message: message.into(),
    }
}
