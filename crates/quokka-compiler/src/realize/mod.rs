//! Binding a parsed specification to concrete definitions.
//!
//! The realizer walks declarations in encounter order (depth-first into
//! step groups), resolves every symbolic reference through a
//! [`LibraryClient`], validates literal instructions, and enforces the
//! structural rules of the language. The result is a [`Realization`]: the
//! ordered list of concrete steps the emitter renders.

pub mod graph;
pub mod validator;

use std::collections::{HashMap, HashSet};

use quokka_common::error::{QuokkaError, Result, SemanticRule};
use quokka_common::types::SourcePosition;
use quokka_library::{LibraryClient, ResolvedDefinition, SymbolicReference};

use self::graph::StepGraph;
use self::validator::semantic;
use crate::parser::ast::{Declaration, DeclarationKind, Specification};

/// The realization stage: AST plus library in, concrete steps out.
pub trait Realize: Send + Sync {
    /// Realizes `spec`, resolving references through `library`.
    ///
    /// # Errors
    ///
    /// Returns `QuokkaError::Resolution` when a lookup fails and
    /// `QuokkaError::Semantic` when a structural rule is violated.
    fn realize(&self, spec: &Specification, library: &dyn LibraryClient) -> Result<Realization>;
}

/// How a command-carrying instruction was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandForm {
    /// A single string run through the shell.
    Shell(String),
    /// An argument vector executed directly.
    Exec(Vec<String>),
}

/// What a resolved step does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    /// Start from the resolved base image.
    Base(ResolvedDefinition),
    /// Bring a resolved dependency into the image.
    Dependency(ResolvedDefinition),
    /// Execute a command at build time.
    Run(CommandForm),
    /// Default container command.
    Cmd(CommandForm),
    /// Container entrypoint.
    Entrypoint(CommandForm),
    /// Environment variables, in declaration order.
    Env(Vec<(String, String)>),
    /// Image labels, in declaration order.
    Label(Vec<(String, String)>),
    /// Working directory.
    Workdir(String),
    /// Copy `sources` to `destination`.
    Copy {
        /// Source paths.
        sources: Vec<String>,
        /// Destination path.
        destination: String,
    },
    /// Documented listening port.
    Expose(u16),
    /// User for subsequent instructions.
    User(String),
}

impl StepAction {
    /// Short name of the action kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Base(_) => "base",
            Self::Dependency(_) => "dep",
            Self::Run(_) => "run",
            Self::Cmd(_) => "cmd",
            Self::Entrypoint(_) => "entrypoint",
            Self::Env(_) => "env",
            Self::Label(_) => "label",
            Self::Workdir(_) => "workdir",
            Self::Copy { .. } => "copy",
            Self::Expose(_) => "expose",
            Self::User(_) => "user",
        }
    }

    /// The resolved definition behind a `base` or `dep` step.
    #[must_use]
    pub const fn definition(&self) -> Option<&ResolvedDefinition> {
        match self {
            Self::Base(def) | Self::Dependency(def) => Some(def),
            _ => None,
        }
    }
}

/// One concrete step of a realization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStep {
    /// Position of the declaration the step came from.
    pub position: SourcePosition,
    /// Name of the step group the declaration belongs to.
    pub group: Option<String>,
    /// What the step does.
    pub action: StepAction,
}

/// The fully resolved, ordered build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Realization {
    steps: Vec<ResolvedStep>,
}

impl Realization {
    /// Wraps an already ordered list of steps.
    #[must_use]
    pub const fn from_steps(steps: Vec<ResolvedStep>) -> Self {
        Self { steps }
    }

    /// Steps in emission order.
    #[must_use]
    pub fn steps(&self) -> &[ResolvedStep] {
        &self.steps
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the realization has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The resolved base image, if any.
    #[must_use]
    pub fn base(&self) -> Option<&ResolvedDefinition> {
        self.steps.iter().find_map(|step| match &step.action {
            StepAction::Base(def) => Some(def),
            _ => None,
        })
    }
}

/// The default realizer.
///
/// Identical references (same name and constraint) are looked up once per
/// [`Realize::realize`] call; every declaration still yields its own step.
#[derive(Debug, Clone, Copy, Default)]
pub struct Realizer;

impl Realizer {
    /// Creates a realizer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Realize for Realizer {
    fn realize(&self, spec: &Specification, library: &dyn LibraryClient) -> Result<Realization> {
        tracing::info!(
            declarations = spec.declarations.len(),
            "realizing specification"
        );
        let mut pass = Pass::new(library);
        let mut units = Vec::with_capacity(spec.declarations.len());
        for declaration in &spec.declarations {
            units.push(pass.unit(declaration)?);
        }

        let order = order_units(&units)?;
        let steps: Vec<ResolvedStep> = order
            .into_iter()
            .flat_map(|idx| std::mem::take(&mut units[idx].steps))
            .collect();

        tracing::info!(
            steps = steps.len(),
            lookups = pass.resolved.len(),
            "realized specification"
        );
        Ok(Realization { steps })
    }
}

/// A top-level declaration after realization.
struct Unit<'a> {
    declaration: &'a Declaration,
    steps: Vec<ResolvedStep>,
}

/// State carried across one realization.
struct Pass<'l> {
    library: &'l dyn LibraryClient,
    resolved: HashMap<SymbolicReference, ResolvedDefinition>,
    seen_base: bool,
    step_names: HashSet<String>,
}

impl<'l> Pass<'l> {
    fn new(library: &'l dyn LibraryClient) -> Self {
        Self {
            library,
            resolved: HashMap::new(),
            seen_base: false,
            step_names: HashSet::new(),
        }
    }

    fn unit<'a>(&mut self, declaration: &'a Declaration) -> Result<Unit<'a>> {
        let mut steps = Vec::new();
        match &declaration.kind {
            DeclarationKind::Step { name, body, .. } => {
                self.require_base(declaration)?;
                if !self.step_names.insert(name.clone()) {
                    return Err(semantic(
                        declaration.position,
                        SemanticRule::DuplicateStep,
                        format!("step `{name}` is declared more than once"),
                    ));
                }
                if body.is_empty() {
                    return Err(validator::missing(
                        declaration.position,
                        format!("step `{name}` has no declarations"),
                    ));
                }
                for child in body {
                    steps.push(self.step(child, Some(name))?);
                }
            }
            _ => steps.push(self.step(declaration, None)?),
        }
        Ok(Unit { declaration, steps })
    }

    fn step(&mut self, declaration: &Declaration, group: Option<&str>) -> Result<ResolvedStep> {
        let position = declaration.position;
        let action = match &declaration.kind {
            DeclarationKind::Base(reference) => {
                if group.is_some() {
                    return Err(semantic(
                        position,
                        SemanticRule::BaseInStep,
                        "`base` must be declared at the top level",
                    ));
                }
                if self.seen_base {
                    return Err(semantic(
                        position,
                        SemanticRule::DuplicateBase,
                        "only one `base` may be declared",
                    ));
                }
                self.seen_base = true;
                StepAction::Base(self.resolve(reference, position)?)
            }
            DeclarationKind::Dependency(reference) => {
                self.require_base(declaration)?;
                StepAction::Dependency(self.resolve(reference, position)?)
            }
            DeclarationKind::Instruction { keyword, value } => {
                self.require_base(declaration)?;
                validator::instruction(*keyword, value, position)?
            }
            DeclarationKind::Block { keyword, entries } => {
                self.require_base(declaration)?;
                validator::block(*keyword, entries, position)?
            }
            DeclarationKind::Step { name, .. } => {
                return Err(semantic(
                    position,
                    SemanticRule::NestedStep,
                    format!("step `{name}` is nested inside another step"),
                ));
            }
        };
        tracing::debug!(%position, kind = action.kind(), group, "realized step");
        Ok(ResolvedStep {
            position,
            group: group.map(str::to_string),
            action,
        })
    }

    fn require_base(&self, declaration: &Declaration) -> Result<()> {
        if self.seen_base {
            return Ok(());
        }
        Err(semantic(
            declaration.position,
            SemanticRule::MissingBase,
            format!("`{}` appears before any `base`", declaration.keyword()),
        ))
    }

    fn resolve(
        &mut self,
        reference: &SymbolicReference,
        position: SourcePosition,
    ) -> Result<ResolvedDefinition> {
        if let Some(hit) = self.resolved.get(reference) {
            tracing::debug!(reference = %reference, "reusing resolution");
            return Ok(hit.clone());
        }

        tracing::debug!(reference = %reference, %position, "resolving reference");
        let definition =
            self.library
                .resolve(reference)
                .map_err(|source| QuokkaError::Resolution {
                    reference: reference.to_string(),
                    position,
                    source,
                })?;
        let _ = self.resolved.insert(reference.clone(), definition.clone());
        Ok(definition)
    }
}

/// Checks `after` clauses and computes the emission order of `units`.
fn order_units(units: &[Unit<'_>]) -> Result<Vec<usize>> {
    let mut graph = StepGraph::new();
    let mut groups = HashMap::new();
    let nodes: Vec<_> = units
        .iter()
        .map(|unit| {
            let declaration = unit.declaration;
            match &declaration.kind {
                DeclarationKind::Step { name, .. } => {
                    let node = graph.add_unit(name.as_str(), declaration.position);
                    let _ = groups.insert(name.as_str(), node);
                    node
                }
                _ => graph.add_unit(declaration.keyword(), declaration.position),
            }
        })
        .collect();

    for (unit, &node) in units.iter().zip(&nodes) {
        let DeclarationKind::Step { name, after, .. } = &unit.declaration.kind else {
            continue;
        };
        for prerequisite in after {
            let Some(&prerequisite_node) = groups.get(prerequisite.name.as_str()) else {
                return Err(semantic(
                    prerequisite.position,
                    SemanticRule::UndeclaredPrerequisite,
                    format!(
                        "step `{name}` runs after `{}`, which is not declared",
                        prerequisite.name
                    ),
                ));
            };
            graph.add_prerequisite(node, prerequisite_node);
        }
    }

    graph.resolve_order()
}
