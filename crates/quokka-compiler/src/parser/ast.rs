//! Abstract Syntax Tree for Quokkafiles.

use quokka_common::types::SourcePosition;
use quokka_library::reference::SymbolicReference;

/// Root node of a parsed Quokkafile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Specification {
    /// Top-level declarations in source order.
    pub declarations: Vec<Declaration>,
}

/// A single declaration and where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Position of the declaration's leading keyword.
    pub position: SourcePosition,
    /// What was declared.
    pub kind: DeclarationKind,
}

/// The kinds of declaration the grammar knows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationKind {
    /// `base = "<reference>"`.
    Base(SymbolicReference),
    /// `dep = "<reference>"`.
    Dependency(SymbolicReference),
    /// `<keyword> = <value>` for a literal instruction.
    Instruction {
        /// The instruction keyword.
        keyword: Keyword,
        /// The value as written; its shape is checked during realization.
        value: Value,
    },
    /// `env { ... }` or `label { ... }`.
    Block {
        /// Which block this is.
        keyword: BlockKeyword,
        /// Key/value entries in source order.
        entries: Vec<Entry>,
    },
    /// `step <name> [after <a>, <b>] { ... }`.
    Step {
        /// Step group name.
        name: String,
        /// Step groups that must be emitted before this one.
        after: Vec<Prerequisite>,
        /// Nested declarations in source order.
        body: Vec<Declaration>,
    },
}

impl Declaration {
    /// The symbolic reference this declaration carries, if any.
    #[must_use]
    pub const fn reference(&self) -> Option<&SymbolicReference> {
        match &self.kind {
            DeclarationKind::Base(reference) | DeclarationKind::Dependency(reference) => {
                Some(reference)
            }
            _ => None,
        }
    }

    /// Nested child declarations (non-empty only for step groups).
    #[must_use]
    pub fn children(&self) -> &[Declaration] {
        match &self.kind {
            DeclarationKind::Step { body, .. } => body,
            _ => &[],
        }
    }

    /// The keyword the declaration was introduced with.
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match &self.kind {
            DeclarationKind::Base(_) => "base",
            DeclarationKind::Dependency(_) => "dep",
            DeclarationKind::Instruction { keyword, .. } => keyword.as_str(),
            DeclarationKind::Block { keyword, .. } => keyword.as_str(),
            DeclarationKind::Step { .. } => "step",
        }
    }
}

/// Literal instruction keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    /// `run`: execute a command at build time.
    Run,
    /// `workdir`: set the working directory.
    Workdir,
    /// `copy`: copy paths into the image.
    Copy,
    /// `expose`: document a listening port.
    Expose,
    /// `user`: set the user for later instructions.
    User,
    /// `cmd`: default container command.
    Cmd,
    /// `entrypoint`: container entrypoint.
    Entrypoint,
}

impl Keyword {
    /// Looks up a keyword by its source spelling.
    #[must_use]
    pub fn from_word(word: &str) -> Option<Self> {
        Some(match word {
            "run" => Self::Run,
            "workdir" => Self::Workdir,
            "copy" => Self::Copy,
            "expose" => Self::Expose,
            "user" => Self::User,
            "cmd" => Self::Cmd,
            "entrypoint" => Self::Entrypoint,
            _ => return None,
        })
    }

    /// Source spelling of the keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::Workdir => "workdir",
            Self::Copy => "copy",
            Self::Expose => "expose",
            Self::User => "user",
            Self::Cmd => "cmd",
            Self::Entrypoint => "entrypoint",
        }
    }
}

/// Keywords that introduce a key/value block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKeyword {
    /// `env { KEY = "value" }`.
    Env,
    /// `label { key = "value" }`.
    Label,
}

impl BlockKeyword {
    /// Looks up a block keyword by its source spelling.
    #[must_use]
    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "env" => Some(Self::Env),
            "label" => Some(Self::Label),
            _ => None,
        }
    }

    /// Source spelling of the keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Env => "env",
            Self::Label => "label",
        }
    }
}

/// One `key = "value"` entry of a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Position of the key.
    pub position: SourcePosition,
    /// Entry key.
    pub key: String,
    /// Entry value.
    pub value: String,
}

/// A step name listed in an `after` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prerequisite {
    /// Position of the name.
    pub position: SourcePosition,
    /// Name of the step group that must come first.
    pub name: String,
}

/// A literal value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A string literal.
    String(String),
    /// An integer literal.
    Integer(i64),
    /// A bracketed list of string literals.
    List(Vec<String>),
}

impl Value {
    /// Short description of the value's shape, for error messages.
    #[must_use]
    pub const fn shape(&self) -> &'static str {
        match self {
            Self::String(_) => "a string",
            Self::Integer(_) => "an integer",
            Self::List(_) => "a list",
        }
    }
}
