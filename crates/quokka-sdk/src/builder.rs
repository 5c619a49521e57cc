//! Fluent API for assembling a build service.

use std::sync::Arc;

use quokka_compiler::{Emit, Emitter, Parse, Parser, Realize, Realizer};
use quokka_library::LibraryClient;

use crate::service::BuildService;

/// Builder for a [`BuildService`] whose stages can be replaced.
///
/// Any stage left unset uses the default implementation.
pub struct BuildServiceBuilder {
    library: Arc<dyn LibraryClient>,
    parser: Option<Box<dyn Parse>>,
    realizer: Option<Box<dyn Realize>>,
    emitter: Option<Box<dyn Emit>>,
}

impl BuildServiceBuilder {
    /// Creates a builder around a shared library client.
    #[must_use]
    pub fn new(library: Arc<dyn LibraryClient>) -> Self {
        Self {
            library,
            parser: None,
            realizer: None,
            emitter: None,
        }
    }

    /// Replaces the parsing stage.
    #[must_use]
    pub fn parser(mut self, parser: impl Parse + 'static) -> Self {
        self.parser = Some(Box::new(parser));
        self
    }

    /// Replaces the realization stage.
    #[must_use]
    pub fn realizer(mut self, realizer: impl Realize + 'static) -> Self {
        self.realizer = Some(Box::new(realizer));
        self
    }

    /// Replaces the emission stage.
    #[must_use]
    pub fn emitter(mut self, emitter: impl Emit + 'static) -> Self {
        self.emitter = Some(Box::new(emitter));
        self
    }

    /// Builds the service.
    #[must_use]
    pub fn build(self) -> BuildService {
        BuildService {
            library: self.library,
            parser: self.parser.unwrap_or_else(|| Box::new(Parser::new())),
            realizer: self.realizer.unwrap_or_else(|| Box::new(Realizer::new())),
            emitter: self.emitter.unwrap_or_else(|| Box::new(Emitter::new())),
        }
    }
}

impl std::fmt::Debug for BuildServiceBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildServiceBuilder")
            .field("parser", &self.parser.is_some())
            .field("realizer", &self.realizer.is_some())
            .field("emitter", &self.emitter.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};

    use quokka_common::error::{QuokkaError, Result};
    use quokka_compiler::Realization;
    use quokka_compiler::parser::ast::Specification;
    use quokka_library::CatalogLibrary;

    use super::*;

    struct FailingParser;

    impl Parse for FailingParser {
        fn parse(&self, _input: &mut dyn Read) -> Result<Specification> {
            Err(QuokkaError::Config {
                message: "parser double".into(),
            })
        }
    }

    struct FixedEmitter;

    impl Emit for FixedEmitter {
        fn emit(
            &self,
            _realization: &Realization,
            _library: &dyn LibraryClient,
            sink: &mut dyn Write,
        ) -> Result<()> {
            sink.write_all(b"# fixed\n")
                .map_err(|source| QuokkaError::OutputSink { source })
        }
    }

    #[test]
    fn substituted_parser_error_is_returned_unchanged() {
        let service = BuildService::builder(CatalogLibrary::new())
            .parser(FailingParser)
            .build();
        let mut out = Vec::new();
        let err = service.build(&b"anything"[..], &mut out).unwrap_err();
        assert!(err.to_string().contains("parser double"), "got: {err}");
        assert!(out.is_empty());
    }

    #[test]
    fn substituted_emitter_is_used() {
        let service = BuildService::builder(CatalogLibrary::new())
            .emitter(FixedEmitter)
            .build();
        let mut out = Vec::new();
        service.build(&b""[..], &mut out).unwrap();
        assert_eq!(out, b"# fixed\n");
    }

    #[test]
    fn builder_debug_shows_overrides() {
        let builder = BuildServiceBuilder::new(Arc::new(CatalogLibrary::new())).emitter(FixedEmitter);
        let debug = format!("{builder:?}");
        assert!(debug.contains("emitter: true"), "got: {debug}");
        assert!(debug.contains("parser: false"), "got: {debug}");
    }
}
