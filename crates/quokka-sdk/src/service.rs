//! The end-to-end build pipeline.

use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

use quokka_common::error::Result;
use quokka_compiler::{Emit, Parse, Realization, Realize};
use quokka_library::LibraryClient;

use crate::builder::BuildServiceBuilder;

/// Compiles Quokkafiles into Dockerfiles.
///
/// The stages and the library client are fixed when the service is built.
/// A service holds no per-build state, so one instance can serve concurrent
/// builds from several threads.
pub struct BuildService {
    pub(crate) library: Arc<dyn LibraryClient>,
    pub(crate) parser: Box<dyn Parse>,
    pub(crate) realizer: Box<dyn Realize>,
    pub(crate) emitter: Box<dyn Emit>,
}

impl BuildService {
    /// Creates a service with the default stages.
    pub fn new(library: impl LibraryClient + 'static) -> Self {
        Self::builder(library).build()
    }

    /// Starts a builder for a service using `library`.
    pub fn builder(library: impl LibraryClient + 'static) -> BuildServiceBuilder {
        BuildServiceBuilder::new(Arc::new(library))
    }

    /// The library client every build resolves against.
    #[must_use]
    pub fn library(&self) -> &dyn LibraryClient {
        self.library.as_ref()
    }

    /// Reads a specification from `input` and writes the Dockerfile to `output`.
    ///
    /// Stages run in order and the first error is returned unchanged. On
    /// failure nothing is written to `output`.
    ///
    /// # Errors
    ///
    /// Returns the error of whichever stage failed first.
    pub fn build<R: Read, W: Write>(&self, mut input: R, mut output: W) -> Result<()> {
        let realization = self.plan(&mut input)?;
        self.emitter
            .emit(&realization, self.library.as_ref(), &mut output)?;
        tracing::info!(steps = realization.len(), "build finished");
        Ok(())
    }

    /// Parses and realizes a specification without emitting it.
    ///
    /// # Errors
    ///
    /// Returns the parser's or realizer's error.
    pub fn plan<R: Read>(&self, mut input: R) -> Result<Realization> {
        let spec = self.parser.parse(&mut input)?;
        self.realizer.realize(&spec, self.library.as_ref())
    }
}

impl fmt::Debug for BuildService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildService").finish_non_exhaustive()
    }
}
