use std::sync::Arc;

use oaiharvest_core::catalog::resolve_or_generate;
use oaiharvest_core::{CatalogLookup, PidGenerator, SiteConfig, TimestampPidGenerator};
use tracing::{Span, debug, info_span};

use crate::error::{ReaderError, Result};

/// Collaborators handed to every reader when it is built.
#[derive(Clone)]
pub struct ReaderContext {
    pub site: Arc<SiteConfig>,
    pub catalog: Arc<dyn CatalogLookup>,
    pub pid_generator: Arc<dyn PidGenerator>,
    /// Entered for the duration of each read.
    pub span: Span,
}

impl ReaderContext {
    pub fn new(
        site: SiteConfig,
        catalog: Arc<dyn CatalogLookup>,
        pid_generator: Arc<dyn PidGenerator>,
    ) -> Self {
        Self {
            site: Arc::new(site),
            catalog,
            pid_generator,
            span: info_span!("reader"),
        }
    }

    /// Context generating `<pid_prefix><timestamp>` identifiers.
    pub fn with_prefix(site: SiteConfig, catalog: Arc<dyn CatalogLookup>, pid_prefix: &str) -> Self {
        Self::new(site, catalog, Arc::new(TimestampPidGenerator::new(pid_prefix)))
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Catalog id of the record owning `primary_pid`, or a fresh one.
    ///
    /// Failing to generate an id fails the whole read.
    pub fn resolve_id(&self, primary_pid: Option<&str>) -> Result<String> {
        let id = resolve_or_generate(
            self.catalog.as_ref(),
            self.pid_generator.as_ref(),
            primary_pid,
        )?;
        match id {
            Some(id) => {
                debug!(id = %id, "catalog id resolved");
                Ok(id)
            }
            None => Err(ReaderError::IdentifierUnavailable(
                primary_pid.unwrap_or("record without primary pid").to_string(),
            )),
        }
    }
}

impl std::fmt::Debug for ReaderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderContext")
            .field("site", &self.site)
            .finish_non_exhaustive()
    }
}
