//! CMDI (`cmdi0571`) dispatch. The CMDI grammar itself is handled by an
//! external [`CmdiParser`].

use std::sync::Arc;

use oaiharvest_core::UnifiedRecord;

use crate::context::ReaderContext;
use crate::error::{ReaderError, Result};
use crate::reader::MetadataReader;
use crate::xml::Element;

pub trait CmdiParser: Send + Sync {
    fn parse(&self, document: &Element, ctx: &ReaderContext) -> Result<UnifiedRecord>;
}

/// Parser used when no CMDI support is configured; every read fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredCmdiParser;

impl CmdiParser for UnconfiguredCmdiParser {
    fn parse(&self, _document: &Element, _ctx: &ReaderContext) -> Result<UnifiedRecord> {
        Err(ReaderError::Cmdi("no CMDI parser configured".to_string()))
    }
}

#[derive(Clone)]
pub struct CmdiReader {
    ctx: ReaderContext,
    parser: Arc<dyn CmdiParser>,
}

impl CmdiReader {
    pub fn new(ctx: ReaderContext, parser: Arc<dyn CmdiParser>) -> Self {
        Self { ctx, parser }
    }
}

impl std::fmt::Debug for CmdiReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CmdiReader").finish_non_exhaustive()
    }
}

impl MetadataReader for CmdiReader {
    fn read_data(&self, document: &Element) -> Result<UnifiedRecord> {
        let _entered = self.ctx.span.enter();
        self.parser.parse(document, &self.ctx)
    }
}
