//! Mapping external persistent identifiers back to local catalog records.

use tracing::{debug, warn};

use crate::error::Result;
use crate::identifiers::generate_pid;
use crate::models::PidType;

/// Upper bound on candidates tried by [`generate_unique_id`].
pub const MAX_ID_ATTEMPTS: usize = 10;

/// Read side of the catalog used by every reader.
///
/// Implementations may be shared between harvest workers; id generation
/// built on top of this is optimistic, so uniqueness must ultimately be
/// enforced by the store.
pub trait CatalogLookup: Send + Sync {
    /// Id of the active record holding `pid` with the given pid type.
    fn find_record_by_pid(&self, pid: &str, pid_type: PidType) -> Result<Option<String>>;

    fn record_exists(&self, id: &str) -> Result<bool>;
}

/// Source of candidate catalog identifiers.
pub trait PidGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Prefix + microsecond timestamp, e.g. `urn:nbn:fi:csc-kata20240305140709123456`.
#[derive(Debug, Clone)]
pub struct TimestampPidGenerator {
    prefix: String,
}

impl TimestampPidGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl PidGenerator for TimestampPidGenerator {
    fn generate(&self) -> String {
        generate_pid(&self.prefix)
    }
}

/// Generate an id not yet present in the catalog.
///
/// Returns `Ok(None)` when all [`MAX_ID_ATTEMPTS`] candidates collide;
/// callers must treat that as a failure of the whole read.
pub fn generate_unique_id(
    lookup: &dyn CatalogLookup,
    generator: &dyn PidGenerator,
) -> Result<Option<String>> {
    for attempt in 1..=MAX_ID_ATTEMPTS {
        let candidate = generator.generate();
        if !lookup.record_exists(&candidate)? {
            return Ok(Some(candidate));
        }
        debug!(attempt, candidate = %candidate, "generated catalog id already exists");
    }
    warn!("no unique catalog id after {MAX_ID_ATTEMPTS} attempts");
    Ok(None)
}

/// Existing record for `pid`, or a freshly generated id.
pub fn resolve_or_generate(
    lookup: &dyn CatalogLookup,
    generator: &dyn PidGenerator,
    pid: Option<&str>,
) -> Result<Option<String>> {
    if let Some(pid) = pid {
        if let Some(existing) = lookup.find_record_by_pid(pid, PidType::Primary)? {
            debug!(pid, id = %existing, "pid resolved to existing record");
            return Ok(Some(existing));
        }
    }
    generate_unique_id(lookup, generator)
}
