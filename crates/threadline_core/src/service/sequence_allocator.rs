//! Named sequence allocation use-case.
//!
//! # Invariants
//! - N concurrent `allocate` calls for one name yield N distinct,
//!   consecutive values with no gaps and no repeats.
//! - Ordering comes from the store's increment-and-fetch, never from
//!   in-process locks.

use crate::error::{CoreError, CoreResult};
use crate::repo::sequence_repo::SequenceRepository;
use log::{debug, error};

/// Counter name used for article numbering.
pub const ARTICLE_COUNTER: &str = "article";

/// Service facade over named monotonic counters.
pub struct SequenceAllocator<R: SequenceRepository> {
    repo: R,
}

impl<R: SequenceRepository> SequenceAllocator<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Increments `name` (created at 0 on first use) and returns the new value.
    ///
    /// A store failure aborts the allocation; nothing is handed out.
    pub fn allocate(&self, name: &str) -> CoreResult<i64> {
        let name = validate_counter_name(name)?;
        match self.repo.next_value(name) {
            Ok(value) => {
                record_allocation(name, value);
                Ok(value)
            }
            Err(err) => {
                error!(
                    "event=sequence_allocate module=sequence status=error counter={name} error={err}"
                );
                Err(err.into())
            }
        }
    }

    /// Last value handed out for `name`, without allocating.
    pub fn current(&self, name: &str) -> CoreResult<Option<i64>> {
        let name = validate_counter_name(name)?;
        Ok(self.repo.current_value(name)?)
    }
}

/// Logs a value handed out for `name`.
///
/// Shared with allocations that run inside an entity insert transaction.
pub(crate) fn record_allocation(name: &str, value: i64) {
    debug!("event=sequence_allocate module=sequence status=ok counter={name} value={value}");
}

pub(crate) fn validate_counter_name(name: &str) -> CoreResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "counter name must not be blank".to_string(),
        ));
    }
    Ok(trimmed)
}
