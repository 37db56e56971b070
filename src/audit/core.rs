use parking_lot::lock_api::RawRwLock;
use rayon::prelude::*;
use tracing::debug;

use crate::payload::Payload;
use crate::verified::Verified;

/// Outcome of an [`audit`] sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    /// Containers verified.
    pub checked: usize,
    /// Containers whose checksum did not match.
    pub failed: usize,
    /// Indices of the failing containers, ascending.
    pub failures: Vec<usize>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Verify every container in `cells` in parallel.
///
/// Each container takes only its own shared lock, so the sweep can run
/// alongside writers; a container being modified is checked once its
/// mutation scope ends.
pub fn audit<T, R>(cells: &[Verified<T, R>]) -> AuditReport
where
    T: Payload + Send + Sync,
    R: RawRwLock + Sync,
{
    let mut failures: Vec<usize> = cells
        .par_iter()
        .enumerate()
        .filter(|(_, cell)| !cell.verify())
        .map(|(i, _)| i)
        .collect();
    // collect keeps order for indexed iterators; sort anyway so the
    // contract does not hinge on that
    failures.sort_unstable();

    let report = AuditReport {
        checked: cells.len(),
        failed: failures.len(),
        failures,
    };
    debug!(
        checked = report.checked,
        failed = report.failed,
        "audit finished"
    );
    report
}
