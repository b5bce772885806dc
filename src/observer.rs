use std::path::Path;

use crate::schemata::{MutationMapping, MutationSchema};
use crate::state::MutationOutcome;

/// Progress callbacks consumed by the reporter. Replaces a process-wide
/// notification bus with an explicit seam; every method has a no-op
/// default so observers implement only what they render.
pub trait ProgressObserver {
    fn project_copy_started(&self) {}
    fn project_copy_finished(&self, _mutated_project: &Path) {}
    fn mappings_discovered(&self, _mappings: &[MutationMapping]) {}
    fn test_plan_created(&self, _path: &Path) {}
    fn test_plan_loaded(&self, _path: &Path) {}
    fn coverage_discovered(&self, _percent: f64) {}
    fn coverage_unavailable(&self, _reason: &str) {}
    fn mutation_testing_started(&self, _total_schemata: usize) {}
    fn baseline_passed(&self, _duration_ms: u64, _remaining: usize) {}
    fn activation_failed(&self, _schema: &MutationSchema, _reason: &str) {}
    fn mutation_tested(&self, _outcome: &MutationOutcome, _log: &str) {}
}

/// Observer that renders nothing; used by tests and embedding callers.
pub struct NullObserver;

impl ProgressObserver for NullObserver {}
