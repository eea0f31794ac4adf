pub mod csv_export;
pub mod csv_import;
pub mod records;

use crate::model::task::ConversionLog;
use crate::model::tree::OrphanDiagnostic;
use crate::model::Task;

/// Tasks loaded from a file, plus everything that needed fixing on the way.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub tasks: Vec<Task>,
    pub conversion: ConversionLog,
    pub orphans: Vec<OrphanDiagnostic>,
}

impl LoadReport {
    pub fn task_count(&self) -> usize {
        crate::model::task::walk(&self.tasks).count()
    }

    pub fn has_issues(&self) -> bool {
        !self.conversion.is_clean() || !self.orphans.is_empty()
    }

    /// One-line summary for the status bar.
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("Loaded {} tasks", self.task_count())];
        if !self.conversion.skipped.is_empty() {
            parts.push(format!("{} skipped", self.conversion.skipped.len()));
        }
        if !self.conversion.fallbacks.is_empty() {
            parts.push(format!("{} with substituted dates", self.conversion.fallbacks.len()));
        }
        if !self.orphans.is_empty() {
            parts.push(format!("{} orphaned", self.orphans.len()));
        }
        parts.join(", ")
    }
}
