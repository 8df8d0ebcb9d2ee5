use std::collections::HashMap;
use std::sync::Arc;

use headlint_domain::{Check, CheckRegistry, RegistryError};
use headlint_types::Finding;
use tracing::debug;

use crate::binder::BoundFile;
use crate::linter::{LintError, LintSummary, Linter};
use crate::program::SourceFile;

/// Bound files in dispatch order with their checks already resolved.
///
/// Planning validates every check name up front, so an unknown name fails
/// before any check runs and before any finding is produced.
pub struct Schedule<'p> {
    files: Vec<&'p SourceFile>,
    checks: HashMap<&'p str, Vec<Arc<dyn Check>>>,
}

impl<'p> Schedule<'p> {
    /// Order files longest text first (ties keep config order) and resolve
    /// their check names against `registry`.
    pub fn plan(mut bound: Vec<BoundFile<'p>>, registry: &CheckRegistry) -> Result<Self, RegistryError> {
        // Stable sort: equal lengths keep their configured order.
        bound.sort_by(|a, b| b.file.text().len().cmp(&a.file.text().len()));

        let mut files = Vec::with_capacity(bound.len());
        let mut checks = HashMap::with_capacity(bound.len());
        for entry in bound {
            let resolved = registry.resolve(&entry.rules)?;
            files.push(entry.file);
            checks.insert(entry.file.file_name(), resolved);
        }

        debug!("Planned {} file(s)", files.len());
        Ok(Self { files, checks })
    }

    /// Files in dispatch order.
    pub fn files(&self) -> &[&'p SourceFile] {
        &self.files
    }

    pub fn checks_for(&self, file: &SourceFile) -> Vec<Arc<dyn Check>> {
        self.checks.get(file.file_name()).cloned().unwrap_or_default()
    }

    /// Hand the whole schedule to `linter` in one call.
    pub fn dispatch<S>(&self, linter: &Linter, sink: S) -> Result<LintSummary, LintError>
    where
        S: Fn(Finding) + Sync,
    {
        linter.run(&self.files, |file| self.checks_for(file), sink)
    }
}
