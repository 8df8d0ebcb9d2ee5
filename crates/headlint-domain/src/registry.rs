use std::collections::BTreeMap;
use std::sync::Arc;

use crate::check::Check;
use crate::checks;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("check '{name}' is registered twice")]
    Duplicate { name: String },

    #[error("unknown rule: {name}")]
    UnknownCheck { name: String },
}

/// Immutable name → check map, built once at start-up and shared read-only.
#[derive(Clone, Default)]
pub struct CheckRegistry {
    checks: BTreeMap<&'static str, Arc<dyn Check>>,
}

impl std::fmt::Debug for CheckRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckRegistry")
            .field("checks", &self.checks.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CheckRegistry {
    pub fn builder() -> CheckRegistryBuilder {
        CheckRegistryBuilder::default()
    }

    /// Registry containing every built-in check.
    pub fn builtin() -> Self {
        let mut checks: BTreeMap<&'static str, Arc<dyn Check>> = BTreeMap::new();
        for check in checks::all() {
            checks.insert(check.name(), check);
        }
        Self { checks }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Check>> {
        self.checks.get(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.checks.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Check>> + '_ {
        self.checks.values()
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Resolve `names` in order. The first unknown name is an error.
    pub fn resolve(&self, names: &[String]) -> Result<Vec<Arc<dyn Check>>, RegistryError> {
        names
            .iter()
            .map(|name| {
                self.get(name)
                    .cloned()
                    .ok_or_else(|| RegistryError::UnknownCheck { name: name.clone() })
            })
            .collect()
    }
}

#[derive(Default)]
pub struct CheckRegistryBuilder {
    checks: Vec<Arc<dyn Check>>,
}

impl CheckRegistryBuilder {
    pub fn with_builtins(mut self) -> Self {
        self.checks.extend(checks::all());
        self
    }

    pub fn with_check(mut self, check: Arc<dyn Check>) -> Self {
        self.checks.push(check);
        self
    }

    pub fn build(self) -> Result<CheckRegistry, RegistryError> {
        let mut map: BTreeMap<&'static str, Arc<dyn Check>> = BTreeMap::new();
        for check in self.checks {
            let name = check.name();
            if map.insert(name, check).is_some() {
                return Err(RegistryError::Duplicate {
                    name: name.to_string(),
                });
            }
        }
        Ok(CheckRegistry { checks: map })
    }
}
