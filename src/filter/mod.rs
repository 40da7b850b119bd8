use crate::config::LevelsConfig;
use crate::record::{Bindings, Severity};

/// Per-subscriber severity gate. Resolution order for a module: explicit
/// module override, then the global default. No resolvable level means the
/// module is rejected outright rather than admitted unfiltered.
#[derive(Debug, Clone, Default)]
pub struct LevelFilter {
    levels: LevelsConfig,
}

impl LevelFilter {
    pub fn new(levels: LevelsConfig) -> Self {
        Self { levels }
    }

    /// Effective minimum severity for a module, if any.
    pub fn effective_level(&self, module: &str) -> Option<Severity> {
        match self.levels.modules.get(module) {
            Some(override_level) => override_level.min_severity(),
            None => self.levels.default,
        }
    }

    /// True iff a record at `level` from these bindings should enter the
    /// queue. Pure function of configuration and input.
    pub fn should_admit(&self, bindings: &Bindings, level: Severity) -> bool {
        match self.effective_level(&bindings.module) {
            Some(min) => level >= min,
            None => false,
        }
    }
}
