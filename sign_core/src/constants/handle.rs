//! Process-wide holder for the active constants set with atomic reload.

use std::path::Path;
use std::sync::{Arc, RwLock};

use tracing::info;

use super::{load_dir, ConstantsSet};
use crate::errors::CalcResult;

/// Shares one [`ConstantsSet`] across threads and swaps it on reload.
///
/// Readers take a [`snapshot`](Self::snapshot) and keep using it for the
/// whole calculation; a reload builds the replacement set completely before
/// swapping the pointer, so no reader ever sees a mix of old and new packs.
#[derive(Debug)]
pub struct ConstantsHandle {
    current: RwLock<Arc<ConstantsSet>>,
}

impl ConstantsHandle {
    pub fn new(set: Arc<ConstantsSet>) -> Self {
        ConstantsHandle {
            current: RwLock::new(set),
        }
    }

    /// Handle holding the crate's built-in packs
    pub fn builtin() -> CalcResult<Self> {
        Ok(Self::new(ConstantsSet::builtin()?))
    }

    /// The set currently in force
    pub fn snapshot(&self) -> Arc<ConstantsSet> {
        let guard = self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Replace the active set; returns the one it displaced.
    pub fn swap(&self, next: Arc<ConstantsSet>) -> Arc<ConstantsSet> {
        let mut guard = self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        info!(fingerprint = %next.fingerprint(), "constants set swapped in");
        std::mem::replace(&mut *guard, next)
    }

    /// Load a new set from `dir` and swap it in.
    ///
    /// On error the current set stays active and the error is returned.
    pub fn reload_from_dir(&self, dir: &Path) -> CalcResult<Arc<ConstantsSet>> {
        let next = Arc::new(load_dir(dir)?);
        self.swap(Arc::clone(&next));
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_survives_swap() {
        let handle = ConstantsHandle::builtin().unwrap();
        let before = handle.snapshot();

        let base = ConstantsSet::builtin().unwrap();
        let mut altered = (*base).clone();
        altered.footing.data.embedment.calibration_factor = 1.5;
        altered.footing.meta.version = "v2".to_string();
        let previous = handle.swap(Arc::new(altered));

        assert!(Arc::ptr_eq(&before, &previous));
        assert_eq!(before.footing.meta.version, "v1");
        assert_eq!(handle.snapshot().footing.meta.version, "v2");
    }

    #[test]
    fn test_failed_reload_keeps_current() {
        let handle = ConstantsHandle::builtin().unwrap();
        let dir = tempfile::tempdir().unwrap();
        assert!(handle.reload_from_dir(dir.path()).is_err());
        assert_eq!(handle.snapshot().footing.meta.version, "v1");
    }
}
