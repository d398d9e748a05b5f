use std::{fs, path::PathBuf};

use log::info;
use parking_lot::RwLock;

use crate::{
    config::StoreConfig,
    error::{Result, StoreError},
    state::DepotState,
};

/// Shared handle over the depot state file. Readers take a snapshot under the
/// read lock; writers go through [`DepotStore::transaction`].
pub struct DepotStore {
    state: RwLock<DepotState>,
    path: PathBuf,
}

impl DepotStore {
    /// Loads the state file, or starts empty when none exists yet.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        config.ensure_dirs()?;
        let path = config.state_file_path();
        let state = if path.exists() {
            let bytes = fs::read(&path)?;
            if bytes.is_empty() {
                DepotState::default()
            } else {
                serde_json::from_slice(&bytes)?
            }
        } else {
            DepotState::default()
        };
        Ok(Self {
            state: RwLock::new(state),
            path,
        })
    }

    /// Runs a read-only closure against the current state.
    pub fn read<R>(&self, f: impl FnOnce(&DepotState) -> R) -> R {
        let guard = self.state.read();
        f(&guard)
    }

    /// Runs a mutation all-or-nothing: the closure gets a working copy of the
    /// state; on `Ok` the copy is persisted and swapped in, on `Err` it is
    /// dropped. The write lock is held for the whole call, so each invocation
    /// sees a consistent snapshot and commits against it.
    pub fn transaction<T, E>(
        &self,
        f: impl FnOnce(&mut DepotState) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E>
    where
        E: From<StoreError>,
    {
        let mut guard = self.state.write();
        let mut working = guard.clone();
        let out = f(&mut working)?;
        self.persist(&working).map_err(E::from)?;
        *guard = working;
        Ok(out)
    }

    fn persist(&self, state: &DepotState) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(state)?;
        fs::write(&self.path, bytes)?;
        Ok(())
    }

    /// Drops every row and rewinds the id counters (dev/testing reset).
    pub fn reset(&self) -> Result<()> {
        self.transaction(|state| -> Result<()> {
            state.clear();
            Ok(())
        })?;
        info!("depot store reset; state file {:?} cleared", self.path);
        Ok(())
    }
}
