use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::Result;

pub const STATE_FILE_NAME: &str = "depot-state.json";

#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub state_dir: PathBuf,
}

impl StoreConfig {
    pub fn new(state_dir: PathBuf) -> Self {
        Self { state_dir }
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn state_file_path(&self) -> PathBuf {
        self.state_dir.join(STATE_FILE_NAME)
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        if !self.state_dir.exists() {
            fs::create_dir_all(&self.state_dir)?;
        }
        Ok(())
    }
}
