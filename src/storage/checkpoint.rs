use std::fs;
use std::path::{Path, PathBuf};

use bincode::config;
use tracing::{info, warn};

use crate::config::CheckpointPair;
use crate::domain::Batch;
use crate::errors::{IngestError, IngestResult};
use crate::storage::traits::BatchStore;

/// Checkpoints on the local filesystem: bincode for resumption, pretty JSON for people
#[derive(Debug, Clone, Copy, Default)]
pub struct FileBatchStore;

impl FileBatchStore {
    pub fn new() -> Self {
        Self
    }
}

fn temp_path(path: &Path) -> IngestResult<PathBuf> {
    let mut name = path
        .file_name()
        .ok_or_else(|| IngestError::Config(format!("checkpoint path {} has no file name", path.display())))?
        .to_os_string();
    name.push(".tmp");
    Ok(path.with_file_name(name))
}

fn write_temp(path: &Path, bytes: &[u8]) -> IngestResult<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = temp_path(path)?;
    fs::write(&tmp, bytes)?;
    Ok(tmp)
}

fn discard(paths: &[&Path]) {
    for path in paths {
        let _ = fs::remove_file(path);
    }
}

impl BatchStore for FileBatchStore {
    fn save(&self, batch: &Batch, target: &CheckpointPair) -> IngestResult<()> {
        // Both encodings come from the same value before anything touches disk
        let binary = bincode::serde::encode_to_vec(batch, config::standard())?;
        let structured = serde_json::to_vec_pretty(batch)?;

        let binary_tmp = write_temp(&target.binary, &binary)?;
        let structured_tmp = match write_temp(&target.structured, &structured) {
            Ok(tmp) => tmp,
            Err(e) => {
                discard(&[&binary_tmp]);
                return Err(e);
            }
        };

        // The binary snapshot is authoritative, so it is swapped in last
        if let Err(e) = fs::rename(&structured_tmp, &target.structured) {
            discard(&[&binary_tmp, &structured_tmp]);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&binary_tmp, &target.binary) {
            discard(&[&binary_tmp]);
            warn!(
                structured = %target.structured.display(),
                binary = %target.binary.display(),
                "Structured checkpoint was replaced but the binary was not; they no longer match"
            );
            return Err(e.into());
        }

        info!(
            channels = batch.len(),
            episodes = batch.episode_count(),
            binary = %target.binary.display(),
            structured = %target.structured.display(),
            "Checkpoint saved"
        );
        Ok(())
    }

    fn load(&self, source: &CheckpointPair) -> IngestResult<Batch> {
        let bytes = fs::read(&source.binary)?;
        let (batch, _) = bincode::serde::decode_from_slice::<Batch, _>(&bytes, config::standard())?;

        info!(
            channels = batch.len(),
            episodes = batch.episode_count(),
            binary = %source.binary.display(),
            "Checkpoint loaded"
        );
        Ok(batch)
    }
}
