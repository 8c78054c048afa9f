//! Save and load of the best policy together with its generation number.

use crate::policy::{Policy, ShapeError};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("no saved model at {0}")]
    NoSavedModel(PathBuf),
    #[error("incompatible saved model: {0}")]
    Incompatible(String),
    #[error("failed to encode model: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("model i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ShapeError> for PersistError {
    fn from(err: ShapeError) -> Self {
        PersistError::Incompatible(err.to_string())
    }
}

/// On-disk record. Matrices are stored as nested rows so their shape can be
/// checked on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub version: u32,
    pub w1: Vec<Vec<f64>>,
    pub w2: Vec<Vec<f64>>,
    pub generation: u32,
}

impl ModelRecord {
    pub fn new(policy: &Policy, generation: u32) -> Self {
        let (w1, w2) = policy.matrices();
        Self { version: FORMAT_VERSION, w1, w2, generation }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, PersistError> {
        Ok(bincode::serde::encode_to_vec(self, bincode::config::standard())?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PersistError> {
        let (record, read): (Self, usize) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())
                .map_err(|e| PersistError::Incompatible(e.to_string()))?;
        if read != bytes.len() {
            return Err(PersistError::Incompatible(format!(
                "{} trailing bytes after record",
                bytes.len() - read
            )));
        }
        Ok(record)
    }

    /// Rebuilds the policy, rejecting foreign versions and wrong shapes.
    pub fn policy(&self) -> Result<Policy, PersistError> {
        if self.version != FORMAT_VERSION {
            return Err(PersistError::Incompatible(format!(
                "format version {} (expected {FORMAT_VERSION})",
                self.version
            )));
        }
        Ok(Policy::from_matrices(&self.w1, &self.w2)?)
    }
}

/// A policy recovered from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedModel {
    pub policy: Policy,
    pub generation: u32,
}

pub fn save(path: &Path, policy: &Policy, generation: u32) -> Result<(), PersistError> {
    let bytes = ModelRecord::new(policy, generation).to_bytes()?;
    std::fs::write(path, bytes)?;
    info!(path = %path.display(), generation, "saved best policy");
    Ok(())
}

pub fn load(path: &Path) -> Result<SavedModel, PersistError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(PersistError::NoSavedModel(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    let record = ModelRecord::from_bytes(&bytes)?;
    let policy = record.policy()?;
    info!(path = %path.display(), generation = record.generation, "loaded saved policy");
    Ok(SavedModel { policy, generation: record.generation })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn record_bytes_round_trip() {
        let mut rng = SmallRng::seed_from_u64(3);
        let record = ModelRecord::new(&Policy::random(&mut rng), 17);
        let decoded = ModelRecord::from_bytes(&record.to_bytes().expect("encode")).expect("decode");
        assert_eq!(decoded, record);
    }

    #[test]
    fn garbage_is_incompatible() {
        let err = ModelRecord::from_bytes(&[0xff, 0x00, 0x13]).unwrap_err();
        assert!(matches!(err, PersistError::Incompatible(_)));
    }

    #[test]
    fn truncated_record_is_incompatible() {
        let mut rng = SmallRng::seed_from_u64(4);
        let bytes = ModelRecord::new(&Policy::random(&mut rng), 2).to_bytes().expect("encode");
        let err = ModelRecord::from_bytes(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, PersistError::Incompatible(_)));
    }

    #[test]
    fn foreign_version_is_rejected() {
        let mut rng = SmallRng::seed_from_u64(5);
        let mut record = ModelRecord::new(&Policy::random(&mut rng), 2);
        record.version = 99;
        assert!(matches!(record.policy(), Err(PersistError::Incompatible(_))));
    }
}
