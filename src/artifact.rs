//! Trained pipeline artifact: the single serialized train/serve contract

use crate::error::{Result, UnderwriterError};
use crate::preprocessing::ColumnRouter;
use crate::training::{Classifier, EvaluationResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Magic bytes identifying an underwriter artifact file
const MAGIC: [u8; 4] = *b"UWTR";
/// Current artifact format version
pub const FORMAT_VERSION: u32 = 1;

/// Everything needed to reproduce predictions without retraining: the fitted
/// column router, the winning classifier, and the cross-validation record of
/// every candidate (kept for auditability).
///
/// Read-only for the lifetime of a serving process; replacing it means
/// retraining and an atomic swap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineArtifact {
    pub router: ColumnRouter,
    pub classifier: Classifier,
    pub evaluations: Vec<EvaluationResult>,
    /// RFC 3339 timestamp of the training run
    pub trained_at: String,
}

/// On-disk envelope around the bincode payload.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    magic: [u8; 4],
    format_version: u32,
    payload: Vec<u8>,
    checksum: u64,
}

impl PipelineArtifact {
    pub fn new(
        router: ColumnRouter,
        classifier: Classifier,
        evaluations: Vec<EvaluationResult>,
    ) -> Self {
        Self {
            router,
            classifier,
            evaluations,
            trained_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Serialize to one opaque blob: magic + version + checksummed payload.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let payload = bincode::serialize(self).map_err(|e| {
            UnderwriterError::Data(format!("failed to serialize artifact: {}", e))
        })?;
        let envelope = Envelope {
            magic: MAGIC,
            format_version: FORMAT_VERSION,
            checksum: fnv1a(&payload),
            payload,
        };
        bincode::serialize(&envelope)
            .map_err(|e| UnderwriterError::Data(format!("failed to serialize envelope: {}", e)))
    }

    /// Reconstruct an artifact from a blob produced by [`Self::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let envelope: Envelope = bincode::deserialize(bytes)
            .map_err(|e| UnderwriterError::ArtifactCorrupt(format!("unreadable envelope: {}", e)))?;

        if envelope.magic != MAGIC {
            return Err(UnderwriterError::ArtifactCorrupt(
                "bad magic bytes".to_string(),
            ));
        }
        if envelope.format_version != FORMAT_VERSION {
            return Err(UnderwriterError::ArtifactVersion {
                found: envelope.format_version,
                supported: FORMAT_VERSION,
            });
        }
        if fnv1a(&envelope.payload) != envelope.checksum {
            return Err(UnderwriterError::ArtifactCorrupt(
                "checksum mismatch".to_string(),
            ));
        }

        bincode::deserialize(&envelope.payload)
            .map_err(|e| UnderwriterError::ArtifactCorrupt(format!("unreadable payload: {}", e)))
    }

    /// Write the artifact to disk, atomically: the bytes land in a sibling
    /// temp file first and are renamed into place, so a concurrent reader
    /// never observes a partial artifact.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;

        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, path)?;

        info!(path = %path.display(), size_bytes = bytes.len(), "saved pipeline artifact");
        Ok(())
    }

    /// Load an artifact from disk. A missing or unreadable file is an
    /// `ArtifactLoad` error; undecodable bytes surface as corruption or
    /// version errors from [`Self::from_bytes`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            UnderwriterError::ArtifactLoad(format!("{}: {}", path.display(), e))
        })?;
        Self::from_bytes(&bytes)
    }
}

/// FNV-1a hash for payload integrity
fn fnv1a(data: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 14695981039346656037;
    const FNV_PRIME: u64 = 1099511628211;

    let mut hash = FNV_OFFSET;
    for byte in data {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
