//! Bundle sources: descriptions of the program a script context executes.

use std::path::PathBuf;
use std::sync::Arc;

/// A cheap, cloneable description of the bundle a script context should run.
///
/// Transport (network fetch, filesystem read, cache lookup) is the engine's
/// concern; the host only carries the description from a recreate request to
/// the engine that consumes it.
#[derive(Debug, Clone)]
pub enum BundleSource {
    /// A bundle on the local filesystem.
    File(PathBuf),
    /// An in-memory bundle, typically preloaded by the embedder.
    Bytes {
        /// Display name used in logs and faults.
        name: String,
        /// The bundle payload.
        bytes: Arc<[u8]>,
    },
    /// A bundle served remotely (e.g. by a development server).
    Remote {
        /// URL the engine should fetch the bundle from.
        url: String,
    },
}

impl BundleSource {
    /// Create an in-memory bundle source.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        BundleSource::Bytes {
            name: name.into(),
            bytes: bytes.into().into(),
        }
    }

    /// A short name for logs.
    pub fn display_name(&self) -> String {
        match self {
            BundleSource::File(path) => path.display().to_string(),
            BundleSource::Bytes { name, .. } => name.clone(),
            BundleSource::Remote { url } => url.clone(),
        }
    }
}
