//! Content fingerprints for file equality testing

use mirrorcp_types::{Error, Result};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncReadExt;

/// Read buffer size for fingerprint computation
const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// SHA-256 digest of a file's full byte content
///
/// Two files are equal iff their digests match. Digests are computed on
/// demand and never cached across passes, so a pass can never be misled by
/// stale metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// Compute the digest of a file's content with chunked reads
    pub async fn of_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = fs::File::open(path).await.map_err(|e| Error::Io {
            message: format!("Failed to open '{}' for hashing: {}", path.display(), e),
        })?;

        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; HASH_BUFFER_SIZE];
        loop {
            let read = file.read(&mut buffer).await.map_err(|e| Error::Io {
                message: format!("Failed to read '{}' for hashing: {}", path.display(), e),
            })?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }

        Ok(Self(hasher.finalize().into()))
    }

    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}
