//! Filtered cluster output.
//!
//! Survivors are written as a pretty-printed JSON array. A checksum of the
//! written bytes can be taken on the way out, so a consumer fetching the
//! list later can verify it got exactly what this run produced.

use crate::cluster::{ClusterEntry, ClusterError};
use sha2::digest::DynDigest;
use sha2::{Sha256, Sha512};
use std::fmt;
use std::io::Write;
use std::str::FromStr;

/// Hash used for output checksums
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Sha256,
    Sha512,
}

impl DigestAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha512 => "sha512",
        }
    }

    fn hasher(&self) -> Box<dyn DynDigest> {
        match self {
            DigestAlgorithm::Sha256 => Box::new(Sha256::default()),
            DigestAlgorithm::Sha512 => Box::new(Sha512::default()),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(DigestAlgorithm::Sha256),
            "sha512" | "sha-512" => Ok(DigestAlgorithm::Sha512),
            _ => Err(format!(
                "unknown digest algorithm '{s}', supported: sha256, sha512"
            )),
        }
    }
}

/// Checksum of a written cluster list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksum {
    pub algorithm: DigestAlgorithm,
    /// Lowercase hex digest
    pub hex: String,
    /// Number of bytes covered by the digest
    pub bytes: u64,
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex)
    }
}

/// Writer that hashes and counts every byte the inner writer accepts
pub struct ChecksumWriter<W> {
    inner: W,
    algorithm: DigestAlgorithm,
    hasher: Box<dyn DynDigest>,
    bytes: u64,
}

impl<W: Write> ChecksumWriter<W> {
    pub fn new(inner: W, algorithm: DigestAlgorithm) -> Self {
        Self {
            inner,
            algorithm,
            hasher: algorithm.hasher(),
            bytes: 0,
        }
    }

    /// Hand back the inner writer together with the checksum so far
    pub fn finish(self) -> (W, Checksum) {
        let checksum = Checksum {
            algorithm: self.algorithm,
            hex: hex::encode(self.hasher.finalize()),
            bytes: self.bytes,
        };
        (self.inner, checksum)
    }
}

impl<W: Write> Write for ChecksumWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.hasher.update(&buf[..written]);
        self.bytes += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// Write clusters as a pretty-printed JSON array followed by a newline.
///
/// Returns the checksum of every byte written when `digest_algorithm` is set.
pub fn write_clusters<W: Write>(
    clusters: &[ClusterEntry],
    output: &mut W,
    digest_algorithm: Option<DigestAlgorithm>,
) -> Result<Option<Checksum>, ClusterError> {
    match digest_algorithm {
        Some(algorithm) => {
            let mut writer = ChecksumWriter::new(output, algorithm);
            write_json(clusters, &mut writer)?;
            let (_, checksum) = writer.finish();
            Ok(Some(checksum))
        }
        None => {
            write_json(clusters, output)?;
            Ok(None)
        }
    }
}

fn write_json<W: Write>(clusters: &[ClusterEntry], output: &mut W) -> Result<(), ClusterError> {
    serde_json::to_writer_pretty(&mut *output, clusters).map_err(|e| {
        if e.is_io() {
            ClusterError::Io(e.into())
        } else {
            ClusterError::Serialize(e)
        }
    })?;
    output.write_all(b"\n")?;
    output.flush()?;
    Ok(())
}
