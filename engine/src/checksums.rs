//! Content checksums used to confirm a destination write before a source is removed.
//!
//! Two algorithms are offered: SHA-256 and BLAKE3. Both stream the file in
//! 64 KB chunks so large media files are never held in memory.

use crate::error::EngineError;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Supported checksum algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumAlgorithm {
    /// SHA-256 (cryptographic, 256-bit)
    Sha256,
    /// BLAKE3 (modern, fast, 256-bit)
    Blake3,
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256 => write!(f, "sha256"),
            Self::Blake3 => write!(f, "blake3"),
        }
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sha256" => Ok(Self::Sha256),
            "blake3" => Ok(Self::Blake3),
            other => Err(format!(
                "unknown checksum algorithm '{}', expected 'sha256' or 'blake3'",
                other
            )),
        }
    }
}

/// A computed checksum value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumValue {
    algorithm: ChecksumAlgorithm,
    hex: String,
}

impl ChecksumValue {
    pub fn algorithm(&self) -> ChecksumAlgorithm {
        self.algorithm
    }

    pub fn hex(&self) -> &str {
        &self.hex
    }
}

impl fmt::Display for ChecksumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex)
    }
}

enum Hasher {
    Sha256(sha2::Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl Hasher {
    fn new(algorithm: ChecksumAlgorithm) -> Self {
        match algorithm {
            ChecksumAlgorithm::Sha256 => {
                use sha2::Digest;
                Hasher::Sha256(sha2::Sha256::new())
            }
            ChecksumAlgorithm::Blake3 => Hasher::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Sha256(hasher) => {
                use sha2::Digest;
                hasher.update(data);
            }
            Hasher::Blake3(hasher) => {
                hasher.update(data);
            }
        }
    }

    fn finalize(self) -> ChecksumValue {
        match self {
            Hasher::Sha256(hasher) => {
                use sha2::Digest;
                ChecksumValue {
                    algorithm: ChecksumAlgorithm::Sha256,
                    hex: format!("{:x}", hasher.finalize()),
                }
            }
            Hasher::Blake3(hasher) => ChecksumValue {
                algorithm: ChecksumAlgorithm::Blake3,
                hex: hasher.finalize().to_hex().to_string(),
            },
        }
    }
}

/// Compute checksum for a file
pub fn compute_file_checksum(
    path: &Path,
    algorithm: ChecksumAlgorithm,
) -> Result<ChecksumValue, EngineError> {
    let mut file = File::open(path).map_err(|e| EngineError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut hasher = Hasher::new(algorithm);
    let mut buffer = [0u8; 65536];
    loop {
        match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => hasher.update(&buffer[..n]),
            Err(e) => {
                return Err(EngineError::ReadError {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        }
    }

    Ok(hasher.finalize())
}

/// Compare the checksums of two files, returning whether they match.
pub fn files_match(
    source: &Path,
    destination: &Path,
    algorithm: ChecksumAlgorithm,
) -> Result<bool, EngineError> {
    let src = compute_file_checksum(source, algorithm)?;
    let dst = compute_file_checksum(destination, algorithm)?;
    Ok(src == dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_sha256_known_value() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("hello.txt");
        fs::write(&path, b"hello").expect("Failed to write file");

        let sum = compute_file_checksum(&path, ChecksumAlgorithm::Sha256).expect("checksum");
        assert_eq!(
            sum.hex(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(sum.algorithm(), ChecksumAlgorithm::Sha256);
    }

    #[test]
    fn test_blake3_detects_difference() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let a = temp_dir.path().join("a.bin");
        let b = temp_dir.path().join("b.bin");
        let c = temp_dir.path().join("c.bin");
        fs::write(&a, b"same bytes").expect("write a");
        fs::write(&b, b"same bytes").expect("write b");
        fs::write(&c, b"other bytes").expect("write c");

        assert!(files_match(&a, &b, ChecksumAlgorithm::Blake3).expect("compare"));
        assert!(!files_match(&a, &c, ChecksumAlgorithm::Blake3).expect("compare"));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let result = compute_file_checksum(&temp_dir.path().join("gone"), ChecksumAlgorithm::Blake3);
        assert!(matches!(result, Err(EngineError::ReadError { .. })));
    }

    #[test]
    fn test_parse_algorithm() {
        assert_eq!("BLAKE3".parse::<ChecksumAlgorithm>(), Ok(ChecksumAlgorithm::Blake3));
        assert_eq!("sha256".parse::<ChecksumAlgorithm>(), Ok(ChecksumAlgorithm::Sha256));
        assert!("md5".parse::<ChecksumAlgorithm>().is_err());
    }
}
