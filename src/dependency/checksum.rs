//! Algorithm-tagged content digests
//!
//! A checksum is written as `algorithm:hex`, e.g. `sha256:2c26b4...`. A bare
//! hex digest is taken to be SHA-256.

use crate::error::{PakError, PakResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

/// Supported digest algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }

    /// Start a streaming hash for this algorithm
    pub fn hasher(&self) -> Hasher {
        match self {
            Self::Sha224 => Hasher::Sha224(Sha224::new()),
            Self::Sha256 => Hasher::Sha256(Sha256::new()),
            Self::Sha384 => Hasher::Sha384(Sha384::new()),
            Self::Sha512 => Hasher::Sha512(Sha512::new()),
        }
    }
}

impl FromStr for Algorithm {
    type Err = PakError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha224" => Ok(Self::Sha224),
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            other => Err(PakError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Streaming digest computation; also usable as an `io::Write` sink
pub enum Hasher {
    Sha224(Sha224),
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
}

impl Hasher {
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha224(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
            Self::Sha384(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
        }
    }

    /// Lowercase hex digest
    pub fn finalize_hex(self) -> String {
        match self {
            Self::Sha224(h) => hex::encode(h.finalize()),
            Self::Sha256(h) => hex::encode(h.finalize()),
            Self::Sha384(h) => hex::encode(h.finalize()),
            Self::Sha512(h) => hex::encode(h.finalize()),
        }
    }
}

impl io::Write for Hasher {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// An algorithm paired with a hex digest
#[derive(Debug, Clone)]
pub struct Checksum {
    algorithm: Algorithm,
    hash: String,
}

impl Checksum {
    pub fn new(algorithm: Algorithm, hash: impl Into<String>) -> Self {
        Self {
            algorithm,
            hash: hash.into().to_ascii_lowercase(),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Hex digest without the algorithm tag
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Digest `reader` with this checksum's algorithm
    pub fn compute(&self, reader: &mut impl Read) -> io::Result<Checksum> {
        let mut hasher = self.algorithm.hasher();
        io::copy(reader, &mut hasher)?;
        Ok(Self::new(self.algorithm, hasher.finalize_hex()))
    }

    /// Digest the file at `path` with this checksum's algorithm
    pub fn compute_file(&self, path: &Path) -> PakResult<Checksum> {
        let mut file = File::open(path)
            .map_err(|e| PakError::io(format!("opening {}", path.display()), e))?;
        self.compute(&mut file)
            .map_err(|e| PakError::io(format!("hashing {}", path.display()), e))
    }
}

impl PartialEq for Checksum {
    fn eq(&self, other: &Self) -> bool {
        self.algorithm == other.algorithm && self.hash.eq_ignore_ascii_case(&other.hash)
    }
}

impl Eq for Checksum {}

impl FromStr for Checksum {
    type Err = PakError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (algorithm, hash) = match s.split_once(':') {
            Some((algorithm, hash)) => (algorithm.parse::<Algorithm>()?, hash),
            None => (Algorithm::Sha256, s),
        };

        if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(PakError::InvalidChecksum(s.to_string()));
        }

        Ok(Self::new(algorithm, hash))
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hash)
    }
}

impl Serialize for Checksum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Checksum {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
