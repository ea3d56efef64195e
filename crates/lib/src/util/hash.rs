//! Hashing utilities for artifact verification.
//!
//! This module provides:
//! - `ContentHash`: A full 64-character SHA-256 hash
//! - `copy_hashed()`: Stream copy that hashes the bytes it moves
//! - `hash_bytes()`: In-memory hashing

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const COPY_BUF_SIZE: usize = 64 * 1024;

/// A full 64-character SHA256 hash of some content.
///
/// # Format
///
/// The hash is a lowercase hexadecimal string (64 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Copy `reader` to `writer` until EOF, hashing every byte.
///
/// Returns the number of bytes copied and their hash. The writer is flushed
/// before returning.
pub async fn copy_hashed<R, W>(reader: &mut R, writer: &mut W) -> std::io::Result<(u64, ContentHash)>
where
  R: AsyncRead + Unpin + ?Sized,
  W: AsyncWrite + Unpin + ?Sized,
{
  let mut hasher = Sha256::new();
  let mut buf = vec![0u8; COPY_BUF_SIZE];
  let mut total = 0u64;

  loop {
    let n = reader.read(&mut buf).await?;
    if n == 0 {
      break;
    }
    hasher.update(&buf[..n]);
    writer.write_all(&buf[..n]).await?;
    total += n as u64;
  }
  writer.flush().await?;

  Ok((total, ContentHash(hex::encode(hasher.finalize()))))
}

/// Hash arbitrary bytes.
pub fn hash_bytes(bytes: &[u8]) -> ContentHash {
  ContentHash(hex::encode(Sha256::digest(bytes)))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hash_bytes_known_value() {
    // sha256("") is a well-known constant
    assert_eq!(
      hash_bytes(b"").0,
      "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
  }

  #[tokio::test]
  async fn copy_hashed_matches_hash_bytes() {
    let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    let mut reader = data.as_slice();
    let mut out = Vec::new();

    let (n, hash) = copy_hashed(&mut reader, &mut out).await.unwrap();

    assert_eq!(n, data.len() as u64);
    assert_eq!(out, data);
    assert_eq!(hash, hash_bytes(&data));
  }
}
