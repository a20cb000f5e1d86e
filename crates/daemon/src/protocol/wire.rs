// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Length-prefixed JSON framing.
//!
//! Each message is a 4-byte big-endian length followed by that many bytes
//! of JSON. The cap guards against a corrupt or hostile peer making the
//! daemon allocate gigabytes.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum frame size: 16 MiB.
pub const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame of {0} bytes exceeds the {MAX_FRAME_BYTES} byte cap")]
    FrameTooLarge(usize),

    #[error("connection closed")]
    Closed,
}

/// Encode a message into a framed byte vector.
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, ProtocolError> {
    let body = serde_json::to_vec(message)?;
    if body.len() > MAX_FRAME_BYTES {
        return Err(ProtocolError::FrameTooLarge(body.len()));
    }
    let mut framed = Vec::with_capacity(4 + body.len());
    framed.extend_from_slice(&(body.len() as u32).to_be_bytes());
    framed.extend_from_slice(&body);
    Ok(framed)
}

/// Decode one framed message from a byte slice, returning the value and
/// the bytes consumed.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<(T, usize), ProtocolError> {
    if bytes.len() < 4 {
        return Err(ProtocolError::Closed);
    }
    let len = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    if len > MAX_FRAME_BYTES {
        return Err(ProtocolError::FrameTooLarge(len));
    }
    if bytes.len() < 4 + len {
        return Err(ProtocolError::Closed);
    }
    let value = serde_json::from_slice(&bytes[4..4 + len])?;
    Ok((value, 4 + len))
}

/// Read one framed message. `Ok(None)` on clean EOF at a frame boundary.
pub async fn read_message<T, R>(reader: &mut R) -> Result<Option<T>, ProtocolError>
where
    T: DeserializeOwned,
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_BYTES {
        return Err(ProtocolError::FrameTooLarge(len));
    }
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some(serde_json::from_slice(&body)?))
}

/// Write one framed message and flush.
pub async fn write_message<T, W>(writer: &mut W, message: &T) -> Result<(), ProtocolError>
where
    T: Serialize,
    W: AsyncWrite + Unpin,
{
    let framed = encode(message)?;
    writer.write_all(&framed).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
