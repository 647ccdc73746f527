//! Client-facing error type. The codec layer (`encoding`, `service`) returns its own
//! `DecodeError`/`EncodeError`; this is the `thiserror`-derived wrapper the transport and
//! device-facade layers actually hand to callers.

use thiserror::Error;

use crate::encoding::{DecodeError, EncodeError};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("timed out waiting for a reply")]
    Timeout,

    #[error("unexpected invoke id: expected {expected}, got {got}")]
    UnexpectedInvokeId { expected: u8, got: u8 },

    #[error("unexpected service choice: expected {expected}, got {got}")]
    UnexpectedServiceChoice { expected: u8, got: u8 },

    #[error("no cached device state: call update() first")]
    NotUpdated,
}
