//! Error types for tdb_frag
//! tdb_frag 错误类型定义

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
  #[error("IO: {0}")]
  Io(#[from] std::io::Error),

  #[error("fragment too small: {size} bytes")]
  TooSmall { size: u64 },

  #[error("bad fragment magic/version")]
  BadMagic,

  #[error("checksum mismatch: expected {expected}, got {actual}")]
  Checksum { expected: u32, actual: u32 },

  #[error("invalid block index")]
  InvalidIndex,

  #[error("invalid block at offset {offset}")]
  InvalidBlock { offset: u64 },

  #[error("cell put out of order: key must strictly increase")]
  OutOfOrder,

  #[error("cell codec: {0}")]
  Cell(#[from] tdb_cell::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
