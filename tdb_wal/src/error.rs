//! Error types for tdb_wal
//! tdb_wal 错误类型定义

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
  #[error("IO: {0}")]
  Io(#[from] std::io::Error),

  #[error("bad log file magic")]
  BadMagic,

  #[error("unsupported log version {found}")]
  BadVersion { found: u32 },

  #[error("entry checksum mismatch: expected {expected}, got {actual}")]
  Checksum { expected: u32, actual: u32 },

  #[error("table name too long: {len} bytes")]
  NameTooLong { len: usize },

  #[error("entry data too large: {len} bytes")]
  DataTooLarge { len: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
