//! Error types for tdb_tablet
//! tdb_tablet 错误类型定义

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
  #[error("IO: {0}")]
  Io(#[from] std::io::Error),

  #[error("fragment: {0}")]
  Frag(#[from] tdb_frag::Error),

  #[error("log: {0}")]
  Wal(#[from] tdb_wal::Error),

  #[error("cell codec: {0}")]
  Cell(#[from] tdb_cell::Error),

  #[error("commit: {0}")]
  Commit(#[from] tdb_commit::Error),

  #[error("no loader registered for fragment uri: {uri}")]
  UnknownScheme { uri: String },

  #[error("tablet config: {0}")]
  Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
