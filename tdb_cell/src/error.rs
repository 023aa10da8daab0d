//! Error types
//! 错误类型

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
  #[error("bad cell buffer magic")]
  BadMagic,

  #[error("cell buffer checksum mismatch: expected {expected}, got {actual}")]
  Checksum { expected: u32, actual: u32 },

  #[error("cell buffer truncated at {offset}")]
  Truncated { offset: usize },

  #[error("cells out of order in buffer")]
  BadOrder,
}

pub type Result<T> = std::result::Result<T, Error>;
