//! tdb_frag - Sorted cell fragments
//! 有序单元格分片
//!
//! A fragment is an immutable or mutable provider of a sorted cell
//! sequence. Concrete forms: `DiskFrag` (versioned binary file of
//! crc-trailed cell blocks with a first-key index) and `LogFrag`
//! (in-memory sorted table backed by the write-ahead log).
//! 分片是不可变或可变的有序单元格来源。具体形式：`DiskFrag`（带首键索引、
//! 块级 crc 的版本化二进制文件）与 `LogFrag`（由预写日志支撑的内存有序表）。

mod block;
mod disk;
mod error;
mod foot;
mod frag;
mod log;
mod write;

pub use block::{BLOCK_CELLS_HINT, FragBlock};
pub use disk::DiskFrag;
pub use error::{Error, Result};
pub use foot::{FILE_MAGIC, FORMAT_VERSION};
pub use frag::Frag;
pub use log::LogFrag;
pub use write::{DEFAULT_BLOCK_SIZE, FragMeta, FragWriter};
