#![cfg_attr(docsrs, feature(doc_cfg))]

//! tdb_wal - Write-ahead log for cell batches
//! 单元格批次的预写日志
//!
//! Each log file carries a head and a sequence of framed (table, data)
//! entries. The reader distinguishes a clean end, a torn final write
//! (normal after a crash) and real mid-file corruption; the directory
//! reader yields files oldest first, the only safe replay order.
//! 每个日志文件含文件头与一串帧化（表、数据）条目。读取器区分正常结尾、
//! 撕裂的末次写入（崩溃后的常态）与文件中段的真实损坏；目录读取器按最旧
//! 在前产出文件，这是唯一安全的重放顺序。

mod dir;
mod error;
mod reader;
mod wire;
mod writer;

pub use dir::{LogDirReader, pseudo_numeric_cmp};
pub use error::{Error, Result};
pub use reader::{LogEntry, LogReader, Next};
pub use wire::{ENTRY_MAGIC, EntryHead, FILE_MAGIC, FORMAT_VERSION, FileHead};
pub use writer::LogWriter;
