//! tdb_merge - K-way fragment merge and compactor
//! K 路分片合并与压缩器
//!
//! Merges N fragments into one sorted, deduplicated, predicate-filtered
//! cell stream, pulling disk blocks through the block cache. Work per
//! call is bounded so many scans can share a runtime cooperatively.
//! 将 N 个分片合并为一个有序、去重、按谓词过滤的单元格流，经块缓存拉取磁盘块。
//! 每次调用的工作量有界，让多个扫描在运行时上协作共享。

mod compact;
mod input;
mod merge;

pub use compact::{CompactKind, Compactor};
pub use merge::Merge;
