#![cfg_attr(docsrs, feature(doc_cfg))]

//! tdb_tablet - Tablet assembly over the storage crates
//! 基于各存储 crate 的 tablet 组装
//!
//! Wires the log fragment, disk fragments, WAL, block cache and commit
//! ring into one tablet: mutations land in the WAL and the log
//! fragment, flushes turn the log fragment into a disk fragment,
//! compactions fold disk fragments together, and recovery replays the
//! WAL oldest file first.
//! 将日志分片、磁盘分片、WAL、块缓存与提交环装配为一个 tablet：变更落入
//! WAL 与日志分片，刷盘把日志分片变成磁盘分片，压缩折叠磁盘分片，恢复按
//! 最旧文件在前重放 WAL。

mod config;
mod error;
mod factory;
mod loader;
mod replay;
mod scanner;
mod tablet;

pub use config::{FileConfig, TabletConfig};
pub use error::{Error, Result};
pub use factory::{FragRemover, FragWriterFactory};
pub use loader::{CachedLoader, DiskLoader, Families, Loader, SwitchedLoader};
pub use replay::replay_dir;
pub use scanner::Scanner;
pub use tablet::{Conf, Tablet};
