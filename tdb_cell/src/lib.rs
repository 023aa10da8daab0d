//! tdb_cell - Versioned cell model for tdb
//! tdb 的版本化单元格模型
//!
//! A cell is (row, column, timestamp, value-or-erasure). Cells order by
//! row asc, column asc, timestamp desc (newest version first).
//! 单元格为（行、列、时间戳、值或墓碑）。排序为行升序、列升序、时间戳降序（最新版本在前）。

mod buffer;
mod cell;
mod error;
mod key;
mod output;
mod pred;

pub use buffer::{CellBuffer, pack, push_cell, read_cell};
pub use cell::Cell;
pub use error::{Error, Result};
pub use key::{CellKey, family};
pub use output::{CellOutput, CellVec};
pub use pred::{IntervalSet, ScanPredicate};
