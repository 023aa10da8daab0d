//! Closed fragment variant
//! 封闭分片变体

use std::rc::Rc;

use tdb_cell::{CellOutput, IntervalSet, ScanPredicate};

use crate::{DiskFrag, LogFrag, Result};

/// A sorted cell source backing part of a tablet. Shared by any number
/// of concurrent scans; a fragment outlives every scan that holds a
/// clone of its handle.
/// 支撑 tablet 一部分的有序单元格来源。可被任意数量的并发扫描共享；
/// 分片存活到持有其句柄克隆的扫描全部结束。
#[derive(Debug, Clone)]
pub enum Frag {
  Disk(Rc<DiskFrag>),
  Log(LogFrag),
}

impl Frag {
  #[inline]
  pub fn is_immutable(&self) -> bool {
    matches!(self, Frag::Disk(_))
  }

  /// Fragment name: file path for disk, a fixed tag for the log view
  /// 分片名：磁盘为文件路径，日志视图为固定标签
  pub fn name(&self) -> String {
    match self {
      Frag::Disk(d) => d.path().display().to_string(),
      Frag::Log(_) => "memlog".into(),
    }
  }

  /// Disk size estimate over a row interval. The log fragment reports
  /// its in-memory size regardless of interval.
  /// 行区间的磁盘大小估计。日志分片不分区间，报告内存大小。
  pub fn disk_size(&self, rows: Option<&IntervalSet<Box<[u8]>>>) -> u64 {
    match self {
      Frag::Disk(d) => d.disk_size(rows),
      Frag::Log(l) => l.size() as u64,
    }
  }

  /// Full predicate scan in canonical order
  /// 按规范顺序的谓词全扫描
  pub async fn scan(&self, pred: &ScanPredicate, out: &mut impl CellOutput) -> Result<()> {
    match self {
      Frag::Disk(d) => d.scan(pred, out).await,
      Frag::Log(l) => {
        l.scan(pred, out);
        Ok(())
      }
    }
  }

  #[inline]
  pub fn as_disk(&self) -> Option<&Rc<DiskFrag>> {
    match self {
      Frag::Disk(d) => Some(d),
      Frag::Log(_) => None,
    }
  }
}

impl From<DiskFrag> for Frag {
  #[inline]
  fn from(d: DiskFrag) -> Self {
    Frag::Disk(Rc::new(d))
  }
}

impl From<LogFrag> for Frag {
  #[inline]
  fn from(l: LogFrag) -> Self {
    Frag::Log(l)
  }
}
