//! Cell: the atomic unit of data
//! 单元格：数据的原子单位

use crate::CellKey;

/// A versioned cell. `val == None` is an erasure: a tombstone covering
/// all versions of (row, column) at or below its timestamp.
/// 版本化单元格。`val == None` 为墓碑：覆盖（行、列）在其时间戳及以下的所有版本。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
  pub key: CellKey,
  pub val: Option<Box<[u8]>>,
}

impl Cell {
  #[inline]
  pub fn put(
    row: impl Into<Box<[u8]>>,
    col: impl Into<Box<[u8]>>,
    ts: i64,
    val: impl Into<Box<[u8]>>,
  ) -> Self {
    Self {
      key: CellKey::new(row, col, ts),
      val: Some(val.into()),
    }
  }

  #[inline]
  pub fn erase(row: impl Into<Box<[u8]>>, col: impl Into<Box<[u8]>>, ts: i64) -> Self {
    Self {
      key: CellKey::new(row, col, ts),
      val: None,
    }
  }

  #[inline]
  pub fn is_erasure(&self) -> bool {
    self.val.is_none()
  }

  /// Approximate in-memory payload size
  /// 近似内存负载大小
  #[inline]
  pub fn size(&self) -> usize {
    self.key.row.len()
      + self.key.col.len()
      + size_of::<i64>()
      + self.val.as_ref().map_or(0, |v| v.len())
  }
}
