//! Cell key and canonical order
//! 单元格键与规范排序

use std::cmp::Ordering;

/// Key of a cell: (row, column, timestamp)
/// 单元格键：（行、列、时间戳）
///
/// Column is "family:qualifier". Timestamp sorts descending so the
/// newest version of a (row, column) comes first.
/// 列格式为 "family:qualifier"。时间戳降序排列，最新版本在前。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CellKey {
  pub row: Box<[u8]>,
  pub col: Box<[u8]>,
  pub ts: i64,
}

impl CellKey {
  #[inline]
  pub fn new(row: impl Into<Box<[u8]>>, col: impl Into<Box<[u8]>>, ts: i64) -> Self {
    Self {
      row: row.into(),
      col: col.into(),
      ts,
    }
  }

  /// Same (row, column) as another key, ignoring timestamp
  /// 与另一键同（行、列），忽略时间戳
  #[inline]
  pub fn same_cell(&self, o: &CellKey) -> bool {
    self.row == o.row && self.col == o.col
  }
}

impl Ord for CellKey {
  #[inline]
  fn cmp(&self, o: &Self) -> Ordering {
    self
      .row
      .cmp(&o.row)
      .then_with(|| self.col.cmp(&o.col))
      // Newest first: timestamp descends
      // 最新在前：时间戳降序
      .then_with(|| o.ts.cmp(&self.ts))
  }
}

impl PartialOrd for CellKey {
  #[inline]
  fn partial_cmp(&self, o: &Self) -> Option<Ordering> {
    Some(self.cmp(o))
  }
}

/// Column family: the part before ':', or the whole column if none
/// 列族：':' 之前的部分，无 ':' 则为整列
#[inline]
pub fn family(col: &[u8]) -> &[u8] {
  match memchr::memchr(b':', col) {
    Some(i) => &col[..i],
    None => col,
  }
}
