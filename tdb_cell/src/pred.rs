//! Scan predicate: row / column / timestamp filter
//! 扫描谓词：行 / 列 / 时间戳过滤

use std::ops::{Bound, RangeBounds};

use crate::Cell;

/// Sorted, non-overlapping interval set
/// 有序不重叠区间集
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalSet<T: Ord> {
  /// (start, end) pairs sorted by start
  /// 按起点排序的（起点，终点）对
  ranges: Vec<(Bound<T>, Bound<T>)>,
}

impl<T: Ord + Clone> IntervalSet<T> {
  #[inline]
  pub fn new() -> Self {
    Self { ranges: Vec::new() }
  }

  /// Add one interval. Intervals are expected disjoint and in order;
  /// membership stays correct either way, only skip estimates degrade.
  /// 添加一个区间。期望区间不相交且有序；乱序只影响跳过估计，不影响正确性。
  #[inline]
  pub fn add(&mut self, range: impl RangeBounds<T>) -> &mut Self {
    self
      .ranges
      .push((range.start_bound().cloned(), range.end_bound().cloned()));
    self
  }

  #[inline]
  pub fn point(&mut self, v: T) -> &mut Self {
    self.add(v.clone()..=v)
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.ranges.is_empty()
  }

  pub fn contains(&self, v: &T) -> bool {
    self.ranges.iter().any(|(s, e)| {
      let ge = match s {
        Bound::Included(s) => v >= s,
        Bound::Excluded(s) => v > s,
        Bound::Unbounded => true,
      };
      let le = match e {
        Bound::Included(e) => v <= e,
        Bound::Excluded(e) => v < e,
        Bound::Unbounded => true,
      };
      ge && le
    })
  }

  /// Whether [lo, hi] could intersect any interval. `hi == None` means
  /// unbounded above. Used for block skipping.
  /// [lo, hi] 是否可能与某区间相交。`hi == None` 表示无上界。用于块跳过。
  pub fn overlaps(&self, lo: &T, hi: Option<&T>) -> bool {
    self.ranges.iter().any(|(s, e)| {
      let below = match e {
        Bound::Included(e) => e < lo,
        Bound::Excluded(e) => e <= lo,
        Bound::Unbounded => false,
      };
      let above = match (hi, s) {
        (Some(hi), Bound::Included(s)) => s > hi,
        (Some(hi), Bound::Excluded(s)) => s >= hi,
        _ => false,
      };
      !below && !above
    })
  }
}

/// Immutable filter applied identically to live scans and compaction
/// merges. `None` sets mean "all".
/// 不可变过滤器，在实时扫描与合并压缩中同样生效。`None` 表示全部。
#[derive(Debug, Clone, Default)]
pub struct ScanPredicate {
  pub rows: Option<IntervalSet<Box<[u8]>>>,
  pub cols: Option<IntervalSet<Box<[u8]>>>,
  pub times: Option<IntervalSet<i64>>,
  /// Keep at most this many versions per (row, column); 0 = unlimited
  /// 每（行、列）最多保留的版本数；0 为不限
  pub max_history: usize,
  /// Drop erasures from output (they still suppress older versions)
  /// 从输出中去掉墓碑（仍会压制更旧版本）
  pub filter_erasures: bool,
}

impl ScanPredicate {
  /// Unconstrained predicate: all rows, all columns, all times
  /// 无约束谓词：全部行、列、时间
  #[inline]
  pub fn all() -> Self {
    Self::default()
  }

  #[inline]
  pub fn rows(mut self, rows: IntervalSet<Box<[u8]>>) -> Self {
    self.rows = Some(rows);
    self
  }

  #[inline]
  pub fn cols(mut self, cols: IntervalSet<Box<[u8]>>) -> Self {
    self.cols = Some(cols);
    self
  }

  #[inline]
  pub fn times(mut self, times: IntervalSet<i64>) -> Self {
    self.times = Some(times);
    self
  }

  #[inline]
  pub fn max_history(mut self, k: usize) -> Self {
    self.max_history = k;
    self
  }

  #[inline]
  pub fn filter_erasures(mut self, yes: bool) -> Self {
    self.filter_erasures = yes;
    self
  }

  #[inline]
  pub fn contains_row(&self, row: &[u8]) -> bool {
    match &self.rows {
      Some(set) => set.contains(&Box::from(row)),
      None => true,
    }
  }

  /// Row / column / timestamp set membership (history and erasure
  /// handling are the merge engine's concern)
  /// 行 / 列 / 时间戳集合匹配（历史与墓碑处理由合并引擎负责）
  pub fn matches(&self, cell: &Cell) -> bool {
    if !self.contains_row(&cell.key.row) {
      return false;
    }
    if let Some(cols) = &self.cols
      && !cols.contains(&cell.key.col)
    {
      return false;
    }
    if let Some(times) = &self.times
      && !times.contains(&cell.key.ts)
    {
      return false;
    }
    true
  }

  /// Could rows in [lo, hi] match? `hi == None` means unbounded.
  /// [lo, hi] 内的行是否可能匹配？`hi == None` 表示无上界。
  #[inline]
  pub fn overlaps_rows(&self, lo: &[u8], hi: Option<&[u8]>) -> bool {
    match &self.rows {
      Some(set) => set.overlaps(&Box::from(lo), hi.map(Box::from).as_ref()),
      None => true,
    }
  }
}
