//! Mutable log fragment: in-memory sorted table
//! 可变日志分片：内存有序表
//!
//! Holds the cells made durable by the write-ahead log but not yet
//! flushed into a disk fragment. Scans are a live, always-current view;
//! no snapshot isolation beyond what the caller serializes.
//! 保存已由预写日志持久化但尚未刷入磁盘分片的单元格。扫描为实时视图；
//! 除调用方自行串行化外无快照隔离。

use std::{
  cell::RefCell,
  collections::BTreeMap,
  ops::Bound,
  rc::Rc,
};

use tdb_cell::{Cell, CellKey, CellOutput, ScanPredicate};

use crate::block::BLOCK_CELLS_HINT;

#[derive(Debug, Default)]
struct Inner {
  map: BTreeMap<CellKey, Option<Box<[u8]>>>,
  /// Approximate payload bytes
  /// 近似负载字节数
  size: usize,
}

/// Shared handle to the mutable in-memory fragment
/// 可变内存分片的共享句柄
#[derive(Debug, Clone, Default)]
pub struct LogFrag {
  inner: Rc<RefCell<Inner>>,
}

impl LogFrag {
  #[inline]
  pub fn new() -> Self {
    Self::default()
  }

  /// Apply one mutation batch. Same-key writes replace in place.
  /// 应用一个变更批次。同键写入原地替换。
  pub fn apply(&self, cells: &[Cell]) {
    let mut inner = self.inner.borrow_mut();
    for cell in cells {
      let add = cell.size();
      if let Some(old) = inner.map.insert(cell.key.clone(), cell.val.clone()) {
        let dropped = cell.key.row.len()
          + cell.key.col.len()
          + size_of::<i64>()
          + old.as_ref().map_or(0, |v| v.len());
        inner.size -= dropped;
      }
      inner.size += add;
    }
  }

  #[inline]
  pub fn cell_count(&self) -> usize {
    self.inner.borrow().map.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.inner.borrow().map.is_empty()
  }

  /// Approximate memory size, used to decide when to flush
  /// 近似内存大小，用于决定何时刷盘
  #[inline]
  pub fn size(&self) -> usize {
    self.inner.borrow().size
  }

  /// Copy out a bounded window of cells strictly after `start`
  /// (`None` = from the beginning). This is the merge engine's refill
  /// unit for the live view.
  /// 拷出严格位于 `start` 之后的有界单元格窗口（`None` 为从头）。
  /// 这是合并引擎对实时视图的填充单位。
  pub fn read_after(&self, start: Option<&CellKey>, limit: usize) -> Vec<Cell> {
    let inner = self.inner.borrow();
    let lower = match start {
      Some(k) => Bound::Excluded(k.clone()),
      None => Bound::Unbounded,
    };
    inner
      .map
      .range((lower, Bound::Unbounded))
      .take(limit.max(1))
      .map(|(k, v)| Cell {
        key: k.clone(),
        val: v.clone(),
      })
      .collect()
  }

  /// Snapshot the whole table in order (flush path)
  /// 按序快照整表（刷盘路径）
  pub fn cells(&self) -> Vec<Cell> {
    let inner = self.inner.borrow();
    inner
      .map
      .iter()
      .map(|(k, v)| Cell {
        key: k.clone(),
        val: v.clone(),
      })
      .collect()
  }

  /// Live predicate scan in canonical order
  /// 按规范顺序的实时谓词扫描
  pub fn scan(&self, pred: &ScanPredicate, out: &mut impl CellOutput) {
    let mut start: Option<CellKey> = None;
    loop {
      let window = self.read_after(start.as_ref(), BLOCK_CELLS_HINT);
      let Some(last) = window.last() else {
        return;
      };
      start = Some(last.key.clone());
      for cell in window {
        if pred.matches(&cell) {
          out.emit(cell);
        }
      }
    }
  }
}
