//! Cell output sink
//! 单元格输出接收器

use crate::Cell;

/// Consumer of merged / scanned cells. Producers bound their work per
/// call by the sink's running cell count and data size.
/// 合并 / 扫描单元格的消费者。生产者按接收器的累计条数与字节数限制每次调用的工作量。
pub trait CellOutput {
  fn emit(&mut self, cell: Cell);

  /// Cells emitted so far
  /// 已输出条数
  fn cell_count(&self) -> usize;

  /// Payload bytes emitted so far
  /// 已输出字节数
  fn data_size(&self) -> usize;
}

/// Vec-backed sink
/// 基于 Vec 的接收器
#[derive(Debug, Default)]
pub struct CellVec {
  pub cells: Vec<Cell>,
  size: usize,
}

impl CellVec {
  #[inline]
  pub fn new() -> Self {
    Self::default()
  }

  /// Take accumulated cells, resetting counters
  /// 取走累计单元格并重置计数
  #[inline]
  pub fn take(&mut self) -> Vec<Cell> {
    self.size = 0;
    std::mem::take(&mut self.cells)
  }
}

impl CellOutput for CellVec {
  #[inline]
  fn emit(&mut self, cell: Cell) {
    self.size += cell.size();
    self.cells.push(cell);
  }

  #[inline]
  fn cell_count(&self) -> usize {
    self.cells.len()
  }

  #[inline]
  fn data_size(&self) -> usize {
    self.size
  }
}
