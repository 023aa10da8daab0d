//! Merge inputs: one cursor per fragment
//! 合并输入：每分片一个游标

use std::rc::Rc;

use tdb_cache::BlockCache;
use tdb_cell::{Cell, CellKey, ScanPredicate};
use tdb_frag::{BLOCK_CELLS_HINT, DiskFrag, Frag, FragBlock, LogFrag, Result};

/// Cursor over one fragment's cell sequence with a read-ahead window:
/// a pinned cache block for disk, a copied range window for the log.
/// 单个分片单元格序列的游标，带预读窗口：磁盘为钉住的缓存块，日志为拷出的范围窗口。
pub(crate) enum Input {
  Disk(DiskInput),
  Log(LogInput),
}

impl Input {
  pub fn new(frag: &Frag) -> Self {
    match frag {
      Frag::Disk(d) => Input::Disk(DiskInput {
        frag: d.clone(),
        next_addr: 0,
        block: None,
        pos: 0,
      }),
      Frag::Log(l) => Input::Log(LogInput {
        frag: l.clone(),
        last: None,
        window: Vec::new(),
        pos: 0,
      }),
    }
  }

  /// Pull the next cell, refilling the window as needed
  /// 拉取下一个单元格，按需填充窗口
  pub async fn next(&mut self, cache: &BlockCache, pred: &ScanPredicate) -> Result<Option<Cell>> {
    match self {
      Input::Disk(d) => d.next(cache, pred).await,
      Input::Log(l) => Ok(l.next()),
    }
  }

  /// Fast-forward so the next pulled cell is strictly after `key`
  /// 快进：下一个拉取的单元格严格大于 `key`
  pub async fn seek_after(
    &mut self,
    key: &CellKey,
    cache: &BlockCache,
    pred: &ScanPredicate,
  ) -> Result<()> {
    match self {
      Input::Disk(d) => d.seek_after(key, cache, pred).await,
      Input::Log(l) => {
        l.seek_after(key);
        Ok(())
      }
    }
  }
}

pub(crate) struct DiskInput {
  frag: Rc<DiskFrag>,
  next_addr: usize,
  /// Pin on the block being read; dropped when the block is exhausted
  /// 正在读取的块的钉；块耗尽时释放
  block: Option<Rc<FragBlock>>,
  pos: usize,
}

impl DiskInput {
  async fn next(&mut self, cache: &BlockCache, pred: &ScanPredicate) -> Result<Option<Cell>> {
    loop {
      if let Some(block) = &self.block {
        if self.pos < block.cells.len() {
          let cell = block.cells[self.pos].clone();
          self.pos += 1;
          return Ok(Some(cell));
        }
        self.block = None;
      }

      let Some(addr) = self.frag.next_block(pred, self.next_addr) else {
        return Ok(None);
      };
      let block = cache.get_block(&self.frag, addr).await?;
      self.next_addr = addr + 1;
      self.pos = 0;
      // A block may decode empty under a family restriction
      // 列族受限时块可能解码为空
      self.block = Some(block);
    }
  }

  async fn seek_after(
    &mut self,
    key: &CellKey,
    cache: &BlockCache,
    pred: &ScanPredicate,
  ) -> Result<()> {
    loop {
      let Some(addr) = self.frag.next_block(pred, self.next_addr) else {
        self.block = None;
        return Ok(());
      };
      let block = cache.get_block(&self.frag, addr).await?;
      self.next_addr = addr + 1;

      // Whole block at or before the cursor: skip without scanning
      // 整块不超过游标：整块跳过
      if block.cells.last().is_some_and(|c| c.key <= *key) {
        continue;
      }
      self.pos = block.seek_after(key);
      self.block = Some(block);
      return Ok(());
    }
  }
}

pub(crate) struct LogInput {
  frag: LogFrag,
  /// Key of the last cell handed out; the live view refills after it
  /// 上次交出的单元格键；实时视图从其后填充
  last: Option<CellKey>,
  window: Vec<Cell>,
  pos: usize,
}

impl LogInput {
  fn next(&mut self) -> Option<Cell> {
    if self.pos >= self.window.len() {
      self.window = self.frag.read_after(self.last.as_ref(), BLOCK_CELLS_HINT);
      self.pos = 0;
      if self.window.is_empty() {
        return None;
      }
    }
    let cell = self.window[self.pos].clone();
    self.pos += 1;
    self.last = Some(cell.key.clone());
    Some(cell)
  }

  fn seek_after(&mut self, key: &CellKey) {
    self.last = Some(key.clone());
    self.window.clear();
    self.pos = 0;
  }
}
