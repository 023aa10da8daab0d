//! Restartable scan over a fragment snapshot
//! 对分片快照的可重启扫描

use std::rc::Rc;

use tdb_cache::BlockCache;
use tdb_cell::{CellKey, CellOutput, ScanPredicate};
use tdb_frag::Frag;
use tdb_merge::Merge;

use crate::Result;

/// A scan holds its own snapshot of the fragment list, so flushes and
/// compactions that swap the tablet's list never disturb it; the
/// fragments it references stay alive until it drops. One merge lives
/// for the scanner's lifetime: erasure cover and history budget carry
/// across `fetch` budget boundaries instead of resetting at each one.
/// 扫描持有分片列表的独立快照，刷盘与压缩换列表不影响它；其引用的分片在
/// 其存活期内不会消失。一个合并贯穿扫描器整个生命周期：墓碑覆盖与历史预算
/// 跨越 `fetch` 限额边界延续，不在每次边界处重置。
pub struct Scanner {
  frags: Rc<Vec<Frag>>,
  cache: Rc<BlockCache>,
  pred: ScanPredicate,
  /// Built on first fetch, then kept until the scan is drained
  /// 首次 fetch 时构建，扫描取尽前一直保留
  merge: Option<Merge>,
  cursor: Option<CellKey>,
  done: bool,
}

impl Scanner {
  pub(crate) fn new(
    frags: Rc<Vec<Frag>>,
    cache: Rc<BlockCache>,
    pred: ScanPredicate,
    start_after: Option<CellKey>,
  ) -> Self {
    Self {
      frags,
      cache,
      pred,
      merge: None,
      cursor: start_after,
      done: false,
    }
  }

  /// Deliver at most `max_cells` cells or `max_size` bytes into `out`;
  /// returns whether more may remain
  /// 向 `out` 交付至多 `max_cells` 条或 `max_size` 字节；返回是否可能还有
  pub async fn fetch(
    &mut self,
    max_cells: usize,
    max_size: usize,
    out: &mut impl CellOutput,
  ) -> Result<bool> {
    if self.done {
      return Ok(false);
    }
    let merge = match &mut self.merge {
      Some(merge) => merge,
      none => {
        let merge = Merge::new(
          &self.frags,
          self.cache.clone(),
          self.pred.clone(),
          self.cursor.as_ref(),
        )
        .await?;
        none.insert(merge)
      }
    };
    let more = merge.copy_merged(max_cells, max_size, out).await?;
    self.cursor = merge.last_key().cloned();
    self.done = !more;
    Ok(more)
  }

  /// Cursor to hand a future scanner for resuming this scan
  /// 交给后续扫描器以恢复此扫描的游标
  #[inline]
  pub fn cursor(&self) -> Option<&CellKey> {
    self.cursor.as_ref()
  }
}
