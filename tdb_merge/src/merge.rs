//! Heap merge with dedup, erasure suppression and history limit
//! 带去重、墓碑压制与历史上限的堆合并

use std::{cmp::Ordering, collections::BinaryHeap, rc::Rc};

use tdb_cache::BlockCache;
use tdb_cell::{Cell, CellKey, CellOutput, ScanPredicate};
use tdb_frag::{Frag, Result};

use crate::input::Input;

/// Heap slot: the pulled cell plus its input index. Min on
/// (key, input index): index ascending breaks key ties, so with inputs
/// listed newest first the newest fragment wins duplicates.
/// 堆槽：已拉取的单元格及其输入下标。按（键，输入下标）取最小：
/// 下标升序破平，输入按新到旧排列时最新分片赢得重复键。
struct Slot {
  cell: Cell,
  idx: usize,
}

impl PartialEq for Slot {
  fn eq(&self, o: &Self) -> bool {
    self.cell.key == o.cell.key && self.idx == o.idx
  }
}

impl Eq for Slot {}

impl Ord for Slot {
  fn cmp(&self, o: &Self) -> Ordering {
    // Reversed: BinaryHeap is a max-heap, we want the minimum on top
    // 反转：BinaryHeap 为大顶堆，需要最小者在顶
    o.cell
      .key
      .cmp(&self.cell.key)
      .then_with(|| o.idx.cmp(&self.idx))
  }
}

impl PartialOrd for Slot {
  fn partial_cmp(&self, o: &Self) -> Option<Ordering> {
    Some(self.cmp(o))
  }
}

/// K-way merge over fragments, newest listed first. Owns its share of
/// the cache so it can outlive the call that built it; the inputs keep
/// their fragments alive the same way. Filter state (erasure cover,
/// history budget) persists for the merge's lifetime, so budgeted
/// `copy_merged` calls continue where the previous one stopped.
/// 分片的 K 路合并，最新在前。持有缓存的共享引用，可比构建它的调用活得久；
/// 输入同样持有各自分片。过滤状态（墓碑覆盖、历史预算）在合并存活期内保持，
/// 限额的 `copy_merged` 调用从上次停止处继续。
pub struct Merge {
  cache: Rc<BlockCache>,
  pred: ScanPredicate,
  inputs: Vec<Input>,
  heap: BinaryHeap<Slot>,
  /// Last key handed to the filter stage, for duplicate discard
  /// 交给过滤阶段的上一个键，用于丢弃重复
  last_key: Option<CellKey>,
  /// Active erasure cover: same (row, col) cells at or below this
  /// timestamp are suppressed
  /// 当前墓碑覆盖：同（行、列）且时间戳不高于此值的单元格被压制
  cover: Option<CellKey>,
  /// (row, col) the history budget currently counts, and cells emitted
  /// for it so far
  /// 历史预算当前统计的（行、列）及已输出条数
  hist_key: Option<CellKey>,
  hist_emitted: usize,
}

impl Merge {
  /// Build a merge over `frags` (newest first). With `start_after`,
  /// output resumes strictly after that key — the restart cursor for
  /// paginated scans.
  /// 在 `frags`（最新在前）上构建合并。给定 `start_after` 时输出从该键之后
  /// 严格恢复——分页扫描的重启游标。
  pub async fn new(
    frags: &[Frag],
    cache: Rc<BlockCache>,
    pred: ScanPredicate,
    start_after: Option<&CellKey>,
  ) -> Result<Self> {
    let mut inputs: Vec<Input> = frags.iter().map(Input::new).collect();
    let mut heap = BinaryHeap::with_capacity(inputs.len());

    for (idx, input) in inputs.iter_mut().enumerate() {
      if let Some(key) = start_after {
        input.seek_after(key, &cache, &pred).await?;
      }
      if let Some(cell) = input.next(&cache, &pred).await? {
        heap.push(Slot { cell, idx });
      }
    }

    Ok(Self {
      cache,
      pred,
      inputs,
      heap,
      last_key: start_after.cloned(),
      cover: None,
      hist_key: None,
      hist_emitted: 0,
    })
  }

  /// Pop the minimum slot and refill its input
  /// 弹出最小槽并填充其输入
  async fn pop(&mut self) -> Result<Option<Cell>> {
    let Some(Slot { cell, idx }) = self.heap.pop() else {
      return Ok(None);
    };
    if let Some(next) = self.inputs[idx].next(&self.cache, &self.pred).await? {
      self.heap.push(Slot { cell: next, idx });
    }
    Ok(Some(cell))
  }

  /// Filter stage: dedup, predicate, erasure cover, history budget.
  /// Returns the cell to emit, if any.
  /// 过滤阶段：去重、谓词、墓碑覆盖、历史预算。返回要输出的单元格（如有）。
  fn filter(&mut self, cell: Cell) -> Option<Cell> {
    // Stale duplicate of an already-decided key: a lower-priority
    // fragment's version of the same (row, col, ts)
    // 已裁决键的过期重复：较低优先级分片的同（行、列、时间戳）版本
    if self.last_key.as_ref() == Some(&cell.key) {
      return None;
    }
    self.last_key = Some(cell.key.clone());

    if !self.pred.matches(&cell) {
      return None;
    }

    // Erasure cover: all later same-(row, col) cells sort with lower
    // timestamps, so the cover holds until the (row, col) changes
    // 墓碑覆盖：之后的同（行、列）单元格时间戳更低，覆盖持续到（行、列）变化
    if let Some(cover) = &self.cover {
      if cover.same_cell(&cell.key) && cell.key.ts <= cover.ts {
        return None;
      }
      self.cover = None;
    }

    if cell.is_erasure() {
      self.cover = Some(cell.key.clone());
      if self.pred.filter_erasures {
        return None;
      }
    }

    // History budget per (row, col)
    // 每（行、列）的历史预算
    if self.pred.max_history > 0 {
      match &self.hist_key {
        Some(k) if k.same_cell(&cell.key) => {
          if self.hist_emitted >= self.pred.max_history {
            return None;
          }
        }
        _ => {
          self.hist_key = Some(cell.key.clone());
          self.hist_emitted = 0;
        }
      }
      self.hist_emitted += 1;
    }

    Some(cell)
  }

  /// Push at most `max_cells` cells or `max_size` bytes into `out`.
  /// Returns whether more data may remain. Bounded work per call keeps
  /// long scans cooperative.
  /// 向 `out` 推送至多 `max_cells` 条或 `max_size` 字节。返回是否可能还有数据。
  /// 每次调用工作量有界，使长扫描保持协作性。
  pub async fn copy_merged(
    &mut self,
    max_cells: usize,
    max_size: usize,
    out: &mut impl CellOutput,
  ) -> Result<bool> {
    let cell_stop = out.cell_count().saturating_add(max_cells);
    let size_stop = out.data_size().saturating_add(max_size);

    while let Some(cell) = self.pop().await? {
      if let Some(cell) = self.filter(cell) {
        out.emit(cell);
        if out.cell_count() >= cell_stop || out.data_size() >= size_stop {
          break;
        }
      }
    }
    Ok(!self.heap.is_empty())
  }

  /// Key of the last cell that reached the filter stage; feed it back
  /// as `start_after` to resume this scan
  /// 最后进入过滤阶段的键；作为 `start_after` 回传即可恢复此扫描
  #[inline]
  pub fn last_key(&self) -> Option<&CellKey> {
    self.last_key.as_ref()
  }
}
