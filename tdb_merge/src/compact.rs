//! Compactor: fold fragments into one
//! 压缩器：将多个分片折叠为一个

use std::rc::Rc;

use log::debug;
use tdb_cache::BlockCache;
use tdb_cell::{CellVec, ScanPredicate};
use tdb_frag::{Frag, FragMeta, FragWriter, Result};

use crate::Merge;

/// Work unit per merge call, keeping compaction cooperative with scans
/// 每次合并调用的工作单位，使压缩与扫描协作
const STEP_CELLS: usize = 4096;
const STEP_SIZE: usize = 4 << 20;

/// Whether the fragment set is known complete for the keys it holds
/// 分片集对其持有的键是否已知完整
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactKind {
  /// Every fragment that could hold an older matching version is in
  /// the set: erasures have nothing left to suppress and are dropped
  /// 所有可能含较旧版本的分片都在集合内：墓碑无可压制，直接丢弃
  Full,
  /// Other fragments may hold older versions: erasures are retained so
  /// they keep suppressing in later merges
  /// 其他分片可能仍含较旧版本：保留墓碑以便后续合并继续压制
  Partial,
}

/// Rewrites a set of fragments into one new fragment through the merge
/// engine. Which fragments to pick and when to run is the scheduler's
/// decision; swapping the result into the tablet's fragment list is the
/// caller's.
/// 通过合并引擎将一组分片重写为一个新分片。选哪些分片、何时运行由调度器决定；
/// 将结果换入 tablet 分片列表由调用方负责。
pub struct Compactor {
  cache: Rc<BlockCache>,
}

impl Compactor {
  #[inline]
  pub fn new(cache: Rc<BlockCache>) -> Self {
    Self { cache }
  }

  /// Merge `frags` (newest first) into `writer` and publish it.
  /// All rows, all columns, no history limit: compaction must preserve
  /// every surviving version.
  /// 将 `frags`（最新在前）合并进 `writer` 并发布。全行、全列、无历史上限：
  /// 压缩必须保留所有幸存版本。
  pub async fn compact(
    &self,
    frags: &[Frag],
    mut writer: FragWriter,
    kind: CompactKind,
  ) -> Result<FragMeta> {
    let pred = ScanPredicate::all().filter_erasures(kind == CompactKind::Full);
    let mut merge = Merge::new(frags, self.cache.clone(), pred, None).await?;

    let mut out = CellVec::new();
    loop {
      let more = merge.copy_merged(STEP_CELLS, STEP_SIZE, &mut out).await?;
      for cell in out.take() {
        writer.put(&cell).await?;
      }
      if !more {
        break;
      }
    }

    let meta = writer.finish().await?;
    debug!(
      "compacted {} frags into {} ({} cells, {} bytes)",
      frags.len(),
      meta.path.display(),
      meta.cell_count,
      meta.size
    );
    Ok(meta)
  }
}
