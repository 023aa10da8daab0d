#![cfg_attr(docsrs, feature(doc_cfg))]

//! tdb_commit - Bounded per-row commit tracking
//! 有界的按行提交跟踪
//!
//! The ring answers "what was the last committed txn for row R" for
//! recently-active rows, in bounded memory. Rows that aged out fall
//! back to a conservative floor `min_txn`; a caller seeing `txn <=
//! min_txn` for an absent row must treat the answer as ambiguous and
//! consult the log or fragments instead.
//! 环在有界内存内回答“行 R 最后提交的事务号是多少”。被挤出的行退回保守下界
//! `min_txn`；调用方若对缺席行得到 `txn <= min_txn`，须视为不确定并改查日志
//! 或分片。
//!
//! Not internally synchronized: one ring belongs to one tablet's
//! serializing context.
//! 内部不加锁：每个环属于单个 tablet 的串行上下文。

use hashlink::LinkedHashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
  #[error("decreasing txn: {txn} < {max}")]
  DecreasingTxn { txn: i64, max: i64 },
}

pub type Result<T> = std::result::Result<T, Error>;

pub const DEFAULT_PURGE: usize = 1 << 20;

/// Accounted bytes per entry on top of the row key itself
/// 每条目在行键之外计账的字节数
const ENTRY_SIZE: usize = size_of::<Box<[u8]>>() + size_of::<i64>();

/// Most-recently-set rows at the back of the map, oldest at the front.
/// Purging walks from the front.
/// 最近设置的行在表尾，最旧的在表头。清理从表头开始。
pub struct CommitRing {
  map: LinkedHashMap<Box<[u8]>, i64>,
  min_txn: i64,
  purge_threshold: usize,
  size: usize,
}

impl CommitRing {
  pub fn new(start_txn: i64, purge_threshold: usize) -> Self {
    Self {
      map: LinkedHashMap::new(),
      min_txn: start_txn,
      purge_threshold,
      size: 0,
    }
  }

  /// Latest commit not guaranteed resident: purged and never-seen rows
  /// answer with this floor
  /// 不保证驻留的最新提交：被清理或从未见过的行以此下界作答
  #[inline]
  pub fn min_commit(&self) -> i64 {
    self.min_txn
  }

  /// Highest commit ever recorded
  /// 记录过的最高提交号
  #[inline]
  pub fn max_commit(&self) -> i64 {
    self.map.back().map_or(self.min_txn, |(_, &txn)| txn)
  }

  /// Last commit for `row` if resident, else the conservative floor
  /// 若 `row` 驻留则返回其最后提交，否则返回保守下界
  #[inline]
  pub fn get_commit(&self, row: &[u8]) -> i64 {
    self.map.get(row).copied().unwrap_or(self.min_txn)
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.map.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.map.is_empty()
  }

  /// Record a commit. Commit ids must be globally non-decreasing; a
  /// decreasing id signals a replay or clock error and leaves the ring
  /// untouched. An existing row is updated in place and becomes the
  /// most recent.
  /// 记录一次提交。提交号须全局非递减；递减意味着重放或时钟错误，环保持原状。
  /// 已存在的行原地更新并成为最近者。
  pub fn set_commit(&mut self, row: &[u8], txn: i64) -> Result<()> {
    let max = self.max_commit();
    if txn < max {
      return Err(Error::DecreasingTxn { txn, max });
    }

    if let Some(v) = self.map.to_back(row) {
      *v = txn;
      return Ok(());
    }

    self.map.insert(Box::from(row), txn);
    self.size += ENTRY_SIZE + row.len();
    if self.size > self.purge_threshold {
      self.purge();
    }
    Ok(())
  }

  /// Evict oldest entries until half the threshold remains. The floor
  /// rises to the highest purged txn, never falls.
  /// 从最旧开始驱逐，直到只剩阈值一半。下界升至被清理的最高事务号，绝不下降。
  fn purge(&mut self) {
    let target = self.purge_threshold / 2;
    while self.size > target {
      let Some((row, txn)) = self.map.pop_front() else {
        break;
      };
      self.size -= ENTRY_SIZE + row.len();
      if txn > self.min_txn {
        self.min_txn = txn;
      }
    }
  }
}

impl Default for CommitRing {
  fn default() -> Self {
    Self::new(0, DEFAULT_PURGE)
  }
}
