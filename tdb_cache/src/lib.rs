//! tdb_cache - Block cache backing fragment reads
//! 支撑分片读取的块缓存
//!
//! A pinned block is a live `Rc<FragBlock>`: the index only holds weak
//! handles, so a block can never be evicted while someone holds it, and
//! release is simply dropping the handle.
//! 被钉住的块就是存活的 `Rc<FragBlock>`：索引只存弱句柄，持有中的块不可能被淘汰，
//! 释放即丢弃句柄。

use std::{
  cell::{Cell, RefCell},
  rc::{Rc, Weak},
};

use hashlink::LinkedHashMap;
use log::debug;
use tdb_frag::{DiskFrag, FragBlock, Result};

/// Default index size that triggers an amortized sweep of dead entries
/// 触发摊销清扫死条目的默认索引大小
pub const DEFAULT_WATERMARK: usize = 1024;

/// Cache index key: (fragment identity, block address). Fragment ids
/// are process-unique, so a reloaded file never aliases old blocks.
/// 缓存索引键：（分片标识，块地址）。分片 id 进程内唯一，重载文件不会串块。
type Key = (u64, usize);

enum Kind {
  /// Load and drop every call: predictable memory, no reuse
  /// 每次调用都加载并释放：内存可预测，无复用
  Direct,
  /// Weak-handle index with amortized purge of dead entries
  /// 弱句柄索引，摊销清理死条目
  Weak {
    index: RefCell<LinkedHashMap<Key, Weak<FragBlock>>>,
    watermark: usize,
  },
}

/// Shared block cache for concurrent scans
/// 并发扫描共享的块缓存
pub struct BlockCache {
  kind: Kind,
  hits: Cell<u64>,
  misses: Cell<u64>,
}

impl BlockCache {
  /// No-cache strategy
  /// 不缓存策略
  #[inline]
  pub fn direct() -> Self {
    Self {
      kind: Kind::Direct,
      hits: Cell::new(0),
      misses: Cell::new(0),
    }
  }

  /// Weak purging cache; `watermark` bounds the index size between
  /// sweeps
  /// 弱引用清理缓存；`watermark` 限制两次清扫之间的索引大小
  #[inline]
  pub fn weak(watermark: usize) -> Self {
    Self {
      kind: Kind::Weak {
        index: RefCell::new(LinkedHashMap::new()),
        watermark: watermark.max(1),
      },
      hits: Cell::new(0),
      misses: Cell::new(0),
    }
  }

  /// Get a pinned block, loading through the fragment on miss. The
  /// index borrow is never held across the load.
  /// 获取钉住的块，未命中时经分片加载。索引借用绝不跨加载持有。
  pub async fn get_block(&self, frag: &Rc<DiskFrag>, addr: usize) -> Result<Rc<FragBlock>> {
    let Kind::Weak { index, watermark } = &self.kind else {
      self.misses.set(self.misses.get() + 1);
      return Ok(Rc::new(frag.load_block(addr).await?));
    };

    let key = (frag.id(), addr);
    if let Some(weak) = index.borrow().get(&key)
      && let Some(block) = weak.upgrade()
    {
      self.hits.set(self.hits.get() + 1);
      return Ok(block);
    }
    self.misses.set(self.misses.get() + 1);

    let block = Rc::new(frag.load_block(addr).await?);

    let mut index = index.borrow_mut();
    index.insert(key, Rc::downgrade(&block));
    if index.len() > *watermark {
      let before = index.len();
      index.retain(|_, w| w.strong_count() > 0);
      debug!("block cache sweep: {before} -> {}", index.len());
    }
    Ok(block)
  }

  /// Resident (possibly dead) index entries
  /// 索引中的（可能已死的）条目数
  pub fn index_len(&self) -> usize {
    match &self.kind {
      Kind::Direct => 0,
      Kind::Weak { index, .. } => index.borrow().len(),
    }
  }

  /// Entries whose block is still alive
  /// 块仍存活的条目数
  pub fn live_len(&self) -> usize {
    match &self.kind {
      Kind::Direct => 0,
      Kind::Weak { index, .. } => index
        .borrow()
        .iter()
        .filter(|(_, w)| w.strong_count() > 0)
        .count(),
    }
  }

  #[inline]
  pub fn hits(&self) -> u64 {
    self.hits.get()
  }

  #[inline]
  pub fn misses(&self) -> u64 {
    self.misses.get()
  }
}
