//! tdb_alloc - Bounded cell buffer pool with backpressure
//! 带背压的有界单元格缓冲池
//!
//! Admission control for mutation payloads: allocation waits while the
//! byte budget is exhausted instead of failing, so a burst of large
//! writes is throttled rather than dropped.
//! 变更负载的准入控制：预算耗尽时分配等待而非失败，大写入突发被限速而不是丢弃。

use std::{cell::Cell, ops::Deref, rc::Rc};

use event_listener::Event;

struct Inner {
  max: usize,
  used: Cell<usize>,
  count: Cell<usize>,
  released: Event,
}

impl Inner {
  /// Admit when nothing is outstanding (forward progress: the first
  /// allocation may overshoot) or when the request fits the budget.
  /// 无在途缓冲时放行（保证前进：首个分配允许超额），或请求在预算内时放行。
  #[inline]
  fn admit(&self, need: usize) -> bool {
    self.count.get() == 0 || self.used.get() + need <= self.max
  }
}

/// Budgeted allocator for cell payload buffers
/// 单元格负载缓冲的预算分配器
#[derive(Clone)]
pub struct CellBufAlloc {
  inner: Rc<Inner>,
}

impl CellBufAlloc {
  #[inline]
  pub fn new(max: usize) -> Self {
    Self {
      inner: Rc::new(Inner {
        max,
        used: Cell::new(0),
        count: Cell::new(0),
        released: Event::new(),
      }),
    }
  }

  /// Copy `data` into a budgeted buffer, waiting for budget if needed
  /// 将 `data` 复制入预算缓冲，必要时等待预算
  pub async fn alloc(&self, data: &[u8]) -> CellBuf {
    let need = data.len();
    loop {
      if self.inner.admit(need) {
        self.inner.used.set(self.inner.used.get() + need);
        self.inner.count.set(self.inner.count.get() + 1);
        return CellBuf(Rc::new(BufInner {
          data: data.into(),
          pool: self.inner.clone(),
        }));
      }

      let listener = self.inner.released.listen();
      // Re-check after registering, or a release between the check and
      // the listen would be missed
      // 注册后复查，否则检查与注册之间的释放会被漏掉
      if self.inner.admit(need) {
        continue;
      }
      listener.await;
    }
  }

  /// Bytes currently allocated
  /// 当前已分配字节数
  #[inline]
  pub fn used(&self) -> usize {
    self.inner.used.get()
  }

  /// Buffers currently outstanding
  /// 当前在途缓冲数
  #[inline]
  pub fn count(&self) -> usize {
    self.inner.count.get()
  }

  #[inline]
  pub fn max(&self) -> usize {
    self.inner.max
  }
}

struct BufInner {
  data: Box<[u8]>,
  pool: Rc<Inner>,
}

impl Drop for BufInner {
  fn drop(&mut self) {
    self.pool.used.set(self.pool.used.get() - self.data.len());
    self.pool.count.set(self.pool.count.get() - 1);
    self.pool.released.notify(usize::MAX);
  }
}

/// Shared handle to a budgeted buffer; budget returns when the last
/// clone drops
/// 预算缓冲的共享句柄；最后一个克隆释放时预算归还
#[derive(Clone)]
pub struct CellBuf(Rc<BufInner>);

impl Deref for CellBuf {
  type Target = [u8];

  #[inline]
  fn deref(&self) -> &[u8] {
    &self.0.data
  }
}

impl std::fmt::Debug for CellBuf {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CellBuf").field("len", &self.0.data.len()).finish()
  }
}
