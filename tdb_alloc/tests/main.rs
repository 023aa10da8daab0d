//! Allocator backpressure tests
//! 分配器背压测试

use aok::{OK, Void};
use futures::{pin_mut, poll};
use tdb_alloc::CellBufAlloc;

#[static_init::constructor(0)]
extern "C" fn _log_init() {
  log_init::init();
}

#[compio::test]
async fn test_first_alloc_overshoots() -> Void {
  let pool = CellBufAlloc::new(4);
  // First allocation always proceeds, even past the budget
  // 首个分配总是放行，即使超出预算
  let buf = pool.alloc(&[0u8; 100]).await;
  assert_eq!(buf.len(), 100);
  assert_eq!(pool.used(), 100);
  assert_eq!(pool.count(), 1);
  OK
}

#[compio::test]
async fn test_release_returns_budget() -> Void {
  let pool = CellBufAlloc::new(64);
  let a = pool.alloc(&[1u8; 10]).await;
  let b = a.clone();
  drop(a);
  // Budget returns only when the last clone drops
  // 预算仅在最后一个克隆释放时归还
  assert_eq!(pool.used(), 10);
  drop(b);
  assert_eq!(pool.used(), 0);
  assert_eq!(pool.count(), 0);
  OK
}

#[compio::test]
async fn test_blocks_until_release() -> Void {
  let pool = CellBufAlloc::new(16);
  let held = pool.alloc(&[0u8; 12]).await;

  let fut = pool.alloc(&[0u8; 12]);
  pin_mut!(fut);
  // 12 + 12 > 16 with one buffer outstanding: must wait
  // 12 + 12 > 16 且有在途缓冲：必须等待
  assert!(poll!(fut.as_mut()).is_pending());
  assert!(poll!(fut.as_mut()).is_pending());

  drop(held);
  let buf = fut.await;
  assert_eq!(buf.len(), 12);
  assert_eq!(pool.used(), 12);
  OK
}

#[compio::test]
async fn test_budget_never_exceeded_when_waiting() -> Void {
  let pool = CellBufAlloc::new(10);
  let a = pool.alloc(&[0u8; 6]).await;
  let b = pool.alloc(&[0u8; 4]).await;

  let fut = pool.alloc(&[0u8; 1]);
  pin_mut!(fut);
  assert!(poll!(fut.as_mut()).is_pending());
  assert_eq!(pool.used(), 10);

  drop(a);
  let c = fut.await;
  assert_eq!(pool.used(), 5);
  drop(b);
  drop(c);
  assert_eq!(pool.used(), 0);
  OK
}

#[compio::test]
async fn test_content() -> Void {
  let pool = CellBufAlloc::new(1024);
  let buf = pool.alloc(b"hello").await;
  assert_eq!(&*buf, b"hello");
  OK
}
