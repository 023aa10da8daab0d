//! Merge engine tests
//! 合并引擎测试

use std::{path::Path, rc::Rc};

use aok::{OK, Void};
use tdb_cache::BlockCache;
use tdb_cell::{Cell, CellKey, CellOutput, CellVec, IntervalSet, ScanPredicate};
use tdb_frag::{DiskFrag, Frag, FragWriter, LogFrag};
use tdb_merge::Merge;

#[static_init::constructor(0)]
extern "C" fn _log_init() {
  log_init::init();
}

async fn disk_frag(dir: &Path, name: &str, cells: &[Cell]) -> Frag {
  let path = dir.join(name);
  let mut w = FragWriter::create(&path, 128).await.unwrap();
  for c in cells {
    w.put(c).await.unwrap();
  }
  w.finish().await.unwrap();
  DiskFrag::open(&path, None).await.unwrap().into()
}

async fn merged(frags: &[Frag], pred: ScanPredicate) -> Vec<Cell> {
  let cache = Rc::new(BlockCache::weak(64));
  let mut merge = Merge::new(frags, cache, pred, None).await.unwrap();
  let mut out = CellVec::new();
  while merge.copy_merged(usize::MAX, usize::MAX, &mut out).await.unwrap() {}
  out.take()
}

fn sorted_unique(cells: &[Cell]) -> bool {
  cells.windows(2).all(|w| w[0].key < w[1].key)
}

#[compio::test]
async fn test_newest_fragment_wins_duplicates() -> Void {
  let dir = tempfile::tempdir()?;
  // A listed newer than B; both carry (a, c, 5)
  // A 比 B 新；两者都含 (a, c, 5)
  let a = disk_frag(dir.path(), "a", &[Cell::put(*b"a", *b"c", 5, *b"1")]).await;
  let b = disk_frag(
    dir.path(),
    "b",
    &[Cell::put(*b"a", *b"c", 5, *b"2"), Cell::put(*b"a", *b"c", 3, *b"x")],
  )
  .await;

  let got = merged(&[a, b], ScanPredicate::all()).await;
  assert_eq!(
    got,
    vec![Cell::put(*b"a", *b"c", 5, *b"1"), Cell::put(*b"a", *b"c", 3, *b"x")]
  );
  OK
}

#[compio::test]
async fn test_total_order_no_duplicates() -> Void {
  let dir = tempfile::tempdir()?;
  // Three fragments with interleaved and overlapping keys
  // 三个分片，键交错且重叠
  let a = disk_frag(
    dir.path(),
    "a",
    &[
      Cell::put(*b"a", *b"f:q", 9, *b"a9"),
      Cell::put(*b"c", *b"f:q", 1, *b"c1"),
    ],
  )
  .await;
  let b = disk_frag(
    dir.path(),
    "b",
    &[
      Cell::put(*b"a", *b"f:q", 9, *b"stale"),
      Cell::put(*b"b", *b"f:q", 4, *b"b4"),
      Cell::put(*b"d", *b"f:q", 2, *b"d2"),
    ],
  )
  .await;
  let c = disk_frag(
    dir.path(),
    "c",
    &[
      Cell::put(*b"a", *b"f:q", 7, *b"a7"),
      Cell::put(*b"b", *b"f:q", 4, *b"stale"),
    ],
  )
  .await;

  let got = merged(&[a, b, c], ScanPredicate::all()).await;
  assert!(sorted_unique(&got));
  assert_eq!(got.len(), 5);
  assert_eq!(got[0].val.as_deref(), Some(&b"a9"[..]));
  assert_eq!(got[1].val.as_deref(), Some(&b"a7"[..]));
  assert_eq!(got[2].val.as_deref(), Some(&b"b4"[..]));
  OK
}

#[compio::test]
async fn test_same_cell_different_ts_never_deduped() -> Void {
  let dir = tempfile::tempdir()?;
  let a = disk_frag(dir.path(), "a", &[Cell::put(*b"a", *b"c", 5, *b"new")]).await;
  let b = disk_frag(dir.path(), "b", &[Cell::put(*b"a", *b"c", 4, *b"old")]).await;

  let got = merged(&[a, b], ScanPredicate::all()).await;
  assert_eq!(got.len(), 2);
  OK
}

#[compio::test]
async fn test_erasure_suppression() -> Void {
  let dir = tempfile::tempdir()?;
  let newer = disk_frag(dir.path(), "new", &[Cell::erase(*b"a", *b"c", 10)]).await;
  let older = disk_frag(
    dir.path(),
    "old",
    &[Cell::put(*b"a", *b"c", 10, *b"v"), Cell::put(*b"a", *b"c", 5, *b"w")],
  )
  .await;

  // filter_erasures: everything covered vanishes, so does the erasure
  // filter_erasures：被覆盖者与墓碑本身都消失
  let got = merged(
    &[newer.clone(), older.clone()],
    ScanPredicate::all().filter_erasures(true),
  )
  .await;
  assert!(got.is_empty());

  // Without filtering the erasure itself survives, covered values do not
  // 不过滤时墓碑本身保留，被覆盖的值不保留
  let got = merged(&[newer, older], ScanPredicate::all()).await;
  assert_eq!(got, vec![Cell::erase(*b"a", *b"c", 10)]);
  OK
}

#[compio::test]
async fn test_erasure_covers_only_older_or_equal() -> Void {
  let dir = tempfile::tempdir()?;
  let newer = disk_frag(dir.path(), "new", &[Cell::erase(*b"a", *b"c", 10)]).await;
  let older = disk_frag(dir.path(), "old", &[Cell::put(*b"a", *b"c", 12, *b"v")]).await;

  // ts=12 > 10: not covered
  // ts=12 > 10：不被覆盖
  let got = merged(&[newer, older], ScanPredicate::all().filter_erasures(true)).await;
  assert_eq!(got, vec![Cell::put(*b"a", *b"c", 12, *b"v")]);
  OK
}

#[compio::test]
async fn test_history_limit() -> Void {
  let dir = tempfile::tempdir()?;
  let a = disk_frag(dir.path(), "a", &[Cell::put(*b"a", *b"c", 9, *b"v9")]).await;
  let b = disk_frag(
    dir.path(),
    "b",
    &[
      Cell::put(*b"a", *b"c", 5, *b"v5"),
      Cell::put(*b"a", *b"c", 1, *b"v1"),
      Cell::put(*b"b", *b"c", 3, *b"b3"),
    ],
  )
  .await;

  let got = merged(&[a.clone(), b.clone()], ScanPredicate::all().max_history(1)).await;
  // One version per (row, col): the newest
  // 每（行、列）一个版本：最新者
  assert_eq!(
    got,
    vec![Cell::put(*b"a", *b"c", 9, *b"v9"), Cell::put(*b"b", *b"c", 3, *b"b3")]
  );

  let got = merged(&[a, b], ScanPredicate::all().max_history(2)).await;
  assert_eq!(got.len(), 3);
  assert_eq!(got[1].key.ts, 5);
  OK
}

#[compio::test]
async fn test_log_and_disk_merge() -> Void {
  let dir = tempfile::tempdir()?;
  let log = LogFrag::new();
  log.apply(&[
    Cell::put(*b"a", *b"f:q", 2, *b"mem"),
    Cell::put(*b"c", *b"f:q", 1, *b"cmem"),
  ]);
  let disk = disk_frag(
    dir.path(),
    "d",
    &[
      Cell::put(*b"a", *b"f:q", 2, *b"disk"),
      Cell::put(*b"b", *b"f:q", 1, *b"bdisk"),
    ],
  )
  .await;

  // The log fragment is newer than anything flushed
  // 日志分片比任何已刷盘数据新
  let got = merged(&[log.into(), disk], ScanPredicate::all()).await;
  assert_eq!(got.len(), 3);
  assert_eq!(got[0].val.as_deref(), Some(&b"mem"[..]));
  OK
}

#[compio::test]
async fn test_predicate_rows_and_times() -> Void {
  let dir = tempfile::tempdir()?;
  let cells: Vec<Cell> = (0..50)
    .map(|i| Cell::put(format!("r{i:02}").into_bytes(), *b"f:q", i, *b"v"))
    .collect();
  let frag = disk_frag(dir.path(), "a", &cells).await;

  let mut rows = IntervalSet::new();
  rows.add(Box::from(&b"r10"[..])..=Box::from(&b"r19"[..]));
  let mut times = IntervalSet::new();
  times.add(12..=15);
  let pred = ScanPredicate::all().rows(rows).times(times);

  let got = merged(&[frag], pred).await;
  assert_eq!(got.len(), 4);
  assert!(got.iter().all(|c| (12..=15).contains(&c.key.ts)));
  OK
}

#[compio::test]
async fn test_copy_merged_budget_and_restart() -> Void {
  let dir = tempfile::tempdir()?;
  let cells: Vec<Cell> = (0..100)
    .map(|i| Cell::put(format!("r{i:03}").into_bytes(), *b"f:q", 1, *b"v"))
    .collect();
  let frag = disk_frag(dir.path(), "a", &cells).await;
  let cache = Rc::new(BlockCache::weak(64));

  // Drain in small budgeted steps
  // 以小额预算分步取完
  let mut merge = Merge::new(
    std::slice::from_ref(&frag),
    cache.clone(),
    ScanPredicate::all(),
    None,
  )
  .await
  .unwrap();
  let mut out = CellVec::new();
  let mut steps = 0;
  loop {
    let before = out.cell_count();
    let more = merge.copy_merged(7, usize::MAX, &mut out).await.unwrap();
    assert!(out.cell_count() - before <= 7);
    steps += 1;
    if !more {
      break;
    }
  }
  assert!(steps >= 100 / 7);
  assert_eq!(out.cell_count(), 100);

  // Restarting after a cursor key yields exactly the remainder
  // 以游标键重启恰好得到剩余部分
  let cursor = CellKey::new(*b"r049", *b"f:q", 1);
  let mut merge = Merge::new(
    std::slice::from_ref(&frag),
    cache,
    ScanPredicate::all(),
    Some(&cursor),
  )
  .await
  .unwrap();
  let mut rest = CellVec::new();
  while merge.copy_merged(usize::MAX, usize::MAX, &mut rest).await.unwrap() {}
  let rest = rest.take();
  assert_eq!(rest.len(), 50);
  assert_eq!(&*rest[0].key.row, b"r050");
  OK
}

#[compio::test]
async fn test_budgeted_steps_keep_filter_state() -> Void {
  let dir = tempfile::tempdir()?;
  let newer = disk_frag(dir.path(), "new", &[Cell::erase(*b"a", *b"c", 10)]).await;
  let older = disk_frag(
    dir.path(),
    "old",
    &[Cell::put(*b"a", *b"c", 10, *b"v"), Cell::put(*b"a", *b"c", 5, *b"w")],
  )
  .await;

  // One cell per call: the cover set by the erasure must still
  // suppress (a, c, 5) in a later call
  // 每次调用一条：墓碑设下的覆盖必须在后续调用中仍压制 (a, c, 5)
  let cache = Rc::new(BlockCache::weak(64));
  let mut merge = Merge::new(&[newer, older], cache.clone(), ScanPredicate::all(), None)
    .await
    .unwrap();
  let mut out = CellVec::new();
  while merge.copy_merged(1, usize::MAX, &mut out).await.unwrap() {}
  assert_eq!(out.take(), vec![Cell::erase(*b"a", *b"c", 10)]);

  // Same for the history budget
  // 历史预算同理
  let a = disk_frag(dir.path(), "a", &[Cell::put(*b"h", *b"c", 9, *b"v9")]).await;
  let b = disk_frag(
    dir.path(),
    "b",
    &[Cell::put(*b"h", *b"c", 5, *b"v5"), Cell::put(*b"h", *b"c", 1, *b"v1")],
  )
  .await;
  let mut merge = Merge::new(&[a, b], cache, ScanPredicate::all().max_history(1), None)
    .await
    .unwrap();
  let mut out = CellVec::new();
  while merge.copy_merged(1, usize::MAX, &mut out).await.unwrap() {}
  assert_eq!(out.take(), vec![Cell::put(*b"h", *b"c", 9, *b"v9")]);
  OK
}

#[compio::test]
async fn test_empty_inputs() -> Void {
  let cache = Rc::new(BlockCache::direct());
  let mut merge = Merge::new(&[], cache, ScanPredicate::all(), None)
    .await
    .unwrap();
  let mut out = CellVec::new();
  let more = merge.copy_merged(10, 10, &mut out).await.unwrap();
  assert!(!more);
  assert_eq!(out.cell_count(), 0);
  OK
}
