//! Disk fragment write/read tests
//! 磁盘分片写读测试

use aok::{OK, Void};
use tdb_cell::{Cell, CellVec, IntervalSet, ScanPredicate};
use tdb_frag::{DiskFrag, Error, FragWriter};

#[static_init::constructor(0)]
extern "C" fn _log_init() {
  log_init::init();
}

fn cells(n: usize) -> Vec<Cell> {
  (0..n)
    .map(|i| {
      let row = format!("row{i:04}");
      Cell::put(row.into_bytes(), *b"f:q", 7, *b"value")
    })
    .collect()
}

async fn write_frag(path: &std::path::Path, cells: &[Cell], block_size: usize) -> u64 {
  let mut w = FragWriter::create(path, block_size).await.unwrap();
  for c in cells {
    w.put(c).await.unwrap();
  }
  let meta = w.finish().await.unwrap();
  meta.cell_count
}

#[compio::test]
async fn test_roundtrip_multi_block() -> Void {
  let dir = tempfile::tempdir()?;
  let path = dir.path().join("a.frag");
  let data = cells(500);
  // Tiny blocks force many of them
  // 极小块大小迫使产生多个块
  let count = write_frag(&path, &data, 128).await;
  assert_eq!(count, 500);

  let frag = DiskFrag::open(&path, None).await.unwrap();
  assert!(frag.block_count() > 1);
  assert_eq!(frag.cell_count(), 500);

  let mut out = CellVec::new();
  frag.scan(&ScanPredicate::all(), &mut out).await.unwrap();
  assert_eq!(out.take(), data);
  OK
}

#[compio::test]
async fn test_out_of_order_rejected() -> Void {
  let dir = tempfile::tempdir()?;
  let path = dir.path().join("a.frag");
  let mut w = FragWriter::create(&path, 4096).await.unwrap();
  w.put(&Cell::put(*b"b", *b"f:q", 1, *b"v")).await.unwrap();

  let r = w.put(&Cell::put(*b"a", *b"f:q", 1, *b"v")).await;
  assert!(matches!(r, Err(Error::OutOfOrder)));

  // Duplicate key is equally fatal
  // 重复键同样致命
  let r = w.put(&Cell::put(*b"b", *b"f:q", 1, *b"v")).await;
  assert!(matches!(r, Err(Error::OutOfOrder)));

  // Older timestamp of the same (row, col) is a larger key: fine
  // 同（行、列）的更旧时间戳是更大的键：允许
  w.put(&Cell::put(*b"b", *b"f:q", 0, *b"v")).await.unwrap();
  OK
}

#[compio::test]
async fn test_abandoned_writer_leaves_nothing() -> Void {
  let dir = tempfile::tempdir()?;
  let path = dir.path().join("a.frag");
  {
    let mut w = FragWriter::create(&path, 4096).await.unwrap();
    w.put(&Cell::put(*b"a", *b"f:q", 1, *b"v")).await.unwrap();
    // Dropped without finish
    // 未 finish 即丢弃
  }
  assert!(!path.exists());
  assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
  OK
}

#[compio::test]
async fn test_next_block_skips_by_row() -> Void {
  let dir = tempfile::tempdir()?;
  let path = dir.path().join("a.frag");
  write_frag(&path, &cells(500), 128).await;
  let frag = DiskFrag::open(&path, None).await.unwrap();

  let mut rows = IntervalSet::new();
  rows.point(Box::from(&b"row0400"[..]));
  let pred = ScanPredicate::all().rows(rows);

  let first = frag.next_block(&pred, 0).unwrap();
  // The matching block is deep in the file
  // 匹配块位于文件深处
  assert!(first > 0);
  let mut out = CellVec::new();
  frag.scan(&pred, &mut out).await.unwrap();
  let got = out.take();
  assert_eq!(got.len(), 1);
  assert_eq!(&*got[0].key.row, b"row0400");
  OK
}

#[compio::test]
async fn test_disk_size_interval() -> Void {
  let dir = tempfile::tempdir()?;
  let path = dir.path().join("a.frag");
  write_frag(&path, &cells(500), 128).await;
  let frag = DiskFrag::open(&path, None).await.unwrap();

  let full = frag.disk_size(None);
  let mut rows = IntervalSet::new();
  rows.add(Box::from(&b"row0000"[..])..=Box::from(&b"row0010"[..]));
  let part = frag.disk_size(Some(&rows));
  assert!(part > 0);
  assert!(part < full);
  OK
}

#[compio::test]
async fn test_family_restriction() -> Void {
  let dir = tempfile::tempdir()?;
  let path = dir.path().join("a.frag");
  let data = vec![
    Cell::put(*b"r", *b"a:x", 1, *b"1"),
    Cell::put(*b"r", *b"b:x", 1, *b"2"),
    Cell::put(*b"r", *b"c:x", 1, *b"3"),
  ];
  write_frag(&path, &data, 4096).await;

  let frag = DiskFrag::open(&path, Some(vec![Box::from(&b"b"[..])]))
    .await
    .unwrap();
  let mut out = CellVec::new();
  frag.scan(&ScanPredicate::all(), &mut out).await.unwrap();
  let got = out.take();
  assert_eq!(got.len(), 1);
  assert_eq!(&*got[0].key.col, b"b:x");
  OK
}

#[compio::test]
async fn test_corrupt_foot() -> Void {
  let dir = tempfile::tempdir()?;
  let path = dir.path().join("a.frag");
  write_frag(&path, &cells(10), 4096).await;

  let mut raw = std::fs::read(&path)?;
  let last = raw.len() - 1;
  raw[last] ^= 0xff;
  std::fs::write(&path, &raw)?;

  assert!(matches!(
    DiskFrag::open(&path, None).await,
    Err(Error::BadMagic)
  ));
  OK
}

#[compio::test]
async fn test_corrupt_block() -> Void {
  let dir = tempfile::tempdir()?;
  let path = dir.path().join("a.frag");
  write_frag(&path, &cells(10), 4096).await;

  // Flip a byte inside the first block's payload
  // 翻转第一个块负载内的一个字节
  let mut raw = std::fs::read(&path)?;
  raw[16] ^= 0xff;
  std::fs::write(&path, &raw)?;

  let frag = DiskFrag::open(&path, None).await.unwrap();
  assert!(matches!(
    frag.load_block(0).await,
    Err(Error::Checksum { .. })
  ));
  OK
}

#[compio::test]
async fn test_empty_fragment() -> Void {
  let dir = tempfile::tempdir()?;
  let path = dir.path().join("a.frag");
  let w = FragWriter::create(&path, 4096).await.unwrap();
  let meta = w.finish().await.unwrap();
  assert_eq!(meta.cell_count, 0);
  assert_eq!(meta.block_count, 0);

  let frag = DiskFrag::open(&path, None).await.unwrap();
  assert_eq!(frag.block_count(), 0);
  assert!(frag.next_block(&ScanPredicate::all(), 0).is_none());
  OK
}
