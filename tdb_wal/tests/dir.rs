//! Directory replay order tests
//! 目录重放顺序测试

use std::cmp::Ordering;

use aok::{OK, Void};
use tdb_wal::{LogDirReader, LogWriter, Next, pseudo_numeric_cmp};

#[static_init::constructor(0)]
extern "C" fn _log_init() {
  log_init::init();
}

#[test]
fn test_pseudo_numeric_cmp() {
  assert_eq!(pseudo_numeric_cmp(b"9", b"10"), Ordering::Less);
  assert_eq!(pseudo_numeric_cmp(b"log2", b"log10"), Ordering::Less);
  assert_eq!(pseudo_numeric_cmp(b"log10", b"log10"), Ordering::Equal);
  assert_eq!(pseudo_numeric_cmp(b"007", b"8"), Ordering::Less);
  assert_eq!(pseudo_numeric_cmp(b"a1b2", b"a1b10"), Ordering::Less);
  assert_eq!(pseudo_numeric_cmp(b"abc", b"abd"), Ordering::Less);
  assert_eq!(pseudo_numeric_cmp(b"10", b"10x"), Ordering::Less);
}

#[compio::test]
async fn test_replay_oldest_first() -> Void {
  let dir = tempfile::tempdir()?;
  // Created out of order on purpose
  // 故意乱序创建
  for seq in [10u32, 2, 1] {
    let mut w = LogWriter::create(dir.path().join(seq.to_string())).await?;
    w.write_cells(b"t", seq.to_string().as_bytes())?;
    w.finish().await?;
  }

  let mut rd = LogDirReader::open(dir.path())?;
  assert_eq!(rd.len(), 3);
  let mut seen = Vec::new();
  while let Some(mut r) = rd.next().await {
    while let Next::Entry(e) = r.next()? {
      seen.push(String::from_utf8(e.data.into_vec())?);
    }
  }
  assert_eq!(seen, ["1", "2", "10"]);
  OK
}

#[compio::test]
async fn test_foreign_files_skipped() -> Void {
  let dir = tempfile::tempdir()?;
  std::fs::write(dir.path().join("0"), b"garbage, not a log")?;
  let mut w = LogWriter::create(dir.path().join("1")).await?;
  w.write_cells(b"t", b"good")?;
  w.finish().await?;
  std::fs::create_dir(dir.path().join("subdir"))?;

  let mut rd = LogDirReader::open(dir.path())?;
  // Directories are not listed; the garbage file is skipped at open
  // 目录不会列出；垃圾文件在打开时被跳过
  assert_eq!(rd.len(), 2);
  let mut opened = 0;
  while let Some(mut r) = rd.next().await {
    opened += 1;
    assert!(matches!(r.next()?, Next::Entry(e) if &*e.data == b"good"));
  }
  assert_eq!(opened, 1);
  OK
}

#[compio::test]
async fn test_empty_dir() -> Void {
  let dir = tempfile::tempdir()?;
  let mut rd = LogDirReader::open(dir.path())?;
  assert!(rd.is_empty());
  assert!(rd.next().await.is_none());
  OK
}
