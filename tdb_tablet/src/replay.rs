//! WAL replay into the log fragment
//! WAL 重放到日志分片

use std::path::Path;

use log::{debug, warn};
use tdb_cell::CellBuffer;
use tdb_commit::CommitRing;
use tdb_frag::LogFrag;
use tdb_wal::{LogDirReader, Next};

use crate::Result;

/// Replay every surviving batch for `table` from the log directory,
/// oldest file first. A log file is named by the txn preceding its
/// first batch, so batches regain their original txns from log order;
/// a batch whose rows the ring already covers was flushed before the
/// crash and is skipped. A torn final frame is the normal shape of a
/// crash and ends that file's replay; mid-file checksum damage aborts
/// with an error.
/// 从日志目录按最旧在前重放 `table` 的所有存续批次。日志文件以其首个批次
/// 之前的事务号命名，批次按日志顺序找回原事务号；其所有行已被环覆盖的批次
/// 在崩溃前已刷盘，直接跳过。撕裂的末帧是崩溃的正常形态，结束该文件的重放；
/// 文件中段校验和损坏则报错中止。
pub async fn replay_dir(
  dir: &Path,
  table: &[u8],
  ring: &mut CommitRing,
  log: &LogFrag,
) -> Result<i64> {
  let mut last_txn = ring.max_commit();
  let mut reader = LogDirReader::open(dir)?;

  while let Some(mut r) = reader.next().await {
    let path = r.path().to_path_buf();
    // Base txn from the file name; a foreign name replays after
    // whatever came before it
    // 文件名给出基准事务号；异常命名的文件接在之前的内容后重放
    let mut txn = path
      .file_name()
      .and_then(|n| n.to_str())
      .and_then(|s| s.parse::<i64>().ok())
      .unwrap_or(last_txn);

    let mut applied = 0usize;
    let mut skipped = 0usize;
    loop {
      match r.next()? {
        Next::Entry(e) => {
          if &*e.table != table {
            continue;
          }
          let buffer = CellBuffer::decode(&e.data)?;
          txn += 1;
          let rows = buffer.rows();
          if rows.iter().all(|row| ring.get_commit(row) >= txn) {
            skipped += 1;
            continue;
          }
          for row in &rows {
            ring.set_commit(row, txn)?;
          }
          log.apply(buffer.cells());
          applied += 1;
          last_txn = txn;
        }
        Next::Eof => break,
        Next::Torn => {
          warn!("torn tail in {}, earlier entries intact", path.display());
          break;
        }
      }
    }
    debug!(
      "replayed {}: {} applied, {} skipped",
      path.display(),
      applied,
      skipped
    );
  }
  Ok(last_txn)
}
