//! Directory replay: log files oldest to newest
//! 目录重放：日志文件从最旧到最新

use std::{
  cmp::Ordering,
  collections::VecDeque,
  path::{Path, PathBuf},
};

use log::warn;

use crate::{LogReader, Result};

/// Enumerates a directory's log files in replay order. Log files are
/// named by increasing sequence number, so the order is numeric
/// ascending; replaying newest first would reapply older mutations on
/// top of newer ones.
/// 按重放顺序枚举目录中的日志文件。日志文件按递增序号命名，故顺序为数值升序；
/// 先放最新会把旧变更覆盖到新变更之上。
pub struct LogDirReader {
  files: VecDeque<PathBuf>,
}

impl LogDirReader {
  /// List `dir`, keeping regular files sorted oldest first
  /// 列出 `dir`，保留普通文件并按最旧在前排序
  pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
    let mut names: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
      let entry = entry?;
      if entry.file_type()?.is_file() {
        names.push(entry.path());
      }
    }
    names.sort_by(|a, b| {
      pseudo_numeric_cmp(
        a.file_name().unwrap_or_default().as_encoded_bytes(),
        b.file_name().unwrap_or_default().as_encoded_bytes(),
      )
    });
    Ok(Self {
      files: names.into(),
    })
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.files.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.files.is_empty()
  }

  /// Open the next log file; files with a bad or foreign head are
  /// logged and skipped
  /// 打开下一个日志文件；文件头损坏或非日志的文件记录后跳过
  pub async fn next(&mut self) -> Option<LogReader> {
    while let Some(path) = self.files.pop_front() {
      match LogReader::open(&path).await {
        Ok(r) => return Some(r),
        Err(err) => warn!("skip log file {}: {}", path.display(), err),
      }
    }
    None
  }
}

/// Filename order where digit runs compare as numbers: "9" < "10",
/// "log2" < "log10"
/// 文件名排序，数字段按数值比较："9" < "10"，"log2" < "log10"
pub fn pseudo_numeric_cmp(a: &[u8], b: &[u8]) -> Ordering {
  let mut x = a;
  let mut y = b;
  loop {
    match (x.first(), y.first()) {
      (None, None) => return Ordering::Equal,
      (None, Some(_)) => return Ordering::Less,
      (Some(_), None) => return Ordering::Greater,
      (Some(&ca), Some(&cb)) => {
        if ca.is_ascii_digit() && cb.is_ascii_digit() {
          let xa = digit_run(x);
          let ya = digit_run(y);
          // Strip leading zeros, then longer run is larger
          // 去前导零后，更长的数字段更大
          let na = trim_zeros(&x[..xa]);
          let nb = trim_zeros(&y[..ya]);
          let ord = na.len().cmp(&nb.len()).then_with(|| na.cmp(nb));
          if ord != Ordering::Equal {
            return ord;
          }
          x = &x[xa..];
          y = &y[ya..];
        } else {
          if ca != cb {
            return ca.cmp(&cb);
          }
          x = &x[1..];
          y = &y[1..];
        }
      }
    }
  }
}

fn digit_run(s: &[u8]) -> usize {
  s.iter().take_while(|c| c.is_ascii_digit()).count()
}

fn trim_zeros(s: &[u8]) -> &[u8] {
  let n = s.iter().take_while(|&&c| c == b'0').count();
  if n == s.len() { &s[s.len() - 1..] } else { &s[n..] }
}
