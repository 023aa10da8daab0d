//! Fragment writer factory and file remover
//! 分片写入器工厂与文件删除器

use std::{
  cell::Cell,
  path::{Path, PathBuf},
};

use log::warn;
use tdb_frag::FragWriter;

use crate::Result;

/// Hands out writers for new fragment files in one directory, named by
/// an increasing sequence number. Block size comes from the table
/// schema; the factory treats it as opaque configuration.
/// 为单个目录下的新分片文件发放写入器，按递增序号命名。块大小来自表模式，
/// 工厂视其为不透明配置。
#[derive(Debug)]
pub struct FragWriterFactory {
  dir: PathBuf,
  block_size: usize,
  next: Cell<u64>,
}

impl FragWriterFactory {
  /// Continue numbering after whatever already exists in `dir`
  /// 接续 `dir` 中已有文件的编号
  pub fn open(dir: impl Into<PathBuf>, block_size: usize) -> Result<Self> {
    let dir = dir.into();
    std::fs::create_dir_all(&dir)?;

    let mut max = 0u64;
    for entry in std::fs::read_dir(&dir)? {
      let entry = entry?;
      if let Some(n) = entry
        .file_name()
        .to_str()
        .and_then(|s| s.parse::<u64>().ok())
      {
        max = max.max(n);
      }
    }
    Ok(Self {
      dir,
      block_size,
      next: Cell::new(max + 1),
    })
  }

  /// Begin a new fragment; its uri is published when the writer
  /// finishes
  /// 开始新分片；写入器完成时其 uri 即发布
  pub async fn start(&self) -> Result<FragWriter> {
    let seq = self.next.get();
    self.next.set(seq + 1);
    let path = self.dir.join(seq.to_string());
    Ok(FragWriter::create(&path, self.block_size).await?)
  }

  /// Loader uri for a fragment file this factory produced
  /// 本工厂产出的分片文件的加载器 uri
  pub fn uri(path: &Path) -> String {
    format!("disk:{}", path.display())
  }
}

/// Deletes obsolete fragment files. Called only after a replacement
/// list is published and no reader holds the fragment.
/// 删除废弃分片文件。仅在替换列表发布且无读者持有该分片后调用。
#[derive(Debug, Default)]
pub struct FragRemover;

impl FragRemover {
  /// Failure to unlink leaves garbage, not corruption; log and move on
  /// 删除失败只留垃圾文件，不会损坏数据；记录后继续
  pub fn remove(&self, path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
      warn!("remove fragment {}: {}", path.display(), e);
    }
  }
}
