//! Tablet config: fragment list + txn watermark, saved after every
//! fragment-set change
//! Tablet 配置：分片列表与事务水位，每次分片集变化后保存

use std::path::{Path, PathBuf};

use bitcode::{Decode, Encode};
use compio::{fs::File, io::AsyncWriteAtExt};

use crate::{Error, Result};

/// What survives a restart: fragment uris newest first, and the highest
/// txn whose cells are durable in those fragments. WAL batches at or
/// below `last_txn` were flushed and must not be reapplied.
/// 重启后存续的内容：分片 uri（最新在前）与其中已持久的最高事务号。不高于
/// `last_txn` 的 WAL 批次已刷盘，不得重放。
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode)]
pub struct TabletConfig {
  pub frags: Vec<String>,
  pub last_txn: i64,
}

/// Config persistence on a local file, bitcode-encoded, published by
/// rename so a crash mid-save leaves the previous config intact
/// 本地文件上的配置持久化，bitcode 编码，经重命名发布，保存中途崩溃不损坏
/// 旧配置
#[derive(Debug, Clone)]
pub struct FileConfig {
  path: PathBuf,
}

impl FileConfig {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  #[inline]
  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Missing file means a fresh tablet
  /// 文件缺失表示全新 tablet
  pub fn load(&self) -> Result<TabletConfig> {
    let bytes = match std::fs::read(&self.path) {
      Ok(b) => b,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(TabletConfig::default()),
      Err(e) => return Err(e.into()),
    };
    bitcode::decode(&bytes).map_err(|e| Error::Config(e.to_string()))
  }

  pub async fn save(&self, config: &TabletConfig) -> Result<()> {
    let bytes = bitcode::encode(config);
    let mut tmp = self.path.clone().into_os_string();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut file = File::create(&tmp).await?;
    file.write_all_at(bytes, 0).await.0?;
    file.sync_all().await?;
    drop(file);
    std::fs::rename(&tmp, &self.path)?;
    Ok(())
  }
}
