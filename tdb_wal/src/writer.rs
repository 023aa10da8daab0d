//! Log writer: append-only framed entries
//! 日志写入器：追加式帧化条目

use std::path::{Path, PathBuf};

use compio::{fs::File, io::AsyncWriteAtExt};
use zerocopy::{IntoBytes, little_endian::U32};

use crate::{
  Error, Result,
  wire::{self, ENTRY_MAGIC, EntryHead, FileHead, MAX_DATA_LEN, MAX_NAME_LEN},
};

/// Appends framed cell batches to one log file. Entries accumulate in
/// memory until `sync`; a batch is durable only once `sync` returns.
/// 向单个日志文件追加帧化单元格批次。条目先在内存累积，`sync` 返回后才持久。
pub struct LogWriter {
  file: File,
  path: PathBuf,
  /// Entries not yet written out
  /// 尚未写出的条目
  buf: Vec<u8>,
  offset: u64,
}

impl LogWriter {
  /// Create a new log file at `path`
  /// 在 `path` 创建新日志文件
  pub async fn create(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    let file = File::create(&path).await?;
    Ok(Self {
      file,
      path,
      buf: FileHead::new().as_bytes().to_vec(),
      offset: 0,
    })
  }

  /// Append one framed entry: cells packed for `table`
  /// 追加一条帧化条目：`table` 的打包单元格
  pub fn write_cells(&mut self, table: &[u8], packed: &[u8]) -> Result<()> {
    if table.len() > MAX_NAME_LEN {
      return Err(Error::NameTooLong { len: table.len() });
    }
    if packed.len() > MAX_DATA_LEN {
      return Err(Error::DataTooLarge { len: packed.len() });
    }

    let head = EntryHead {
      magic: U32::new(ENTRY_MAGIC),
      checksum: U32::new(wire::entry_checksum(table, packed.len())),
      name_len: U32::new(table.len() as u32),
      data_len: U32::new(packed.len() as u32),
    };
    self.buf.extend_from_slice(head.as_bytes());
    self.buf.extend_from_slice(table);
    self.buf.extend_from_slice(packed);
    Ok(())
  }

  /// Write buffered entries and force them to disk
  /// 写出缓冲条目并强制落盘
  pub async fn sync(&mut self) -> Result<()> {
    if !self.buf.is_empty() {
      let buf = std::mem::take(&mut self.buf);
      let len = buf.len() as u64;
      self.file.write_all_at(buf, self.offset).await.0?;
      self.offset += len;
    }
    self.file.sync_all().await?;
    Ok(())
  }

  /// Bytes this log occupies, buffered entries included
  /// 此日志占用的字节数，含缓冲条目
  #[inline]
  pub fn disk_size(&self) -> u64 {
    self.offset + self.buf.len() as u64
  }

  /// Sync and close, returning the log file's path
  /// 同步并关闭，返回日志文件路径
  pub async fn finish(mut self) -> Result<PathBuf> {
    self.sync().await?;
    Ok(self.path)
  }
}
