//! Log reader: frame-at-a-time replay with torn-tail detection
//! 日志读取器：逐帧重放并识别撕裂尾部

use std::path::{Path, PathBuf};

use compio::{
  buf::{IntoInner, IoBuf},
  fs::File,
  io::AsyncReadAtExt,
};
use zerocopy::FromBytes;

use crate::{
  Error, Result,
  wire::{ENTRY_MAGIC, EntryHead, FILE_MAGIC, FileHead, MAX_DATA_LEN, MAX_NAME_LEN},
};

/// One replayed entry
/// 一条重放条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
  pub table: Box<[u8]>,
  pub data: Box<[u8]>,
}

/// Outcome of advancing the reader. `Torn` marks a frame cut short by a
/// crash mid-write; everything before it replayed intact, so recovery
/// treats it as the end of this log. A checksum mismatch on a complete
/// frame is real corruption and surfaces as an error instead.
/// 推进读取器的结果。`Torn` 表示写入中途崩溃截断的帧；其前的条目均完整重放，
/// 恢复将其视为此日志的终点。完整帧的校验和不符则是真实损坏，以错误上报。
#[derive(Debug)]
pub enum Next {
  Entry(LogEntry),
  Eof,
  Torn,
}

/// Reads one log file front to back
/// 从头到尾读取单个日志文件
pub struct LogReader {
  path: PathBuf,
  data: Vec<u8>,
  pos: usize,
  torn: bool,
}

impl LogReader {
  /// Open a log file and verify its head
  /// 打开日志文件并校验文件头
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    let file = File::open(&path).await?;
    let size = file.metadata().await?.len() as usize;
    if size < FileHead::SIZE {
      return Err(Error::BadMagic);
    }

    let buf = vec![0u8; size];
    let res = file.read_exact_at(buf.slice(0..size), 0).await;
    res.0?;
    let data = res.1.into_inner();

    let head = FileHead::read_from_bytes(&data[..FileHead::SIZE]).map_err(|_| Error::BadMagic)?;
    if head.magic.get() != FILE_MAGIC {
      return Err(Error::BadMagic);
    }
    if head.version.get() != crate::wire::FORMAT_VERSION {
      return Err(Error::BadVersion {
        found: head.version.get(),
      });
    }

    Ok(Self {
      path,
      data,
      pos: FileHead::SIZE,
      torn: false,
    })
  }

  #[inline]
  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Advance to the next frame
  /// 推进到下一帧
  pub fn next(&mut self) -> Result<Next> {
    if self.torn {
      return Ok(Next::Torn);
    }
    let rest = &self.data[self.pos..];
    if rest.is_empty() {
      return Ok(Next::Eof);
    }
    if rest.len() < EntryHead::SIZE {
      self.torn = true;
      return Ok(Next::Torn);
    }

    let head = match EntryHead::read_from_bytes(&rest[..EntryHead::SIZE]) {
      Ok(h) => h,
      Err(_) => {
        self.torn = true;
        return Ok(Next::Torn);
      }
    };
    let name_len = head.name_len.get() as usize;
    let data_len = head.data_len.get() as usize;
    if head.magic.get() != ENTRY_MAGIC || name_len > MAX_NAME_LEN || data_len > MAX_DATA_LEN {
      self.torn = true;
      return Ok(Next::Torn);
    }

    let total = EntryHead::SIZE + name_len + data_len;
    if rest.len() < total {
      self.torn = true;
      return Ok(Next::Torn);
    }

    let name = &rest[EntryHead::SIZE..EntryHead::SIZE + name_len];
    let expected = head.checksum.get();
    let actual = crate::wire::entry_checksum(name, data_len);
    if actual != expected {
      return Err(Error::Checksum { expected, actual });
    }

    let entry = LogEntry {
      table: Box::from(name),
      data: Box::from(&rest[EntryHead::SIZE + name_len..total]),
    };
    self.pos += total;
    Ok(Next::Entry(entry))
  }
}
