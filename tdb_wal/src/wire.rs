//! On-disk log framing
//! 日志在盘帧格式

use zerocopy::{
  FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
  little_endian::U32,
};

/// "tLOG" little-endian
pub const FILE_MAGIC: u32 = 0x474F_4C74;

pub const FORMAT_VERSION: u32 = 1;

/// "tENT" little-endian
pub const ENTRY_MAGIC: u32 = 0x544E_4574;

/// Bounds used to reject garbage lengths in a damaged frame
/// 用于拒绝受损帧中垃圾长度的上界
pub const MAX_NAME_LEN: usize = 1 << 16;
pub const MAX_DATA_LEN: usize = 1 << 30;

/// Written once at offset 0 of every log file
/// 写在每个日志文件偏移 0 处，仅一次
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C, packed)]
pub struct FileHead {
  pub magic: U32,
  pub version: U32,
}

impl FileHead {
  pub const SIZE: usize = size_of::<Self>();

  #[inline]
  pub fn new() -> Self {
    Self {
      magic: U32::new(FILE_MAGIC),
      version: U32::new(FORMAT_VERSION),
    }
  }
}

impl Default for FileHead {
  fn default() -> Self {
    Self::new()
  }
}

/// Frame head preceding each (name, data) entry. The checksum covers
/// name_len, data_len and the name bytes, so a frame whose lengths or
/// routing were damaged never routes data to the wrong table.
/// 每条（名称、数据）条目前的帧头。校验和覆盖 name_len、data_len 与名称字节，
/// 长度或路由受损的帧不会把数据送错表。
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C, packed)]
pub struct EntryHead {
  pub magic: U32,
  pub checksum: U32,
  pub name_len: U32,
  pub data_len: U32,
}

impl EntryHead {
  pub const SIZE: usize = size_of::<Self>();
}

/// Checksum of one frame: the two length words then the name bytes
/// 单帧校验和：两个长度字段后接名称字节
pub fn entry_checksum(name: &[u8], data_len: usize) -> u32 {
  let mut h = crc32fast::Hasher::new();
  h.update(&(name.len() as u32).to_le_bytes());
  h.update(&(data_len as u32).to_le_bytes());
  h.update(name);
  h.finalize()
}
