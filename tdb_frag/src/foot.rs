//! File head and foot of the disk fragment format
//! 磁盘分片格式的文件头与尾部
//!
//! Layout: head, cell blocks (each payload + crc32), block index, foot.
//! The foot is read from EOF; its `magic_ver` version-locks the writer
//! and reader.
//! 布局：文件头、单元格块（负载 + crc32）、块索引、尾部。尾部从文件末尾读取；
//! `magic_ver` 将写入器与读取器版本锁定。

use zerocopy::{
  FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
  little_endian::{U32, U64},
};

/// "tFRG"
pub const FILE_MAGIC: u32 = 0x4752_4674;

/// On-disk format version. Bump on any layout change: readers refuse
/// foots whose version they do not know.
/// 磁盘格式版本。任何布局变更都要递增：读取器拒绝未知版本的尾部。
pub const FORMAT_VERSION: u32 = 1;

/// Combined magic + version word stored in the foot
/// 存于尾部的魔数与版本合并字
pub const MAGIC_VER: u64 = ((FILE_MAGIC as u64) << 32) | FORMAT_VERSION as u64;

#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
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

  #[inline]
  pub fn ok(&self) -> bool {
    self.magic.get() == FILE_MAGIC && self.version.get() == FORMAT_VERSION
  }
}

impl Default for FileHead {
  fn default() -> Self {
    Self::new()
  }
}

#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct Foot {
  pub index_offset: U64,
  pub index_len: U32,
  pub block_count: U32,
  pub cell_count: U64,
  /// CRC32 over the encoded block index
  /// 块索引编码的 CRC32
  pub checksum: U32,
  pub magic_ver: U64,
}

impl Foot {
  pub const SIZE: usize = size_of::<Self>();
}
