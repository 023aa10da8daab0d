//! Fragment writer: streaming, strictly ordered
//! 分片写入器：流式、严格有序

use std::path::{Path, PathBuf};

use compio::{
  fs::File,
  io::AsyncWriteAtExt,
};
use tdb_cell::{Cell, CellKey, push_cell};

use crate::{
  Error, Result,
  block::{self, IndexEntry},
  foot::{FileHead, Foot, MAGIC_VER},
};
use zerocopy::{
  IntoBytes,
  little_endian::{U32, U64},
};

/// Default block size, bytes of encoded cells per block
/// 默认块大小（每块编码单元格字节数）
pub const DEFAULT_BLOCK_SIZE: usize = 64 << 10;

/// Identity of a finished fragment
/// 已完成分片的标识
#[derive(Debug, Clone)]
pub struct FragMeta {
  pub path: PathBuf,
  pub size: u64,
  pub cell_count: u64,
  pub block_count: usize,
}

/// Streams cells into the disk fragment format. `put` must be called in
/// strictly increasing cell order; a violation is rejected before any
/// byte is written, since unsorted output corrupts the format
/// irrecoverably.
/// 将单元格流式写入磁盘分片格式。`put` 必须按严格递增顺序调用；违反时在写出任何
/// 字节前拒绝，乱序输出会不可恢复地损坏格式。
pub struct FragWriter {
  file: File,
  tmp_path: PathBuf,
  path: PathBuf,
  block_size: usize,
  /// Encoded cells of the open block
  /// 当前未封块的编码单元格
  buf: Vec<u8>,
  buf_cells: u32,
  first_key: Option<CellKey>,
  last_key: Option<CellKey>,
  index: Vec<IndexEntry>,
  offset: u64,
  cell_count: u64,
  finished: bool,
}

impl FragWriter {
  /// Create a writer targeting `path`. Data goes to a temp sibling and
  /// is published on `finish`.
  /// 创建以 `path` 为目标的写入器。数据先写临时文件，`finish` 时发布。
  pub async fn create(path: impl AsRef<Path>, block_size: usize) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    let mut tmp_path = path.clone().into_os_string();
    tmp_path.push(".tmp");
    let tmp_path = PathBuf::from(tmp_path);

    let mut file = File::create(&tmp_path).await?;
    file.write_all_at(FileHead::new().as_bytes().to_vec(), 0).await.0?;

    Ok(Self {
      file,
      tmp_path,
      path,
      block_size: block_size.max(1),
      buf: Vec::with_capacity(block_size.max(1)),
      buf_cells: 0,
      first_key: None,
      last_key: None,
      index: Vec::new(),
      offset: FileHead::SIZE as u64,
      cell_count: 0,
      finished: false,
    })
  }

  /// Append one cell. Keys must strictly increase.
  /// 追加一个单元格。键必须严格递增。
  pub async fn put(&mut self, cell: &Cell) -> Result<()> {
    if let Some(last) = &self.last_key
      && *last >= cell.key
    {
      return Err(Error::OutOfOrder);
    }

    if self.first_key.is_none() {
      self.first_key = Some(cell.key.clone());
    }
    self.last_key = Some(cell.key.clone());

    push_cell(&mut self.buf, cell);
    self.buf_cells += 1;
    self.cell_count += 1;

    if self.buf.len() >= self.block_size {
      self.seal().await?;
    }
    Ok(())
  }

  /// Running size estimate of the finished fragment
  /// 完成后分片的运行时大小估计
  #[inline]
  pub fn size(&self) -> u64 {
    self.offset + self.buf.len() as u64
  }

  #[inline]
  pub fn cell_count(&self) -> u64 {
    self.cell_count
  }

  /// Seal the open block to disk
  /// 将当前块封盘
  async fn seal(&mut self) -> Result<()> {
    if self.buf_cells == 0 {
      return Ok(());
    }
    let data = block::seal_block(self.buf_cells, &self.buf);
    let len = data.len() as u32;
    self.file.write_all_at(data, self.offset).await.0?;

    // first_key is set whenever buf_cells > 0
    let first = self.first_key.take().ok_or(Error::InvalidIndex)?;
    self.index.push(IndexEntry {
      first,
      offset: self.offset,
      len,
    });
    self.offset += len as u64;
    self.buf.clear();
    self.buf_cells = 0;
    Ok(())
  }

  /// Flush, write index and foot, sync, publish. Returns the new
  /// fragment's identity.
  /// 刷盘、写索引与尾部、同步、发布。返回新分片的标识。
  pub async fn finish(mut self) -> Result<FragMeta> {
    self.seal().await?;

    let index_data = block::encode_index(&self.index);
    let index_offset = self.offset;
    let checksum = crc32fast::hash(&index_data);
    let index_len = index_data.len() as u32;
    self.file.write_all_at(index_data, self.offset).await.0?;
    self.offset += index_len as u64;

    let foot = Foot {
      index_offset: U64::new(index_offset),
      index_len: U32::new(index_len),
      block_count: U32::new(self.index.len() as u32),
      cell_count: U64::new(self.cell_count),
      checksum: U32::new(checksum),
      magic_ver: U64::new(MAGIC_VER),
    };
    self.file.write_all_at(foot.as_bytes().to_vec(), self.offset).await.0?;
    self.offset += Foot::SIZE as u64;

    self.file.sync_all().await?;
    std::fs::rename(&self.tmp_path, &self.path)?;
    self.finished = true;

    Ok(FragMeta {
      path: self.path.clone(),
      size: self.offset,
      cell_count: self.cell_count,
      block_count: self.index.len(),
    })
  }
}

impl Drop for FragWriter {
  fn drop(&mut self) {
    // Abandoned writer leaves no partial fragment behind
    // 被放弃的写入器不留下残缺分片
    if !self.finished {
      let _ = std::fs::remove_file(&self.tmp_path);
    }
  }
}
