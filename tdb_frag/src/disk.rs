//! Immutable disk fragment
//! 不可变磁盘分片

use std::{
  path::{Path, PathBuf},
  sync::atomic::{AtomicU64, Ordering},
};

use compio::{
  buf::{IntoInner, IoBuf},
  fs::File,
  io::AsyncReadAtExt,
};
use tdb_cell::{CellOutput, IntervalSet, ScanPredicate, family};
use zerocopy::FromBytes;

use crate::{
  Error, Result,
  block::{self, FragBlock, IndexEntry},
  foot::{FileHead, Foot, MAGIC_VER},
};

/// Process-wide fragment identity for cache keying. Paths are not used
/// because a reloaded fragment must not alias a dropped one's blocks.
/// 进程级分片标识，用于缓存键。不用路径，避免重载分片与已弃分片的块混淆。
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Read side of the disk fragment format
/// 磁盘分片格式的读取端
#[derive(Debug)]
pub struct DiskFrag {
  file: File,
  path: PathBuf,
  id: u64,
  index: Vec<IndexEntry>,
  file_size: u64,
  cell_count: u64,
  /// Restricted column-family view; `None` = all families
  /// 列族受限视图；`None` 为全部
  families: Option<Vec<Box<[u8]>>>,
}

impl DiskFrag {
  /// Open a fragment file, verifying head, foot and index
  /// 打开分片文件，校验文件头、尾部与索引
  pub async fn open(path: impl AsRef<Path>, families: Option<Vec<Box<[u8]>>>) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    let file = File::open(&path).await?;
    let file_size = file.metadata().await?.len();

    let min = (FileHead::SIZE + Foot::SIZE) as u64;
    if file_size < min {
      return Err(Error::TooSmall { size: file_size });
    }

    let head_buf = read_exact(&file, 0, FileHead::SIZE).await?;
    let head = FileHead::read_from_bytes(&head_buf).map_err(|_| Error::BadMagic)?;
    if !head.ok() {
      return Err(Error::BadMagic);
    }

    let foot_buf = read_exact(&file, file_size - Foot::SIZE as u64, Foot::SIZE).await?;
    let foot = Foot::read_from_bytes(&foot_buf).map_err(|_| Error::BadMagic)?;
    if foot.magic_ver.get() != MAGIC_VER {
      return Err(Error::BadMagic);
    }

    let index_buf = read_exact(&file, foot.index_offset.get(), foot.index_len.get() as usize).await?;
    let expected = foot.checksum.get();
    let actual = crc32fast::hash(&index_buf);
    if actual != expected {
      return Err(Error::Checksum { expected, actual });
    }

    let index = block::decode_index(&index_buf)?;
    if index.len() != foot.block_count.get() as usize {
      return Err(Error::InvalidIndex);
    }

    Ok(Self {
      file,
      path,
      id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
      index,
      file_size,
      cell_count: foot.cell_count.get(),
      families,
    })
  }

  #[inline]
  pub fn id(&self) -> u64 {
    self.id
  }

  #[inline]
  pub fn path(&self) -> &Path {
    &self.path
  }

  #[inline]
  pub fn block_count(&self) -> usize {
    self.index.len()
  }

  #[inline]
  pub fn cell_count(&self) -> u64 {
    self.cell_count
  }

  /// Disk size estimate for a row interval; `None` = whole fragment
  /// 行区间的磁盘大小估计；`None` 为整个分片
  pub fn disk_size(&self, rows: Option<&IntervalSet<Box<[u8]>>>) -> u64 {
    let Some(rows) = rows else {
      return self.file_size;
    };
    let mut total = 0u64;
    for (i, e) in self.index.iter().enumerate() {
      let hi = self.index.get(i + 1).map(|n| &n.first.row);
      if rows.overlaps(&e.first.row, hi) {
        total += e.len as u64;
      }
    }
    total
  }

  /// Next block at or after `min_block` whose row span could match the
  /// predicate, or `None` when out of blocks
  /// `min_block` 起首个行范围可能匹配谓词的块；没有则为 `None`
  pub fn next_block(&self, pred: &ScanPredicate, min_block: usize) -> Option<usize> {
    for i in min_block..self.index.len() {
      // Block rows span [first row, next block's first row]; the bound
      // is inclusive since a row can straddle blocks
      // 块行范围为 [首行, 下一块首行]；行可跨块，故上界取闭
      let lo = &self.index[i].first.row;
      let hi = self.index.get(i + 1).map(|n| &*n.first.row);
      if pred.overlaps_rows(lo, hi) {
        return Some(i);
      }
    }
    None
  }

  /// Load and decode one block
  /// 加载并解码一个块
  pub async fn load_block(&self, addr: usize) -> Result<FragBlock> {
    let e = self.index.get(addr).ok_or(Error::InvalidIndex)?;
    let data = read_exact(&self.file, e.offset, e.len as usize).await?;
    let mut cells = block::open_block(&data, e.offset)?;
    if let Some(fams) = &self.families {
      cells.retain(|c| fams.iter().any(|f| **f == *family(&c.key.col)));
    }
    Ok(FragBlock { cells })
  }

  /// Full predicate scan in canonical order. History limits and erasure
  /// suppression are the merge engine's concern, not the fragment's.
  /// 按规范顺序的谓词全扫描。历史上限与墓碑压制由合并引擎负责。
  pub async fn scan(&self, pred: &ScanPredicate, out: &mut impl CellOutput) -> Result<()> {
    let mut addr = 0;
    while let Some(i) = self.next_block(pred, addr) {
      let block = self.load_block(i).await?;
      for cell in block.cells {
        if pred.matches(&cell) {
          out.emit(cell);
        }
      }
      addr = i + 1;
    }
    Ok(())
  }
}

async fn read_exact(file: &File, offset: u64, len: usize) -> Result<Vec<u8>> {
  let buf = vec![0u8; len];
  let res = file.read_exact_at(buf.slice(0..len), offset).await;
  res.0?;
  Ok(res.1.into_inner())
}
