//! Cell block: the cached unit of fragment data
//! 单元格块：分片数据的缓存单位

use tdb_cell::{Cell, CellKey, read_cell};
use zerocopy::{
  FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
  little_endian::{I64, U16, U32, U64},
};

use crate::{Error, Result};

/// Read-ahead window size for in-memory fragments, in cells
/// 内存分片的预读窗口大小（单元格数）
pub const BLOCK_CELLS_HINT: usize = 256;

/// A decoded, contiguous chunk of a fragment's cell sequence
/// 分片单元格序列中已解码的连续片段
#[derive(Debug)]
pub struct FragBlock {
  pub cells: Vec<Cell>,
}

impl FragBlock {
  /// Index of the first cell strictly after `key`
  /// 严格大于 `key` 的首个单元格下标
  #[inline]
  pub fn seek_after(&self, key: &CellKey) -> usize {
    self.cells.partition_point(|c| c.key <= *key)
  }
}

/// Seal a block: count, encoded cells, trailing crc32
/// 封块：条数、编码单元格、尾随 crc32
pub(crate) fn seal_block(count: u32, payload: &[u8]) -> Vec<u8> {
  let mut buf = Vec::with_capacity(4 + payload.len() + 4);
  buf.extend_from_slice(&count.to_le_bytes());
  buf.extend_from_slice(payload);
  let crc = crc32fast::hash(&buf);
  buf.extend_from_slice(&crc.to_le_bytes());
  buf
}

/// Decode and verify a sealed block. `offset` is only for errors.
/// 解码并校验封块。`offset` 仅用于错误信息。
pub(crate) fn open_block(data: &[u8], offset: u64) -> Result<Vec<Cell>> {
  if data.len() < 8 {
    return Err(Error::InvalidBlock { offset });
  }
  let (body, crc_bytes) = data.split_at(data.len() - 4);
  let expected = U32::read_from_bytes(crc_bytes).map_err(|_| Error::InvalidBlock { offset })?.get();
  let actual = crc32fast::hash(body);
  if actual != expected {
    return Err(Error::Checksum { expected, actual });
  }

  let count = U32::read_from_bytes(&body[..4]).map_err(|_| Error::InvalidBlock { offset })?.get() as usize;
  let payload = &body[4..];
  let mut cells = Vec::with_capacity(count);
  let mut pos = 0;
  for _ in 0..count {
    cells.push(read_cell(payload, &mut pos)?);
  }
  if pos != payload.len() {
    return Err(Error::InvalidBlock { offset });
  }
  Ok(cells)
}

#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
struct IndexEntryHead {
  row_len: U16,
  col_len: U16,
  ts: I64,
  offset: U64,
  len: U32,
}

const ENTRY_HEAD: usize = size_of::<IndexEntryHead>();

/// Block index entry: first key of the block and its file extent
/// 块索引项：块的首键及其文件范围
#[derive(Debug, Clone)]
pub(crate) struct IndexEntry {
  pub first: CellKey,
  pub offset: u64,
  pub len: u32,
}

/// Encode the block index (count-prefixed entries)
/// 编码块索引（条数前缀的条目）
pub(crate) fn encode_index(entries: &[IndexEntry]) -> Vec<u8> {
  let mut buf = Vec::with_capacity(4 + entries.len() * (ENTRY_HEAD + 16));
  buf.extend_from_slice(&(entries.len() as u32).to_le_bytes());
  for e in entries {
    let head = IndexEntryHead {
      row_len: U16::new(e.first.row.len() as u16),
      col_len: U16::new(e.first.col.len() as u16),
      ts: I64::new(e.first.ts),
      offset: U64::new(e.offset),
      len: U32::new(e.len),
    };
    buf.extend_from_slice(head.as_bytes());
    buf.extend_from_slice(&e.first.row);
    buf.extend_from_slice(&e.first.col);
  }
  buf
}

pub(crate) fn decode_index(data: &[u8]) -> Result<Vec<IndexEntry>> {
  let count_bytes = data.get(..4).ok_or(Error::InvalidIndex)?;
  let count = U32::read_from_bytes(count_bytes).map_err(|_| Error::InvalidIndex)?.get() as usize;

  let mut entries = Vec::with_capacity(count);
  let mut pos = 4;
  for _ in 0..count {
    let head_bytes = data.get(pos..pos + ENTRY_HEAD).ok_or(Error::InvalidIndex)?;
    let head = IndexEntryHead::read_from_bytes(head_bytes).map_err(|_| Error::InvalidIndex)?;
    pos += ENTRY_HEAD;

    let row_end = pos + head.row_len.get() as usize;
    let col_end = row_end + head.col_len.get() as usize;
    let row = data.get(pos..row_end).ok_or(Error::InvalidIndex)?;
    let col = data.get(row_end..col_end).ok_or(Error::InvalidIndex)?;
    pos = col_end;

    entries.push(IndexEntry {
      first: CellKey::new(row, col, head.ts.get()),
      offset: head.offset.get(),
      len: head.len.get(),
    });
  }
  if pos != data.len() {
    return Err(Error::InvalidIndex);
  }
  Ok(entries)
}
