//! Packed cell buffer: the wire form of a mutation batch
//! 打包单元格缓冲：变更批次的线上格式
//!
//! Head: magic, crc32 over payload, cell count. Payload: length-prefixed
//! cells in strictly increasing key order.
//! 头部：魔数、负载 crc32、单元格数。负载：长度前缀单元格，键严格递增。

use zerocopy::{
  FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
  little_endian::{I64, U16, U32},
};

use crate::{Cell, CellKey, Error, Result};

/// "tCb0"
pub const MAGIC: u32 = 0x3062_4374;

/// Erasure marker in the value length field
/// 值长度字段中的墓碑标记
const ERASE_LEN: u32 = u32::MAX;

#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
struct BufHead {
  magic: U32,
  checksum: U32,
  count: U32,
}

#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
struct CellHead {
  row_len: U16,
  col_len: U16,
  ts: I64,
  val_len: U32,
}

const BUF_HEAD: usize = size_of::<BufHead>();
const CELL_HEAD: usize = size_of::<CellHead>();

/// Append one encoded cell
/// 追加一个编码单元格
pub fn push_cell(buf: &mut Vec<u8>, cell: &Cell) {
  let head = CellHead {
    row_len: U16::new(cell.key.row.len() as u16),
    col_len: U16::new(cell.key.col.len() as u16),
    ts: I64::new(cell.key.ts),
    val_len: U32::new(cell.val.as_ref().map_or(ERASE_LEN, |v| v.len() as u32)),
  };
  buf.extend_from_slice(head.as_bytes());
  buf.extend_from_slice(&cell.key.row);
  buf.extend_from_slice(&cell.key.col);
  if let Some(v) = &cell.val {
    buf.extend_from_slice(v);
  }
}

/// Decode one cell at `pos`, advancing it
/// 在 `pos` 处解码一个单元格并前移
pub fn read_cell(data: &[u8], pos: &mut usize) -> Result<Cell> {
  let trunc = |offset| Error::Truncated { offset };
  let head_end = *pos + CELL_HEAD;
  let head_bytes = data.get(*pos..head_end).ok_or(trunc(*pos))?;
  let head = CellHead::read_from_bytes(head_bytes).map_err(|_| trunc(*pos))?;

  let row_len = head.row_len.get() as usize;
  let col_len = head.col_len.get() as usize;
  let val_len = head.val_len.get();

  let row_end = head_end + row_len;
  let col_end = row_end + col_len;
  let row = data.get(head_end..row_end).ok_or(trunc(head_end))?;
  let col = data.get(row_end..col_end).ok_or(trunc(row_end))?;

  let (val, end) = if val_len == ERASE_LEN {
    (None, col_end)
  } else {
    let val_end = col_end + val_len as usize;
    let val = data.get(col_end..val_end).ok_or(trunc(col_end))?;
    (Some(Box::from(val)), val_end)
  };

  *pos = end;
  Ok(Cell {
    key: CellKey::new(row, col, head.ts.get()),
    val,
  })
}

/// Pack cells into a framed buffer
/// 将单元格打包为带框架的缓冲
pub fn pack(cells: &[Cell]) -> Vec<u8> {
  let mut payload = Vec::with_capacity(cells.iter().map(|c| c.size() + CELL_HEAD).sum());
  for cell in cells {
    push_cell(&mut payload, cell);
  }

  let head = BufHead {
    magic: U32::new(MAGIC),
    checksum: U32::new(crc32fast::hash(&payload)),
    count: U32::new(cells.len() as u32),
  };

  let mut buf = Vec::with_capacity(BUF_HEAD + payload.len());
  buf.extend_from_slice(head.as_bytes());
  buf.extend_from_slice(&payload);
  buf
}

/// Verified, decoded cell batch
/// 已校验并解码的单元格批次
///
/// Construction checks magic, checksum and strict key order, so a
/// buffer that decodes is safe to apply to a sorted table.
/// 构造时检查魔数、校验和与键严格递增，解码成功的缓冲可安全应用到有序表。
#[derive(Debug)]
pub struct CellBuffer {
  cells: Vec<Cell>,
  data_size: usize,
}

impl CellBuffer {
  pub fn decode(data: &[u8]) -> Result<Self> {
    let head_bytes = data.get(..BUF_HEAD).ok_or(Error::Truncated { offset: 0 })?;
    let head = BufHead::read_from_bytes(head_bytes).map_err(|_| Error::Truncated { offset: 0 })?;

    if head.magic.get() != MAGIC {
      return Err(Error::BadMagic);
    }

    let payload = &data[BUF_HEAD..];
    let actual = crc32fast::hash(payload);
    let expected = head.checksum.get();
    if actual != expected {
      return Err(Error::Checksum { expected, actual });
    }

    let count = head.count.get() as usize;
    let mut cells: Vec<Cell> = Vec::with_capacity(count);
    let mut pos = 0;
    for _ in 0..count {
      let cell = read_cell(payload, &mut pos)?;
      if let Some(last) = cells.last()
        && last.key >= cell.key
      {
        return Err(Error::BadOrder);
      }
      cells.push(cell);
    }
    if pos != payload.len() {
      return Err(Error::Truncated { offset: pos });
    }

    Ok(Self {
      cells,
      data_size: data.len(),
    })
  }

  #[inline]
  pub fn cells(&self) -> &[Cell] {
    &self.cells
  }

  #[inline]
  pub fn into_cells(self) -> Vec<Cell> {
    self.cells
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.cells.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.cells.is_empty()
  }

  /// Encoded size including framing
  /// 含框架的编码大小
  #[inline]
  pub fn data_size(&self) -> usize {
    self.data_size
  }

  /// Distinct rows touched, in order
  /// 触及的去重行，按序
  pub fn rows(&self) -> Vec<Box<[u8]>> {
    let mut rows: Vec<Box<[u8]>> = Vec::new();
    for cell in &self.cells {
      if rows.last().is_none_or(|r| *r != cell.key.row) {
        rows.push(cell.key.row.clone());
      }
    }
    rows
  }
}
