//! Packed cell buffer tests
//! 打包单元格缓冲测试

use tdb_cell::{Cell, CellBuffer, Error, pack};

fn batch() -> Vec<Cell> {
  vec![
    Cell::put(*b"a", *b"f:x", 10, *b"v1"),
    Cell::put(*b"a", *b"f:x", 3, *b"v0"),
    Cell::erase(*b"a", *b"f:y", 5),
    Cell::put(*b"b", *b"f:x", 1, *b""),
  ]
}

#[test]
fn test_roundtrip() {
  let cells = batch();
  let data = pack(&cells);
  let buf = CellBuffer::decode(&data).unwrap();
  assert_eq!(buf.cells(), &cells[..]);
  assert_eq!(buf.data_size(), data.len());
}

#[test]
fn test_rows() {
  let data = pack(&batch());
  let buf = CellBuffer::decode(&data).unwrap();
  let rows = buf.rows();
  assert_eq!(rows.len(), 2);
  assert_eq!(&*rows[0], b"a");
  assert_eq!(&*rows[1], b"b");
}

#[test]
fn test_bad_magic() {
  let mut data = pack(&batch());
  data[0] ^= 0xff;
  assert!(matches!(CellBuffer::decode(&data), Err(Error::BadMagic)));
}

#[test]
fn test_bad_checksum() {
  let mut data = pack(&batch());
  let last = data.len() - 1;
  data[last] ^= 0xff;
  assert!(matches!(
    CellBuffer::decode(&data),
    Err(Error::Checksum { .. })
  ));
}

#[test]
fn test_bad_order() {
  // Duplicate key is out of order too
  // 重复键同样视为乱序
  let cells = vec![
    Cell::put(*b"a", *b"f:x", 10, *b"v1"),
    Cell::put(*b"a", *b"f:x", 10, *b"v2"),
  ];
  let data = pack(&cells);
  assert!(matches!(CellBuffer::decode(&data), Err(Error::BadOrder)));
}

#[test]
fn test_truncated() {
  let data = pack(&batch());
  assert!(matches!(
    CellBuffer::decode(&data[..data.len() - 1]),
    Err(Error::Checksum { .. })
  ));
}

#[test]
fn test_empty() {
  let data = pack(&[]);
  let buf = CellBuffer::decode(&data).unwrap();
  assert!(buf.is_empty());
}
