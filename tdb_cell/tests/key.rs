//! Cell order tests
//! 单元格排序测试

use tdb_cell::{Cell, CellKey, family};

#[test]
fn test_order_row_col_asc() {
  let a = CellKey::new(*b"a", *b"f:x", 5);
  let b = CellKey::new(*b"b", *b"f:x", 5);
  let c = CellKey::new(*b"b", *b"f:y", 5);
  assert!(a < b);
  assert!(b < c);
}

#[test]
fn test_order_ts_desc() {
  // Newer version sorts first
  // 新版本排在前
  let new = CellKey::new(*b"a", *b"f:x", 10);
  let old = CellKey::new(*b"a", *b"f:x", 3);
  assert!(new < old);
}

#[test]
fn test_same_cell() {
  let a = CellKey::new(*b"a", *b"f:x", 10);
  let b = CellKey::new(*b"a", *b"f:x", 3);
  let c = CellKey::new(*b"a", *b"f:y", 10);
  assert!(a.same_cell(&b));
  assert!(!a.same_cell(&c));
}

#[test]
fn test_cell_kinds() {
  let put = Cell::put(*b"r", *b"f:q", 1, *b"v");
  let erase = Cell::erase(*b"r", *b"f:q", 1);
  assert!(!put.is_erasure());
  assert!(erase.is_erasure());
  assert_eq!(put.size(), 1 + 3 + 8 + 1);
  assert_eq!(erase.size(), 1 + 3 + 8);
}

#[test]
fn test_family() {
  assert_eq!(family(b"fam:qual"), b"fam");
  assert_eq!(family(b"fam:"), b"fam");
  assert_eq!(family(b"noqual"), b"noqual");
}
