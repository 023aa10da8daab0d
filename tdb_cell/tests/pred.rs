//! Scan predicate tests
//! 扫描谓词测试

use proptest::prelude::*;
use tdb_cell::{Cell, IntervalSet, ScanPredicate};

#[test]
fn test_all_matches_everything() {
  let pred = ScanPredicate::all();
  assert!(pred.matches(&Cell::put(*b"r", *b"f:q", 1, *b"v")));
  assert!(pred.matches(&Cell::erase(*b"", *b"", i64::MIN)));
  assert!(pred.overlaps_rows(b"a", None));
}

#[test]
fn test_row_ranges() {
  let mut rows = IntervalSet::new();
  rows.add(Box::from(*b"b")..Box::from(*b"d")).point(Box::from(*b"x"));
  let pred = ScanPredicate::all().rows(rows);

  assert!(!pred.contains_row(b"a"));
  assert!(pred.contains_row(b"b"));
  assert!(pred.contains_row(b"c"));
  assert!(!pred.contains_row(b"d"));
  assert!(pred.contains_row(b"x"));
}

#[test]
fn test_overlaps_rows() {
  let mut rows = IntervalSet::new();
  rows.add(Box::from(*b"m")..Box::from(*b"p"));
  let pred = ScanPredicate::all().rows(rows);

  assert!(!pred.overlaps_rows(b"a", Some(b"c")));
  assert!(pred.overlaps_rows(b"a", Some(b"n")));
  assert!(pred.overlaps_rows(b"n", Some(b"z")));
  assert!(pred.overlaps_rows(b"n", None));
  assert!(!pred.overlaps_rows(b"q", None));
}

#[test]
fn test_col_and_time() {
  let mut cols = IntervalSet::new();
  cols.point(Box::from(*b"f:q"));
  let mut times = IntervalSet::new();
  times.add(5..=10);
  let pred = ScanPredicate::all().cols(cols).times(times);

  assert!(pred.matches(&Cell::put(*b"r", *b"f:q", 7, *b"v")));
  assert!(!pred.matches(&Cell::put(*b"r", *b"f:z", 7, *b"v")));
  assert!(!pred.matches(&Cell::put(*b"r", *b"f:q", 11, *b"v")));
}

proptest! {
  #![proptest_config(ProptestConfig::with_cases(256))]

  // A member of the set must make every window containing it overlap;
  // block skipping would otherwise drop matching cells.
  // 集合成员所在的任何窗口都必须判为相交，否则跳块会丢匹配单元格。
  #[test]
  fn prop_contains_implies_overlaps(
    ranges in prop::collection::vec((0i64..100, 0i64..40), 1..8),
    v in 0i64..140,
    lo_pad in 0i64..20,
    hi_pad in 0i64..20,
  ) {
    let mut set = IntervalSet::new();
    for (start, len) in ranges {
      set.add(start..start + len);
    }
    if set.contains(&v) {
      let lo = v - lo_pad;
      prop_assert!(set.overlaps(&lo, Some(&(v + hi_pad))));
      prop_assert!(set.overlaps(&lo, None));
    }
  }
}
