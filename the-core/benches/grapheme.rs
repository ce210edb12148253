//! Benchmarks for the grapheme segment provider in the-core.
//!
//! Run with: `cargo bench -p the-core`

use divan::{
  Bencher,
  black_box,
};
use the_core::grapheme::{
  ensure_boundary_prev,
  next_boundary,
  prev_boundary,
};

fn main() {
  divan::main();
}

// Test data generators.

fn repeat_to(unit: &str, size: usize) -> String {
  let mut s = String::with_capacity(size + unit.len());
  while s.len() < size {
    s.push_str(unit);
  }
  // Truncate at char boundary
  while s.len() > size {
    s.pop();
  }
  s
}

fn make_ascii_text(size: usize) -> String {
  repeat_to("The quick brown fox jumps over the lazy dog. ", size)
}

fn make_combining_text(size: usize) -> String {
  // "a\u{0301}" = á (a + combining acute), 3 bytes per grapheme
  repeat_to("a\u{0301}", size)
}

fn make_flag_text(size: usize) -> String {
  repeat_to("🇺🇸🇨🇦🇯🇵", size)
}

fn make_mixed_text(size: usize) -> String {
  repeat_to("Hello 世界! 🎉 Test テスト 👨\u{200D}👩\u{200D}👧 ", size)
}

fn mid_scalars(text: &str) -> (Vec<char>, usize) {
  let scalars: Vec<char> = text.chars().collect();
  let mid = scalars.len() / 2;
  (scalars, mid)
}

mod boundary {
  use super::*;

  const SIZE: usize = 1000;

  #[divan::bench(args = ["ascii", "combining", "flags", "mixed"])]
  fn next(bencher: Bencher, kind: &str) {
    let text = match kind {
      "ascii" => make_ascii_text(SIZE),
      "combining" => make_combining_text(SIZE),
      "flags" => make_flag_text(SIZE),
      _ => make_mixed_text(SIZE),
    };
    let (scalars, mid) = mid_scalars(&text);

    bencher.bench(|| next_boundary(black_box(&scalars[mid..]).iter().copied()));
  }

  #[divan::bench(args = ["ascii", "combining", "flags", "mixed"])]
  fn prev(bencher: Bencher, kind: &str) {
    let text = match kind {
      "ascii" => make_ascii_text(SIZE),
      "combining" => make_combining_text(SIZE),
      "flags" => make_flag_text(SIZE),
      _ => make_mixed_text(SIZE),
    };
    let (scalars, mid) = mid_scalars(&text);

    bencher.bench(|| prev_boundary(black_box(&scalars[..mid]).iter().rev().copied()));
  }

  #[divan::bench]
  fn ensure_prev_combining(bencher: Bencher) {
    let text = make_combining_text(SIZE);
    let (scalars, _) = mid_scalars(&text);
    // Odd scalar index: inside an "a + acute" cluster.
    let at = scalars.len() / 2 | 1;

    bencher.bench(|| {
      ensure_boundary_prev(
        black_box(&scalars[..at]).iter().rev().copied(),
        black_box(&scalars[at..]).iter().copied(),
      )
    });
  }
}
