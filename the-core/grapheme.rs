//! Grapheme cluster boundaries over streams of Unicode scalars.
//!
//! The text engine never hands the segmenter a whole document. Instead it
//! feeds scalars outward from a position, in whatever encoding the storage
//! happens to use, and asks how many of them belong to the adjacent cluster.
//! Counts are in scalars, so callers translate them back into their own
//! code-unit grid.
//!
//! The start of the forward stream (and the end of the backward stream) is
//! treated as the edge of the text. That is what gives substrings cut at an
//! arbitrary scalar boundary their own, independent grapheme grid.

use smallvec::SmallVec;
use unicode_segmentation::{
  GraphemeCursor,
  GraphemeIncomplete,
};

use crate::chars::has_fast_break;

/// Number of scalars decoded before the first attempt at segmenting. Doubled
/// every time the cursor asks for more text.
const INITIAL_WINDOW: usize = 16;

/// Returns how many scalars of `scalars` make up the first grapheme cluster.
///
/// `scalars` must start on a cluster boundary. Returns 0 only for an empty
/// stream.
#[must_use]
pub fn next_boundary<I>(scalars: I) -> usize
where
  I: Iterator<Item = char> + Clone,
{
  let mut peek = scalars.clone();
  let Some(first) = peek.next() else {
    return 0;
  };
  match peek.next() {
    None => return 1,
    Some(second) => {
      if has_fast_break(first, second) == Some(true) {
        return 1;
      }
    },
  }

  let mut window = INITIAL_WINDOW;
  let mut buf = String::new();
  loop {
    buf.clear();
    let mut rest = scalars.clone();
    buf.extend(rest.by_ref().take(window));
    let more = rest.next().is_some();

    // A phantom trailing byte tells the cursor that the text continues past
    // the window, so it asks for more instead of declaring a boundary.
    let len = buf.len() + usize::from(more);
    let mut cursor = GraphemeCursor::new(0, len, true);
    match cursor.next_boundary(&buf, 0) {
      Ok(Some(end)) if end <= buf.len() => return buf[..end].chars().count(),
      Err(GraphemeIncomplete::NextChunk) if more => window *= 2,
      // The stream starts on a boundary, so no earlier context is ever needed.
      _ => return 1,
    }
  }
}

/// Returns how many scalars, counted backwards from the end of the text, make
/// up the grapheme cluster that ends at (or contains) that end.
///
/// `scalars_rev` yields the scalars preceding a position in reverse order.
/// Returns 0 only for an empty stream.
#[must_use]
pub fn prev_boundary<I>(scalars_rev: I) -> usize
where
  I: Iterator<Item = char> + Clone,
{
  let mut peek = scalars_rev.clone();
  let Some(last) = peek.next() else {
    return 0;
  };
  match peek.next() {
    None => return 1,
    Some(before) => {
      if has_fast_break(before, last) == Some(true) {
        return 1;
      }
    },
  }

  let mut window = INITIAL_WINDOW;
  let mut buf = String::new();
  loop {
    let mut rest = scalars_rev.clone();
    let mut taken: SmallVec<[char; INITIAL_WINDOW]> = rest.by_ref().take(window).collect();
    let more = rest.next().is_some();
    taken.reverse();
    buf.clear();
    buf.extend(taken.iter());

    // Same trick as `next_boundary`: a phantom leading byte stands in for the
    // text that was not decoded.
    let pre = usize::from(more);
    let len = pre + buf.len();
    let mut cursor = GraphemeCursor::new(len, len, true);
    match cursor.prev_boundary(&buf, pre) {
      Ok(Some(start)) if start >= pre => return buf[start - pre..].chars().count(),
      Ok(None) => return taken.len(),
      Err(GraphemeIncomplete::PrevChunk | GraphemeIncomplete::PreContext(_)) if more => {
        window *= 2
      },
      _ => return taken.len(),
    }
  }
}

/// Returns how many scalars lie between a position and the start of the
/// cluster containing it: 0 when the position is already a boundary.
///
/// `before_rev` yields the scalars preceding the position in reverse order and
/// `after` the scalars following it.
#[must_use]
pub fn ensure_boundary_prev<B, A>(before_rev: B, after: A) -> usize
where
  B: Iterator<Item = char> + Clone,
  A: Iterator<Item = char> + Clone,
{
  let back = prev_boundary(before_rev.clone());
  if back == 0 {
    return 0;
  }

  let mut cluster: Vec<char> = before_rev.take(back).collect();
  cluster.reverse();
  let forward = next_boundary(cluster.iter().copied().chain(after));
  if forward <= back { 0 } else { back }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn clusters(text: &str) -> Vec<usize> {
    let mut out = Vec::new();
    let mut rest = text.chars();
    loop {
      let n = next_boundary(rest.clone());
      if n == 0 {
        break;
      }
      out.push(n);
      for _ in 0..n {
        rest.next();
      }
    }
    out
  }

  fn clusters_rev(text: &str) -> Vec<usize> {
    let scalars: Vec<char> = text.chars().collect();
    let mut end = scalars.len();
    let mut out = Vec::new();
    loop {
      let n = prev_boundary(scalars[..end].iter().rev().copied());
      if n == 0 {
        break;
      }
      out.push(n);
      end -= n;
    }
    out.reverse();
    out
  }

  #[test]
  fn test_next_boundary_ascii_and_crlf() {
    assert_eq!(clusters("abc"), vec![1, 1, 1]);
    assert_eq!(clusters("x\r\ny"), vec![1, 2, 1]);
    assert_eq!(next_boundary("".chars()), 0);
  }

  #[test]
  fn test_boundaries_combining() {
    // "a\u{0301}" (a + combining acute) is one grapheme cluster of 2 chars
    assert_eq!(clusters("a\u{0301}b"), vec![2, 1]);
    assert_eq!(clusters_rev("a\u{0301}b"), vec![2, 1]);
  }

  #[test]
  fn test_boundaries_regional_indicators() {
    let flags = "a🇺🇸🇨🇦b";
    assert_eq!(clusters(flags), vec![1, 2, 2, 1]);
    assert_eq!(clusters_rev(flags), vec![1, 2, 2, 1]);

    // Starting the stream on the second indicator re-pairs the rest.
    assert_eq!(clusters("🇸🇨🇦"), vec![2, 1]);
  }

  #[test]
  fn test_boundaries_long_regional_indicator_run() {
    // Parity has to be resolved across several window expansions.
    let run: String = std::iter::repeat_n("🇺🇸", 40).collect();
    assert_eq!(clusters(&run), vec![2; 40]);
    assert_eq!(clusters_rev(&run), vec![2; 40]);
  }

  #[test]
  fn test_boundaries_zwj_sequence() {
    let family = "👨\u{200D}👩\u{200D}👧";
    assert_eq!(clusters(family), vec![5]);
    assert_eq!(clusters_rev(family), vec![5]);
    assert_eq!(clusters(&format!("x{family}y")), vec![1, 5, 1]);
  }

  #[test]
  fn test_long_cluster_grows_window() {
    let mut text = String::from("e");
    text.extend(std::iter::repeat_n('\u{301}', 50));
    text.push('z');
    assert_eq!(clusters(&text), vec![51, 1]);
    assert_eq!(clusters_rev(&text), vec![51, 1]);
  }

  #[test]
  fn test_ensure_boundary_prev() {
    let scalars: Vec<char> = "a\u{0301}b🇺🇸".chars().collect();
    let at = |i: usize| {
      ensure_boundary_prev(
        scalars[..i].iter().rev().copied(),
        scalars[i..].iter().copied(),
      )
    };
    assert_eq!(at(0), 0);
    assert_eq!(at(1), 1);
    assert_eq!(at(2), 0);
    assert_eq!(at(3), 0);
    assert_eq!(at(4), 1);
    assert_eq!(at(5), 0);
  }
}
