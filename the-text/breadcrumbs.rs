//! Sparse UTF-16 ↔ UTF-8 offset index for UTF-8 storage.
//!
//! Every `stride` UTF-16 code units (rounded up to the next scalar boundary)
//! the index records where that UTF-16 offset lives in the UTF-8 buffer.
//! A lookup binary-searches the nearest checkpoint at or before the query and
//! scans at most one stride of text from there.
//!
//! The index is immutable once built. It remembers which storage generation
//! and length it describes so that a lookup against a different generation can
//! be detected and the index rebuilt instead of trusted.

use the_core::chars::utf16_units_for_utf8_unit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Crumb {
  utf16: usize,
  utf8:  usize,
}

#[derive(Debug)]
pub(crate) struct Breadcrumbs {
  crumbs:    Vec<Crumb>,
  utf16_len: usize,
  epoch:     u64,
  len:       usize,
}

impl Breadcrumbs {
  pub(crate) fn build(text: &str, stride: usize, epoch: u64) -> Self {
    let stride = stride.max(1);
    let mut crumbs = vec![Crumb { utf16: 0, utf8: 0 }];
    let mut utf16 = 0;
    let mut checkpoint = stride;

    for (utf8, ch) in text.char_indices() {
      if utf16 >= checkpoint {
        crumbs.push(Crumb { utf16, utf8 });
        checkpoint = (utf16 / stride + 1) * stride;
      }
      utf16 += ch.len_utf16();
    }

    tracing::trace!(
      crumbs = crumbs.len(),
      utf16_len = utf16,
      epoch,
      "built utf-16 breadcrumbs"
    );

    Self {
      crumbs,
      utf16_len: utf16,
      epoch,
      len: text.len(),
    }
  }

  pub(crate) fn utf16_len(&self) -> usize {
    self.utf16_len
  }

  /// Whether this index was built for a different generation of the storage.
  pub(crate) fn is_stale(&self, epoch: u64, len: usize) -> bool {
    self.epoch != epoch || self.len != len
  }

  /// UTF-16 offset of the UTF-8 offset `utf8`. Offsets inside a scalar count
  /// the scalar as if it started there.
  pub(crate) fn utf16_offset(&self, text: &str, utf8: usize) -> usize {
    let utf8 = utf8.min(text.len());
    let idx = self.crumbs.partition_point(|c| c.utf8 <= utf8) - 1;
    let crumb = self.crumbs[idx];
    crumb.utf16 + count_utf16(&text.as_bytes()[crumb.utf8..utf8])
  }

  /// UTF-8 location of the UTF-16 offset `utf16`, as a scalar start plus 1
  /// when the offset addresses a trailing surrogate.
  pub(crate) fn utf8_offset(&self, text: &str, utf16: usize) -> Option<(usize, u8)> {
    if utf16 > self.utf16_len {
      return None;
    }
    let idx = self.crumbs.partition_point(|c| c.utf16 <= utf16) - 1;
    let crumb = self.crumbs[idx];
    scan_utf16(text, crumb.utf8, crumb.utf16, utf16)
  }
}

/// Number of UTF-16 code units needed for the scalars led by `bytes`.
pub(crate) fn count_utf16(bytes: &[u8]) -> usize {
  bytes.iter().map(|&b| utf16_units_for_utf8_unit(b)).sum()
}

/// Walks `text` from the scalar boundary `from` (UTF-16 offset `from_utf16`)
/// until the UTF-16 offset `target` is reached.
pub(crate) fn scan_utf16(
  text: &str,
  from: usize,
  from_utf16: usize,
  target: usize,
) -> Option<(usize, u8)> {
  let tail = text.get(from..)?;
  let mut utf16 = from_utf16;
  for (idx, ch) in tail.char_indices() {
    if utf16 == target {
      return Some((from + idx, 0));
    }
    let width = ch.len_utf16();
    if width == 2 && utf16 + 1 == target {
      return Some((from + idx, 1));
    }
    utf16 += width;
    if utf16 > target {
      return None;
    }
  }
  (utf16 == target).then_some((text.len(), 0))
}
