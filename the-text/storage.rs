//! Storage backends and the scalar-level primitives every view is built on.
//!
//! All offsets in this module are in the native code-unit grid of the
//! backend: bytes for UTF-8 storage and 16-bit units for UTF-16 storage.

use std::{
  borrow::Cow,
  ops::Range,
  sync::Arc,
};

use arc_swap::ArcSwapOption;
use smartstring::{
  Compact,
  SmartString,
};
use the_core::chars::{
  REPLACEMENT_CHARACTER,
  is_high_surrogate,
  is_low_surrogate,
  is_utf8_continuation,
};

use crate::{
  breadcrumbs::{
    self,
    Breadcrumbs,
  },
  config::IndexConfig,
  encoding::Encoding,
};

/// Interchangeable ways of holding the text. Every variant answers the same
/// questions; only UTF-8 variants can lend out a `&str`.
#[derive(Debug, Clone)]
pub(crate) enum Backend {
  /// UTF-8 on the heap.
  Native(String),
  /// Short UTF-8 kept inline.
  Small(SmartString<Compact>),
  /// UTF-16 adopted from a foreign source. May hold lone surrogates, which
  /// read as U+FFFD.
  Foreign(Vec<u16>),
}

/// Borrowed code units of a backend.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Units<'a> {
  Utf8(&'a str),
  Utf16(&'a [u16]),
}

impl Backend {
  pub(crate) fn utf8(text: String) -> Self {
    if text.len() <= smartstring::MAX_INLINE {
      Self::Small(SmartString::from(text.as_str()))
    } else {
      Self::Native(text)
    }
  }

  pub(crate) fn encoding(&self) -> Encoding {
    match self {
      Self::Native(_) | Self::Small(_) => Encoding::Utf8,
      Self::Foreign(_) => Encoding::Utf16,
    }
  }

  pub(crate) fn units(&self) -> Units<'_> {
    match self {
      Self::Native(text) => Units::Utf8(text),
      Self::Small(text) => Units::Utf8(text),
      Self::Foreign(units) => Units::Utf16(units),
    }
  }

  pub(crate) fn code_unit_count(&self) -> usize {
    match self.units() {
      Units::Utf8(text) => text.len(),
      Units::Utf16(units) => units.len(),
    }
  }

  pub(crate) fn is_ascii(&self) -> bool {
    match self.units() {
      Units::Utf8(text) => text.is_ascii(),
      Units::Utf16(units) => units.iter().all(|&u| u < 0x80),
    }
  }

  /// Direct UTF-8 access, when the backend stores UTF-8.
  pub(crate) fn fast_utf8(&self) -> Option<&str> {
    match self.units() {
      Units::Utf8(text) => Some(text),
      Units::Utf16(_) => None,
    }
  }

  pub(crate) fn foreign_copy_utf8(&self) -> String {
    match self.units() {
      Units::Utf8(text) => text.to_owned(),
      Units::Utf16(units) => String::from_utf16_lossy(units),
    }
  }

  /// `range` must lie on scalar boundaries.
  pub(crate) fn replace_range(&mut self, range: Range<usize>, with: &str) {
    match self {
      Self::Native(text) => text.replace_range(range, with),
      Self::Small(text) => {
        let mut owned = String::with_capacity(text.len() + with.len());
        owned.push_str(text);
        owned.replace_range(range, with);
        *self = Self::utf8(owned);
      },
      Self::Foreign(units) => {
        units.splice(range, with.encode_utf16());
      },
    }
  }
}

/// One storage identity: the backend plus everything derived from it.
///
/// Cloning produces a new identity, so the clone starts without breadcrumbs.
#[derive(Debug)]
pub(crate) struct Storage {
  backend:     Backend,
  ascii:       bool,
  epoch:       u64,
  config:      IndexConfig,
  breadcrumbs: ArcSwapOption<Breadcrumbs>,
}

impl Clone for Storage {
  fn clone(&self) -> Self {
    Self {
      backend:     self.backend.clone(),
      ascii:       self.ascii,
      epoch:       self.epoch,
      config:      self.config,
      breadcrumbs: ArcSwapOption::empty(),
    }
  }
}

impl Storage {
  pub(crate) fn new(backend: Backend, config: IndexConfig) -> Self {
    Self {
      ascii: backend.is_ascii(),
      backend,
      epoch: 0,
      config: config.sanitized(),
      breadcrumbs: ArcSwapOption::empty(),
    }
  }

  pub(crate) fn backend(&self) -> &Backend {
    &self.backend
  }

  pub(crate) fn encoding(&self) -> Encoding {
    self.backend.encoding()
  }

  pub(crate) fn units(&self) -> Units<'_> {
    self.backend.units()
  }

  pub(crate) fn len(&self) -> usize {
    self.backend.code_unit_count()
  }

  pub(crate) fn is_ascii(&self) -> bool {
    self.ascii
  }

  pub(crate) fn epoch(&self) -> u64 {
    self.epoch
  }

  pub(crate) fn config(&self) -> &IndexConfig {
    &self.config
  }

  pub(crate) fn has_breadcrumbs(&self) -> bool {
    self.breadcrumbs.load().is_some()
  }

  // Scalar primitives.

  pub(crate) fn is_scalar_aligned(&self, offset: usize) -> bool {
    match self.units() {
      Units::Utf8(text) => text.is_char_boundary(offset),
      Units::Utf16(units) => {
        offset == 0
          || offset >= units.len()
          || !(is_low_surrogate(units[offset]) && is_high_surrogate(units[offset - 1]))
      },
    }
  }

  /// Rounds `offset` down to the start of the scalar containing it.
  pub(crate) fn scalar_start(&self, offset: usize) -> usize {
    let offset = offset.min(self.len());
    match self.units() {
      Units::Utf8(text) => {
        let bytes = text.as_bytes();
        let mut offset = offset;
        while offset > 0 && offset < bytes.len() && is_utf8_continuation(bytes[offset]) {
          offset -= 1;
        }
        offset
      },
      Units::Utf16(_) => {
        if self.is_scalar_aligned(offset) {
          offset
        } else {
          offset - 1
        }
      },
    }
  }

  /// Rounds `offset` up to the end of the scalar containing it.
  pub(crate) fn scalar_end(&self, offset: usize) -> usize {
    let offset = offset.min(self.len());
    match self.units() {
      Units::Utf8(text) => {
        let bytes = text.as_bytes();
        let mut offset = offset;
        while offset < bytes.len() && is_utf8_continuation(bytes[offset]) {
          offset += 1;
        }
        offset
      },
      Units::Utf16(_) => {
        if self.is_scalar_aligned(offset) {
          offset
        } else {
          offset + 1
        }
      },
    }
  }

  /// Decodes the scalar starting at the scalar-aligned `offset`, returning it
  /// with its width in native code units.
  pub(crate) fn decode(&self, offset: usize) -> Option<(char, usize)> {
    match self.units() {
      Units::Utf8(text) => {
        let ch = text.get(offset..)?.chars().next()?;
        Some((ch, ch.len_utf8()))
      },
      Units::Utf16(units) => {
        let decoded = char::decode_utf16(units.get(offset..)?.iter().copied()).next()?;
        Some(match decoded {
          Ok(ch) => (ch, ch.len_utf16()),
          Err(_) => (REPLACEMENT_CHARACTER, 1),
        })
      },
    }
  }

  /// Decodes the scalar ending at the scalar-aligned `offset`.
  pub(crate) fn decode_before(&self, offset: usize) -> Option<(char, usize)> {
    match self.units() {
      Units::Utf8(text) => {
        let ch = text.get(..offset)?.chars().next_back()?;
        Some((ch, ch.len_utf8()))
      },
      Units::Utf16(units) => {
        let last = *units.get(..offset)?.last()?;
        if is_low_surrogate(last) && offset >= 2 && is_high_surrogate(units[offset - 2]) {
          self.decode(offset - 2)
        } else {
          self.decode(offset - 1)
        }
      },
    }
  }

  pub(crate) fn scalars(&self, range: Range<usize>) -> ScalarsForward<'_> {
    ScalarsForward {
      storage: self,
      pos:     range.start,
      end:     range.end,
    }
  }

  pub(crate) fn scalars_rev(&self, range: Range<usize>) -> ScalarsBackward<'_> {
    ScalarsBackward {
      storage: self,
      start:   range.start,
      pos:     range.end,
    }
  }

  /// Moves forward `n` scalars from the scalar-aligned `offset`, stopping at
  /// `limit`.
  pub(crate) fn advance_scalars(&self, mut offset: usize, n: usize, limit: usize) -> usize {
    for _ in 0..n {
      if offset >= limit {
        break;
      }
      match self.decode(offset) {
        Some((_, width)) => offset += width,
        None => break,
      }
    }
    offset.min(limit)
  }

  /// Moves backward `n` scalars from the scalar-aligned `offset`, stopping at
  /// `limit`.
  pub(crate) fn retreat_scalars(&self, mut offset: usize, n: usize, limit: usize) -> usize {
    for _ in 0..n {
      if offset <= limit {
        break;
      }
      match self.decode_before(offset) {
        Some((_, width)) => offset -= width,
        None => break,
      }
    }
    offset.max(limit)
  }

  pub(crate) fn count_scalars(&self, range: Range<usize>) -> usize {
    match self.units() {
      Units::Utf8(text) => match text.get(range.clone()) {
        Some(slice) => ropey::str_utils::byte_to_char_idx(slice, slice.len()),
        None => text.as_bytes()[range]
          .iter()
          .filter(|&&b| !is_utf8_continuation(b))
          .count(),
      },
      Units::Utf16(_) => self.scalars(range).count(),
    }
  }

  /// UTF-8 length of the scalars in `range`.
  pub(crate) fn count_utf8(&self, range: Range<usize>) -> usize {
    match self.units() {
      Units::Utf8(_) => range.len(),
      Units::Utf16(_) => self.scalars(range).map(char::len_utf8).sum(),
    }
  }

  /// The text between two scalar-aligned offsets.
  pub(crate) fn text(&self, range: Range<usize>) -> Cow<'_, str> {
    match self.units() {
      Units::Utf8(text) => Cow::Borrowed(text.get(range).unwrap_or_default()),
      Units::Utf16(units) => Cow::Owned(String::from_utf16_lossy(
        units.get(range).unwrap_or_default(),
      )),
    }
  }

  // UTF-16 conversion, accelerated by breadcrumbs on UTF-8 storage.

  /// UTF-16 offset of the native `offset`.
  pub(crate) fn utf16_offset(&self, offset: usize) -> usize {
    match self.units() {
      Units::Utf16(_) => offset,
      Units::Utf8(_) if self.ascii => offset,
      Units::Utf8(text) if text.len() < self.config.breadcrumb_threshold => {
        breadcrumbs::count_utf16(&text.as_bytes()[..offset.min(text.len())])
      },
      Units::Utf8(text) => self.breadcrumbs(text).utf16_offset(text, offset),
    }
  }

  /// Native location of the UTF-16 offset `utf16`: a scalar-aligned offset,
  /// plus 1 when it addresses the trailing surrogate of a UTF-8 scalar.
  pub(crate) fn native_of_utf16(&self, utf16: usize) -> Option<(usize, u8)> {
    match self.units() {
      Units::Utf16(units) => (utf16 <= units.len()).then_some((utf16, 0)),
      Units::Utf8(text) if self.ascii => (utf16 <= text.len()).then_some((utf16, 0)),
      Units::Utf8(text) if text.len() < self.config.breadcrumb_threshold => {
        breadcrumbs::scan_utf16(text, 0, 0, utf16)
      },
      Units::Utf8(text) => self.breadcrumbs(text).utf8_offset(text, utf16),
    }
  }

  pub(crate) fn utf16_len(&self) -> usize {
    match self.units() {
      Units::Utf16(units) => units.len(),
      Units::Utf8(text) if self.ascii => text.len(),
      Units::Utf8(text) if text.len() < self.config.breadcrumb_threshold => {
        breadcrumbs::count_utf16(text.as_bytes())
      },
      Units::Utf8(text) => self.breadcrumbs(text).utf16_len(),
    }
  }

  /// Returns the breadcrumbs for this storage, building them on first use.
  ///
  /// Racing builders are fine: whichever build is published first is kept
  /// and the others are dropped.
  fn breadcrumbs(&self, text: &str) -> Arc<Breadcrumbs> {
    let current = self.breadcrumbs.load();
    if let Some(crumbs) = &*current {
      if !crumbs.is_stale(self.epoch, text.len()) {
        return Arc::clone(crumbs);
      }
      tracing::trace!(epoch = self.epoch, "discarding stale utf-16 breadcrumbs");
    }

    let fresh = Arc::new(Breadcrumbs::build(
      text,
      self.config.breadcrumb_stride,
      self.epoch,
    ));
    let previous = self
      .breadcrumbs
      .compare_and_swap(&current, Some(Arc::clone(&fresh)));
    let swapped = match (&*previous, &*current) {
      (Some(previous), Some(current)) => Arc::ptr_eq(previous, current),
      (None, None) => true,
      _ => false,
    };
    match &*previous {
      // Another reader published first.
      Some(published) if !swapped && !published.is_stale(self.epoch, text.len()) => {
        Arc::clone(published)
      },
      _ => fresh,
    }
  }

  // Mutation. Callers hold the only reference (see `Arc::make_mut`).

  pub(crate) fn replace_range(&mut self, range: Range<usize>, with: &str) {
    self.backend.replace_range(range, with);
    self.ascii = (self.ascii && with.is_ascii()) || self.backend.is_ascii();
    self.invalidate();
  }

  pub(crate) fn push_str(&mut self, text: &str) {
    let end = self.len();
    self.replace_range(end..end, text);
  }

  /// Re-encodes foreign storage as UTF-8. Returns false when the storage
  /// already was UTF-8.
  pub(crate) fn transcode_to_utf8(&mut self) -> bool {
    if self.encoding() == Encoding::Utf8 {
      return false;
    }
    self.backend = Backend::utf8(self.backend.foreign_copy_utf8());
    self.invalidate();
    true
  }

  fn invalidate(&mut self) {
    self.epoch += 1;
    self.breadcrumbs = ArcSwapOption::empty();
    tracing::debug!(
      epoch = self.epoch,
      encoding = %self.encoding(),
      "storage replaced"
    );
  }
}

#[derive(Debug, Clone)]
pub(crate) struct ScalarsForward<'a> {
  storage: &'a Storage,
  pos:     usize,
  end:     usize,
}

impl Iterator for ScalarsForward<'_> {
  type Item = char;

  fn next(&mut self) -> Option<char> {
    if self.pos >= self.end {
      return None;
    }
    let (ch, width) = self.storage.decode(self.pos)?;
    self.pos += width;
    Some(ch)
  }
}

#[derive(Debug, Clone)]
pub(crate) struct ScalarsBackward<'a> {
  storage: &'a Storage,
  start:   usize,
  pos:     usize,
}

impl Iterator for ScalarsBackward<'_> {
  type Item = char;

  fn next(&mut self) -> Option<char> {
    if self.pos <= self.start {
      return None;
    }
    let (ch, width) = self.storage.decode_before(self.pos)?;
    self.pos -= width;
    Some(ch)
  }
}
