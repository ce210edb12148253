use std::{
  fmt,
  ops::Range,
  sync::Arc,
};

use crate::{
  config::IndexConfig,
  encoding::{
    Encoding,
    Unit,
  },
  error::Result,
  position::Position,
  slice::TextSlice,
  span::Span,
  storage::{
    Backend,
    Storage,
    Units,
  },
  view::{
    Characters,
    Scalars,
    Utf8View,
    Utf16View,
  },
};

/// A copy-on-write Unicode string stored as UTF-8 or UTF-16.
///
/// Clones share storage until one of them is mutated.
#[derive(Clone)]
pub struct Text {
  storage: Arc<Storage>,
}

impl Text {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_config(text: impl Into<String>, config: IndexConfig) -> Self {
    Self::from_storage(Storage::new(Backend::utf8(text.into()), config))
  }

  /// Adopts UTF-16 code units as they are. Lone surrogates read as U+FFFD.
  pub fn from_utf16(units: impl Into<Vec<u16>>) -> Self {
    Self::from_utf16_with_config(units, IndexConfig::default())
  }

  pub fn from_utf16_with_config(units: impl Into<Vec<u16>>, config: IndexConfig) -> Self {
    Self::from_storage(Storage::new(Backend::Foreign(units.into()), config))
  }

  fn from_storage(storage: Storage) -> Self {
    Self {
      storage: Arc::new(storage),
    }
  }

  pub(crate) fn storage(&self) -> &Storage {
    &self.storage
  }

  pub(crate) fn span(&self) -> Span<'_> {
    Span::whole(&self.storage)
  }

  pub fn encoding(&self) -> Encoding {
    self.storage.encoding()
  }

  pub fn is_ascii(&self) -> bool {
    self.storage.is_ascii()
  }

  pub fn is_empty(&self) -> bool {
    self.storage.len() == 0
  }

  /// Number of storage replacements this value has gone through.
  pub fn epoch(&self) -> u64 {
    self.storage.epoch()
  }

  pub fn config(&self) -> &IndexConfig {
    self.storage.config()
  }

  /// The text itself, when it is stored as UTF-8.
  pub fn as_str(&self) -> Option<&str> {
    self.storage.backend().fast_utf8()
  }

  pub fn to_utf16(&self) -> Vec<u16> {
    match self.storage.units() {
      Units::Utf8(text) => text.encode_utf16().collect(),
      Units::Utf16(units) => units.to_vec(),
    }
  }

  pub fn start(&self) -> Position {
    self.span().start()
  }

  pub fn end(&self) -> Position {
    self.span().end()
  }

  pub fn characters(&self) -> Characters<'_> {
    Characters::new(self.span())
  }

  pub fn scalars(&self) -> Scalars<'_> {
    Scalars::new(self.span())
  }

  pub fn utf8(&self) -> Utf8View<'_> {
    Utf8View::new(self.span())
  }

  pub fn utf16(&self) -> Utf16View<'_> {
    Utf16View::new(self.span())
  }

  pub fn count(&self, unit: Unit) -> usize {
    self.span().count(unit)
  }

  /// The position `n` units from the start, clamped into the text.
  pub fn position_at(&self, unit: Unit, n: isize) -> Position {
    self.span().position_at(unit, n)
  }

  /// The position `n` units from the start. One past the end is accepted and
  /// yields the end.
  pub fn checked_position_at(&self, unit: Unit, n: isize) -> Result<Position> {
    self.span().checked_position_at(unit, n)
  }

  pub fn offset_of(&self, position: Position, unit: Unit) -> Result<usize> {
    self.span().offset_of(position, unit)
  }

  /// `position` itself when it lies on a `unit` boundary, `None` otherwise.
  pub fn same_position(&self, position: Position, unit: Unit) -> Result<Option<Position>> {
    self.span().same_position(position, unit)
  }

  /// Shares storage with `self`. Both bounds round down to scalar boundaries.
  pub fn slice(&self, range: Range<Position>) -> Result<TextSlice> {
    let span = self.span().slice(range)?;
    Ok(TextSlice::new(
      self.clone(),
      span.bounds(),
      span.trusts_characters(),
    ))
  }

  /// Replaces every scalar touched by `range` with `with`.
  pub fn replace_range(&mut self, range: Range<Position>, with: &str) -> Result<()> {
    let range = self.span().enclosing_scalars(range)?;
    Arc::make_mut(&mut self.storage).replace_range(range, with);
    Ok(())
  }

  pub fn push_str(&mut self, text: &str) {
    Arc::make_mut(&mut self.storage).push_str(text);
  }

  /// Re-encodes UTF-16 storage as UTF-8. Returns false when it already was.
  ///
  /// Positions taken before the re-encoding stay usable: they are tagged
  /// UTF-16 and get repaired on their next use.
  pub fn make_native_utf8(&mut self) -> bool {
    if self.encoding() == Encoding::Utf8 {
      return false;
    }
    Arc::make_mut(&mut self.storage).transcode_to_utf8()
  }
}

impl Default for Text {
  fn default() -> Self {
    Self::with_config(String::new(), IndexConfig::default())
  }
}

impl From<&str> for Text {
  fn from(text: &str) -> Self {
    Self::with_config(text, IndexConfig::default())
  }
}

impl From<String> for Text {
  fn from(text: String) -> Self {
    Self::with_config(text, IndexConfig::default())
  }
}

impl FromIterator<char> for Text {
  fn from_iter<T: IntoIterator<Item = char>>(iter: T) -> Self {
    Self::from(iter.into_iter().collect::<String>())
  }
}

impl fmt::Display for Text {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.storage.text(0..self.storage.len()))
  }
}

impl fmt::Debug for Text {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Text({:?} {})", self.to_string(), self.encoding())
  }
}

impl PartialEq for Text {
  fn eq(&self, other: &Self) -> bool {
    match (self.as_str(), other.as_str()) {
      (Some(a), Some(b)) => a == b,
      _ => {
        let a = self.storage.scalars(0..self.storage.len());
        let b = other.storage.scalars(0..other.storage.len());
        a.eq(b)
      },
    }
  }
}

impl Eq for Text {}

impl PartialEq<str> for Text {
  fn eq(&self, other: &str) -> bool {
    match self.as_str() {
      Some(text) => text == other,
      None => self.storage.scalars(0..self.storage.len()).eq(other.chars()),
    }
  }
}

impl PartialEq<&str> for Text {
  fn eq(&self, other: &&str) -> bool {
    *self == **other
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    error::TextError,
    position::{
      Alignment,
      EncodingTag,
    },
    view::TextView,
  };

  #[test]
  fn test_text_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Text>();
    assert_send_sync::<TextSlice>();
  }

  #[test]
  fn test_equality_across_encodings() {
    let a = Text::from("a😇é");
    let b = Text::from_utf16("a😇é".encode_utf16().collect::<Vec<_>>());
    assert_eq!(a, b);
    assert_eq!(b, "a😇é");
    assert_eq!(b.to_string(), "a😇é");
    assert_eq!(a.to_utf16(), b.to_utf16());
    assert_eq!(b.as_str(), None);
  }

  #[test]
  fn test_counts() {
    let text = Text::from("a🇺🇸🇨🇦b");
    assert_eq!(text.count(Unit::Scalar), 6);
    assert_eq!(text.count(Unit::Utf8), 18);
    assert_eq!(text.count(Unit::Utf16), 10);
    assert_eq!(text.count(Unit::Character), 4);
  }

  #[test]
  fn test_copy_on_write() {
    let original = Text::from("é".repeat(80));
    let _ = original.utf16().count();
    assert!(original.storage().has_breadcrumbs());

    let mut copy = original.clone();
    copy.push_str("!");
    assert_eq!(copy.epoch(), 1);
    assert_eq!(original.epoch(), 0);
    assert!(original.storage().has_breadcrumbs());
    assert!(!copy.storage().has_breadcrumbs());
    assert_eq!(original.count(Unit::Scalar), 80);
    assert_eq!(copy.count(Unit::Scalar), 81);
  }

  #[test]
  fn test_replace_range_rounds_outward() {
    let mut text = Text::from("a😇b");
    let mid = Position::new(2, EncodingTag::Utf8);
    text.replace_range(mid..mid, "x").unwrap();
    assert_eq!(text, "axb");

    let mut text = Text::from("ab");
    let err = text
      .replace_range(Position::legacy(2)..Position::legacy(1), "x")
      .unwrap_err();
    assert!(matches!(err, TextError::InvalidRange { .. }));
  }

  #[test]
  fn test_character_flags_are_rechecked_after_mutation() {
    let mut text = Text::from("e");
    let end = text.end();
    assert!(end.is_character_aligned());
    text.push_str("\u{301}x");

    // The old end now sits inside "e\u{301}".
    let characters = text.characters();
    assert_eq!(characters.align(end).unwrap(), text.start());
    assert_eq!(characters.get(end).unwrap(), "e\u{301}");
    assert_eq!(text.offset_of(end, Unit::Character).unwrap(), 0);
    assert_eq!(text.same_position(end, Unit::Character).unwrap(), None);
    assert_eq!(text.position_at(Unit::Character, 0), characters.align(end).unwrap());

    let tail = text.slice(end..text.end()).unwrap();
    assert_eq!(tail.start().alignment(), Alignment::Scalar);
    assert_eq!(tail.count(Unit::Character), 2);

    let x = text.position_at(Unit::Character, 1);
    assert_eq!(characters.get(x).unwrap(), "x");
  }

    #[test]
  fn test_make_native_utf8() {
    let mut text = Text::from_utf16("hé".encode_utf16().collect::<Vec<_>>());
    assert_eq!(text.encoding(), Encoding::Utf16);
    assert!(text.make_native_utf8());
    assert_eq!(text.encoding(), Encoding::Utf8);
    assert_eq!(text.as_str(), Some("hé"));
    assert!(!text.make_native_utf8());
    assert_eq!(text.epoch(), 1);
  }

  #[test]
  fn test_from_iter_and_default() {
    let text: Text = "abc".chars().rev().collect();
    assert_eq!(text, "cba");
    assert!(Text::default().is_empty());
    assert!(Text::new().is_ascii());
  }
}
