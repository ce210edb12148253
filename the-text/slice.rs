use std::{
  fmt,
  ops::Range,
};

use crate::{
  encoding::Unit,
  error::Result,
  position::Position,
  span::Span,
  storage::Units,
  text::Text,
  view::{
    Characters,
    Scalars,
    Utf8View,
    Utf16View,
  },
};

/// A scalar-aligned range of a [`Text`], sharing its storage.
///
/// Navigation inside a slice behaves as if the slice were a text of its own:
/// a slice cut through the middle of a cluster still reaches its own start and
/// end in the character view.
#[derive(Clone)]
pub struct TextSlice {
  base:              Text,
  bounds:            Range<usize>,
  trusts_characters: bool,
}

impl TextSlice {
  pub(crate) fn new(base: Text, bounds: Range<usize>, trusts_characters: bool) -> Self {
    Self {
      base,
      bounds,
      trusts_characters,
    }
  }

  fn span(&self) -> Span<'_> {
    Span::new(
      self.base.storage(),
      self.bounds.clone(),
      self.trusts_characters,
    )
  }

  pub fn base(&self) -> &Text {
    &self.base
  }

  pub fn start(&self) -> Position {
    self.span().start()
  }

  pub fn end(&self) -> Position {
    self.span().end()
  }

  pub fn is_empty(&self) -> bool {
    self.span().is_empty()
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

  pub fn position_at(&self, unit: Unit, n: isize) -> Position {
    self.span().position_at(unit, n)
  }

  pub fn checked_position_at(&self, unit: Unit, n: isize) -> Result<Position> {
    self.span().checked_position_at(unit, n)
  }

  pub fn offset_of(&self, position: Position, unit: Unit) -> Result<usize> {
    self.span().offset_of(position, unit)
  }

  pub fn same_position(&self, position: Position, unit: Unit) -> Result<Option<Position>> {
    self.span().same_position(position, unit)
  }

  pub fn slice(&self, range: Range<Position>) -> Result<TextSlice> {
    let span = self.span().slice(range)?;
    Ok(TextSlice::new(
      self.base.clone(),
      span.bounds(),
      span.trusts_characters(),
    ))
  }

  /// Copies the slice into a text of its own, keeping the encoding.
  pub fn to_text(&self) -> Text {
    let storage = self.base.storage();
    let config = *storage.config();
    match storage.units() {
      Units::Utf8(text) => Text::with_config(&text[self.bounds.clone()], config),
      Units::Utf16(units) => Text::from_utf16_with_config(&units[self.bounds.clone()], config),
    }
  }
}

impl fmt::Display for TextSlice {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.base.storage().text(self.bounds.clone()))
  }
}

impl fmt::Debug for TextSlice {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "TextSlice({:?} {:?})", self.to_string(), self.bounds)
  }
}

impl PartialEq<str> for TextSlice {
  fn eq(&self, other: &str) -> bool {
    self
      .base
      .storage()
      .scalars(self.bounds.clone())
      .eq(other.chars())
  }
}

impl PartialEq<&str> for TextSlice {
  fn eq(&self, other: &&str) -> bool {
    *self == **other
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    position::EncodingTag,
    view::TextView,
  };

  #[test]
  fn test_flag_slice_navigation() {
    let text = Text::from("a🇺🇸🇨🇦b");
    let from = text.position_at(Unit::Scalar, 2);
    let to = text.position_at(Unit::Scalar, 4);
    let slice = text.slice(from..to).unwrap();

    assert_eq!(slice, "🇸🇨");
    assert_eq!(slice.count(Unit::Scalar), 2);
    assert_eq!(slice.count(Unit::Character), 1);
    let characters = slice.characters();
    assert_eq!(characters.next(slice.start()).unwrap(), slice.end());
    assert_eq!(characters.previous(slice.end()).unwrap(), slice.start());
    assert_eq!(characters.offset_by(slice.start(), 1).unwrap(), slice.end());
  }

  #[test]
  fn test_slice_of_slice_and_copy() {
    let text = Text::from_utf16("héllo wörld".encode_utf16().collect::<Vec<_>>());
    let world = text
      .slice(text.position_at(Unit::Character, 6)..text.end())
      .unwrap();
    assert_eq!(world, "wörld");
    let orl = world
      .slice(world.position_at(Unit::Utf8, 1)..world.position_at(Unit::Utf8, 5))
      .unwrap();
    assert_eq!(orl, "örl");
    assert_eq!(orl.base().epoch(), 0);

    let copy = orl.to_text();
    assert_eq!(copy, "örl");
    assert_eq!(copy.encoding(), text.encoding());
    assert_eq!(copy.count(Unit::Utf16), 3);
  }

  #[test]
  fn test_slice_positions_are_base_positions() {
    let text = Text::from("abc😇def");
    let slice = text
      .slice(Position::new(2, EncodingTag::Utf8)..Position::new(9, EncodingTag::Utf8))
      .unwrap();
    let p = slice.position_at(Unit::Scalar, 2);
    assert_eq!(text.scalars().get(p).unwrap(), 'd');
    assert_eq!(slice.offset_of(p, Unit::Utf16).unwrap(), 3);
    assert!(slice.scalars().get(text.start()).is_err());
  }
}
