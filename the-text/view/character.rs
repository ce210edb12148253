use std::{
  borrow::Cow,
  fmt,
  ops::{
    Deref,
    Range,
  },
};

use the_core::grapheme::{
  ensure_boundary_prev,
  next_boundary,
  prev_boundary,
};

use super::{
  TextView,
  step_by,
  step_distance,
};
use crate::{
  encoding::Unit,
  error::Result,
  position::Position,
  span::Span,
};

/// One grapheme cluster, borrowed when the storage is UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Character<'a>(Cow<'a, str>);

impl Character<'_> {
  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn into_owned(self) -> String {
    self.0.into_owned()
  }
}

impl Deref for Character<'_> {
  type Target = str;

  fn deref(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for Character<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl PartialEq<str> for Character<'_> {
  fn eq(&self, other: &str) -> bool {
    self.as_str() == other
  }
}

impl PartialEq<&str> for Character<'_> {
  fn eq(&self, other: &&str) -> bool {
    self.as_str() == *other
  }
}

/// Whether the scalar-aligned `offset` is a cluster boundary of `span`.
pub(crate) fn is_boundary(span: &Span<'_>, offset: usize) -> bool {
  let bounds = span.bounds();
  offset == bounds.start
    || offset == bounds.end
    || ensure_boundary_prev(span.scalars_before(offset), span.scalars_from(offset)) == 0
}

/// Start of the cluster holding the scalar-aligned `offset`.
fn floor(span: &Span<'_>, offset: usize) -> usize {
  let bounds = span.bounds();
  if offset == bounds.start || offset == bounds.end {
    return offset;
  }
  let back = ensure_boundary_prev(span.scalars_before(offset), span.scalars_from(offset));
  span
    .storage()
    .retreat_scalars(offset, back, bounds.start)
}

fn after(span: &Span<'_>, offset: usize) -> Option<usize> {
  let end = span.bounds().end;
  if offset >= end {
    return None;
  }
  let scalars = next_boundary(span.scalars_from(offset));
  Some(span.storage().advance_scalars(offset, scalars, end))
}

fn before(span: &Span<'_>, offset: usize) -> Option<usize> {
  let start = span.bounds().start;
  if offset <= start {
    return None;
  }
  let scalars = prev_boundary(span.scalars_before(offset));
  Some(span.storage().retreat_scalars(offset, scalars, start))
}

/// Grapheme clusters. Every entry point rounds down to a cluster boundary.
///
/// In a slice cut through a cluster, clusters are computed as if the slice
/// were the whole text.
#[derive(Debug, Clone, Copy)]
pub struct Characters<'a> {
  span: Span<'a>,
}

impl<'a> Characters<'a> {
  pub(crate) fn new(span: Span<'a>) -> Self {
    Self { span }
  }

  fn mark(&self, offset: usize) -> Position {
    self.span.at(offset, 0, self.span.character_alignment())
  }

  /// Validated native offset of the cluster boundary at or before `position`.
  fn boundary(&self, position: Position) -> Result<usize> {
    let position = self.span.validate(position)?.stripping_transcoding();
    let offset = self.span.scalar_floor(position.offset());
    let trusted = self.span.trusts(position)
      && offset == position.offset()
      && self.span.storage().is_scalar_aligned(offset);
    if trusted {
      return Ok(offset);
    }
    Ok(floor(&self.span, offset))
  }

  fn step_forward(&self, position: Position) -> Option<Position> {
    after(&self.span, position.offset()).map(|offset| self.mark(offset))
  }

  fn step_backward(&self, position: Position) -> Option<Position> {
    before(&self.span, position.offset()).map(|offset| self.mark(offset))
  }
}

impl<'a> TextView for Characters<'a> {
  type Element = Character<'a>;

  const UNIT: Unit = Unit::Character;

  fn start(&self) -> Position {
    self.span.start()
  }

  fn end(&self) -> Position {
    self.span.end()
  }

  fn validate(&self, position: Position) -> Result<Position> {
    self.span.validate(position)
  }

  fn align(&self, position: Position) -> Result<Position> {
    let offset = self.boundary(position)?;
    Ok(self.mark(offset))
  }

  fn next(&self, position: Position) -> Result<Position> {
    let from = self.align(position)?;
    self
      .step_forward(from)
      .ok_or_else(|| self.span.out_of_bounds(position))
  }

  fn previous(&self, position: Position) -> Result<Position> {
    let from = self.align(position)?;
    self
      .step_backward(from)
      .ok_or_else(|| self.span.out_of_bounds(position))
  }

  fn get(&self, position: Position) -> Result<Character<'a>> {
    let from = self.boundary(position)?;
    let to = after(&self.span, from).ok_or_else(|| self.span.out_of_bounds(position))?;
    Ok(Character(self.span.storage().text(from..to)))
  }

  fn distance(&self, from: Position, to: Position) -> Result<isize> {
    let from = self.align(from)?;
    let to = self.align(to)?;
    Ok(step_distance(
      from,
      to,
      |p| self.step_forward(p),
      |p| self.step_backward(p),
    ))
  }

  fn walk(&self, position: Position, n: isize, limit: Option<Position>) -> Result<Option<Position>> {
    let from = self.align(position)?;
    step_by(
      Self::UNIT,
      from,
      n,
      limit,
      |p| self.step_forward(p),
      |p| self.step_backward(p),
    )
  }

  fn slice(&self, range: Range<Position>) -> Result<Self> {
    let start = self.align(range.start)?;
    let end = self.align(range.end)?;
    Ok(Self::new(self.span.slice(start..end)?))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    config::IndexConfig,
    position::{
      Alignment,
      EncodingTag,
    },
    storage::{
      Backend,
      Storage,
    },
  };

  fn utf8(text: &str) -> Storage {
    Storage::new(Backend::utf8(text.to_owned()), IndexConfig::default())
  }

  fn utf16(text: &str) -> Storage {
    Storage::new(
      Backend::Foreign(text.encode_utf16().collect()),
      IndexConfig::default(),
    )
  }

  fn clusters(view: &Characters<'_>) -> Vec<String> {
    view.iter().map(Character::into_owned).collect()
  }

  #[test]
  fn test_iterates_clusters_on_both_encodings() {
    let text = "e\u{301}🇺🇸👨‍👩‍👧\r\nz";
    for storage in [utf8(text), utf16(text)] {
      let view = Characters::new(Span::whole(&storage));
      assert_eq!(clusters(&view), vec!["e\u{301}", "🇺🇸", "👨‍👩‍👧", "\r\n", "z"]);
      let rev: Vec<String> = view.iter().rev().map(Character::into_owned).collect();
      assert_eq!(rev, vec!["z", "\r\n", "👨‍👩‍👧", "🇺🇸", "e\u{301}"]);
      assert_eq!(view.count(), 5);
    }
  }

  #[test]
  fn test_misaligned_position_reads_enclosing_cluster() {
    let storage = utf8("ae\u{301}b");
    let view = Characters::new(Span::whole(&storage));
    // Offset 3 is inside the combining acute, offset 2 is its first byte.
    for offset in 1..=3 {
      let p = Position::new(offset, EncodingTag::Utf8);
      assert_eq!(view.get(p).unwrap(), "e\u{301}");
      assert_eq!(view.align(p).unwrap().offset(), 1);
    }
    assert_eq!(view.next(Position::legacy(2)).unwrap().offset(), 4);
    assert_eq!(view.previous(Position::legacy(3)).unwrap().offset(), 0);
  }

  #[test]
  fn test_produced_positions_are_character_aligned() {
    let storage = utf8("a🇺🇸");
    let view = Characters::new(Span::whole(&storage));
    let p = view.next(view.start()).unwrap();
    assert_eq!(p.alignment(), Alignment::Character);
    assert_eq!(p.encoding(), EncodingTag::Utf8);
  }

  #[test]
  fn test_slice_through_flags_has_its_own_grid() {
    // a 🇺 🇸 🇨 🇦 b, each indicator 4 bytes.
    let storage = utf8("a🇺🇸🇨🇦b");
    let span = Span::new(&storage, 5..13, false);
    let view = Characters::new(span);
    assert_eq!(clusters(&view), vec!["🇸🇨"]);
    assert_eq!(view.count(), 1);
    assert_eq!(view.next(view.start()).unwrap(), view.end());
    assert_eq!(view.previous(view.end()).unwrap(), view.start());
    assert_eq!(view.next(view.start()).unwrap().alignment(), Alignment::Scalar);
  }

  #[test]
  fn test_offsets_and_limits() {
    let storage = utf16("ab\u{300}cd");
    let view = Characters::new(Span::whole(&storage));
    let c = view.offset_by(view.start(), 2).unwrap();
    assert_eq!(view.get(c).unwrap(), "c");
    assert_eq!(view.distance(view.start(), c).unwrap(), 2);
    assert_eq!(view.distance(c, view.start()).unwrap(), -2);
    assert_eq!(view.offset_by_limited(view.start(), 3, c).unwrap(), None);
    assert_eq!(view.offset_by_limited(view.start(), 2, c).unwrap(), Some(c));
    assert!(view.offset_by(c, 3).is_err());
    assert_eq!(view.offset_by(c, 2).unwrap(), view.end());
  }

  #[test]
  fn test_stepping_past_edges_fails() {
    let storage = utf8("x");
    let view = Characters::new(Span::whole(&storage));
    assert!(view.next(view.end()).is_err());
    assert!(view.previous(view.start()).is_err());
    assert!(view.get(view.end()).is_err());

    let empty = utf8("");
    let view = Characters::new(Span::whole(&empty));
    assert!(view.is_empty());
    assert_eq!(view.iter().next(), None);
  }
}
