//! A scalar-aligned window onto a storage.
//!
//! Every view, the whole text and every slice navigate through a [`Span`].
//! The span owns the bounds check and the edge positions; the views only know
//! how to step inside it.

use std::ops::Range;

use crate::{
  encoding::{
    self,
    Unit,
  },
  error::{
    Result,
    TextError,
  },
  position::{
    Alignment,
    Position,
  },
  storage::{
    ScalarsBackward,
    ScalarsForward,
    Storage,
  },
  view::{
    self,
    Characters,
    Scalars,
    TextView,
    Utf8View,
    Utf16View,
  },
};

#[derive(Debug, Clone, Copy)]
pub(crate) struct Span<'a> {
  storage:           &'a Storage,
  start:             usize,
  end:               usize,
  /// Both bounds are character boundaries of the whole storage, so character
  /// flags computed on the whole storage hold here too.
  trusts_characters: bool,
}

impl<'a> Span<'a> {
  pub(crate) fn whole(storage: &'a Storage) -> Self {
    Self {
      storage,
      start: 0,
      end: storage.len(),
      trusts_characters: true,
    }
  }

  /// `bounds` must be scalar aligned.
  pub(crate) fn new(storage: &'a Storage, bounds: Range<usize>, trusts_characters: bool) -> Self {
    Self {
      storage,
      start: bounds.start,
      end: bounds.end,
      trusts_characters,
    }
  }

  pub(crate) fn storage(&self) -> &'a Storage {
    self.storage
  }

  pub(crate) fn bounds(&self) -> Range<usize> {
    self.start..self.end
  }

  pub(crate) fn is_empty(&self) -> bool {
    self.start == self.end
  }

  pub(crate) fn trusts_characters(&self) -> bool {
    self.trusts_characters
  }

  /// Alignment given to character boundaries found in this span.
  pub(crate) fn character_alignment(&self) -> Alignment {
    if self.trusts_characters {
      Alignment::Character
    } else {
      Alignment::Scalar
    }
  }

  pub(crate) fn start(&self) -> Position {
    self.at(self.start, 0, Alignment::None)
  }

  pub(crate) fn end(&self) -> Position {
    self.at(self.end, 0, Alignment::None)
  }

  /// Builds a position in the storage's grid. The span's edges always carry
  /// the character alignment.
  pub(crate) fn at(&self, offset: usize, transcoded: u8, alignment: Alignment) -> Position {
    let alignment = if transcoded == 0 && (offset == self.start || offset == self.end) {
      alignment.max(self.character_alignment())
    } else {
      alignment
    };
    Position::from_encoded(offset, transcoded, self.storage.encoding().tag())
      .with_alignment(alignment)
      .with_epoch(self.storage.epoch())
  }

  /// Whether the character flag carried by `position` still holds here. Flags
  /// from an earlier epoch predate a mutation and are recomputed.
  pub(crate) fn trusts(&self, position: Position) -> bool {
    self.trusts_characters
      && position.is_character_aligned()
      && position.epoch() == self.storage.epoch()
  }

  /// Reconciles `position` with the storage encoding and checks that it lies
  /// within the span.
  pub(crate) fn validate(&self, position: Position) -> Result<Position> {
    let position = encoding::validate(self.storage, position)?;
    if position < self.start() || position > self.end() {
      return Err(self.out_of_bounds(position));
    }
    Ok(position)
  }

  pub(crate) fn out_of_bounds(&self, position: Position) -> TextError {
    TextError::OutOfBounds {
      position,
      start: self.start(),
      end: self.end(),
    }
  }

  /// Start of the scalar holding the native `offset`, kept inside the span.
  pub(crate) fn scalar_floor(&self, offset: usize) -> usize {
    self.storage.scalar_start(offset).clamp(self.start, self.end)
  }

  pub(crate) fn scalars_from(&self, offset: usize) -> ScalarsForward<'a> {
    self.storage.scalars(offset..self.end)
  }

  pub(crate) fn scalars_before(&self, offset: usize) -> ScalarsBackward<'a> {
    self.storage.scalars_rev(self.start..offset)
  }

  // Unit dispatch for the offset-based API of texts and slices.

  pub(crate) fn count(&self, unit: Unit) -> usize {
    match unit {
      Unit::Character => Characters::new(*self).count(),
      Unit::Scalar => Scalars::new(*self).count(),
      Unit::Utf8 => Utf8View::new(*self).count(),
      Unit::Utf16 => Utf16View::new(*self).count(),
    }
  }

  fn align(&self, position: Position, unit: Unit) -> Result<Position> {
    match unit {
      Unit::Character => Characters::new(*self).align(position),
      Unit::Scalar => Scalars::new(*self).align(position),
      Unit::Utf8 => Utf8View::new(*self).align(position),
      Unit::Utf16 => Utf16View::new(*self).align(position),
    }
  }

  fn offset_by(&self, unit: Unit, from: Position, n: isize) -> Result<Position> {
    match unit {
      Unit::Character => Characters::new(*self).offset_by(from, n),
      Unit::Scalar => Scalars::new(*self).offset_by(from, n),
      Unit::Utf8 => Utf8View::new(*self).offset_by(from, n),
      Unit::Utf16 => Utf16View::new(*self).offset_by(from, n),
    }
  }

  fn distance(&self, unit: Unit, from: Position, to: Position) -> Result<isize> {
    match unit {
      Unit::Character => Characters::new(*self).distance(from, to),
      Unit::Scalar => Scalars::new(*self).distance(from, to),
      Unit::Utf8 => Utf8View::new(*self).distance(from, to),
      Unit::Utf16 => Utf16View::new(*self).distance(from, to),
    }
  }

  /// The position `n` units after the start. Negative offsets clamp to the
  /// start and offsets past the end clamp to the end.
  pub(crate) fn position_at(&self, unit: Unit, n: isize) -> Position {
    match self.checked_position_at(unit, n) {
      Ok(position) => position,
      Err(err) => {
        tracing::debug!(%unit, n, %err, "clamping offset into the text");
        if n < 0 { self.start() } else { self.end() }
      },
    }
  }

  /// Like [`Span::position_at`], but only tolerates one past the end.
  pub(crate) fn checked_position_at(&self, unit: Unit, n: isize) -> Result<Position> {
    if n < 0 {
      return Err(TextError::OutOfRange {
        unit,
        offset: n,
        len: self.count(unit),
      });
    }
    match self.offset_by(unit, self.start(), n) {
      Err(TextError::OutOfRange { len, .. }) if n.unsigned_abs() == len + 1 => Ok(self.end()),
      result => result,
    }
  }

  /// Number of `unit`s between the start and `position`.
  pub(crate) fn offset_of(&self, position: Position, unit: Unit) -> Result<usize> {
    let distance = self.distance(unit, self.start(), position)?;
    Ok(distance.unsigned_abs())
  }

  /// `position` itself when it lies on a boundary of `unit`.
  pub(crate) fn same_position(&self, position: Position, unit: Unit) -> Result<Option<Position>> {
    let position = self.validate(position)?;
    let aligned = self.align(position, unit)?;
    Ok((aligned == position).then_some(aligned))
  }

  /// The sub-span between two positions, rounded down to scalar boundaries.
  pub(crate) fn slice(&self, range: Range<Position>) -> Result<Span<'a>> {
    let start = self.validate(range.start)?;
    let end = self.validate(range.end)?;
    if start > end {
      return Err(TextError::InvalidRange {
        start: range.start,
        end:   range.end,
      });
    }

    let lower = self.scalar_floor(start.offset());
    let upper = self.scalar_floor(end.offset());
    let whole = Span::whole(self.storage);
    let trusted = |position: Position, offset: usize| {
      (self.trusts(position) && position.offset() == offset)
        || view::character::is_boundary(&whole, offset)
    };
    let trusts_characters = trusted(start, lower) && trusted(end, upper);

    tracing::trace!(lower, upper, trusts_characters, "sliced text");
    Ok(Span::new(self.storage, lower..upper, trusts_characters))
  }

  /// Native range covering every scalar touched by `range`: the start rounds
  /// down and the end rounds up.
  pub(crate) fn enclosing_scalars(&self, range: Range<Position>) -> Result<Range<usize>> {
    let start = self.validate(range.start)?;
    let end = self.validate(range.end)?;
    if start > end {
      return Err(TextError::InvalidRange {
        start: range.start,
        end:   range.end,
      });
    }

    let lower = self.scalar_floor(start.offset());
    let upper = if end.transcoded() > 0 {
      self.storage.scalar_end(end.offset() + 1)
    } else {
      self.storage.scalar_end(end.offset())
    };
    Ok(lower..upper.clamp(lower, self.end))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    config::IndexConfig,
    position::EncodingTag,
    storage::Backend,
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

  #[test]
  fn test_edges_are_character_aligned() {
    let storage = utf8("héllo");
    let span = Span::whole(&storage);
    assert!(span.start().is_character_aligned());
    assert!(span.end().is_character_aligned());
    assert_eq!(span.end().offset(), 6);
    assert_eq!(span.end().encoding(), EncodingTag::Utf8);
  }

  #[test]
  fn test_validate_bounds() {
    let storage = utf8("abc");
    let span = Span::new(&storage, 1..2, false);
    assert!(span.validate(Position::legacy(1)).is_ok());
    assert!(span.validate(Position::legacy(2)).is_ok());
    assert!(matches!(
      span.validate(Position::legacy(0)),
      Err(TextError::OutOfBounds { .. })
    ));
    assert!(matches!(
      span.validate(Position::legacy(3)),
      Err(TextError::OutOfBounds { .. })
    ));
  }

  #[test]
  fn test_position_at_clamps() {
    let storage = utf8("a😇");
    let span = Span::whole(&storage);
    assert_eq!(span.position_at(Unit::Utf16, -3), span.start());
    assert_eq!(span.position_at(Unit::Utf16, 3), span.end());
    assert_eq!(span.position_at(Unit::Utf16, 40), span.end());
    assert_eq!(span.checked_position_at(Unit::Utf16, 4), Ok(span.end()));
    assert!(matches!(
      span.checked_position_at(Unit::Utf16, 5),
      Err(TextError::OutOfRange { len: 3, .. })
    ));
    assert!(span.checked_position_at(Unit::Scalar, -1).is_err());
  }

  #[test]
  fn test_offset_of_and_position_at_agree() {
    for storage in [utf8("a😇é漢"), utf16("a😇é漢")] {
      let span = Span::whole(&storage);
      for unit in [Unit::Character, Unit::Scalar, Unit::Utf8, Unit::Utf16] {
        for n in 0..=span.count(unit) {
          let position = span.position_at(unit, n as isize);
          assert_eq!(span.offset_of(position, unit).unwrap(), n, "{unit} {n}");
        }
      }
    }
  }

  #[test]
  fn test_same_position() {
    let storage = utf8("a😇");
    let span = Span::whole(&storage);
    let mid = Position::new(2, EncodingTag::Utf8);
    assert_eq!(span.same_position(mid, Unit::Utf8).unwrap(), Some(mid));
    assert_eq!(span.same_position(mid, Unit::Scalar).unwrap(), None);
    assert_eq!(span.same_position(mid, Unit::Utf16).unwrap(), None);

    let boundary = Position::new(1, EncodingTag::Utf8);
    assert_eq!(
      span.same_position(boundary, Unit::Character).unwrap(),
      Some(boundary)
    );
  }

  #[test]
  fn test_slice_rounds_to_scalars_and_tracks_trust() {
    let storage = utf8("a🇺🇸🇨🇦b");
    let span = Span::whole(&storage);

    let aligned = span
      .slice(Position::new(1, EncodingTag::Utf8)..Position::new(9, EncodingTag::Utf8))
      .unwrap();
    assert_eq!(aligned.bounds(), 1..9);
    assert!(aligned.trusts_characters());

    let split = span
      .slice(Position::new(7, EncodingTag::Utf8)..Position::new(13, EncodingTag::Utf8))
      .unwrap();
    assert_eq!(split.bounds(), 5..13);
    assert!(!split.trusts_characters());
    assert_eq!(split.start().alignment(), Alignment::Scalar);

    let backwards = span.slice(Position::legacy(3)..Position::legacy(1));
    assert!(matches!(backwards, Err(TextError::InvalidRange { .. })));
  }

  #[test]
  fn test_enclosing_scalars() {
    let storage = utf8("a😇b");
    let span = Span::whole(&storage);
    let range = span
      .enclosing_scalars(Position::legacy(2)..Position::legacy(3))
      .unwrap();
    assert_eq!(range, 1..5);
    let trailing = Position::from_encoded(1, 1, EncodingTag::Utf8);
    assert_eq!(
      span.enclosing_scalars(Position::legacy(0)..trailing).unwrap(),
      0..5
    );
  }
}
