use std::ops::Range;

use super::{
  TextView,
  step_by,
};
use crate::{
  encoding::Unit,
  error::Result,
  position::{
    Alignment,
    Position,
  },
  span::Span,
};

/// Unicode scalars. Positions round down to the scalar holding them, never
/// further.
#[derive(Debug, Clone, Copy)]
pub struct Scalars<'a> {
  span: Span<'a>,
}

impl<'a> Scalars<'a> {
  pub(crate) fn new(span: Span<'a>) -> Self {
    Self { span }
  }

  fn mark(&self, offset: usize) -> Position {
    self.span.at(offset, 0, Alignment::Scalar)
  }

  fn floor(&self, position: Position) -> Result<usize> {
    let position = self.span.validate(position)?;
    Ok(self.span.scalar_floor(position.offset()))
  }

  fn step_forward(&self, offset: usize) -> Option<usize> {
    if offset >= self.span.bounds().end {
      return None;
    }
    let (_, width) = self.span.storage().decode(offset)?;
    Some(offset + width)
  }

  fn step_backward(&self, offset: usize) -> Option<usize> {
    if offset <= self.span.bounds().start {
      return None;
    }
    let (_, width) = self.span.storage().decode_before(offset)?;
    Some(offset - width)
  }
}

impl TextView for Scalars<'_> {
  type Element = char;

  const UNIT: Unit = Unit::Scalar;

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
    let offset = self.floor(position)?;
    Ok(self.mark(offset))
  }

  fn next(&self, position: Position) -> Result<Position> {
    let from = self.floor(position)?;
    self
      .step_forward(from)
      .map(|offset| self.mark(offset))
      .ok_or_else(|| self.span.out_of_bounds(position))
  }

  fn previous(&self, position: Position) -> Result<Position> {
    let from = self.floor(position)?;
    self
      .step_backward(from)
      .map(|offset| self.mark(offset))
      .ok_or_else(|| self.span.out_of_bounds(position))
  }

  fn get(&self, position: Position) -> Result<char> {
    let offset = self.floor(position)?;
    if offset >= self.span.bounds().end {
      return Err(self.span.out_of_bounds(position));
    }
    self
      .span
      .storage()
      .decode(offset)
      .map(|(ch, _)| ch)
      .ok_or_else(|| self.span.out_of_bounds(position))
  }

  fn distance(&self, from: Position, to: Position) -> Result<isize> {
    let from = self.floor(from)?;
    let to = self.floor(to)?;
    let storage = self.span.storage();
    Ok(if from <= to {
      storage.count_scalars(from..to) as isize
    } else {
      -(storage.count_scalars(to..from) as isize)
    })
  }

  fn walk(&self, position: Position, n: isize, limit: Option<Position>) -> Result<Option<Position>> {
    let from = self.align(position)?;
    step_by(
      Self::UNIT,
      from,
      n,
      limit,
      |p| self.step_forward(p.offset()).map(|offset| self.mark(offset)),
      |p| self.step_backward(p.offset()).map(|offset| self.mark(offset)),
    )
  }

  fn slice(&self, range: Range<Position>) -> Result<Self> {
    Ok(Self::new(self.span.slice(range)?))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    config::IndexConfig,
    position::EncodingTag,
    storage::{
      Backend,
      Storage,
    },
  };

  #[test]
  fn test_scalars_round_down_inside_scalar_only() {
    let storage = Storage::new(Backend::utf8("🇺🇸x".to_owned()), IndexConfig::default());
    let view = Scalars::new(Span::whole(&storage));
    // Offset 4 is the start of the second indicator, not a cluster boundary.
    let second = Position::new(4, EncodingTag::Utf8);
    assert_eq!(view.align(second).unwrap(), second);
    assert_eq!(view.get(second).unwrap(), '🇸');
    assert_eq!(view.get(Position::new(6, EncodingTag::Utf8)).unwrap(), '🇸');
    assert_eq!(view.next(second).unwrap().offset(), 8);
    assert_eq!(view.count(), 3);
  }

  #[test]
  fn test_utf16_storage_with_lone_surrogate() {
    let storage = Storage::new(
      Backend::Foreign(vec![0x61, 0xD83D, 0xDE07, 0xDC00]),
      IndexConfig::default(),
    );
    let view = Scalars::new(Span::whole(&storage));
    let scalars: String = view.iter().collect();
    assert_eq!(scalars, "a😇\u{FFFD}");
    assert_eq!(view.distance(view.start(), view.end()).unwrap(), 3);
    // The trailing surrogate of the pair reads the whole scalar.
    assert_eq!(view.get(Position::new(2, EncodingTag::Utf16)).unwrap(), '😇');
    assert_eq!(view.offset_by(view.end(), -2).unwrap().offset(), 1);
  }
}
