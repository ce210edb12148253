use std::ops::Range;

use super::{
  TextView,
  jump_by,
};
use crate::{
  encoding::{
    Encoding,
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
  span::Span,
  storage::Units,
};

/// UTF-16 code units.
///
/// On UTF-8 storage the trailing surrogate of an astral scalar is addressed
/// as the scalar's first byte plus a residual of 1. Conversions to and from
/// absolute UTF-16 offsets go through the storage's breadcrumbs.
#[derive(Debug, Clone, Copy)]
pub struct Utf16View<'a> {
  span:  Span<'a>,
  lower: Position,
  upper: Position,
}

impl<'a> Utf16View<'a> {
  pub(crate) fn new(span: Span<'a>) -> Self {
    Self {
      span,
      lower: span.start(),
      upper: span.end(),
    }
  }

  fn is_native(&self) -> bool {
    self.span.storage().encoding() == Encoding::Utf16
  }

  fn out_of_bounds(&self, position: Position) -> TextError {
    TextError::OutOfBounds {
      position,
      start: self.lower,
      end: self.upper,
    }
  }

  /// UTF-8 storage only: the scalar start under `position`, plus 1 when it
  /// addresses a trailing surrogate. Bytes inside a scalar fall back to the
  /// scalar start.
  fn locate(&self, position: Position) -> Result<(usize, u8)> {
    let validated = self.validate(position)?;
    let scalar = self.span.scalar_floor(validated.offset());
    let trailing = scalar == validated.offset()
      && validated.transcoded() == 1
      && self
        .span
        .storage()
        .decode(scalar)
        .is_some_and(|(ch, _)| ch.len_utf16() == 2);
    Ok((scalar, u8::from(trailing)))
  }

  /// Absolute UTF-16 offset of `position`.
  fn absolute(&self, position: Position) -> Result<usize> {
    if self.is_native() {
      return Ok(self.validate(position)?.offset());
    }
    let (scalar, trailing) = self.locate(position)?;
    Ok(self.span.storage().utf16_offset(scalar) + usize::from(trailing))
  }
}

impl TextView for Utf16View<'_> {
  type Element = u16;

  const UNIT: Unit = Unit::Utf16;

  fn start(&self) -> Position {
    self.lower
  }

  fn end(&self) -> Position {
    self.upper
  }

  fn validate(&self, position: Position) -> Result<Position> {
    let validated = self.span.validate(position)?;
    if validated < self.lower || validated > self.upper {
      return Err(self.out_of_bounds(position));
    }
    Ok(validated)
  }

  fn align(&self, position: Position) -> Result<Position> {
    if self.is_native() {
      let offset = self.validate(position)?.offset();
      return Ok(self.span.at(offset, 0, Alignment::None));
    }
    let (scalar, trailing) = self.locate(position)?;
    Ok(self.span.at(scalar, trailing, Alignment::None))
  }

  fn next(&self, position: Position) -> Result<Position> {
    let from = self.align(position)?;
    if from >= self.upper {
      return Err(self.out_of_bounds(position));
    }
    if self.is_native() {
      return Ok(self.span.at(from.offset() + 1, 0, Alignment::None));
    }

    let scalar = from.offset();
    let Some((ch, width)) = self.span.storage().decode(scalar) else {
      return Err(self.out_of_bounds(position));
    };
    Ok(if ch.len_utf16() == 2 && from.transcoded() == 0 {
      self.span.at(scalar, 1, Alignment::None)
    } else {
      self.span.at(scalar + width, 0, Alignment::None)
    })
  }

  fn previous(&self, position: Position) -> Result<Position> {
    let from = self.align(position)?;
    if from <= self.lower {
      return Err(self.out_of_bounds(position));
    }
    if self.is_native() {
      return Ok(self.span.at(from.offset() - 1, 0, Alignment::None));
    }

    let scalar = from.offset();
    if from.transcoded() == 1 {
      return Ok(self.span.at(scalar, 0, Alignment::None));
    }
    let Some((ch, width)) = self.span.storage().decode_before(scalar) else {
      return Err(self.out_of_bounds(position));
    };
    let residual = u8::from(ch.len_utf16() == 2);
    Ok(self.span.at(scalar - width, residual, Alignment::None))
  }

  fn get(&self, position: Position) -> Result<u16> {
    if let Units::Utf16(units) = self.span.storage().units() {
      let offset = self.validate(position)?.offset();
      if offset >= self.upper.offset() {
        return Err(self.out_of_bounds(position));
      }
      return units
        .get(offset)
        .copied()
        .ok_or_else(|| self.out_of_bounds(position));
    }

    let (scalar, trailing) = self.locate(position)?;
    if self.span.at(scalar, trailing, Alignment::None) >= self.upper {
      return Err(self.out_of_bounds(position));
    }
    let Some((ch, _)) = self.span.storage().decode(scalar) else {
      return Err(self.out_of_bounds(position));
    };
    let mut buf = [0; 2];
    Ok(ch.encode_utf16(&mut buf)[usize::from(trailing)])
  }

  fn distance(&self, from: Position, to: Position) -> Result<isize> {
    let from = self.absolute(from)?;
    let to = self.absolute(to)?;
    Ok(to as isize - from as isize)
  }

  fn walk(&self, position: Position, n: isize, limit: Option<Position>) -> Result<Option<Position>> {
    let from = self.align(position)?;
    let here = self.absolute(from)?;
    let available = if n >= 0 {
      self.absolute(self.upper)? - here
    } else {
      here - self.absolute(self.lower)?
    };

    jump_by(Self::UNIT, from, n, limit, available, || {
      let target = here.wrapping_add_signed(n);
      if self.is_native() {
        return Ok(self.span.at(target, 0, Alignment::None));
      }
      let (offset, trailing) = self
        .span
        .storage()
        .native_of_utf16(target)
        .ok_or(TextError::OutOfRange {
          unit:   Self::UNIT,
          offset: n,
          len:    available,
        })?;
      Ok(self.span.at(offset, trailing, Alignment::None))
    })
  }

  fn slice(&self, range: Range<Position>) -> Result<Self> {
    let lower = self.align(range.start)?;
    let upper = self.align(range.end)?;
    if lower > upper {
      return Err(TextError::InvalidRange {
        start: range.start,
        end:   range.end,
      });
    }
    let enclosing = self.span.enclosing_scalars(lower..upper)?;
    Ok(Self {
      span: Span::new(self.span.storage(), enclosing, false),
      lower,
      upper,
    })
  }
}
