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

/// UTF-8 code units.
///
/// On UTF-8 storage this is plain byte arithmetic. On UTF-16 storage a byte
/// is addressed as the code unit holding its scalar plus a residual: a BMP
/// scalar spans residuals `0..=2` of its unit, an astral scalar `0..=1` of
/// each surrogate.
///
/// A sliced view keeps byte-precise bounds inside the scalar-aligned span that
/// encloses them.
#[derive(Debug, Clone, Copy)]
pub struct Utf8View<'a> {
  span:  Span<'a>,
  lower: Position,
  upper: Position,
}

/// A byte of UTF-16 storage: the scalar holding it and the index of the byte
/// inside the scalar's UTF-8 encoding.
#[derive(Debug, Clone, Copy)]
struct Byte {
  scalar: usize,
  index:  usize,
}

impl<'a> Utf8View<'a> {
  pub(crate) fn new(span: Span<'a>) -> Self {
    Self {
      span,
      lower: span.start(),
      upper: span.end(),
    }
  }

  fn is_native(&self) -> bool {
    self.span.storage().encoding() == Encoding::Utf8
  }

  fn out_of_bounds(&self, position: Position) -> TextError {
    TextError::OutOfBounds {
      position,
      start: self.lower,
      end: self.upper,
    }
  }

  fn native(&self, position: Position) -> Result<usize> {
    Ok(self.validate(position)?.offset())
  }

  fn locate(&self, position: Position) -> Result<Byte> {
    let validated = self.validate(position)?;
    let storage = self.span.storage();
    let scalar = self.span.scalar_floor(validated.offset());
    if scalar == self.span.bounds().end {
      return Ok(Byte { scalar, index: 0 });
    }
    let Some((ch, _)) = storage.decode(scalar) else {
      return Err(self.out_of_bounds(position));
    };
    let index = 2 * (validated.offset() - scalar) + usize::from(validated.transcoded());
    if index >= ch.len_utf8() {
      return Err(TextError::invalid_index(
        position,
        "residual past the end of the scalar",
      ));
    }
    Ok(Byte { scalar, index })
  }

  fn encode(&self, byte: Byte) -> Position {
    let storage = self.span.storage();
    let astral = storage
      .decode(byte.scalar)
      .is_some_and(|(ch, _)| ch.len_utf8() == 4);
    let (offset, residual) = if astral && byte.index >= 2 {
      (byte.scalar + 1, byte.index - 2)
    } else {
      (byte.scalar, byte.index)
    };
    // Residuals are at most 2 by construction.
    self
      .span
      .at(offset, residual as u8, Alignment::None)
  }

  fn byte_after(&self, byte: Byte) -> Option<Byte> {
    let end = self.span.bounds().end;
    if byte.scalar >= end {
      return None;
    }
    let (ch, width) = self.span.storage().decode(byte.scalar)?;
    Some(if byte.index + 1 < ch.len_utf8() {
      Byte {
        scalar: byte.scalar,
        index:  byte.index + 1,
      }
    } else {
      Byte {
        scalar: byte.scalar + width,
        index:  0,
      }
    })
  }

  fn byte_before(&self, byte: Byte) -> Option<Byte> {
    if byte.index > 0 {
      return Some(Byte {
        scalar: byte.scalar,
        index:  byte.index - 1,
      });
    }
    if byte.scalar <= self.span.bounds().start {
      return None;
    }
    let (ch, width) = self.span.storage().decode_before(byte.scalar)?;
    Some(Byte {
      scalar: byte.scalar - width,
      index:  ch.len_utf8() - 1,
    })
  }

  /// Bytes between the span start and `byte`.
  fn rank(&self, byte: Byte) -> usize {
    self
      .span
      .storage()
      .count_utf8(self.span.bounds().start..byte.scalar)
      + byte.index
  }

  /// Position of the `target`th byte after the span start, on UTF-16 storage.
  fn seek(&self, target: usize) -> Result<Position> {
    let storage = self.span.storage();
    let bounds = self.span.bounds();
    let mut scalar = bounds.start;
    let mut remaining = target;
    while scalar < bounds.end {
      let Some((ch, width)) = storage.decode(scalar) else {
        break;
      };
      if remaining < ch.len_utf8() {
        return Ok(self.encode(Byte {
          scalar,
          index: remaining,
        }));
      }
      remaining -= ch.len_utf8();
      scalar += width;
    }
    Ok(self.span.at(scalar, 0, Alignment::None))
  }
}

impl TextView for Utf8View<'_> {
  type Element = u8;

  const UNIT: Unit = Unit::Utf8;

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
      let offset = self.native(position)?;
      return Ok(self.span.at(offset, 0, Alignment::None));
    }
    let byte = self.locate(position)?;
    Ok(self.encode(byte))
  }

  fn next(&self, position: Position) -> Result<Position> {
    let from = self.align(position)?;
    if from >= self.upper {
      return Err(self.out_of_bounds(position));
    }
    if self.is_native() {
      return Ok(self.span.at(from.offset() + 1, 0, Alignment::None));
    }
    self
      .byte_after(self.locate(from)?)
      .map(|byte| self.encode(byte))
      .ok_or_else(|| self.out_of_bounds(position))
  }

  fn previous(&self, position: Position) -> Result<Position> {
    let from = self.align(position)?;
    if from <= self.lower {
      return Err(self.out_of_bounds(position));
    }
    if self.is_native() {
      return Ok(self.span.at(from.offset() - 1, 0, Alignment::None));
    }
    self
      .byte_before(self.locate(from)?)
      .map(|byte| self.encode(byte))
      .ok_or_else(|| self.out_of_bounds(position))
  }

  fn get(&self, position: Position) -> Result<u8> {
    let storage = self.span.storage();
    if let Units::Utf8(text) = storage.units() {
      let offset = self.native(position)?;
      if offset >= self.upper.offset() {
        return Err(self.out_of_bounds(position));
      }
      return text
        .as_bytes()
        .get(offset)
        .copied()
        .ok_or_else(|| self.out_of_bounds(position));
    }

    let byte = self.locate(position)?;
    if self.encode(byte) >= self.upper {
      return Err(self.out_of_bounds(position));
    }
    let Some((ch, _)) = storage.decode(byte.scalar) else {
      return Err(self.out_of_bounds(position));
    };
    let mut buf = [0; 4];
    Ok(ch.encode_utf8(&mut buf).as_bytes()[byte.index])
  }

  fn distance(&self, from: Position, to: Position) -> Result<isize> {
    if self.is_native() {
      let from = self.native(from)?;
      let to = self.native(to)?;
      return Ok(to as isize - from as isize);
    }
    let from = self.rank(self.locate(from)?);
    let to = self.rank(self.locate(to)?);
    Ok(to as isize - from as isize)
  }

  fn walk(&self, position: Position, n: isize, limit: Option<Position>) -> Result<Option<Position>> {
    let from = self.align(position)?;

    if self.is_native() {
      let here = from.offset();
      let available = if n >= 0 {
        self.upper.offset() - here
      } else {
        here - self.lower.offset()
      };
      return jump_by(Self::UNIT, from, n, limit, available, || {
        Ok(self.span.at(here.wrapping_add_signed(n), 0, Alignment::None))
      });
    }

    let here = self.rank(self.locate(from)?);
    let available = if n >= 0 {
      self.rank(self.locate(self.upper)?) - here
    } else {
      here - self.rank(self.locate(self.lower)?)
    };
    jump_by(Self::UNIT, from, n, limit, available, || {
      let target = here.wrapping_add_signed(n);
      self.seek(target)
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
