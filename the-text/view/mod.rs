//! Four projections of the same text, all addressed with [`Position`].
//!
//! Navigation is strict and subscripting is permissive:
//!
//! - [`Characters`] rounds every position down to a grapheme cluster boundary.
//! - [`Scalars`] rounds down to a scalar boundary only.
//! - [`Utf8View`] and [`Utf16View`] read the code unit under the position
//!   without rounding. A position the view cannot address (the middle of a
//!   UTF-8 scalar seen through UTF-16) falls back to the scalar holding it.
//!
//! Cutting a range at scalar or code-unit level therefore yields the minimal
//! slice instead of snapping outward to whole clusters.

use std::ops::Range;

pub(crate) mod character;
mod scalar;
mod utf16;
mod utf8;

pub use self::{
  character::{
    Character,
    Characters,
  },
  scalar::Scalars,
  utf8::Utf8View,
  utf16::Utf16View,
};
use crate::{
  encoding::Unit,
  error::{
    Result,
    TextError,
  },
  position::Position,
};

pub trait TextView {
  type Element;

  const UNIT: Unit;

  fn start(&self) -> Position;

  fn end(&self) -> Position;

  /// Checks `position` against the storage encoding and the bounds of the
  /// text, repairing legacy positions where possible.
  fn validate(&self, position: Position) -> Result<Position>;

  /// Rounds `position` down to the nearest boundary of this view.
  fn align(&self, position: Position) -> Result<Position>;

  fn next(&self, position: Position) -> Result<Position>;

  fn previous(&self, position: Position) -> Result<Position>;

  fn get(&self, position: Position) -> Result<Self::Element>;

  /// Number of boundaries crossed going from `from` to `to`, negative when
  /// `to` comes first.
  fn distance(&self, from: Position, to: Position) -> Result<isize> {
    let from = self.align(from)?;
    let to = self.align(to)?;
    Ok(step_distance(
      from,
      to,
      |p| self.next(p).ok(),
      |p| self.previous(p).ok(),
    ))
  }

  /// Moves `n` units from `position`. With a `limit`, returns `None` when the
  /// walk meets it before the destination or runs off the text.
  fn walk(&self, position: Position, n: isize, limit: Option<Position>) -> Result<Option<Position>> {
    let from = self.align(position)?;
    step_by(
      Self::UNIT,
      from,
      n,
      limit,
      |p| self.next(p).ok(),
      |p| self.previous(p).ok(),
    )
  }

  /// This view restricted to `range`, both bounds aligned first. Its
  /// `count` is the `distance` between the aligned bounds.
  fn slice(&self, range: Range<Position>) -> Result<Self>
  where
    Self: Sized;

  fn offset_by(&self, position: Position, n: isize) -> Result<Position> {
    let from = self.align(position)?;
    Ok(self.walk(from, n, None)?.unwrap_or(from))
  }

  fn offset_by_limited(
    &self,
    position: Position,
    n: isize,
    limit: Position,
  ) -> Result<Option<Position>> {
    self.walk(position, n, Some(limit))
  }

  fn count(&self) -> usize {
    self
      .distance(self.start(), self.end())
      .map_or(0, isize::unsigned_abs)
  }

  fn is_empty(&self) -> bool {
    self.start() == self.end()
  }

  /// `position` itself when it already lies on a boundary of this view.
  fn same_position(&self, position: Position) -> Result<Option<Position>> {
    let position = self.validate(position)?;
    let aligned = self.align(position)?;
    Ok((aligned == position).then_some(aligned))
  }

  fn is_boundary(&self, position: Position) -> bool {
    matches!(self.same_position(position), Ok(Some(_)))
  }

  fn iter(&self) -> ViewIter<'_, Self>
  where
    Self: Sized,
  {
    ViewIter {
      view:  self,
      front: self.start(),
      back:  self.end(),
    }
  }
}

/// Double-ended iterator over the elements of a view.
#[derive(Debug)]
pub struct ViewIter<'v, V> {
  view:  &'v V,
  front: Position,
  back:  Position,
}

impl<V: TextView> Iterator for ViewIter<'_, V> {
  type Item = V::Element;

  fn next(&mut self) -> Option<V::Element> {
    if self.front >= self.back {
      return None;
    }
    let element = self.view.get(self.front).ok()?;
    self.front = self.view.next(self.front).ok()?;
    Some(element)
  }
}

impl<V: TextView> DoubleEndedIterator for ViewIter<'_, V> {
  fn next_back(&mut self) -> Option<V::Element> {
    if self.back <= self.front {
      return None;
    }
    self.back = self.view.previous(self.back).ok()?;
    self.view.get(self.back).ok()
  }
}

/// Counts single steps between two aligned positions.
pub(crate) fn step_distance(
  from: Position,
  to: Position,
  mut next: impl FnMut(Position) -> Option<Position>,
  mut previous: impl FnMut(Position) -> Option<Position>,
) -> isize {
  let mut current = from;
  let mut steps = 0isize;
  while current < to {
    let Some(step) = next(current) else { break };
    current = step;
    steps += 1;
  }
  while current > to {
    let Some(step) = previous(current) else { break };
    current = step;
    steps -= 1;
  }
  steps
}

/// Whether `limit` lies on the way from `from` to `to`: at `from` or strictly
/// before `to`.
fn meets_limit(limit: Option<Position>, from: Position, to: Position) -> bool {
  let Some(limit) = limit else {
    return false;
  };
  if from <= to {
    from <= limit && limit < to
  } else {
    to < limit && limit <= from
  }
}

/// Walks `n` single steps from the aligned `from`.
///
/// With a `limit`, running into it while steps remain, passing over it
/// between two boundaries, or running off the span all yield `None`.
pub(crate) fn step_by(
  unit: Unit,
  from: Position,
  n: isize,
  limit: Option<Position>,
  mut next: impl FnMut(Position) -> Option<Position>,
  mut previous: impl FnMut(Position) -> Option<Position>,
) -> Result<Option<Position>> {
  let limited = limit.is_some();
  let forward = n >= 0;
  let limit = limit.filter(|&limit| if forward { limit >= from } else { limit <= from });
  let mut current = from;
  for taken in 0..n.unsigned_abs() {
    let reached = limit.is_some_and(|limit| {
      if forward {
        current >= limit
      } else {
        current <= limit
      }
    });
    if reached {
      return Ok(None);
    }
    let step = if forward {
      next(current)
    } else {
      previous(current)
    };
    match step {
      Some(step) => current = step,
      None if limited => return Ok(None),
      None => {
        return Err(TextError::OutOfRange {
          unit,
          offset: n,
          len: taken,
        });
      },
    }
  }
  if meets_limit(limit, from, current) {
    return Ok(None);
  }
  Ok(Some(current))
}

/// Jumps `n` units from the aligned `from` in one go, for views that can
/// compute the destination directly.
///
/// `available` is how many units lie between `from` and the span edge in the
/// direction of travel. `resolve` is only called when the destination is in
/// range.
pub(crate) fn jump_by(
  unit: Unit,
  from: Position,
  n: isize,
  limit: Option<Position>,
  available: usize,
  resolve: impl FnOnce() -> Result<Position>,
) -> Result<Option<Position>> {
  if n.unsigned_abs() > available {
    if limit.is_some() {
      return Ok(None);
    }
    return Err(TextError::OutOfRange {
      unit,
      offset: n,
      len: available,
    });
  }
  let to = resolve()?;
  if meets_limit(limit, from, to) {
    return Ok(None);
  }
  Ok(Some(to))
}
