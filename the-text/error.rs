use thiserror::Error;

use crate::{
  encoding::Unit,
  position::Position,
};

pub type Result<T> = std::result::Result<T, TextError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TextError {
  /// The position's encoding cannot be reconciled with the storage.
  #[error("invalid string index {position:?}: {reason}")]
  InvalidIndex {
    position: Position,
    reason:   &'static str,
  },
  #[error("{unit} offset {offset} is out of range for length {len}")]
  OutOfRange {
    unit:   Unit,
    offset: isize,
    len:    usize,
  },
  #[error("position {position:?} is out of bounds {start:?}..{end:?}")]
  OutOfBounds {
    position: Position,
    start:    Position,
    end:      Position,
  },
  #[error("invalid range: start {start:?} is after end {end:?}")]
  InvalidRange { start: Position, end: Position },
}

impl TextError {
  pub(crate) const fn invalid_index(position: Position, reason: &'static str) -> Self {
    Self::InvalidIndex { position, reason }
  }
}
