//! The position type shared by every view of a [`Text`](crate::Text).
//!
//! A [`Position`] is an offset in the *storage's* native code-unit grid plus
//! enough metadata to notice when it is consumed by a string that stores its
//! text in a different encoding than the one the position was computed
//! against.
//!
//! ```text
//!  "a😇" stored as UTF-8:   61 F0 9F 98 87
//!  utf8 positions:          0  1  2  3  4  5
//!  utf16 positions:         0  1 (1,+1)    5
//! ```
//!
//! The trailing surrogate of `😇` has no byte of its own, so the UTF-16 view
//! addresses it as offset 1 with a transcoded residual of 1.
//!
//! Positions order by `(offset, transcoded)` only; the encoding tag, the
//! alignment and the storage epoch are hints that never participate in
//! identity. An alignment flag only holds for the epoch it was computed in.

use std::{
  cmp::Ordering,
  fmt,
  hash::{
    Hash,
    Hasher,
  },
};

use serde::{
  Deserialize,
  Serialize,
};

/// The code-unit grid a position's offset was computed against.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncodingTag {
  /// Predates encoding tracking; interpreted in whatever grid the storage uses.
  #[default]
  Unknown,
  Utf8,
  Utf16,
}

impl fmt::Display for EncodingTag {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Unknown => "unknown",
      Self::Utf8 => "utf-8",
      Self::Utf16 => "utf-16",
    })
  }
}

/// The strongest boundary guarantee known to hold for a position.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Alignment {
  #[default]
  None,
  Scalar,
  Character,
}

#[derive(Clone, Copy, Default)]
pub struct Position {
  offset:     usize,
  transcoded: u8,
  encoding:   EncodingTag,
  alignment:  Alignment,
  epoch:      u64,
}

impl Position {
  /// Largest residual a position can carry: the third byte of a BMP scalar
  /// seen through the UTF-8 view of UTF-16 storage.
  pub const MAX_TRANSCODED: u8 = 2;

  /// An unaligned position at `offset` in the `encoding` grid.
  pub const fn new(offset: usize, encoding: EncodingTag) -> Self {
    Self {
      offset,
      transcoded: 0,
      encoding,
      alignment: Alignment::None,
      epoch: 0,
    }
  }

  /// A position that carries no encoding information, as produced by code
  /// that only kept the raw offset around.
  pub const fn legacy(offset: usize) -> Self {
    Self::new(offset, EncodingTag::Unknown)
  }

  /// Rebuilds a position from its encoded parts.
  ///
  /// Residuals above [`Position::MAX_TRANSCODED`] are kept as-is and rejected
  /// when the position is validated against a text.
  pub const fn from_encoded(offset: usize, transcoded: u8, encoding: EncodingTag) -> Self {
    Self {
      offset,
      transcoded,
      encoding,
      alignment: Alignment::None,
      epoch: 0,
    }
  }

  pub const fn offset(&self) -> usize {
    self.offset
  }

  pub const fn transcoded(&self) -> u8 {
    self.transcoded
  }

  pub const fn encoding(&self) -> EncodingTag {
    self.encoding
  }

  pub const fn alignment(&self) -> Alignment {
    self.alignment
  }

  pub fn is_scalar_aligned(&self) -> bool {
    self.alignment >= Alignment::Scalar
  }

  pub fn is_character_aligned(&self) -> bool {
    self.alignment == Alignment::Character
  }

  pub(crate) const fn with_alignment(mut self, alignment: Alignment) -> Self {
    self.alignment = alignment;
    self
  }

  /// Storage epoch the alignment flag was computed in.
  pub(crate) const fn epoch(&self) -> u64 {
    self.epoch
  }

  pub(crate) const fn with_epoch(mut self, epoch: u64) -> Self {
    self.epoch = epoch;
    self
  }

  pub(crate) const fn with_encoding(mut self, encoding: EncodingTag) -> Self {
    self.encoding = encoding;
    self
  }

  /// Drops the residual, landing on the native code unit that holds it.
  pub(crate) const fn stripping_transcoding(mut self) -> Self {
    if self.transcoded != 0 {
      self.transcoded = 0;
      self.alignment = Alignment::None;
    }
    self
  }

  const fn key(&self) -> (usize, u8) {
    (self.offset, self.transcoded)
  }
}

impl PartialEq for Position {
  fn eq(&self, other: &Self) -> bool {
    self.key() == other.key()
  }
}

impl Eq for Position {}

impl Hash for Position {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.key().hash(state);
  }
}

impl PartialOrd for Position {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for Position {
  fn cmp(&self, other: &Self) -> Ordering {
    self.key().cmp(&other.key())
  }
}

impl fmt::Debug for Position {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Position({}", self.offset)?;
    if self.transcoded != 0 {
      write!(f, "+{}", self.transcoded)?;
    }
    write!(f, " {}", self.encoding)?;
    match self.alignment {
      Alignment::None => {},
      Alignment::Scalar => f.write_str(" scalar")?,
      Alignment::Character => f.write_str(" character")?,
    }
    f.write_str(")")
  }
}
