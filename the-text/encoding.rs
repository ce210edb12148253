//! Native encodings, view units, and the validator that reconciles a
//! position's encoding tag with the storage it is used on.
//!
//! | position tag | UTF-8 storage              | UTF-16 storage   |
//! |--------------|----------------------------|------------------|
//! | `Utf8`       | pass                       | `InvalidIndex`   |
//! | `Utf16`      | transcoded (legacy repair) | pass             |
//! | `Unknown`    | pass, retagged             | pass, retagged   |
//!
//! The UTF-16 → UTF-8 repair exists for positions that were kept across a
//! re-encoding of the storage. It is linear in the worst case and can be
//! switched off with [`IndexConfig::legacy_utf16_repair`](crate::IndexConfig).
//! The opposite direction is never repaired: on ASCII text a UTF-8 offset
//! would silently look valid as a UTF-16 offset.

use std::fmt;

use serde::{
  Deserialize,
  Serialize,
};

use crate::{
  error::{
    Result,
    TextError,
  },
  position::{
    EncodingTag,
    Position,
  },
  storage::Storage,
};

/// The code units a storage keeps its text in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Encoding {
  Utf8,
  Utf16,
}

impl Encoding {
  pub const fn tag(self) -> EncodingTag {
    match self {
      Self::Utf8 => EncodingTag::Utf8,
      Self::Utf16 => EncodingTag::Utf16,
    }
  }

  /// Largest transcoded residual a position can carry on this storage.
  pub(crate) const fn max_transcoded(self) -> u8 {
    match self {
      Self::Utf8 => 1,
      Self::Utf16 => Position::MAX_TRANSCODED,
    }
  }
}

impl fmt::Display for Encoding {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(&self.tag(), f)
  }
}

/// The unit a view counts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Unit {
  Character,
  Scalar,
  Utf8,
  Utf16,
}

impl fmt::Display for Unit {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Character => "character",
      Self::Scalar => "scalar",
      Self::Utf8 => "utf-8",
      Self::Utf16 => "utf-16",
    })
  }
}

/// Returns `position` expressed in the native grid of `storage`, or an
/// `InvalidIndex` error when the two cannot be reconciled.
pub(crate) fn validate(storage: &Storage, position: Position) -> Result<Position> {
  let native = storage.encoding();
  let position = match (position.encoding(), native) {
    (EncodingTag::Unknown, _) => position.with_encoding(native.tag()),
    (EncodingTag::Utf8, Encoding::Utf8) | (EncodingTag::Utf16, Encoding::Utf16) => position,
    (EncodingTag::Utf16, Encoding::Utf8) => repair_utf16(storage, position)?,
    (EncodingTag::Utf8, Encoding::Utf16) => {
      return Err(TextError::invalid_index(
        position,
        "utf-8 position used on utf-16 storage",
      ));
    },
  };

  if position.transcoded() > native.max_transcoded() {
    return Err(TextError::invalid_index(
      position,
      "transcoded residual out of range for the storage encoding",
    ));
  }
  Ok(position)
}

/// Reinterprets a UTF-16 position as a UTF-8 one.
///
/// The offset is read as an absolute UTF-16 offset. A non-zero residual picks
/// a byte inside the scalar found there: bytes `2..` of an astral scalar when
/// the offset lands on its trailing surrogate, bytes `0..` otherwise.
fn repair_utf16(storage: &Storage, position: Position) -> Result<Position> {
  if !storage.config().legacy_utf16_repair {
    return Err(TextError::invalid_index(
      position,
      "utf-16 position used on utf-8 storage",
    ));
  }

  let residual = position.transcoded();
  if storage.is_ascii() {
    if residual != 0 || position.offset() > storage.len() {
      return Err(TextError::invalid_index(
        position,
        "utf-16 position does not exist in this text",
      ));
    }
    return Ok(Position::new(position.offset(), EncodingTag::Utf8));
  }

  let Some((offset, trailing)) = storage.native_of_utf16(position.offset()) else {
    return Err(TextError::invalid_index(
      position,
      "utf-16 offset past the end of the text",
    ));
  };

  let repaired = if residual == 0 {
    Position::from_encoded(offset, trailing, EncodingTag::Utf8)
  } else {
    let byte = usize::from(residual) + 2 * usize::from(trailing);
    match storage.decode(offset) {
      Some((ch, _)) if byte < ch.len_utf8() => Position::new(offset + byte, EncodingTag::Utf8),
      _ => {
        return Err(TextError::invalid_index(
          position,
          "transcoded residual past the end of the scalar",
        ));
      },
    }
  };

  tracing::debug!(
    from = ?position,
    to = ?repaired,
    epoch = storage.epoch(),
    "repaired utf-16 position on utf-8 storage"
  );
  Ok(repaired)
}
