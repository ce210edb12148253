//! Classification of scalars and code units.

/// U+FFFD, produced for ill-formed UTF-16 (lone surrogates).
pub const REPLACEMENT_CHARACTER: char = '\u{FFFD}';

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Utf8UnitKind {
  Ascii,
  Continuation,
  /// Leading byte of a multi-byte scalar, carrying the scalar's byte length.
  Lead(usize),
}

pub const fn categorize_utf8_unit(byte: u8) -> Utf8UnitKind {
  match byte {
    0x00..=0x7F => Utf8UnitKind::Ascii,
    0x80..=0xBF => Utf8UnitKind::Continuation,
    0xC0..=0xDF => Utf8UnitKind::Lead(2),
    0xE0..=0xEF => Utf8UnitKind::Lead(3),
    _ => Utf8UnitKind::Lead(4),
  }
}

#[inline]
pub const fn is_utf8_continuation(byte: u8) -> bool {
  byte & 0xC0 == 0x80
}

/// Number of UTF-16 code units contributed by a single UTF-8 byte: one per
/// scalar, plus one extra for the leading byte of an astral scalar.
#[inline]
pub const fn utf16_units_for_utf8_unit(byte: u8) -> usize {
  match categorize_utf8_unit(byte) {
    Utf8UnitKind::Continuation => 0,
    Utf8UnitKind::Lead(4) => 2,
    _ => 1,
  }
}

#[inline]
pub const fn is_high_surrogate(unit: u16) -> bool {
  unit & 0xFC00 == 0xD800
}

#[inline]
pub const fn is_low_surrogate(unit: u16) -> bool {
  unit & 0xFC00 == 0xDC00
}

/// Grapheme breaks between scalars below U+0300 are unconditional, except
/// inside a CR LF pair.
#[inline]
pub const fn has_fast_break(before: char, after: char) -> Option<bool> {
  if (before as u32) < 0x300 && (after as u32) < 0x300 {
    Some(!(before == '\r' && after == '\n'))
  } else {
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_categorize_utf8_unit() {
    let text = "aé漢😇";
    let kinds: Vec<_> = text.bytes().map(categorize_utf8_unit).collect();
    assert_eq!(kinds[0], Utf8UnitKind::Ascii);
    assert_eq!(kinds[1], Utf8UnitKind::Lead(2));
    assert_eq!(kinds[2], Utf8UnitKind::Continuation);
    assert_eq!(kinds[3], Utf8UnitKind::Lead(3));
    assert_eq!(kinds[6], Utf8UnitKind::Lead(4));
    assert!(kinds[7..].iter().all(|k| *k == Utf8UnitKind::Continuation));
  }

  #[test]
  fn test_utf16_units_for_utf8_unit_sums_to_utf16_len() {
    for text in ["", "abc", "aé漢😇", "🇺🇸🇨🇦", "e\u{301}"] {
      let sum: usize = text.bytes().map(utf16_units_for_utf8_unit).sum();
      assert_eq!(sum, text.encode_utf16().count(), "{text:?}");
    }
  }

  #[test]
  fn test_surrogates() {
    let units: Vec<u16> = "😇".encode_utf16().collect();
    assert!(is_high_surrogate(units[0]));
    assert!(is_low_surrogate(units[1]));
    assert!(!is_high_surrogate(units[1]));
    assert!(!is_low_surrogate('a' as u16));
  }

  #[test]
  fn test_fast_break() {
    assert_eq!(has_fast_break('a', 'b'), Some(true));
    assert_eq!(has_fast_break('\r', '\n'), Some(false));
    assert_eq!(has_fast_break('\n', '\r'), Some(true));
    assert_eq!(has_fast_break('e', '\u{301}'), None);
    assert_eq!(has_fast_break('🇺', '🇸'), None);
  }
}
