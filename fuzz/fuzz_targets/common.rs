use the_text::{
  EncodingTag,
  IndexConfig,
  Position,
  Text,
  Unit,
};

const MAX_INITIAL_UNITS: usize = 4 * 1024;
const MAX_OPS: usize = 64;
const MAX_INSERT_BYTES: usize = 64;

const UNITS: [Unit; 4] = [Unit::Character, Unit::Scalar, Unit::Utf8, Unit::Utf16];
const TAGS: [EncodingTag; 3] = [EncodingTag::Unknown, EncodingTag::Utf8, EncodingTag::Utf16];

#[derive(Debug, Clone)]
pub enum Op {
  /// Walk from an arbitrary, possibly misaligned position.
  Navigate {
    unit:     Unit,
    position: Position,
    steps:    i16,
    limit:    Position,
  },
  Slice {
    from: Position,
    to:   Position,
  },
  Replace {
    from:   Position,
    to:     Position,
    insert: String,
  },
  Transcode,
}

pub struct Session {
  pub text: Text,
  pub ops:  Vec<Op>,
}

pub fn session_from_bytes(data: &[u8]) -> Session {
  let mut cursor = ByteCursor::new(data);
  let flags = cursor.next_u8();
  let config = IndexConfig {
    breadcrumb_stride: usize::from(cursor.next_u8()).max(1),
    breadcrumb_threshold: usize::from(cursor.next_u8()),
    legacy_utf16_repair: flags & 2 == 0,
  };

  let len = cursor.next_usize(MAX_INITIAL_UNITS);
  let text = if flags & 1 == 0 {
    let bytes = cursor.next_bytes(len);
    Text::with_config(String::from_utf8_lossy(bytes), config)
  } else {
    // Raw units, lone surrogates included.
    let units: Vec<u16> = (0..len / 2).map(|_| cursor.next_u16()).collect();
    Text::from_utf16_with_config(units, config)
  };

  let op_count = cursor.next_usize(MAX_OPS);
  let ops = (0..op_count).map(|_| decode_op(&mut cursor)).collect();
  Session { text, ops }
}

fn decode_op(cursor: &mut ByteCursor<'_>) -> Op {
  match cursor.next_u8() % 8 {
    0..=4 => Op::Navigate {
      unit:     UNITS[usize::from(cursor.next_u8()) % UNITS.len()],
      position: cursor.next_position(),
      steps:    cursor.next_u16() as i16,
      limit:    cursor.next_position(),
    },
    5 => Op::Slice {
      from: cursor.next_position(),
      to:   cursor.next_position(),
    },
    6 => {
      let from = cursor.next_position();
      let to = cursor.next_position();
      let len = cursor.next_usize(MAX_INSERT_BYTES);
      let insert = String::from_utf8_lossy(cursor.next_bytes(len)).into_owned();
      Op::Replace { from, to, insert }
    },
    _ => Op::Transcode,
  }
}

struct ByteCursor<'a> {
  data: &'a [u8],
  pos:  usize,
}

impl<'a> ByteCursor<'a> {
  fn new(data: &'a [u8]) -> Self {
    Self { data, pos: 0 }
  }

  fn next_u8(&mut self) -> u8 {
    let value = self.data.get(self.pos).copied().unwrap_or(0);
    self.pos = self.pos.saturating_add(1);
    value
  }

  fn next_u16(&mut self) -> u16 {
    let lo = self.next_u8() as u16;
    let hi = self.next_u8() as u16;
    lo | (hi << 8)
  }

  fn next_usize(&mut self, max: usize) -> usize {
    if max == 0 {
      return 0;
    }
    (self.next_u16() as usize) % (max + 1)
  }

  fn next_position(&mut self) -> Position {
    let offset = usize::from(self.next_u16());
    let packed = self.next_u8();
    let tag = TAGS[usize::from(packed & 3) % TAGS.len()];
    Position::from_encoded(offset, (packed >> 2) & 3, tag)
  }

  fn next_bytes(&mut self, len: usize) -> &'a [u8] {
    let start = self.pos.min(self.data.len());
    let end = start.saturating_add(len).min(self.data.len());
    self.pos = end;
    &self.data[start..end]
  }
}
