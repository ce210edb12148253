#![no_main]

mod common;

use libfuzzer_sys::fuzz_target;
use the_text::{
  Position,
  Result,
  Text,
  TextView,
  Unit,
};

use crate::common::{
  Op,
  session_from_bytes,
};

/// Walks `steps` in `view` and checks that the walk agrees with `distance`.
fn check_walk<V: TextView>(view: &V, position: Position, steps: i16, limit: Position) -> Result<()> {
  let from = view.align(position)?;
  assert!(from <= view.validate(position)?);

  if let Ok(to) = view.offset_by(from, isize::from(steps)) {
    assert_eq!(view.distance(from, to)?, isize::from(steps));
    assert_eq!(view.align(to)?, to);
    let slice = view.slice(from.min(to)..from.max(to))?;
    assert_eq!(slice.count(), usize::from(steps.unsigned_abs()));
  }
  if let Some(to) = view.offset_by_limited(from, isize::from(steps), limit)? {
    assert_eq!(view.distance(from, to)?, isize::from(steps));
  }
  if from < view.end() {
    let next = view.next(from)?;
    assert_eq!(view.previous(next)?, from);
    let _ = view.get(from)?;
  }
  Ok(())
}

fn navigate(text: &Text, unit: Unit, position: Position, steps: i16, limit: Position) {
  let _ = match unit {
    Unit::Character => check_walk(&text.characters(), position, steps, limit),
    Unit::Scalar => check_walk(&text.scalars(), position, steps, limit),
    Unit::Utf8 => check_walk(&text.utf8(), position, steps, limit),
    Unit::Utf16 => check_walk(&text.utf16(), position, steps, limit),
  };
}

fuzz_target!(|data: &[u8]| {
  let mut session = session_from_bytes(data);

  for op in std::mem::take(&mut session.ops) {
    let text = &mut session.text;
    match op {
      Op::Navigate {
        unit,
        position,
        steps,
        limit,
      } => navigate(text, unit, position, steps, limit),
      Op::Slice { from, to } => {
        if let Ok(slice) = text.slice(from..to) {
          let scalars = slice.count(Unit::Scalar);
          assert_eq!(slice.scalars().iter().count(), scalars);
          assert!(slice.count(Unit::Character) <= scalars);
          assert_eq!(slice.to_text().count(Unit::Utf8), slice.count(Unit::Utf8));
        }
      },
      Op::Replace { from, to, insert } => {
        let _ = text.replace_range(from..to, &insert);
      },
      Op::Transcode => {
        text.make_native_utf8();
      },
    }
  }
});
