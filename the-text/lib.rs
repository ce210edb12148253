//! Unicode text stored as UTF-8 or UTF-16 and navigated through one position
//! type in four units: grapheme clusters, scalars, UTF-8 and UTF-16 code
//! units.
//!
//! ```
//! use the_text::{Text, TextView, Unit};
//!
//! let text = Text::from("a😇");
//! let emoji = text.position_at(Unit::Character, 1);
//! assert_eq!(text.offset_of(emoji, Unit::Utf16).unwrap(), 1);
//! assert_eq!(text.utf16().count(), 3);
//! assert_eq!(text.characters().get(emoji).unwrap(), "😇");
//! ```

mod breadcrumbs;
pub mod config;
pub mod encoding;
pub mod error;
pub mod position;
mod slice;
mod span;
mod storage;
mod text;
pub mod view;

pub use self::{
  config::{
    ConfigError,
    IndexConfig,
  },
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
    EncodingTag,
    Position,
  },
  slice::TextSlice,
  text::Text,
  view::{
    Character,
    Characters,
    Scalars,
    TextView,
    Utf8View,
    Utf16View,
    ViewIter,
  },
};
