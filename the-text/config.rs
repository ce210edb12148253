//! Tuning knobs for position conversion.
//!
//! ```toml
//! breadcrumb-stride = 64
//! breadcrumb-threshold = 64
//! legacy-utf16-repair = true
//! ```

use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("failed to parse index config: {0}")]
pub struct ConfigError(#[from] toml::de::Error);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct IndexConfig {
  /// UTF-16 code units between two breadcrumbs.
  pub breadcrumb_stride:    usize,
  /// UTF-8 storage shorter than this many bytes is scanned linearly instead
  /// of building breadcrumbs.
  pub breadcrumb_threshold: usize,
  /// Whether UTF-16 positions used on UTF-8 storage are transcoded (slowly)
  /// or rejected as invalid.
  pub legacy_utf16_repair:  bool,
}

impl Default for IndexConfig {
  fn default() -> Self {
    Self {
      breadcrumb_stride:    64,
      breadcrumb_threshold: 64,
      legacy_utf16_repair:  true,
    }
  }
}

impl IndexConfig {
  pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
    let config: Self = toml::from_str(source)?;
    Ok(config.sanitized())
  }

  /// A stride of zero would never make progress.
  pub(crate) fn sanitized(mut self) -> Self {
    self.breadcrumb_stride = self.breadcrumb_stride.max(1);
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults_from_empty_toml() {
    assert_eq!(IndexConfig::from_toml("").unwrap(), IndexConfig::default());
  }

  #[test]
  fn test_partial_toml() {
    let config = IndexConfig::from_toml("legacy-utf16-repair = false\nbreadcrumb-stride = 0").unwrap();
    assert!(!config.legacy_utf16_repair);
    assert_eq!(config.breadcrumb_stride, 1);
    assert_eq!(config.breadcrumb_threshold, 64);
  }

  #[test]
  fn test_unknown_field_rejected() {
    let err = IndexConfig::from_toml("stride = 3").unwrap_err();
    assert!(err.to_string().starts_with("failed to parse index config"));
  }
}
