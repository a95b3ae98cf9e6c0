//! Settings for an exploration session, normally read from a JSON file.
//!
//! ```rust
//! # use statetrie::{Backend, Settings};
//! let settings = Settings::from_json(r#"{
//!     "model_path": "models/sir.json",
//!     "max_states": 1000,
//!     "ordering": ["infected"],
//!     "free_prefix": 1,
//!     "backend": "hash"
//! }"#).unwrap();
//! assert_eq!(settings.backend, Backend::Hash);
//! assert_eq!(settings.layout().unwrap().width(), 32);
//! ```

use crate::{
    Backend, ConfigError, EncodingError, SliceLayout, TransitionFilter, DEFAULT_RESERVED_BITS,
    DEFAULT_SLICE_WIDTH,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Model handed to the [`ModelSource`](crate::ModelSource).
    pub model_path: PathBuf,
    /// Optional property file handed to the [`ModelSource`](crate::ModelSource).
    #[serde(default)]
    pub property_path: Option<PathBuf>,
    /// Target state count. Unbounded when absent.
    #[serde(default)]
    pub max_states: Option<usize>,
    /// Field names to place first in the logical slice order.
    #[serde(default)]
    pub ordering: Vec<String>,
    /// Enables the transition filter with this many free leading slices.
    #[serde(default)]
    pub free_prefix: Option<usize>,
    #[serde(default = "default_slice_width")]
    pub slice_width: u8,
    #[serde(default = "default_reserved_bits")]
    pub reserved_bits: u8,
    #[serde(default)]
    pub backend: Backend,
}

fn default_slice_width() -> u8 {
    DEFAULT_SLICE_WIDTH
}

fn default_reserved_bits() -> u8 {
    DEFAULT_RESERVED_BITS
}

impl Settings {
    /// Settings for `model_path` with every other field at its default.
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Settings {
            model_path: model_path.into(),
            property_path: None,
            max_states: None,
            ordering: Vec::new(),
            free_prefix: None,
            slice_width: DEFAULT_SLICE_WIDTH,
            reserved_bits: DEFAULT_RESERVED_BITS,
            backend: Backend::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.layout()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        log::debug!("Loaded settings. path={}", path.display());
        Self::from_json(&json)
    }

    pub fn layout(&self) -> Result<SliceLayout, EncodingError> {
        SliceLayout::new(self.slice_width, self.reserved_bits)
    }

    pub fn filter(&self) -> Option<TransitionFilter> {
        self.free_prefix.map(TransitionFilter::new)
    }
}
