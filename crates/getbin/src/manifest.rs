//! Manifest files listing the binaries to fetch.
//!
//! TOML is the default format; a `.json` extension selects JSON, where a
//! bare array of requests is accepted as well.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::request::BinarySpec;
use crate::settings::is_json;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub binaries: Vec<BinarySpec>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonManifest {
    Table(Manifest),
    List(Vec<BinarySpec>),
}

impl Manifest {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::Manifest {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let parsed = if is_json(path) {
            Self::from_json(&text)
        } else {
            Self::from_toml(&text)
        };
        parsed.map_err(|reason| Error::Manifest {
            path: path.to_path_buf(),
            reason,
        })
    }

    pub fn from_toml(text: &str) -> std::result::Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }

    pub fn from_json(text: &str) -> std::result::Result<Self, String> {
        match serde_json::from_str(text).map_err(|e| e.to_string())? {
            JsonManifest::Table(manifest) => Ok(manifest),
            JsonManifest::List(binaries) => Ok(Self { binaries }),
        }
    }
}
