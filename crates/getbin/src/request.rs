//! Binary requests as written in a manifest, and their validated form.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use getbin_archive::ArchiveFormat;
use getbin_platform::{Arch, OsConstraint, Platform};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// One binary to obtain, exactly as the caller wrote it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinarySpec {
    pub name: String,
    pub remote_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_constraint: Option<OsConstraintSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_hints: Option<LocalHintsSpec>,
    /// Re-fingerprint a cached download before trusting it. Defaults to true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify: Option<bool>,
}

/// Platform and architecture restriction, unparsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsConstraintSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalHintsSpec {
    #[serde(default)]
    pub command_names: CommandNames,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A single command name or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandNames {
    One(String),
    Many(Vec<String>),
}

impl Default for CommandNames {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl CommandNames {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::One(name) => vec![name.clone()],
            Self::Many(names) => names.clone(),
        }
    }
}

impl BinarySpec {
    pub fn new(name: impl Into<String>, remote_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            remote_url: remote_url.into(),
            ..Self::default()
        }
    }

    /// Parse the platform restriction, if any.
    pub fn os_constraint(&self) -> Result<Option<OsConstraint>> {
        let Some(spec) = &self.os_constraint else {
            return Ok(None);
        };
        let platform = spec
            .platform
            .as_deref()
            .map(|raw| {
                raw.parse::<Platform>()
                    .map_err(|e| Error::validation(&self.name, e.to_string()))
            })
            .transpose()?;
        let arch = spec
            .arch
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(Arch::parse);
        Ok(Some(OsConstraint { platform, arch }))
    }
}

/// Local places a request may already be satisfied from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalHints {
    pub command_names: Vec<String>,
    pub dir: Option<PathBuf>,
    pub name: Option<String>,
}

impl LocalHints {
    /// An explicit `dir/name` install location was given.
    pub fn explicit_target(&self) -> bool {
        self.dir.is_some() && self.name.is_some()
    }
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryRequest {
    pub name: String,
    pub remote_url: Url,
    pub os_constraint: Option<OsConstraint>,
    pub local_hints: LocalHints,
    pub verify: bool,
    /// Where the binary is installed.
    pub target: PathBuf,
}

impl BinaryRequest {
    /// Validate `spec`, resolving its install target against `home`.
    pub fn validate(spec: &BinarySpec, home: &Path) -> Result<Self> {
        let name = spec.name.trim();
        if name.is_empty() {
            return Err(Error::validation(&spec.name, "name must not be empty"));
        }
        let fail = |reason: String| Error::validation(name, reason);

        let remote_url = Url::parse(spec.remote_url.trim())
            .map_err(|e| fail(format!("invalid remote url {:?}: {e}", spec.remote_url)))?;
        if remote_url.cannot_be_a_base() || !matches!(remote_url.scheme(), "http" | "https") {
            return Err(fail(format!(
                "remote url {remote_url} is not an http(s) url"
            )));
        }
        let os_constraint = spec.os_constraint()?;

        let hints = spec.local_hints.clone().unwrap_or_default();
        if let Some(dir) = &hints.dir {
            if !dir.is_absolute() {
                return Err(fail(format!("dir {} must be absolute", dir.display())));
            }
        }
        if let Some(file_name) = &hints.name {
            if !is_plain_file_name(file_name) {
                return Err(fail(format!("name {file_name:?} must be a plain file name")));
            }
        }

        let file_name = match &hints.name {
            Some(file_name) => file_name.clone(),
            None => default_file_name(&remote_url).map_err(|e| fail(e.to_string()))?,
        };
        let target = hints.dir.as_deref().unwrap_or(home).join(file_name);

        Ok(Self {
            name: name.to_string(),
            remote_url,
            os_constraint,
            local_hints: LocalHints {
                command_names: hints
                    .command_names
                    .to_vec()
                    .into_iter()
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect(),
                dir: hints.dir,
                name: hints.name,
            },
            verify: spec.verify.unwrap_or(true),
            target,
        })
    }
}

/// Validate a batch, rejecting every request whose name was already taken.
pub(crate) fn validate_all(specs: &[&BinarySpec], home: &Path) -> Vec<Result<BinaryRequest>> {
    let mut seen = HashSet::new();
    specs
        .iter()
        .map(|spec| {
            let request = BinaryRequest::validate(spec, home)?;
            if !seen.insert(request.name.clone()) {
                return Err(Error::validation(&request.name, "duplicate request name"));
            }
            Ok(request)
        })
        .collect()
}

/// The URL's file name with any archive suffix removed.
fn default_file_name(url: &Url) -> getbin_fetch::Result<String> {
    let file_name = getbin_fetch::file_name_from_url(url.as_str())?;
    let (stem, _) = ArchiveFormat::split_file_name(&file_name);
    Ok(if stem.is_empty() {
        file_name.clone()
    } else {
        stem.to_string()
    })
}

fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(std::path::Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn home() -> PathBuf {
        if cfg!(windows) {
            PathBuf::from(r"C:\getbin")
        } else {
            PathBuf::from("/opt/getbin")
        }
    }

    fn with_hints(mut spec: BinarySpec, hints: LocalHintsSpec) -> BinarySpec {
        spec.local_hints = Some(hints);
        spec
    }

    #[test]
    fn target_defaults_to_url_stem_under_home() {
        let spec = BinarySpec::new("ffmpeg", "https://example.test/dl/ffmpeg-6.1-linux.tar.xz");
        let request = BinaryRequest::validate(&spec, &home()).unwrap();
        assert_eq!(request.target, home().join("ffmpeg-6.1-linux"));
        assert!(request.verify);
        assert!(request.os_constraint.is_none());
    }

    #[test]
    fn explicit_dir_and_name_form_target() {
        let dir = home().join("tools");
        let spec = with_hints(
            BinarySpec::new("ffmpeg", "https://example.test/ffmpeg.zip"),
            LocalHintsSpec {
                command_names: CommandNames::One("ffmpeg".into()),
                dir: Some(dir.clone()),
                name: Some("ffmpeg-bin".into()),
            },
        );
        let request = BinaryRequest::validate(&spec, &home()).unwrap();
        assert_eq!(request.target, dir.join("ffmpeg-bin"));
        assert_eq!(request.local_hints.command_names, vec!["ffmpeg"]);
        assert!(request.local_hints.explicit_target());
    }

    #[test]
    fn rejects_relative_dir() {
        let spec = with_hints(
            BinarySpec::new("tool", "https://example.test/tool.zip"),
            LocalHintsSpec {
                dir: Some(PathBuf::from("relative/dir")),
                ..LocalHintsSpec::default()
            },
        );
        let err = BinaryRequest::validate(&spec, &home()).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(err.to_string().contains("absolute"));
    }

    #[test]
    fn rejects_nested_name() {
        let spec = with_hints(
            BinarySpec::new("tool", "https://example.test/tool.zip"),
            LocalHintsSpec {
                name: Some("../escape".into()),
                ..LocalHintsSpec::default()
            },
        );
        assert!(BinaryRequest::validate(&spec, &home()).is_err());
    }

    #[test]
    fn rejects_bad_urls() {
        for url in ["not a url", "mailto:someone@example.test", "ftp://example.test/tool.zip"] {
            let spec = BinarySpec::new("tool", url);
            assert!(BinaryRequest::validate(&spec, &home()).is_err(), "{url}");
        }
        let spec = BinarySpec::new("tool", "https://example.test/");
        assert!(BinaryRequest::validate(&spec, &home()).is_err());
    }

    #[test]
    fn rejects_empty_name() {
        let spec = BinarySpec::new("  ", "https://example.test/tool.zip");
        assert!(BinaryRequest::validate(&spec, &home()).is_err());
    }

    #[test]
    fn parses_platform_and_arch() {
        let mut spec = BinarySpec::new("tool", "https://example.test/tool.zip");
        spec.os_constraint = Some(OsConstraintSpec {
            platform: Some("Darwin".into()),
            arch: Some("aarch64".into()),
        });
        let constraint = spec.os_constraint().unwrap().unwrap();
        assert_eq!(constraint.platform, Some(Platform::Mac));
        assert_eq!(constraint.arch, Some(Arch::Arm64));

        spec.os_constraint = Some(OsConstraintSpec {
            platform: Some("beos".into()),
            arch: None,
        });
        assert!(matches!(
            spec.os_constraint(),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn duplicate_names_fail_after_first() {
        let a = BinarySpec::new("tool", "https://example.test/a.zip");
        let b = BinarySpec::new("tool", "https://example.test/b.zip");
        let results = validate_all(&[&a, &b], &home());
        assert!(results[0].is_ok());
        assert!(results[1].as_ref().unwrap_err().to_string().contains("duplicate"));
    }

    #[test]
    fn command_names_accept_string_or_list() {
        let one: LocalHintsSpec = serde_json::from_str(r#"{"commandNames":"ffmpeg"}"#).unwrap();
        assert_eq!(one.command_names.to_vec(), vec!["ffmpeg"]);
        let many: LocalHintsSpec =
            serde_json::from_str(r#"{"commandNames":["ffmpeg","ffmpeg.exe"]}"#).unwrap();
        assert_eq!(many.command_names.to_vec(), vec!["ffmpeg", "ffmpeg.exe"]);
    }
}
