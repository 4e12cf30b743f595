//! Layered runtime settings.
//!
//! Built-in defaults are overridden by the `[settings]` table of a manifest,
//! which is in turn overridden by `GETBIN_*` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const ENV_PREFIX: &str = "GETBIN_";
pub const DEFAULT_INDEX_FILE: &str = "downloaded-binary.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default install root, also home of the cache index.
    pub home: PathBuf,
    /// File name of the cache index under `home`.
    pub index_file: String,
    /// Render download progress bars.
    pub progress: bool,
    pub user_agent: String,
    pub connect_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let home = getbin_platform::dir::binaries_home()
            .unwrap_or_else(|_| std::env::temp_dir().join(getbin_platform::dir::HOME_DIR_NAME));
        Self {
            home,
            index_file: DEFAULT_INDEX_FILE.to_string(),
            progress: true,
            user_agent: concat!("getbin/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout_secs: 30,
        }
    }
}

impl Settings {
    /// Settings rooted at `home` with everything else defaulted.
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            ..Self::default()
        }
    }

    /// Load settings, reading the `[settings]` table of `manifest` if given.
    ///
    /// A relative `home` is resolved against the working directory.
    pub fn load(manifest: Option<&Path>) -> Result<Self> {
        let mut settings: Self = Self::figment(manifest).extract()?;
        if settings.home.is_relative() {
            settings.home = std::path::absolute(&settings.home)?;
        }
        Ok(settings)
    }

    pub fn figment(manifest: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = manifest {
            let file = if !is_json(path) {
                Some(Figment::from(Toml::file(path)))
            } else if has_settings_table(path) {
                Some(Figment::from(Json::file(path)))
            } else {
                None
            };
            if let Some(file) = file {
                figment = figment.merge(file.focus("settings"));
            }
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn index_path(&self) -> PathBuf {
        self.home.join(&self.index_file)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

pub(crate) fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// A bare-array JSON manifest carries no settings. Unreadable or malformed
/// files are left to the provider so its error surfaces.
fn has_settings_table(path: &Path) -> bool {
    let Ok(text) = std::fs::read_to_string(path) else {
        return true;
    };
    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(root) => root.is_object(),
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn manifest_table_then_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "getbin.toml",
                r#"
                [settings]
                home = "/srv/binaries"
                progress = false

                [[binaries]]
                name = "tool"
                remoteUrl = "https://example.test/tool.zip"
                "#,
            )?;
            jail.set_env("GETBIN_INDEX_FILE", "index.json");

            let settings = Settings::figment(Some(Path::new("getbin.toml"))).extract::<Settings>()?;
            assert_eq!(settings.home, PathBuf::from("/srv/binaries"));
            assert!(!settings.progress);
            assert_eq!(settings.index_file, "index.json");
            assert_eq!(settings.index_path(), PathBuf::from("/srv/binaries/index.json"));
            assert_eq!(settings.connect_timeout_secs, 30);
            Ok(())
        });
    }

    #[test]
    fn json_manifest_without_settings_uses_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file("getbin.json", r#"{ "binaries": [] }"#)?;
            let settings = Settings::figment(Some(Path::new("getbin.json"))).extract::<Settings>()?;
            assert_eq!(settings.index_file, DEFAULT_INDEX_FILE);
            assert!(settings.progress);
            Ok(())
        });
    }

    #[test]
    fn bare_array_json_manifest_uses_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "tools.json",
                r#"[{ "name": "tool", "remoteUrl": "https://example.test/tool.zip" }]"#,
            )?;
            jail.set_env("GETBIN_HOME", "/srv/binaries");

            let settings = Settings::load(Some(Path::new("tools.json"))).map_err(|e| e.to_string())?;
            assert_eq!(settings.home, PathBuf::from("/srv/binaries"));
            assert_eq!(settings.index_file, DEFAULT_INDEX_FILE);
            assert!(settings.progress);
            Ok(())
        });
    }

    #[test]
    fn relative_home_is_made_absolute() {
        Jail::expect_with(|jail| {
            jail.set_env("GETBIN_HOME", "rel/home");

            let settings = Settings::load(None).map_err(|e| e.to_string())?;
            let expected = std::env::current_dir().unwrap().join("rel/home");
            assert!(settings.home.is_absolute());
            assert_eq!(settings.home, expected);
            assert_eq!(settings.index_path(), expected.join(DEFAULT_INDEX_FILE));
            Ok(())
        });
    }
}
