use std::path::PathBuf;

use crate::{Error, Result};

/// Name of the directory under the user's home that holds downloads.
pub const HOME_DIR_NAME: &str = ".getbin";

pub fn user_home() -> Option<PathBuf> {
    home::home_dir()
}

/// Default root for downloaded binaries and the cache index.
pub fn binaries_home() -> Result<PathBuf> {
    user_home()
        .map(|home| home.join(HOME_DIR_NAME))
        .ok_or(Error::NoHome)
}
