use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown platform '{0}', expected one of: linux, windows, mac")]
    UnknownPlatform(String),

    #[error("home directory could not be determined")]
    NoHome,
}
