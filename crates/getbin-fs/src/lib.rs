//! Filesystem primitives used when installing downloaded binaries.
//!
//! Writes go through a temporary sibling and a rename, directory swaps go
//! through [`replace_dir`], and extraction happens inside a [`Workspace`]
//! that is removed again unless committed.

mod error;
pub mod primitives;
mod workspace;

pub use error::{Error, Result};
pub use primitives::{
    AtomicWriteOptions, ReplaceDirOptions, atomic_write, empty_dir, hoist_single_dir, replace_dir,
};
pub use workspace::Workspace;
