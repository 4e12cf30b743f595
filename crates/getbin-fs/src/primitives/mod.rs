pub mod atomic_write;
pub mod dir;
pub mod replace_dir;

pub use atomic_write::{AtomicWriteOptions, atomic_write};
pub use dir::{empty_dir, hoist_single_dir};
pub use replace_dir::{ReplaceDirOptions, replace_dir};
