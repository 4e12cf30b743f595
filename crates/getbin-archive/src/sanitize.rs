use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Resolve an archive entry path under `base`.
///
/// `..` may only cancel a component the entry itself introduced; rooted,
/// prefixed and escaping entries are rejected, as is one that names `base`
/// itself.
pub fn sanitize_path(entry_path: impl AsRef<Path>, base: impl AsRef<Path>) -> Result<PathBuf> {
    let entry_path = entry_path.as_ref();
    let base = base.as_ref();
    let slip = || Error::ZipSlip {
        entry: entry_path.to_path_buf(),
        resolved: normalize_path(&base.join(entry_path)),
    };

    let mut relative = PathBuf::new();
    let mut depth = 0usize;
    for component in entry_path.components() {
        match component {
            Component::Normal(part) => {
                relative.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir if depth > 0 => {
                relative.pop();
                depth -= 1;
            }
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return Err(slip()),
        }
    }
    if depth == 0 {
        return Err(slip());
    }
    Ok(base.join(relative))
}

/// Check that a symlink at `symlink_location` pointing to `target` stays
/// within `base`. Returns the resolved target.
pub fn sanitize_symlink_target(
    target: impl AsRef<Path>,
    symlink_location: impl AsRef<Path>,
    base: impl AsRef<Path>,
) -> Result<PathBuf> {
    let target = target.as_ref();
    let symlink_location = symlink_location.as_ref();
    let base = base.as_ref();

    if target.has_root() || target.is_absolute() {
        return Err(Error::AbsoluteSymlinkTarget {
            target: target.to_path_buf(),
            symlink: symlink_location.to_path_buf(),
        });
    }

    let resolved = symlink_location
        .parent()
        .map(|p| p.join(target))
        .unwrap_or_else(|| base.join(target));
    let resolved = normalize_path(&resolved);

    if !resolved.starts_with(base) {
        return Err(Error::SymlinkEscape {
            target: target.to_path_buf(),
            resolved,
        });
    }

    Ok(resolved)
}

/// Resolve `.` and `..` lexically. `..` at the root stays at the root.
fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::Normal(part) => result.push(part),
            Component::RootDir => result.push(component.as_os_str()),
            Component::Prefix(prefix) => result.push(prefix.as_os_str()),
            Component::CurDir => {}
        }
    }

    result
}
