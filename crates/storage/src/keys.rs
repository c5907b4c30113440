use crate::StorageError;
use std::path::{Component, Path, PathBuf};

/// Rejects keys no backend can address.
pub fn validate_key(key: &str) -> Result<&str, StorageError> {
    if key.is_empty() {
        return Err(invalid(key, "key must not be empty"));
    }
    Ok(key)
}

/// Resolves a key (or listing prefix) to a path below `root`.
///
/// Keys are relative paths: absolute paths, drive prefixes and `..` segments
/// would escape the root and are refused.
pub(crate) fn resolve_under(root: &Path, key: &str) -> Result<PathBuf, StorageError> {
    validate_key(key)?;

    let relative = Path::new(key);
    let mut named = false;
    for component in relative.components() {
        match component {
            Component::Normal(_) => named = true,
            Component::CurDir => {}
            Component::ParentDir => return Err(invalid(key, "'..' segments are not allowed")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid(key, "absolute keys are not allowed"))
            }
        }
    }
    if !named {
        return Err(invalid(key, "key must name a path below the store root"));
    }

    Ok(root.join(relative))
}

/// Turns a path relative to the store root back into a key.
pub(crate) fn path_to_key(relative: &Path) -> String {
    relative.to_string_lossy().replace('\\', "/")
}

fn invalid(key: &str, reason: &str) -> StorageError {
    StorageError::InvalidKey(key.to_string(), reason.to_string())
}
