//! Lexical path helpers.

use std::path::{Component, Path, PathBuf};

/// Makes `path` absolute against `base` and removes `.` and `..` components.
///
/// The filesystem is not consulted, so symlinks are kept as written. Tool
/// output echoes the path it was given, which makes a lexical comparison
/// the right one.
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
