//! Lexical path helpers. Nothing here touches the file system.

use std::path::{Component, Path, PathBuf};

/// Collapse `.` and `..` components without resolving symlinks.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out.iter().map(|c| c.as_os_str()).collect()
}

/// Resolve a path written inside a build file against `base_dir`.
///
/// Backslashes are treated as separators on every platform other than Windows.
pub fn resolve(base_dir: &Path, written: &str) -> PathBuf {
    let written = written.trim();
    let written = if cfg!(windows) {
        written.to_string()
    } else {
        written.replace('\\', "/")
    };
    normalize(&base_dir.join(written))
}

/// Path from the directory containing `from_file` to `to_file`, using `/`.
///
/// Both inputs should be absolute. When they share no root the normalised
/// target is returned as-is.
pub fn relative_path(from_file: &Path, to_file: &Path) -> String {
    let from_dir = normalize(from_file.parent().unwrap_or(Path::new("")));
    let to_file = normalize(to_file);

    let from: Vec<Component> = from_dir.components().collect();
    let to: Vec<Component> = to_file.components().collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    if common == 0 && from_dir.has_root() {
        return to_file.to_string_lossy().replace('\\', "/");
    }

    let mut parts: Vec<String> = Vec::new();
    for _ in common..from.len() {
        parts.push("..".to_string());
    }
    for component in &to[common..] {
        parts.push(component.as_os_str().to_string_lossy().to_string());
    }
    parts.join("/")
}

/// File name of `path` as a display string.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// File stem of `path` as a display string.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
