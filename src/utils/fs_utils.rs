// File system utilities

use std::fs;
use std::path::{Path, PathBuf};

use crate::utils::error::{ChainopsError, Result};

pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| ChainopsError::io_at(path, e))?;
    }
    Ok(())
}

pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| ChainopsError::io_at(path, e))
}

pub fn write_string(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| ChainopsError::io_at(path, e))
}

/// Expand a leading `~` to the home directory.
pub fn expand_user(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Absolute form of `path` without touching the file system beyond the cwd.
pub fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Files in `dir` matching `pattern` (e.g. `*.json`), sorted by name.
pub fn glob_sorted(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let escaped = glob::Pattern::escape(&dir.to_string_lossy());
    let full = format!("{escaped}/{pattern}");
    let paths = glob::glob(&full)
        .map_err(|e| ChainopsError::Config(format!("invalid glob '{full}': {e}")))?;

    let mut files: Vec<PathBuf> = paths.filter_map(std::result::Result::ok).collect();
    files.sort();
    Ok(files)
}

/// Recursively collect files below `root`.
///
/// `descend` decides per directory (root excluded) whether to walk into it.
/// Symlinks are reported as files and never followed.
pub fn walk_files<F>(root: &Path, descend: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&Path) -> bool,
{
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries: Vec<_> = fs::read_dir(&dir)
            .map_err(|e| ChainopsError::io_at(&dir, e))?
            .filter_map(std::result::Result::ok)
            .collect();
        entries.sort_by_key(fs::DirEntry::file_name);

        for entry in entries {
            let path = entry.path();
            let file_type = entry.file_type().map_err(|e| ChainopsError::io_at(&path, e))?;
            if file_type.is_dir() {
                if descend(&path) {
                    pending.push(path);
                }
            } else {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

pub fn remove_dir_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path).map_err(|e| ChainopsError::io_at(path, e))?;
    }
    Ok(())
}

/// Whether `path` is a directory without entries.
pub fn is_empty_dir(path: &Path) -> bool {
    fs::read_dir(path).map(|mut it| it.next().is_none()).unwrap_or(false)
}
