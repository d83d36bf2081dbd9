use relative_path::RelativePathBuf;
use std::path::{Path, PathBuf};

/// Find absolute path to executable
///
/// First looks for executable in local directory (`in_dir`).
/// Otherwise, looks for executable in PATH.
pub fn find_executable_path<P>(binary_name: &str, in_dir: P) -> Result<PathBuf, which::Error>
where
    P: AsRef<Path>,
{
    let paths = in_dir.as_ref().as_os_str();

    let mut local_executables = which::which_in_global(binary_name, Some(paths))?;
    if let Some(path) = local_executables.next() {
        return Ok(path);
    }

    which::which(binary_name)
}

/// Show `path` relative to `base` when possible
pub fn display_relative<P, B>(path: P, base: B) -> String
where
    P: AsRef<Path>,
    B: AsRef<Path>,
{
    let path = path.as_ref();

    pathdiff::diff_paths(path, base)
        .and_then(|diff| RelativePathBuf::from_path(diff).ok())
        .map(|relative| {
            if relative.as_str().is_empty() {
                String::from(".")
            } else {
                relative.to_string()
            }
        })
        .unwrap_or_else(|| path.display().to_string())
}
