use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Name given to freshly created entries
pub const UNTITLED: &str = "Untitled";

/// Extension of freshly created files
pub const NEW_FILE_EXTENSION: &str = "md";

/// Strip the last extension from a path: `notes/a.md` -> `notes/a`.
/// Dotfiles keep their name: `.env` stays `.env`.
pub fn remove_extension(path: &Path) -> PathBuf {
    match path.file_stem() {
        Some(stem) if path.extension().is_some() => path.with_file_name(stem),
        _ => path.to_path_buf(),
    }
}

/// Join `base` and an optional extension: (`a`, `md`) -> `a.md`.
fn with_extension(base: &str, extension: Option<&str>) -> PathBuf {
    match extension {
        Some(ext) if !ext.is_empty() => PathBuf::from(format!("{}.{}", base, ext)),
        _ => PathBuf::from(base),
    }
}

/// First path from `base` plus `extension` that `taken` rejects, trying
/// `base.ext`, then `base 1.ext`, `base 2.ext`, ...
pub fn available_path_with<F>(base: &Path, extension: Option<&str>, taken: F) -> PathBuf
where
    F: Fn(&Path) -> bool,
{
    let base = base.to_string_lossy();
    let first = with_extension(&base, extension);
    if !taken(&first) {
        return first;
    }
    let mut n: u64 = 1;
    loop {
        let candidate = with_extension(&format!("{} {}", base, n), extension);
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// [`available_path_with`] against the filesystem under `root`.
/// `base` is relative to `root`; the returned path is too.
pub fn available_path(root: &Path, base: &Path, extension: Option<&str>) -> PathBuf {
    available_path_with(base, extension, |candidate| {
        fs::symlink_metadata(root.join(candidate)).is_ok()
    })
}

/// Create an empty `Untitled.md` in `folder` (relative to `root`).
/// Returns the relative path of the new file.
pub fn create_untitled_file(root: &Path, folder: &Path) -> io::Result<PathBuf> {
    let path = available_path(root, &folder.join(UNTITLED), Some(NEW_FILE_EXTENSION));
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(root.join(&path))?;
    Ok(path)
}

/// Create an empty `Untitled` folder in `folder` (relative to `root`).
pub fn create_untitled_folder(root: &Path, folder: &Path) -> io::Result<PathBuf> {
    let path = available_path(root, &folder.join(UNTITLED), None);
    create_directory(&root.join(&path))?;
    Ok(path)
}

/// Copy a file or directory
pub fn copy_file(src: &Path, dest: &Path) -> io::Result<()> {
    // Check if source and destination are the same
    let resolved_src = src.canonicalize()?;
    if dest.exists() {
        let resolved_dest = dest.canonicalize()?;
        if resolved_src == resolved_dest {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Source and destination are the same file",
            ));
        }
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "Target already exists",
        ));
    }

    // Device files, sockets and pipes cannot be copied
    #[cfg(unix)]
    {
        use std::os::unix::fs::FileTypeExt;
        let file_type = fs::metadata(src)?.file_type();
        if file_type.is_block_device()
            || file_type.is_char_device()
            || file_type.is_fifo()
            || file_type.is_socket()
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Cannot copy special file (device, socket, or pipe)",
            ));
        }
    }

    if src.is_dir() {
        // A folder cloned into itself would recurse forever
        if dest.starts_with(src) || dest.starts_with(&resolved_src) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Cannot copy a folder into itself",
            ));
        }
        copy_dir_recursive(src, dest)
    } else {
        fs::copy(src, dest)?;
        Ok(())
    }
}

/// Maximum recursion depth for directory copy
const MAX_COPY_DEPTH: usize = 256;

/// Copy directory recursively with symlink loop detection
pub fn copy_dir_recursive(src: &Path, dest: &Path) -> io::Result<()> {
    let mut visited = HashSet::new();
    copy_dir_recursive_inner(src, dest, &mut visited, 0)
}

fn copy_dir_recursive_inner(
    src: &Path,
    dest: &Path,
    visited: &mut HashSet<PathBuf>,
    depth: usize,
) -> io::Result<()> {
    if depth > MAX_COPY_DEPTH {
        return Err(io::Error::other(
            format!("Maximum directory depth ({}) exceeded - possible circular symlink", MAX_COPY_DEPTH),
        ));
    }

    let canonical_src = src.canonicalize().unwrap_or_else(|_| src.to_path_buf());
    if !visited.insert(canonical_src) {
        return Err(io::Error::other(
            format!("Circular symlink detected: {}", src.display()),
        ));
    }

    fs::create_dir_all(dest)?;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dest_path = dest.join(entry.file_name());

        // Get metadata without following symlinks
        let metadata = fs::symlink_metadata(&src_path)?;

        if metadata.is_symlink() {
            #[cfg(unix)]
            {
                let link_target = fs::read_link(&src_path)?;
                std::os::unix::fs::symlink(&link_target, &dest_path)?;
            }
            #[cfg(not(unix))]
            {
                if src_path.is_file() {
                    fs::copy(&src_path, &dest_path)?;
                }
            }
        } else if metadata.is_dir() {
            copy_dir_recursive_inner(&src_path, &dest_path, visited, depth + 1)?;
        } else {
            fs::copy(&src_path, &dest_path)?;
        }
    }

    Ok(())
}

/// Delete a file or directory
pub fn delete_file(path: &Path) -> io::Result<()> {
    // Use symlink_metadata so a symlink is removed, not its target
    let metadata = fs::symlink_metadata(path)?;

    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Create a new directory
pub fn create_directory(path: &Path) -> io::Result<()> {
    if path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "Directory already exists",
        ));
    }

    fs::create_dir_all(path)
}

/// Rename a file or directory
pub fn rename_file(old_path: &Path, new_path: &Path) -> io::Result<()> {
    if new_path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "Target already exists",
        ));
    }

    fs::rename(old_path, new_path)
}

/// Maximum filename length (POSIX limit)
const MAX_FILENAME_LENGTH: usize = 255;

/// Validate a name typed into the rename field
pub fn is_valid_filename(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Filename cannot be empty");
    }
    if name.contains('/') || name.contains('\\') {
        return Err("Filename cannot contain path separators");
    }
    if name == "." || name == ".." {
        return Err("Invalid filename");
    }
    if name.len() > MAX_FILENAME_LENGTH {
        return Err("Filename too long (max 255 characters)");
    }
    if name.chars().any(|c| c.is_control()) {
        return Err("Filename cannot contain control characters");
    }
    if name != name.trim() {
        return Err("Filename cannot start or end with whitespace");
    }
    Ok(())
}
