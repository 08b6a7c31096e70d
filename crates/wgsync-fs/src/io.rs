//! Atomic I/O operations
//!
//! Every write goes to a temporary file in the destination directory and is
//! renamed into place, so readers only ever see the old or the new content.

use std::fs::{self, DirBuilder};
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::{Error, NormalizedPath, Result};

/// Suffix counter for staging directories created by this process.
static STAGING_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Permission class of a written file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// Owner read/write only. Used for anything holding a private key.
    Private,
    /// Owner read/write, group read.
    Shared,
}

impl FileMode {
    pub fn bits(self) -> u32 {
        match self {
            Self::Private => 0o600,
            Self::Shared => 0o640,
        }
    }
}

/// Directory permission bits for interface folders.
const DIR_MODE: u32 = 0o750;

/// One file of a directory written by [`replace_dir`].
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub name: String,
    pub content: String,
    pub mode: FileMode,
}

/// Write content atomically to a file.
///
/// Creates the parent directory when missing, writes to a temporary file in
/// the same directory (same filesystem), fsyncs it, applies `mode` and renames
/// it over the destination.
pub fn write_atomic(path: &NormalizedPath, content: &[u8], mode: FileMode) -> Result<()> {
    let native_path = path.to_native();
    let parent = match path.parent() {
        Some(parent) => parent,
        None => NormalizedPath::new("."),
    };
    create_dir(&parent)?;

    let mut temp = NamedTempFile::new_in(parent.to_native())
        .map_err(|e| Error::io(parent.to_native(), e))?;

    temp.write_all(content)
        .map_err(|e| Error::io(temp.path(), e))?;
    set_mode(temp.path(), mode.bits())?;
    temp.as_file()
        .sync_all()
        .map_err(|e| Error::io(temp.path(), e))?;

    temp.persist(&native_path)
        .map_err(|e| Error::io(&native_path, e.error))?;

    debug!(path = %path, bytes = content.len(), "wrote file atomically");
    Ok(())
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Read text content, mapping a missing file to `None`.
pub fn read_text_opt(path: &NormalizedPath) -> Result<Option<String>> {
    match read_text(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Create a directory (and parents) with interface folder permissions.
pub fn create_dir(path: &NormalizedPath) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }
    builder
        .create(path.to_native())
        .map_err(|e| Error::io(path.to_native(), e))
}

/// List files in `dir` with the given extension, sorted by file name.
pub fn list_files(dir: &NormalizedPath, extension: &str) -> Result<Vec<NormalizedPath>> {
    let mut files = Vec::new();
    for entry in read_dir(dir)? {
        let path = NormalizedPath::new(entry.path());
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if is_file && path.extension() == Some(extension) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// List visible sub-directories of `dir`, sorted by name.
pub fn list_dirs(dir: &NormalizedPath) -> Result<Vec<String>> {
    let mut dirs = Vec::new();
    for entry in read_dir(dir)? {
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        let name = entry.file_name().to_string_lossy().to_string();
        if is_dir && !name.starts_with('.') {
            dirs.push(name);
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn read_dir(dir: &NormalizedPath) -> Result<Vec<fs::DirEntry>> {
    let native = dir.to_native();
    let entries = fs::read_dir(&native).map_err(|e| Error::io(&native, e))?;
    entries
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| Error::io(&native, e))
}

pub fn remove_file(path: &NormalizedPath) -> Result<()> {
    let native = path.to_native();
    fs::remove_file(&native).map_err(|e| Error::io(&native, e))
}

pub fn remove_dir_all(path: &NormalizedPath) -> Result<()> {
    let native = path.to_native();
    fs::remove_dir_all(&native).map_err(|e| Error::io(&native, e))
}

/// Replace the `.<managed_extension>` files of the directory at `target`
/// with exactly `files`.
///
/// The new contents are staged in a hidden sibling directory and swapped in
/// with two renames. Entries of the previous directory that are not managed
/// files (other extensions, sub-directories) are moved into the staging
/// directory first, so they survive the swap. If the swap fails the previous
/// directory is restored, carried entries included.
pub fn replace_dir(target: &NormalizedPath, files: &[StagedFile], managed_extension: &str) -> Result<()> {
    let name = target.file_name().unwrap_or("folder").to_string();
    let suffix = format!(
        "{}-{}",
        std::process::id(),
        STAGING_COUNTER.fetch_add(1, Ordering::Relaxed)
    );
    let staging = target.sibling(&format!(".{}.staging-{}", name, suffix));
    let backup = target.sibling(&format!(".{}.old-{}", name, suffix));

    if let Err(e) = populate(&staging, files) {
        let _ = fs::remove_dir_all(staging.to_native());
        return Err(e);
    }

    let had_previous = target.exists();
    let carried = if had_previous {
        match carry_unmanaged(target, &staging, files, managed_extension) {
            Ok(carried) => carried,
            Err((carried, e)) => {
                move_entries(&staging, target, &carried);
                let _ = fs::remove_dir_all(staging.to_native());
                return Err(e);
            }
        }
    } else {
        Vec::new()
    };

    if had_previous && let Err(e) = fs::rename(target.to_native(), backup.to_native()) {
        move_entries(&staging, target, &carried);
        let _ = fs::remove_dir_all(staging.to_native());
        return Err(Error::io(target.to_native(), e));
    }

    if let Err(e) = fs::rename(staging.to_native(), target.to_native()) {
        if had_previous {
            let _ = fs::rename(backup.to_native(), target.to_native());
            move_entries(&staging, target, &carried);
        }
        let _ = fs::remove_dir_all(staging.to_native());
        return Err(Error::io(target.to_native(), e));
    }

    if had_previous {
        discard_backup(&backup);
    }

    debug!(path = %target, files = files.len(), carried = carried.len(), "replaced directory");
    Ok(())
}

/// Move every entry of `target` that `files` does not manage into `staging`.
///
/// On failure, returns the names already moved alongside the error.
fn carry_unmanaged(
    target: &NormalizedPath,
    staging: &NormalizedPath,
    files: &[StagedFile],
    managed_extension: &str,
) -> std::result::Result<Vec<String>, (Vec<String>, Error)> {
    let entries = read_dir(target).map_err(|e| (Vec::new(), e))?;
    let mut carried = Vec::new();
    for entry in entries {
        let name = entry.file_name().to_string_lossy().to_string();
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        let managed = is_file && NormalizedPath::new(&name).extension() == Some(managed_extension);
        if managed || files.iter().any(|f| f.name == name) {
            continue;
        }
        let from = target.join(&name).to_native();
        if let Err(e) = fs::rename(&from, staging.join(&name).to_native()) {
            return Err((carried, Error::io(from, e)));
        }
        carried.push(name);
    }
    Ok(carried)
}

/// Best-effort move of `names` from `from` back into `to`.
fn move_entries(from: &NormalizedPath, to: &NormalizedPath, names: &[String]) {
    for name in names {
        let _ = fs::rename(from.join(name).to_native(), to.join(name).to_native());
    }
}

/// Remove the previous directory once the new one is in place.
///
/// The swap has already succeeded, so a leftover backup is only logged.
fn discard_backup(backup: &NormalizedPath) {
    if let Err(e) = remove_dir_all(backup) {
        warn!(path = %backup, error = %e, "could not remove previous directory after swap");
    }
}

fn populate(staging: &NormalizedPath, files: &[StagedFile]) -> Result<()> {
    create_dir(staging)?;
    for file in files {
        write_atomic(&staging.join(&file.name), file.content.as_bytes(), file.mode)?;
    }
    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &std::path::Path, bits: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(bits)).map_err(|e| Error::io(path, e))
}

#[cfg(not(unix))]
fn set_mode(_path: &std::path::Path, _bits: u32) -> Result<()> {
    Ok(())
}
