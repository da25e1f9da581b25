//! Copy of a source checkout into a destination checkout

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, trace};
use walkdir::{DirEntry, WalkDir};

/// Name of git's metadata directory at the root of a checkout
const GIT_DIR: &str = ".git";

/// What [`copy_missing`] did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CopySummary {
    pub copied_files: usize,
    pub skipped_existing: usize,
    pub created_dirs: usize,
}

/// Copy every entry under `source` to the same relative path under
/// `destination`, skipping entries that already exist there.
///
/// Existing destination files are never overwritten; a source directory
/// whose path is taken by a destination file fails the copy. The top-level
/// `.git` directory of `source` is not copied. Symbolic links are recreated as
/// links on unix rather than followed.
pub fn copy_missing(source: &Path, destination: &Path) -> io::Result<CopySummary> {
    let mut summary = CopySummary::default();

    let walker = WalkDir::new(source)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_top_level_git_dir(entry));

    for entry in walker {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let target = destination.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            match fs::symlink_metadata(&target) {
                Ok(existing) if existing.is_dir() => {}
                Ok(_) => {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!(
                            "cannot copy directory {}: {} exists and is not a directory",
                            relative.display(),
                            target.display()
                        ),
                    ))
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    fs::create_dir_all(&target)?;
                    summary.created_dirs += 1;
                }
                Err(e) => return Err(e),
            }
            continue;
        }

        if fs::symlink_metadata(&target).is_ok() {
            trace!("Keeping existing {}", target.display());
            summary.skipped_existing += 1;
            continue;
        }

        if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
        summary.copied_files += 1;
    }

    debug!(
        "Copied {} files ({} kept, {} directories created) from {} to {}",
        summary.copied_files,
        summary.skipped_existing,
        summary.created_dirs,
        source.display(),
        destination.display()
    );
    Ok(summary)
}

fn is_top_level_git_dir(entry: &DirEntry) -> bool {
    entry.depth() == 1 && entry.file_name() == GIT_DIR
}

#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(link)?, target)
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, target: &Path) -> io::Result<()> {
    fs::copy(link, target).map(|_| ())
}
