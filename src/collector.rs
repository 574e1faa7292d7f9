use std::fs;
use std::path::{Path, PathBuf};

use globset::GlobSet;
use walkdir::{DirEntry, WalkDir};

use crate::config::Config;
use crate::error::AppError;

const MANIFEST_EXTENSIONS: &[&str] = &["yaml", "yml"];
const SKIPPED_DIR: &str = ".git";

/// Finds manifest files below a root directory.
pub struct ManifestCollector {
    exclude: Option<GlobSet>,
}

impl ManifestCollector {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let exclude = config.compile_excludes()?;
        Ok(Self { exclude })
    }

    /// Returns every `.yaml`/`.yml` file under `root` in file-name order.
    ///
    /// `.git` directories and excluded paths are pruned. Any walk error aborts
    /// the collection.
    pub fn collect(&self, root: &Path) -> Result<Vec<PathBuf>, AppError> {
        let root = if root.is_absolute() {
            root.to_path_buf()
        } else {
            std::env::current_dir()?.join(root)
        };

        let mut files = Vec::new();
        let walker = WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_pruned(entry));

        for entry in walker {
            let entry = entry?;
            if !is_file_or_file_link(&entry) {
                continue;
            }
            if has_manifest_extension(entry.path()) {
                log::trace!("Found manifest {}", entry.path().display());
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }

    fn is_pruned(&self, entry: &DirEntry) -> bool {
        if entry.file_type().is_dir() && entry.file_name() == SKIPPED_DIR {
            return true;
        }
        // Entry paths are absolute because `collect` walks an absolute root.
        if self.exclude.as_ref().is_some_and(|set| set.is_match(entry.path())) {
            log::debug!("Excluding {}", entry.path().display());
            return true;
        }
        false
    }
}

/// Symlinks are followed only far enough to see whether they point at a file.
fn is_file_or_file_link(entry: &DirEntry) -> bool {
    if entry.file_type().is_file() {
        return true;
    }
    entry.path_is_symlink() && fs::metadata(entry.path()).is_ok_and(|meta| meta.is_file())
}

fn has_manifest_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| MANIFEST_EXTENSIONS.contains(&ext))
}
