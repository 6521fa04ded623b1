//! Zip archives of saved model directories.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{OpsError, OpsResult};

/// Every file and directory below `dir`, sorted by path.
pub fn collect_files(dir: &Path) -> OpsResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(OpsError::ModelDirNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| OpsError::Io(io::Error::other(e.to_string())))?;
        files.push(entry.into_path());
    }
    debug!(dir = %dir.display(), count = files.len(), "Collected model files");
    Ok(files)
}

/// Write `files` into a deflated zip at `target`, naming entries relative
/// to `base`. Returns the number of entries written.
pub fn zip_files(target: &Path, files: &[PathBuf], base: &Path) -> OpsResult<usize> {
    let file = File::create(target)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in files {
        let name = entry_name(path, base)?;
        if path.is_dir() {
            zip.add_directory(name, options)?;
        } else {
            zip.start_file(name, options)?;
            let mut source = File::open(path)?;
            io::copy(&mut source, &mut zip)?;
        }
    }
    zip.finish()?;

    info!(target = %target.display(), entries = files.len(), "Archive written");
    Ok(files.len())
}

/// Archive `<user_dir>/Model` into `<user_dir>/Model.zip`.
pub fn archive_model_dir(
    user_dir: &Path,
    model_dir_name: &str,
    archive_name: &str,
) -> OpsResult<(PathBuf, usize)> {
    let files = collect_files(&user_dir.join(model_dir_name))?;
    let target = user_dir.join(archive_name);
    let count = zip_files(&target, &files, user_dir)?;
    Ok((target, count))
}

/// Forward-slash entry name relative to `base`.
fn entry_name(path: &Path, base: &Path) -> OpsResult<String> {
    let relative = path.strip_prefix(base).map_err(|_| {
        OpsError::with_context(
            "Archive entry outside base",
            format!("{} is not under {}", path.display(), base.display()),
        )
    })?;
    Ok(relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}
