use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Result of writing a freshly fetched file into place
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persisted {
    Written(u64),
    /// Another writer got there first; its file was left untouched
    AlreadyExists,
}

/// Ensure the output root exists
pub fn ensure_root(base_path: &Path) -> io::Result<()> {
    if !base_path.exists() {
        fs::create_dir_all(base_path)?;
        tracing::info!(path = %base_path.display(), "Created output directory");
    }
    Ok(())
}

/// Write `bytes` to `target` without ever exposing a partial file or replacing an existing one.
///
/// The data goes to a hidden temporary file next to `target` first and is then
/// linked into place, so a concurrent existence check sees either nothing or
/// the complete file.
pub fn write_new_file(target: &Path, bytes: &[u8]) -> io::Result<Persisted> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut temp = tempfile::Builder::new()
        .prefix(&format!(".{}.", file_name))
        .suffix(".part")
        .tempfile_in(dir)?;
    temp.write_all(bytes)?;
    temp.flush()?;

    match temp.persist_noclobber(target) {
        Ok(_) => Ok(Persisted::Written(bytes.len() as u64)),
        // Dropping the returned handle removes the temp file
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(Persisted::AlreadyExists),
        Err(e) => Err(e.error),
    }
}

/// Number of stored images in one category folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub images: usize,
}

fn is_stored_image(path: &Path) -> bool {
    let visible = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| !n.starts_with('.'));
    visible && path.extension().is_some_and(|ext| ext == "png")
}

/// Count the images in every category folder under `root`, sorted by category
pub fn count_category_images(root: &Path) -> io::Result<Vec<CategoryCount>> {
    let category_dirs: Vec<PathBuf> = fs::read_dir(root)?
        .filter_map(|entry| {
            let entry = entry.ok()?;
            if entry.file_type().ok()?.is_dir() {
                Some(entry.path())
            } else {
                None
            }
        })
        .collect();

    let mut counts = category_dirs
        .par_iter()
        .map(|dir| -> io::Result<CategoryCount> {
            let images = fs::read_dir(dir)?
                .filter_map(|entry| entry.ok())
                .filter(|entry| is_stored_image(&entry.path()))
                .count();
            Ok(CategoryCount {
                category: dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                images,
            })
        })
        .collect::<io::Result<Vec<_>>>()?;

    counts.sort_by(|a, b| a.category.cmp(&b.category));
    Ok(counts)
}
