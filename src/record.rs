//! CSV input: header lookup, row normalization, and the lazy record sequence.

use crate::error::SourceError;
use std::fs::File;
use std::path::{Component, Path, PathBuf};

const BOM: char = '\u{feff}';

/// One item to fetch, normalized from a CSV row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    pub category: String,
    pub source_url: String,
}

// A single plain path segment, so `root/<category>/<name>.png` stays under `root`
fn is_plain_segment(value: &str) -> bool {
    if value.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(value).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

impl Record {
    /// Normalize raw cell values.
    ///
    /// Returns `None` when any field ends up empty, or when the name or category
    /// is not a plain file name (`..`, absolute paths, separators).
    pub fn new(name: &str, category: &str, source_url: &str) -> Option<Self> {
        let name = name.to_lowercase();
        let category = category.to_lowercase();
        let source_url = source_url.trim().to_string();

        if name.is_empty() || category.is_empty() || source_url.is_empty() {
            return None;
        }

        if !is_plain_segment(&name) || !is_plain_segment(&category) {
            tracing::warn!(
                name = %name,
                category = %category,
                "Dropping row whose name or type is not a plain file name"
            );
            return None;
        }

        Some(Self {
            name,
            category,
            source_url,
        })
    }

    /// `root/<category>/<name>.png`
    pub fn destination(&self, root: &Path) -> PathBuf {
        root.join(&self.category).join(format!("{}.png", self.name))
    }
}

const NAME_COLUMN: &str = "Pokemon";
const CATEGORY_COLUMN: &str = "Type1";
const URL_COLUMN: &str = "Sprite";

// Column positions resolved from a file's header row
#[derive(Debug, Clone, Copy)]
struct Columns {
    name: Option<usize>,
    category: Option<usize>,
    url: Option<usize>,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Self {
        let find = |column: &str| {
            headers
                .iter()
                .enumerate()
                .find(|(i, h)| {
                    // Spreadsheet exports often lead with a BOM that would hide the first column
                    let h = if *i == 0 { h.trim_start_matches(BOM) } else { *h };
                    h == column
                })
                .map(|(i, _)| i)
        };

        Self {
            name: find(NAME_COLUMN),
            category: find(CATEGORY_COLUMN),
            url: find(URL_COLUMN),
        }
    }

    fn record(&self, row: &csv::StringRecord) -> Option<Record> {
        let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i)).unwrap_or("");
        Record::new(cell(self.name), cell(self.category), cell(self.url))
    }
}

struct OpenFile {
    path: PathBuf,
    columns: Columns,
    rows: csv::StringRecordsIntoIter<File>,
}

/// Lazy record sequence over a list of CSV files.
///
/// Files are opened one at a time, in order. A file that cannot be opened or
/// read is logged and skipped; rows missing a field are dropped silently.
pub struct Records {
    paths: std::vec::IntoIter<PathBuf>,
    current: Option<OpenFile>,
}

/// Start a fresh pass over `paths`. Each call restarts from the first file.
pub fn read_records<P: AsRef<Path>>(paths: &[P]) -> Records {
    let paths: Vec<PathBuf> = paths.iter().map(|p| p.as_ref().to_path_buf()).collect();
    Records {
        paths: paths.into_iter(),
        current: None,
    }
}

fn open_file(path: PathBuf) -> Result<OpenFile, SourceError> {
    let mut reader = match csv::ReaderBuilder::new().flexible(true).from_path(&path) {
        Ok(reader) => reader,
        Err(source) => return Err(SourceError::Open { path, source }),
    };

    let columns = match reader.headers() {
        Ok(headers) => Columns::locate(headers),
        Err(source) => return Err(SourceError::Read { path, source }),
    };

    Ok(OpenFile {
        path,
        columns,
        rows: reader.into_records(),
    })
}

impl Iterator for Records {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        loop {
            if let Some(file) = self.current.as_mut() {
                match file.rows.next() {
                    Some(Ok(row)) => {
                        if let Some(record) = file.columns.record(&row) {
                            return Some(record);
                        }
                    }
                    Some(Err(source)) => {
                        let err = SourceError::Read {
                            path: file.path.clone(),
                            source,
                        };
                        tracing::warn!(error = %err, "Abandoning rest of input file");
                        self.current = None;
                    }
                    None => self.current = None,
                }
                continue;
            }

            let path = self.paths.next()?;
            match open_file(path) {
                Ok(file) => {
                    tracing::debug!(path = %file.path.display(), "Reading input file");
                    self.current = Some(file);
                }
                Err(err) => tracing::warn!(error = %err, "Skipping input file"),
            }
        }
    }
}
