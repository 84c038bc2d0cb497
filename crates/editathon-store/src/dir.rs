//! Directory-backed page store: one `.wiki` file per title.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::{PageStore, StoreError};

const PAGE_EXTENSION: &str = "wiki";
const EDIT_LOG: &str = "edits.log";

/// Pages stored as files under a root directory.
///
/// Titles map to file names with `%` and `/` percent-encoded, so
/// `A/B` is stored as `A%2FB.wiki`. Every write replaces the file atomically
/// and appends `timestamp<TAB>title<TAB>summary` to `edits.log`.
#[derive(Debug, Clone)]
pub struct DirPageStore {
    root: PathBuf,
}

impl DirPageStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn page_path(&self, title: &str) -> PathBuf {
        self.root
            .join(format!("{}.{PAGE_EXTENSION}", encode_title(title)))
    }

    fn log_edit(&self, title: &str, summary: &str) -> Result<(), StoreError> {
        let mut log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.root.join(EDIT_LOG))?;
        let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        writeln!(log, "{stamp}\t{}\t{}", single_line(title), single_line(summary))?;
        Ok(())
    }
}

impl PageStore for DirPageStore {
    fn read(&self, title: &str) -> Result<String, StoreError> {
        let path = self.page_path(title);
        match fs::read_to_string(&path) {
            Ok(text) => {
                debug!(title, bytes = text.len(), "read page");
                Ok(text)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::PageNotFound(title.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, title: &str, text: &str, summary: &str) -> Result<(), StoreError> {
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(text.as_bytes())?;
        tmp.persist(self.page_path(title))?;
        self.log_edit(title, summary)?;
        info!(title, summary, bytes = text.len(), "saved page");
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut titles = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(PAGE_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let title = decode_title(stem);
            if title.starts_with(prefix) {
                titles.push(title);
            }
        }
        titles.sort();
        Ok(titles)
    }
}

fn encode_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.chars() {
        match c {
            '%' => out.push_str("%25"),
            '/' => out.push_str("%2F"),
            _ => out.push(c),
        }
    }
    out
}

fn decode_title(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut rest = name;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let escape = &rest[pos..];
        if escape.starts_with("%25") {
            out.push('%');
            rest = &escape[3..];
        } else if escape.starts_with("%2F") || escape.starts_with("%2f") {
            out.push('/');
            rest = &escape[3..];
        } else {
            out.push('%');
            rest = &escape[1..];
        }
    }
    out.push_str(rest);
    out
}

fn single_line(s: &str) -> String {
    s.replace(['\t', '\n', '\r'], " ")
}
