//! JsonlStore - one JSON-lines file per group
//!
//! `<dir>/<group>.jsonl`: line 1 is the header as a JSON array of strings,
//! every following line is one data row in the same form. Rows written before
//! the header widened are shorter than the header; cells are positional.
//!
//! There is no row index: every `read_rows` call reopens the file and skips
//! lines up to `start`, so a range read costs O(end) lines. Callers should
//! read in large sequential ranges rather than one row at a time.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use contracts::{ContractError, DestinationStore, GroupName};
use tempfile::NamedTempFile;
use tracing::{debug, instrument, warn};

use crate::error::DestinationError;

const EXTENSION: &str = "jsonl";

/// Destination backed by a directory of `.jsonl` files
#[derive(Debug)]
pub struct JsonlStore {
    name: String,
    dir: PathBuf,
}

impl JsonlStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            name: name.into(),
            dir,
        })
    }

    /// Root directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn group_path(&self, group: &str) -> Result<PathBuf, DestinationError> {
        if !GroupName::is_valid(group) {
            return Err(DestinationError::InvalidGroup(group.to_string()));
        }
        Ok(self.dir.join(format!("{group}.{EXTENSION}")))
    }

    /// Open a group file for reading, `None` when the group does not exist
    fn open_group(&self, group: &str) -> Result<Option<BufReader<File>>, DestinationError> {
        let path = self.group_path(group)?;
        match File::open(&path) {
            Ok(file) => Ok(Some(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn read_header(&self, group: &str) -> Result<Option<Vec<String>>, DestinationError> {
        let Some(reader) = self.open_group(group)? else {
            return Ok(None);
        };
        let Some(line) = reader.lines().next().transpose()? else {
            return Ok(None);
        };
        serde_json::from_str(&line)
            .map(Some)
            .map_err(|source| DestinationError::CorruptHeader {
                group: group.to_string(),
                source,
            })
    }

    fn count_rows(&self, group: &str) -> Result<usize, DestinationError> {
        let Some(reader) = self.open_group(group)? else {
            return Ok(0);
        };
        let mut count = 0;
        for line in reader.lines().skip(1) {
            if !line?.is_empty() {
                count += 1;
            }
        }
        Ok(count)
    }

    fn read_range(
        &self,
        group: &str,
        start: usize,
        end: usize,
    ) -> Result<Vec<Vec<String>>, DestinationError> {
        let Some(reader) = self.open_group(group)? else {
            return Ok(Vec::new());
        };
        if start >= end {
            return Ok(Vec::new());
        }

        let mut rows = Vec::with_capacity(end - start);
        let data_lines = reader
            .lines()
            .skip(1)
            .filter(|line| line.as_ref().map_or(true, |l| !l.is_empty()));
        for (idx, line) in data_lines.enumerate().skip(start).take(end - start) {
            let line = line?;
            // A damaged line still occupies its row position; it simply has
            // no readable cells.
            let row = serde_json::from_str(&line).unwrap_or_else(|e| {
                warn!(group, row = idx, error = %e, "unreadable row");
                Vec::new()
            });
            rows.push(row);
        }
        Ok(rows)
    }

    fn replace_header(&self, group: &str, columns: &[String]) -> Result<(), DestinationError> {
        let path = self.group_path(group)?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, columns)?;
            writer.write_all(b"\n")?;

            if let Some(reader) = self.open_group(group)? {
                for line in reader.lines().skip(1) {
                    let line = line?;
                    writer.write_all(line.as_bytes())?;
                    writer.write_all(b"\n")?;
                }
            }
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        debug!(group, path = %path.display(), columns = columns.len(), "header written");
        Ok(())
    }

    fn append_lines(&self, group: &str, rows: &[Vec<String>]) -> Result<(), DestinationError> {
        let path = self.group_path(group)?;
        if !path.exists() {
            return Err(DestinationError::MissingHeader(group.to_string()));
        }

        let file = OpenOptions::new().append(true).open(&path)?;
        let mut writer = BufWriter::new(file);
        for row in rows {
            serde_json::to_writer(&mut writer, row)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }

    fn group_names(&self) -> Result<Vec<String>, DestinationError> {
        let mut groups = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if GroupName::is_valid(stem) {
                    groups.push(stem.to_string());
                }
            }
        }
        groups.sort();
        Ok(groups)
    }
}

impl DestinationStore for JsonlStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_groups(&self) -> Result<Vec<String>, ContractError> {
        self.group_names().map_err(|e| e.into_read("*"))
    }

    async fn header(&self, group: &str) -> Result<Option<Vec<String>>, ContractError> {
        self.read_header(group).map_err(|e| e.into_read(group))
    }

    async fn row_count(&self, group: &str) -> Result<usize, ContractError> {
        self.count_rows(group).map_err(|e| e.into_read(group))
    }

    async fn read_rows(
        &self,
        group: &str,
        start: usize,
        end: usize,
    ) -> Result<Vec<Vec<String>>, ContractError> {
        self.read_range(group, start, end)
            .map_err(|e| e.into_read(group))
    }

    #[instrument(
        name = "jsonl_store_write_header",
        skip(self, columns),
        fields(store = %self.name, columns = columns.len())
    )]
    async fn write_header(&mut self, group: &str, columns: &[String]) -> Result<(), ContractError> {
        self.replace_header(group, columns)
            .map_err(|e| e.into_write(group))
    }

    #[instrument(
        name = "jsonl_store_append",
        skip(self, rows),
        fields(store = %self.name, rows = rows.len())
    )]
    async fn append_rows(&mut self, group: &str, rows: &[Vec<String>]) -> Result<(), ContractError> {
        if rows.is_empty() {
            return Ok(());
        }
        self.append_lines(group, rows)
            .map_err(|e| e.into_write(group))
    }
}
