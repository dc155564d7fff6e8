//! Newline-delimited JSON files.
//!
//! Each record is one line. Appends write a whole line with a single
//! `write_all` on a file opened in append mode, serialized by an in-process
//! mutex, and are synced before returning. Reads treat a missing file as
//! empty and skip lines that do not parse.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use helpdesk_core::error::{HelpdeskError, Result};

/// An append-only JSONL file.
#[derive(Debug)]
pub struct JsonlFile {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single line and flush it to disk.
    pub fn append<T: Serialize>(&self, record: &T) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| HelpdeskError::Storage(format!("Write lock poisoned: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.sync_data()?;
        Ok(())
    }

    /// Every parsable record, in file order.
    pub fn read_all<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let mut out = Vec::new();
        self.scan(|record: T| {
            out.push(record);
            false
        })?;
        Ok(out)
    }

    /// The first parsable record matching `pred`.
    pub fn find<T, P>(&self, pred: P) -> Result<Option<T>>
    where
        T: DeserializeOwned,
        P: Fn(&T) -> bool,
    {
        let mut found = None;
        self.scan(|record: T| {
            if pred(&record) {
                found = Some(record);
                true
            } else {
                false
            }
        })?;
        Ok(found)
    }

    /// Feed parsed records to `visit` until it returns `true`.
    fn scan<T, F>(&self, mut visit: F) -> Result<()>
    where
        T: DeserializeOwned,
        F: FnMut(T) -> bool,
    {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let mut reader = BufReader::new(file);
        let mut buf = Vec::new();
        let mut line_no = 0usize;
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            line_no += 1;

            let trimmed = buf.trim_ascii();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_slice::<T>(trimmed) {
                Ok(record) => {
                    if visit(record) {
                        break;
                    }
                }
                Err(e) => {
                    debug!(
                        path = %self.path.display(),
                        line = line_no,
                        error = %e,
                        "Skipping malformed record"
                    );
                }
            }
        }
        Ok(())
    }
}
