//! # Session Logger
//!
//! Records report rows to session files in CSV or JSON Lines format.
//!
//! Files are named `telemetry_<UTC yyyymmdd_HHMMSS>_<seq>.<ext>`. A new file is
//! started after `max_records_per_file` rows and only the newest
//! `max_files_to_keep` session files are retained.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, warn};

use super::report::{csv_header, ReportRow};
use crate::config::{SessionConfig, SessionFormat};
use crate::error::{EscTelemetryError, Result};

/// Session file name prefix
const FILE_PREFIX: &str = "telemetry_";

impl SessionFormat {
    /// File extension for this format
    pub fn extension(self) -> &'static str {
        match self {
            SessionFormat::Csv => "csv",
            SessionFormat::Jsonl => "jsonl",
        }
    }
}

/// Rotating session file writer
pub struct SessionLogger {
    dir: PathBuf,
    format: SessionFormat,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    current_path: Option<PathBuf>,
    records_in_file: usize,
    sequence: u32,
}

impl std::fmt::Debug for SessionLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLogger")
            .field("dir", &self.dir)
            .field("format", &self.format)
            .field("current_path", &self.current_path)
            .field("records_in_file", &self.records_in_file)
            .finish_non_exhaustive()
    }
}

impl SessionLogger {
    /// Create a logger, creating the session directory if needed
    ///
    /// No file is opened until the first row is written.
    pub fn new(config: &SessionConfig) -> Result<Self> {
        fs::create_dir_all(&config.dir).map_err(|e| {
            EscTelemetryError::Session(format!("Failed to create {}: {}", config.dir, e))
        })?;

        Ok(Self {
            dir: PathBuf::from(&config.dir),
            format: config.format,
            max_records_per_file: config.max_records_per_file,
            max_files_to_keep: config.max_files_to_keep,
            writer: None,
            current_path: None,
            records_in_file: 0,
            sequence: 0,
        })
    }

    /// Path of the file currently being written
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    /// Append rows and flush
    pub fn write_rows(&mut self, rows: &[ReportRow]) -> Result<()> {
        for row in rows {
            if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
                self.rotate()?;
            }

            let format = self.format;
            let writer = self
                .writer
                .as_mut()
                .ok_or_else(|| EscTelemetryError::Session("No session file open".to_string()))?;

            match format {
                SessionFormat::Csv => writeln!(writer, "{}", row.to_csv())?,
                SessionFormat::Jsonl => {
                    serde_json::to_writer(&mut *writer, row)?;
                    writer.write_all(b"\n")?;
                }
            }
            self.records_in_file += 1;
        }

        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    /// Close the current file and start a new one
    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }

        let path = self.next_path();
        let file = File::create(&path).map_err(|e| {
            EscTelemetryError::Session(format!("Failed to create {}: {}", path.display(), e))
        })?;
        let mut writer = BufWriter::new(file);

        if self.format == SessionFormat::Csv {
            writeln!(writer, "{}", csv_header())?;
        }

        info!("Recording session to {}", path.display());
        self.writer = Some(writer);
        self.current_path = Some(path);
        self.records_in_file = 0;

        self.prune()
    }

    /// Pick a file name that does not exist yet
    fn next_path(&mut self) -> PathBuf {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
        let ext = self.format.extension();

        loop {
            let path = self
                .dir
                .join(format!("{}{}_{:04}.{}", FILE_PREFIX, stamp, self.sequence, ext));
            self.sequence = self.sequence.wrapping_add(1);
            if !path.exists() {
                return path;
            }
        }
    }

    /// Session files in the directory, oldest first
    pub fn session_files(&self) -> Result<Vec<PathBuf>> {
        let ext = self.format.extension();
        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                let name_ok = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(FILE_PREFIX));
                let ext_ok = path.extension().and_then(|e| e.to_str()) == Some(ext);
                name_ok && ext_ok
            })
            .collect();

        // Timestamped names sort chronologically
        files.sort();
        Ok(files)
    }

    /// Delete the oldest session files beyond `max_files_to_keep`
    fn prune(&self) -> Result<()> {
        let files = self.session_files()?;
        if files.len() <= self.max_files_to_keep {
            return Ok(());
        }

        let excess = files.len() - self.max_files_to_keep;
        for path in files.into_iter().take(excess) {
            if Some(path.as_path()) == self.current_path() {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => debug!("Removed old session file {}", path.display()),
                Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
        Ok(())
    }
}
