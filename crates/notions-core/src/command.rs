//! Command log
//!
//! Every accepted mutation is appended to a [`CommandLog`] as a
//! [`CommandRecord`]: a sequence number, a timestamp, the [`Command`] kind
//! and its arguments as JSON. The core only ever writes to the log; the
//! replay stream is there for auditing tools.
//!
//! ## Implementations
//!
//! - [`MemoryLog`]: in-process, replayable
//! - [`JsonLinesLog`]: append-only file with one JSON record per line
//! - [`WriterLog`]: human-readable lines to any writer, not replayable

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Kinds of recorded commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    DocumentCreate,
    DocumentDelete,
    DocumentAppend,
    DocumentTruncate,
    DocumentRetitle,
    NodeCreate,
    NodeDelete,
    NodeAppend,
    NodeTruncate,
    NodeInsert,
    NodeChild,
    NodePrune,
    TextInsert,
    TextDelete,
    TextAppend,
    TextTruncate,
    StyleTag,
    StyleDel,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DocumentCreate => "document_create",
            Self::DocumentDelete => "document_delete",
            Self::DocumentAppend => "document_append",
            Self::DocumentTruncate => "document_truncate",
            Self::DocumentRetitle => "document_retitle",
            Self::NodeCreate => "node_create",
            Self::NodeDelete => "node_delete",
            Self::NodeAppend => "node_append",
            Self::NodeTruncate => "node_truncate",
            Self::NodeInsert => "node_insert",
            Self::NodeChild => "node_child",
            Self::NodePrune => "node_prune",
            Self::TextInsert => "text_insert",
            Self::TextDelete => "text_delete",
            Self::TextAppend => "text_append",
            Self::TextTruncate => "text_truncate",
            Self::StyleTag => "style_tag",
            Self::StyleDel => "style_del",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the command log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub seq: u64,
    pub at: DateTime<Utc>,
    pub command: Command,
    pub args: Value,
}

/// Errors from command log implementations
#[derive(Error, Debug)]
pub enum CommandLogError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to encode command: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Corrupt command log '{path}' at line {line}: {details}")]
    Corrupt {
        path: PathBuf,
        line: usize,
        details: String,
    },

    #[error("This command log cannot be replayed")]
    ReplayUnsupported,
}

/// Sequential stream of previously recorded commands
pub type ReplayStream = Box<dyn Iterator<Item = CommandRecord> + Send>;

/// Append-only sink for mutation records
pub trait CommandLog: Send + Sync {
    /// Append one command
    fn record(&self, command: Command, args: Value) -> Result<(), CommandLogError>;

    /// Open a stream over everything recorded so far
    fn replay(&self) -> Result<ReplayStream, CommandLogError>;
}

/// Hands out sequence numbers, starting at 1
#[derive(Debug, Default)]
struct Sequencer {
    last: u64,
}

impl Sequencer {
    fn stamp(&mut self, command: Command, args: Value) -> CommandRecord {
        self.last += 1;
        CommandRecord {
            seq: self.last,
            at: Utc::now(),
            command,
            args,
        }
    }
}

/// In-memory command log
#[derive(Debug, Default)]
pub struct MemoryLog {
    inner: Mutex<(Sequencer, Vec<CommandRecord>)>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every record so far
    pub fn records(&self) -> Vec<CommandRecord> {
        self.inner.lock().1.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CommandLog for MemoryLog {
    fn record(&self, command: Command, args: Value) -> Result<(), CommandLogError> {
        let mut inner = self.inner.lock();
        let record = inner.0.stamp(command, args);
        inner.1.push(record);
        Ok(())
    }

    fn replay(&self) -> Result<ReplayStream, CommandLogError> {
        Ok(Box::new(self.records().into_iter()))
    }
}

/// Command log that writes `CMD: <command> <args>` lines to a writer
pub struct WriterLog<W> {
    inner: Mutex<(Sequencer, W)>,
}

impl<W: Write + Send> WriterLog<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: Mutex::new((Sequencer::default(), writer)),
        }
    }

    pub fn into_inner(self) -> W {
        self.inner.into_inner().1
    }
}

impl<W: Write + Send> CommandLog for WriterLog<W> {
    fn record(&self, command: Command, args: Value) -> Result<(), CommandLogError> {
        let mut inner = self.inner.lock();
        let (sequencer, writer) = &mut *inner;
        let record = sequencer.stamp(command, args);
        writeln!(writer, "CMD: {} {} {}", record.seq, record.command, record.args)?;
        Ok(())
    }

    fn replay(&self) -> Result<ReplayStream, CommandLogError> {
        Err(CommandLogError::ReplayUnsupported)
    }
}

/// Append-only file of JSON records, one per line
pub struct JsonLinesLog {
    path: PathBuf,
    inner: Mutex<(Sequencer, File)>,
}

impl JsonLinesLog {
    /// Open or create a log file, continuing its sequence numbers
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CommandLogError> {
        let path = path.as_ref().to_path_buf();
        let last = if path.exists() {
            read_records(&path)?.last().map(|r| r.seq).unwrap_or(0)
        } else {
            0
        };

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            inner: Mutex::new((Sequencer { last }, file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CommandLog for JsonLinesLog {
    fn record(&self, command: Command, args: Value) -> Result<(), CommandLogError> {
        let mut inner = self.inner.lock();
        let (sequencer, file) = &mut *inner;
        let record = sequencer.stamp(command, args);

        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');
        file.write_all(&line)?;
        file.flush()?;
        Ok(())
    }

    fn replay(&self) -> Result<ReplayStream, CommandLogError> {
        // Hold the lock so a concurrent append is never read half-written
        let _inner = self.inner.lock();
        Ok(Box::new(read_records(&self.path)?.into_iter()))
    }
}

/// Read every record from a JSON-lines log file
pub fn read_records(path: &Path) -> Result<Vec<CommandRecord>, CommandLogError> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|e| CommandLogError::Corrupt {
            path: path.to_path_buf(),
            line: i + 1,
            details: e.to_string(),
        })?;
        records.push(record);
    }
    Ok(records)
}
