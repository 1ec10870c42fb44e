use std::path::PathBuf;

use crossterm::event::KeyEvent;
use derive_setters::Setters;
use thiserror::Error;

use crate::explorer::LoadTicket;
use crate::record::{DatasetId, Record};
use crate::stats::{DatasetMap, ServerStatistics};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_THEME_FILE: &str = "~/.config/filmdash/theme";
pub const DEFAULT_LOG_FILE: &str = "filmdash.log";
pub const DEFAULT_MAX_COLUMN_WIDTH: usize = 40;

/// Failure to retrieve a dataset or file from its source.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error {status} from {target}")]
    Status { target: String, status: u16 },

    #[error("failed to reach {target}: {reason}")]
    Transport { target: String, reason: String },

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("failed to read {target}: {reason}")]
    Io { target: String, reason: String },
}

/// Payload that arrived but does not have the shape of a dataset.
#[derive(Debug, Error, PartialEq)]
pub enum FormatError {
    #[error("Empty CSV file")]
    EmptyCsv,

    #[error("CSV format mismatch on line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("invalid dataset payload: {0}")]
    Payload(String),
}

#[derive(Debug, Error)]
pub enum DashError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct DashConfig {
    pub base_url: String,
    /// Read `<dir>/<id>.csv` exports instead of asking the server.
    #[setters(strip_option)]
    pub data_dir: Option<String>,
    pub extra_datasets: Vec<DatasetId>,
    pub theme_file: String,
    pub log_file: String,
    pub max_column_width: usize,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            data_dir: None,
            extra_datasets: Vec::new(),
            theme_file: DEFAULT_THEME_FILE.to_string(),
            log_file: DEFAULT_LOG_FILE.to_string(),
            max_column_width: DEFAULT_MAX_COLUMN_WIDTH,
        }
    }
}

#[derive(Debug)]
pub enum Message {
    Quit,
    Help,
    Exit,
    NextView,
    PrevView,
    SelectView(usize),
    ToggleSidebar,
    CycleTheme,
    MoveUp,
    MoveDown,
    MovePageUp,
    MovePageDown,
    MoveLeft,
    MoveRight,
    MoveBeginning,
    MoveEnd,
    SortSelected,
    Search,
    CycleScope,
    CopyCell,
    Resize(usize, usize),
    RawKey(KeyEvent),
    StatsLoaded {
        datasets: DatasetMap,
        server: ServerStatistics,
    },
    DatasetLoaded {
        ticket: LoadTicket,
        id: DatasetId,
        result: Result<Vec<Record>, DashError>,
    },
}

pub const HELP_TEXT: &str = "\
Navigation
  Tab / Shift-Tab   next / previous view
  1-9               jump to view
  b                 toggle sidebar
  t                 cycle theme
  ?                 this help
  q / Ctrl-C        quit

Table
  Up/Down/j/k       select row
  PgUp/PgDn         page up / down
  Home/End/g/G      first / last row
  Left/Right/h/l    select column
  s / Enter         sort by selected column (again to reverse)
  /                 search (Enter keeps, Esc clears)
  c                 cycle search scope column
  y                 copy selected cell

Esc closes this help and dismisses errors.";
