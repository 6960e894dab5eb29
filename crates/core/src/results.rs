use std::collections::VecDeque;
use std::fmt;

/// Generic value representation every driver converts its native cells into.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    UnsignedInteger(u64),
    Float(f64),
    Boolean(bool),
    Text(String),
    Bytes(Vec<u8>),
}

impl CellValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::UnsignedInteger(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
            Self::Bytes(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => f.write_str(text),
                Err(_) => write!(f, "<{} bytes>", bytes.len()),
            },
        }
    }
}

/// Column names plus every fetched row, in cursor order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultGrid {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl ResultGrid {
    #[must_use]
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row, padding with NULL or truncating so it matches the column count.
    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Null);
        self.rows.push(row);
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }

    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|values| values.get(column))
    }
}

/// Bounded message history; the oldest line is evicted once capacity is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageLog {
    capacity: usize,
    lines: VecDeque<String>,
    total_lines_seen: u64,
}

impl MessageLog {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "message log capacity must be greater than 0");
        Self {
            capacity,
            lines: VecDeque::with_capacity(capacity.min(256)),
            total_lines_seen: 0,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn total_lines_seen(&self) -> u64 {
        self.total_lines_seen
    }

    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
        self.total_lines_seen += 1;
    }

    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    #[must_use]
    pub fn visible_lines(&self, start: usize, limit: usize) -> Vec<&str> {
        if limit == 0 || start >= self.lines.len() {
            return Vec::new();
        }

        self.lines
            .iter()
            .skip(start)
            .take(limit)
            .map(String::as_str)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultSurface {
    #[default]
    Table,
    Messages,
}

impl ResultSurface {
    pub const ALL: [Self; 2] = [Self::Table, Self::Messages];

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Table => "Table",
            Self::Messages => "Messages",
        }
    }

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Table => 0,
            Self::Messages => 1,
        }
    }

    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::Table => Self::Messages,
            Self::Messages => Self::Table,
        }
    }
}

/// The results area: one grid, one message log, and whichever of the two is on top.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsView {
    grid: ResultGrid,
    messages: MessageLog,
    active: ResultSurface,
    surface_picks: u64,
}

impl ResultsView {
    #[must_use]
    pub fn new(message_capacity: usize) -> Self {
        Self {
            grid: ResultGrid::default(),
            messages: MessageLog::new(message_capacity),
            active: ResultSurface::Table,
            surface_picks: 0,
        }
    }

    #[must_use]
    pub fn grid(&self) -> &ResultGrid {
        &self.grid
    }

    #[must_use]
    pub fn messages(&self) -> &MessageLog {
        &self.messages
    }

    #[must_use]
    pub fn active(&self) -> ResultSurface {
        self.active
    }

    /// How many outcomes have chosen the active surface. A manual `select`
    /// does not count.
    #[must_use]
    pub fn surface_picks(&self) -> u64 {
        self.surface_picks
    }

    pub fn select(&mut self, surface: ResultSurface) {
        self.active = surface;
    }

    pub fn show_grid(&mut self, grid: ResultGrid) {
        self.grid = grid;
        self.pick(ResultSurface::Table);
    }

    fn pick(&mut self, surface: ResultSurface) {
        self.active = surface;
        self.surface_picks += 1;
    }

    /// Records a line without changing the active surface.
    pub fn log(&mut self, line: impl Into<String>) {
        self.messages.push(line);
    }

    pub fn show_message(&mut self, line: impl Into<String>) {
        self.messages.push(line);
        self.pick(ResultSurface::Messages);
    }

    pub fn show_error(&mut self, message: impl fmt::Display) {
        self.show_message(format!("ERROR: {message}"));
    }
}
