//! JSONL trade store: one trade document per line.
//!
//! Every read loads the file afresh, so each request sees a consistent snapshot
//! and nothing is cached between calls. Appends go straight to the end of the
//! file; updates and deletes rewrite it through a temp file and a rename.
//! Lines that do not parse are skipped on read but written back untouched.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{assign_id, StoreError, TradeQuery, TradeStore};
use crate::domain::{TradeId, TradeRecord, UserId};

/// One line of the file as loaded.
enum Line {
    Trade(TradeRecord),
    /// Unparseable bytes, kept verbatim for rewrites.
    Raw(Vec<u8>),
}

pub struct JsonlTradeStore {
    path: PathBuf,
    // Serializes writers within this process.
    write_lock: Mutex<()>,
}

impl JsonlTradeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all trades. Malformed or non-UTF-8 lines are skipped with a warning.
    pub fn read_all(&self) -> Result<Vec<TradeRecord>, StoreError> {
        Ok(self
            .read_lines()?
            .into_iter()
            .filter_map(|line| match line {
                Line::Trade(trade) => Some(trade),
                Line::Raw(_) => None,
            })
            .collect())
    }

    fn read_lines(&self) -> Result<Vec<Line>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let bytes = fs::read(&self.path).map_err(|e| {
            StoreError::Unavailable(format!("cannot open {}: {e}", self.path.display()))
        })?;
        let mut lines = Vec::new();

        for (lineno, raw) in bytes.split(|b| *b == b'\n').enumerate() {
            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
            if raw.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            let parsed = std::str::from_utf8(raw)
                .map_err(|e| e.to_string())
                .and_then(|text| {
                    serde_json::from_str::<TradeRecord>(text).map_err(|e| e.to_string())
                });
            match parsed {
                Ok(trade) => lines.push(Line::Trade(trade)),
                Err(err) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        line = lineno + 1,
                        error = %err,
                        "skipping malformed trade line"
                    );
                    lines.push(Line::Raw(raw.to_vec()));
                }
            }
        }

        Ok(lines)
    }

    fn rewrite(&self, lines: &[Line]) -> Result<(), StoreError> {
        self.ensure_parent()?;
        let tmp = self.path.with_extension("jsonl.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            for line in lines {
                match line {
                    Line::Trade(trade) => serde_json::to_writer(&mut file, trade)?,
                    Line::Raw(raw) => file.write_all(raw)?,
                }
                file.write_all(b"\n")?;
            }
            file.flush()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn ensure_parent(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>, StoreError> {
        self.write_lock
            .lock()
            .map_err(|_| StoreError::Unavailable("jsonl store lock poisoned".into()))
    }
}

fn is_target(line: &Line, user: &UserId, id: &TradeId) -> bool {
    matches!(line, Line::Trade(t) if &t.user_id == user && &t.id == id)
}

impl TradeStore for JsonlTradeStore {
    fn find(&self, query: &TradeQuery) -> Result<Vec<TradeRecord>, StoreError> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|t| query.matches(t))
            .collect())
    }

    fn get(&self, user: &UserId, id: &TradeId) -> Result<Option<TradeRecord>, StoreError> {
        Ok(self
            .read_all()?
            .into_iter()
            .find(|t| &t.user_id == user && &t.id == id))
    }

    fn insert(&self, mut trade: TradeRecord) -> Result<TradeId, StoreError> {
        let _guard = self.lock()?;
        let existing = self.read_all()?;
        let taken = |id: &TradeId| existing.iter().any(|t| &t.id == id);
        assign_id(&mut trade, existing.len() as u64, taken);
        if taken(&trade.id) {
            return Err(StoreError::Duplicate(trade.id));
        }

        self.ensure_parent()?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", serde_json::to_string(&trade)?)?;
        file.flush()?;

        Ok(trade.id)
    }

    fn update(&self, trade: TradeRecord) -> Result<(), StoreError> {
        let _guard = self.lock()?;
        let mut lines = self.read_lines()?;
        let slot = lines
            .iter_mut()
            .find(|l| is_target(l, &trade.user_id, &trade.id))
            .ok_or_else(|| StoreError::NotFound(trade.id.clone()))?;
        *slot = Line::Trade(trade);
        self.rewrite(&lines)
    }

    fn delete(&self, user: &UserId, id: &TradeId) -> Result<(), StoreError> {
        let _guard = self.lock()?;
        let mut lines = self.read_lines()?;
        let before = lines.len();
        lines.retain(|l| !is_target(l, user, id));
        if lines.len() == before {
            return Err(StoreError::NotFound(id.clone()));
        }
        self.rewrite(&lines)
    }
}
