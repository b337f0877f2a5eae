use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::pricing::PriceTable;
use super::tokens::TokenCounter;
use crate::error::CoreError;
use crate::model::{UsageRecord, UsageSummary};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// What a single `track` call added to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackedUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub tokens: u64,
    pub cost: f64,
}

/// Token and cost ledger persisted as one JSON document.
///
/// Every `track` holds an exclusive lock on a `<ledger>.lock` sidecar, re-reads
/// whatever is on disk, and replaces the whole file by writing a sibling temp
/// file and renaming it into place. Concurrent writers (threads or processes
/// sharing the file) therefore serialize instead of overwriting each other's
/// totals, and a failed write leaves the previous snapshot intact.
pub struct UsageLedger {
    path: PathBuf,
    counter: TokenCounter,
    prices: PriceTable,
    snapshot: Mutex<UsageRecord>,
}

impl UsageLedger {
    /// Load the last persisted snapshot, or start from zero if there is none.
    pub fn open(path: impl Into<PathBuf>, prices: PriceTable) -> Result<Self, CoreError> {
        let path = path.into();
        let record = read_snapshot(&path)?.unwrap_or_default();
        tracing::debug!(
            path = %path.display(),
            total_tokens = record.total_tokens,
            "Opened usage ledger"
        );
        Ok(Self {
            path,
            counter: TokenCounter::new(),
            prices,
            snapshot: Mutex::new(record),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Count, price and persist one call against today's bucket.
    pub fn track(
        &self,
        model: &str,
        input_text: &str,
        output_text: &str,
    ) -> Result<TrackedUsage, CoreError> {
        self.track_on(today(), model, input_text, output_text)
    }

    /// Count, price and persist one call against an explicit date bucket.
    pub fn track_on(
        &self,
        date: NaiveDate,
        model: &str,
        input_text: &str,
        output_text: &str,
    ) -> Result<TrackedUsage, CoreError> {
        let input_tokens = self.counter.count(model, input_text)?;
        let output_tokens = self.counter.count(model, output_text)?;
        let tokens = input_tokens + output_tokens;
        let cost = self.prices.cost(model, input_tokens, output_tokens);
        let day = date.format(DATE_FORMAT).to_string();

        let mut snapshot = self
            .snapshot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let lock = self.lock_exclusive()?;

        // Re-read under lock to pick up other writers
        let mut current = read_snapshot(&self.path)?.unwrap_or_default();
        current.apply(&day, model, tokens, cost);
        replace_file(&self.path, &serde_json::to_string_pretty(&current)?)?;

        fs2::FileExt::unlock(&lock).map_err(|source| CoreError::Lock {
            path: lock_path(&self.path),
            source,
        })?;

        *snapshot = current;
        tracing::debug!(model, tokens, cost, day = %day, "Tracked usage");

        Ok(TrackedUsage {
            input_tokens,
            output_tokens,
            tokens,
            cost,
        })
    }

    fn lock_exclusive(&self) -> Result<fs::File, CoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let path = lock_path(&self.path);
        let file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        fs2::FileExt::lock_exclusive(&file).map_err(|source| CoreError::Lock { path, source })?;
        Ok(file)
    }

    /// Totals as of the last load or track.
    pub fn summary(&self) -> UsageSummary {
        self.summary_on(today())
    }

    pub fn summary_on(&self, date: NaiveDate) -> UsageSummary {
        self.record().summary(&date.format(DATE_FORMAT).to_string())
    }

    pub fn record(&self) -> UsageRecord {
        self.snapshot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Replace the in-memory snapshot with what is currently on disk.
    pub fn reload(&self) -> Result<(), CoreError> {
        let record = read_snapshot(&self.path)?.unwrap_or_default();
        *self
            .snapshot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = record;
        Ok(())
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".lock");
    path.with_file_name(name)
}

/// Read the ledger file. `None` if it does not exist yet.
///
/// Writers only ever rename a complete file into place, so a plain read sees
/// either the old or the new snapshot, never a torn one.
fn read_snapshot(path: &Path) -> Result<Option<UsageRecord>, CoreError> {
    match fs::read_to_string(path) {
        Ok(data) => parse_snapshot(path, &data),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Write `contents` to a temp file beside `path`, then rename it over `path`.
/// On failure the temp file is removed and `path` is untouched.
fn replace_file(path: &Path, contents: &str) -> Result<(), CoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| CoreError::Io(e.error))?;
    Ok(())
}

fn parse_snapshot(path: &Path, data: &str) -> Result<Option<UsageRecord>, CoreError> {
    if data.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(data)
        .map(Some)
        .map_err(|e| CoreError::CorruptLedger {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}
