//! In-memory tick table.
//!
//! The `TickStore` is loaded once from the comma-separated file produced by the offline
//! extraction step and is read-only afterwards. Rows are sorted by `TickTimestamp` so the
//! replay cursor can walk them as contiguous timestamp groups.
//!
//! Loading rules:
//! - The header is matched case-insensitively, with spaces normalized to `_`. Both the
//!   extractor's column names (`ID`, `SecType`, `Last`, `Trading time`, `Trading date`)
//!   and the descriptive ones (`symbol`, `security_type`, `price`, ...) are accepted.
//! - A blank, non-numeric or non-finite price is kept as `None`; the cursor gap-fills it.
//! - Rows whose timestamp cannot be parsed, or that have no symbol, are skipped.
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use log::{error, info, warn};
use tick_common::feed::SecurityType;
use tick_common::{FeedError, Result};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d-%m-%Y", "%d.%m.%Y"];
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];

/// Ordered replay key: trading date, then trading time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TickTimestamp {
    /// Trading date.
    pub date: NaiveDate,
    /// Trading time within the date.
    pub time: NaiveTime,
}

impl TickTimestamp {
    /// Parse the raw date and time columns.
    pub fn parse(date: &str, time: &str) -> Option<Self> {
        let date = DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(date.trim(), format).ok())?;
        let time = TIME_FORMATS
            .iter()
            .find_map(|format| NaiveTime::parse_from_str(time.trim(), format).ok())?;
        Some(Self { date, time })
    }
}

/// One observed price record.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    /// Symbol identifier.
    pub symbol: String,
    /// Observed price; `None` when the source had no usable value.
    pub price: Option<f64>,
    /// Replay ordering key.
    pub timestamp: TickTimestamp,
    /// Security type tag.
    pub security_type: SecurityType,
    /// Raw trading date as it appeared in the file.
    pub trading_date: String,
    /// Raw trading time as it appeared in the file.
    pub trading_time: String,
}

/// Column positions resolved from the header row.
struct Columns {
    symbol: usize,
    security_type: usize,
    price: usize,
    trading_time: usize,
    trading_date: usize,
}

impl Columns {
    fn from_header(header: &str) -> Result<Self> {
        let names: Vec<String> = split_fields(header)
            .iter()
            .map(|name| name.trim().to_ascii_lowercase().replace(' ', "_"))
            .collect();
        Ok(Self {
            symbol: find_column(&names, &["symbol", "id", "id.[exchange]"])?,
            security_type: find_column(&names, &["security_type", "sectype", "sec_type"])?,
            price: find_column(&names, &["price", "last"])?,
            trading_time: find_column(&names, &["trading_time"])?,
            trading_date: find_column(&names, &["trading_date"])?,
        })
    }
}

fn find_column(names: &[String], aliases: &[&str]) -> Result<usize> {
    names
        .iter()
        .position(|name| aliases.contains(&name.as_str()))
        .ok_or_else(|| FeedError::MissingColumn(aliases[0].to_string()))
}

/// Split one CSV line, honouring double-quoted fields.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Parse a price field; anything that is not a finite number means "no price".
pub fn parse_price(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|price| price.is_finite())
}

/// Timestamp-sorted, read-only tick table.
#[derive(Debug, Clone, Default)]
pub struct TickStore {
    ticks: Vec<Tick>,
    symbols: BTreeSet<String>,
}

impl TickStore {
    /// Load the tick table from `path`.
    ///
    /// A missing or empty file is an unrecoverable startup condition and is returned as
    /// an error.
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading tick data from {}", path.display());
        let file = File::open(path)
            .inspect_err(|e| error!("Could not open {}: {}", path.display(), e))?;
        let store = Self::from_reader(BufReader::new(file))?;
        if store.is_empty() {
            return Err(FeedError::EmptyStore(path.display().to_string()));
        }
        info!(
            "Loaded {} records for {} symbols",
            store.len(),
            store.symbols.len()
        );
        Ok(store)
    }

    /// Parse a tick table from any buffered reader. The first non-empty line is the header.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut lines = reader.lines();
        let columns = loop {
            match lines.next() {
                Some(line) => {
                    let line = line?;
                    if !line.trim().is_empty() {
                        break Columns::from_header(&line)?;
                    }
                }
                None => return Ok(Self::default()),
            }
        };

        let mut ticks = Vec::new();
        let mut skipped = 0usize;
        for (index, line) in lines.enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match Self::parse_row(&split_fields(&line), &columns) {
                Some(tick) => ticks.push(tick),
                None => {
                    skipped += 1;
                    warn!("Skipping malformed tick row {}: {}", index + 2, line);
                }
            }
        }
        if skipped > 0 {
            warn!("Skipped {} malformed tick rows", skipped);
        }
        Ok(Self::from_ticks(ticks))
    }

    /// Build a store from already parsed ticks, sorting them by timestamp.
    pub fn from_ticks(mut ticks: Vec<Tick>) -> Self {
        ticks.sort_by_key(|tick| tick.timestamp);
        let symbols = ticks.iter().map(|tick| tick.symbol.clone()).collect();
        Self { ticks, symbols }
    }

    fn parse_row(fields: &[String], columns: &Columns) -> Option<Tick> {
        let field = |index: usize| fields.get(index).map(|value| value.trim());
        let symbol = field(columns.symbol).filter(|symbol| !symbol.is_empty())?;
        let trading_date = field(columns.trading_date)?;
        let trading_time = field(columns.trading_time)?;
        let timestamp = TickTimestamp::parse(trading_date, trading_time)?;
        let security_type = field(columns.security_type)
            .and_then(|tag| tag.parse().ok())
            .unwrap_or(SecurityType::Unknown);
        Some(Tick {
            symbol: symbol.to_string(),
            price: field(columns.price).and_then(parse_price),
            timestamp,
            security_type,
            trading_date: trading_date.to_string(),
            trading_time: trading_time.to_string(),
        })
    }

    /// All ticks in replay order.
    pub fn ticks(&self) -> &[Tick] {
        &self.ticks
    }

    /// Every distinct symbol in the table.
    pub fn symbols(&self) -> &BTreeSet<String> {
        &self.symbols
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    /// `true` when the table holds no records.
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}
