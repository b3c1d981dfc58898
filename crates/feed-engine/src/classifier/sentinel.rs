//! Sentinel values embedded in otherwise successful tables.
//!
//! The service marks instruments the display may not see, or that have no
//! data, by putting a fixed string into the row's cells instead of a value.

use std::collections::HashMap;
use std::time::Duration;

use log::debug;
use tokio::time::Instant;

use crate::models::DataTable;
use crate::sink::LogLevel;

/// Known sentinel values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Sentinel {
    /// `N/P`: the display is not permissioned for the instrument.
    NotPermissioned,
    /// `N/A`: the service has no data for the instrument.
    NotAvailable,
}

impl Sentinel {
    pub const ALL: [Sentinel; 2] = [Self::NotPermissioned, Self::NotAvailable];

    pub fn code(&self) -> &'static str {
        match self {
            Self::NotPermissioned => "N/P",
            Self::NotAvailable => "N/A",
        }
    }

    pub fn severity(&self) -> LogLevel {
        match self {
            Self::NotPermissioned | Self::NotAvailable => LogLevel::Error,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::NotPermissioned => "instrument not permissioned",
            Self::NotAvailable => "instrument data unavailable",
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == value)
    }
}

/// One sentinel found during a scan, with the symbols that carried it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbeddedStatus {
    pub sentinel: Sentinel,
    pub symbols: Vec<String>,
}

impl EmbeddedStatus {
    pub fn code(&self) -> &'static str {
        self.sentinel.code()
    }

    pub fn severity(&self) -> LogLevel {
        self.sentinel.severity()
    }
}

/// Scan a table for sentinel cells.
///
/// Rows map to `symbols` by position. Each distinct sentinel is reported
/// once, in order of first appearance, with the affected symbols deduplicated.
pub fn scan_for_embedded_status_codes(table: &DataTable, symbols: &[String]) -> Vec<EmbeddedStatus> {
    let mut found: Vec<EmbeddedStatus> = Vec::new();

    for (index, row) in table.rows.iter().enumerate() {
        for sentinel in row.cells().filter_map(|c| c.as_str()).filter_map(Sentinel::from_value) {
            let symbol = symbols
                .get(index)
                .cloned()
                .unwrap_or_else(|| format!("row {}", index));

            match found.iter_mut().find(|s| s.sentinel == sentinel) {
                Some(status) => {
                    if !status.symbols.contains(&symbol) {
                        status.symbols.push(symbol);
                    }
                }
                None => found.push(EmbeddedStatus {
                    sentinel,
                    symbols: vec![symbol],
                }),
            }
        }
    }

    found
}

/// Limits sentinel log records to one per sentinel per window.
///
/// Only logging is limited; data-update events still carry every table.
#[derive(Debug)]
pub struct SentinelLogLimiter {
    window: Duration,
    last_logged: HashMap<Sentinel, Instant>,
}

impl SentinelLogLimiter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_logged: HashMap::new(),
        }
    }

    /// Returns true if the sentinel should be logged at `now`, and records it.
    pub fn should_log(&mut self, sentinel: Sentinel, now: Instant) -> bool {
        match self.last_logged.get(&sentinel) {
            Some(last) if now.saturating_duration_since(*last) < self.window => {
                debug!(
                    "Sentinel log limiter: '{}' already logged in this window",
                    sentinel.code()
                );
                false
            }
            _ => {
                self.last_logged.insert(sentinel, now);
                true
            }
        }
    }
}
