//! Feed data models
//!
//! This module contains the core data types of the feed engine:
//! - `config` - Host supplied request configuration and its validated form
//! - `table` - Tabular data and error entries returned by the service
//! - `outcome` - The closed set of fetch outcomes delivered to the host

mod config;
mod outcome;
mod table;

pub use config::{
    FeedType, HistoricalDuration, RequestConfig, ValidatedConfig, DEFAULT_DISPLAY_ID,
    SYMBOL_SEPARATOR,
};
pub use outcome::FetchOutcome;
pub use table::{Cell, Column, DataTable, Row, ServiceError};

pub(crate) use table::ResponseEnvelope;
