use serde::{Deserialize, Serialize};

/// Separator between symbols in a request.
pub const SYMBOL_SEPARATOR: char = '|';

/// Display identity used when none is configured.
pub const DEFAULT_DISPLAY_ID: &str = "preview";

/// Kind of data requested from the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedType {
    Realtime,
    Historical,
}

impl FeedType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Realtime => "realtime",
            Self::Historical => "historical",
        }
    }

    /// Parse a type token. Matching is case-sensitive.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "realtime" => Some(Self::Realtime),
            "historical" => Some(Self::Historical),
            _ => None,
        }
    }
}

impl std::fmt::Display for FeedType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Look-back window of a historical request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoricalDuration {
    #[serde(rename = "Day")]
    Day,
    #[serde(rename = "Week")]
    Week,
    #[default]
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "5Y")]
    FiveYears,
}

impl HistoricalDuration {
    pub const ALL: [HistoricalDuration; 7] = [
        Self::Day,
        Self::Week,
        Self::OneMonth,
        Self::ThreeMonths,
        Self::SixMonths,
        Self::OneYear,
        Self::FiveYears,
    ];

    /// Code sent to the service.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Day => "Day",
            Self::Week => "Week",
            Self::OneMonth => "1M",
            Self::ThreeMonths => "3M",
            Self::SixMonths => "6M",
            Self::OneYear => "1Y",
            Self::FiveYears => "5Y",
        }
    }

    /// Parse a duration code. Matching is case-sensitive (`"day"` is rejected).
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.code() == value)
    }
}

impl std::fmt::Display for HistoricalDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Raw request configuration as supplied by the host.
///
/// Values are kept as the host wrote them so that validation can report
/// exactly what was wrong. A new value for any field is a configuration change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestConfig {
    /// Pipe separated ticker list, e.g. `AA.N|MSFT`
    pub symbols: String,

    /// `realtime` or `historical`
    #[serde(rename = "type")]
    pub kind: String,

    /// Duration code, only meaningful for historical requests
    pub duration: String,

    /// Fields to project, in order
    #[serde(default)]
    pub fields: Vec<String>,

    /// Display the data is requested for
    pub display_id: String,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            symbols: String::new(),
            kind: FeedType::Realtime.as_str().to_string(),
            duration: HistoricalDuration::default().code().to_string(),
            fields: Vec::new(),
            display_id: DEFAULT_DISPLAY_ID.to_string(),
        }
    }
}

impl RequestConfig {
    /// Realtime request for the given pipe separated symbols.
    pub fn realtime(symbols: impl Into<String>) -> Self {
        Self {
            symbols: symbols.into(),
            ..Default::default()
        }
    }

    /// Historical request for the given symbols and duration code.
    pub fn historical(symbols: impl Into<String>, duration: impl Into<String>) -> Self {
        Self {
            symbols: symbols.into(),
            kind: FeedType::Historical.as_str().to_string(),
            duration: duration.into(),
            ..Default::default()
        }
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_display_id(mut self, display_id: impl Into<String>) -> Self {
        self.display_id = display_id.into();
        self
    }

    /// Whether the request gets the short cache TTL.
    ///
    /// Realtime data and intraday history change between refreshes; everything
    /// else is stable for a day.
    pub fn is_short_lived(&self) -> bool {
        !self.kind.eq_ignore_ascii_case(FeedType::Historical.as_str())
            || self.duration == HistoricalDuration::Day.code()
    }
}

/// A configuration that passed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedConfig {
    pub kind: FeedType,
    pub symbols: Vec<String>,
    pub duration: HistoricalDuration,
    pub fields: Vec<String>,
    pub display_id: String,
}

impl ValidatedConfig {
    /// Symbols joined back with the request separator.
    pub fn joined_symbols(&self) -> String {
        self.symbols.join(&SYMBOL_SEPARATOR.to_string())
    }
}
