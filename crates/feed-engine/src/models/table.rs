use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Column descriptor of a data table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub pattern: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// Single cell. `v` holds the raw value, `f` an optional formatted form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(default)]
    pub v: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f: Option<String>,
}

impl Cell {
    pub fn as_str(&self) -> Option<&str> {
        self.v.as_str()
    }
}

/// Table row; one per requested symbol, in request order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    #[serde(default)]
    pub c: Vec<Option<Cell>>,
}

impl Row {
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.c.iter().flatten()
    }
}

/// Tabular quote data as returned by the financial data service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DataTable {
    #[serde(default)]
    pub cols: Vec<Column>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl DataTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Structured error entry reported by the service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceError {
    /// Machine readable code, e.g. `not_permissioned`
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detailed_message: Option<String>,
}

/// Envelope of one response object.
#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct ResponseEnvelope {
    #[serde(default)]
    #[allow(dead_code)]
    pub status: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    pub sig: Option<String>,
    #[serde(default)]
    pub table: Option<DataTable>,
    #[serde(default)]
    pub errors: Option<Vec<ServiceError>>,
}
