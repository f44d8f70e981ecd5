use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A row-level change pushed by the realtime feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    #[serde(default = "default_schema")]
    pub schema: String,
    pub table: String,
    pub event_type: ChangeKind,
    /// Row image after the change. `Null` for deletes.
    #[serde(default)]
    pub new: serde_json::Value,
    /// Row image before the change, when the feed provides it.
    #[serde(default)]
    pub old: serde_json::Value,
    #[serde(default, rename = "commit_timestamp")]
    pub commit_timestamp: Option<DateTime<Utc>>,
}

fn default_schema() -> String {
    "public".to_string()
}

impl ChangeEvent {
    pub fn insert(table: impl Into<String>, new: serde_json::Value) -> Self {
        Self {
            schema: default_schema(),
            table: table.into(),
            event_type: ChangeKind::Insert,
            new,
            old: serde_json::Value::Null,
            commit_timestamp: Some(Utc::now()),
        }
    }

    pub fn update(
        table: impl Into<String>,
        old: serde_json::Value,
        new: serde_json::Value,
    ) -> Self {
        Self {
            schema: default_schema(),
            table: table.into(),
            event_type: ChangeKind::Update,
            new,
            old,
            commit_timestamp: Some(Utc::now()),
        }
    }

    /// The row image filters are evaluated against.
    pub fn record(&self) -> &serde_json::Value {
        match self.event_type {
            ChangeKind::Delete => &self.old,
            _ => &self.new,
        }
    }
}

/// Equality predicate on one column of one table, for one kind of change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeFilter {
    pub table: String,
    pub event: ChangeKind,
    pub column: String,
    pub value: String,
}

impl ChangeFilter {
    pub fn new(
        table: impl Into<String>,
        event: ChangeKind,
        column: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            event,
            column: column.into(),
            value: value.into(),
        }
    }

    /// Filter expression in the `column=eq.value` form used by the hosted feed.
    pub fn expression(&self) -> String {
        format!("{}=eq.{}", self.column, self.value)
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        if event.event_type != self.event || event.table != self.table {
            return false;
        }
        match event.record().get(&self.column) {
            Some(serde_json::Value::String(value)) => value == &self.value,
            Some(serde_json::Value::Null) | None => false,
            Some(other) => other.to_string() == self.value,
        }
    }
}
