//! Source and destination tables of a mapping and the links between them

pub mod bridge;
pub mod links;

pub use bridge::*;
pub use links::*;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{PerseusError, Result};

/// Side of the mapping a table is shown on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Area {
    Source,
    Destination,
}

impl Area {
    pub fn as_str(&self) -> &'static str {
        match self {
            Area::Source => "source",
            Area::Destination => "destination",
        }
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Area {
    type Err = PerseusError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "source" => Ok(Area::Source),
            "destination" => Ok(Area::Destination),
            other => Err(PerseusError::UnknownArea(other.to_string())),
        }
    }
}

/// Identifies a row by value: the owning table and the row id within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowRef {
    pub table_id: u32,
    pub id: u32,
}

impl RowRef {
    pub fn new(table_id: u32, id: u32) -> Self {
        Self { table_id, id }
    }
}

/// Arrow drawn from a source row to a destination row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub source: RowRef,
    pub destination: RowRef,
}

impl Connection {
    pub fn new(source: RowRef, destination: RowRef) -> Self {
        Self {
            source,
            destination,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
}

/// A column of a table, shown as one row of the panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub id: u32,
    pub table_id: u32,
    pub name: String,
    pub key: String,
    pub visible: bool,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Row {
    pub fn new(table_id: u32, id: u32, table_name: &str, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id,
            table_id,
            key: format!("{}-{}", table_name, name),
            name,
            visible: true,
            comments: Vec::new(),
        }
    }

    pub fn row_ref(&self) -> RowRef {
        RowRef::new(self.table_id, self.id)
    }

    pub fn matches(&self, target: &RowRef) -> bool {
        self.table_id == target.table_id && self.id == target.id
    }

    pub fn with_comment(mut self, text: impl Into<String>) -> Self {
        self.comments.push(Comment { text: text.into() });
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub id: u32,
    pub area: Area,
    pub name: String,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(id: u32, area: Area, name: impl Into<String>) -> Self {
        Self {
            id,
            area,
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// Append a row named `name`, numbering rows in insertion order.
    pub fn with_row(mut self, name: impl Into<String>) -> Self {
        let row = Row::new(self.id, self.rows.len() as u32, &self.name, name);
        self.rows.push(row);
        self
    }

    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter().filter(|row| row.visible)
    }

    pub fn total_rows_number(&self) -> usize {
        self.rows.len()
    }

    pub fn visible_rows_number(&self) -> usize {
        self.visible_rows().count()
    }
}
