use std::collections::HashSet;

use crate::error::{ConfigError, LinkError};
use crate::model::{MatchResult, OutputColumn, Side};
use crate::table::{Cell, Table};

/// Output columns bound to source positions, with side-prefixed headers.
#[derive(Debug, Clone)]
pub struct Projection {
    columns: Vec<(Side, usize)>,
    headers: Vec<String>,
}

impl Projection {
    /// An empty `output` selects every left column followed by every right
    /// column.
    pub fn bind(
        output: &[OutputColumn],
        left: &Table,
        right: &Table,
        left_prefix: &str,
        right_prefix: &str,
    ) -> Result<Self, ConfigError> {
        let selected: Vec<OutputColumn> = if output.is_empty() {
            left.columns()
                .iter()
                .map(OutputColumn::left)
                .chain(right.columns().iter().map(OutputColumn::right))
                .collect()
        } else {
            output.to_vec()
        };

        let mut columns = Vec::with_capacity(selected.len());
        let mut headers = Vec::with_capacity(selected.len());
        let mut seen = HashSet::new();

        for out in selected {
            let (table, prefix) = match out.side {
                Side::Left => (left, left_prefix),
                Side::Right => (right, right_prefix),
            };
            let idx = table.column_index(&out.column).ok_or_else(|| ConfigError::UnknownColumn {
                side: out.side,
                column: out.column.clone(),
            })?;
            let header = format!("{prefix}{}", out.column);
            if !seen.insert(header.clone()) {
                return Err(ConfigError::DuplicateColumn {
                    side: out.side,
                    column: header,
                });
            }
            columns.push((out.side, idx));
            headers.push(header);
        }

        Ok(Self { columns, headers })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// One output row. Columns of an absent side are [`Cell::Missing`].
    pub fn project(&self, m: &MatchResult, left: &Table, right: &Table) -> Vec<Cell> {
        self.columns
            .iter()
            .map(|&(side, col)| {
                let (row, table) = match side {
                    Side::Left => (m.left, left),
                    Side::Right => (m.right, right),
                };
                row.map(|r| table.cell(r, col).clone()).unwrap_or(Cell::Missing)
            })
            .collect()
    }

    pub fn to_table(&self, results: &[MatchResult], left: &Table, right: &Table) -> Result<Table, LinkError> {
        let rows = results.iter().map(|m| self.project(m, left, right)).collect();
        Table::new(self.headers.clone(), rows)
    }
}
