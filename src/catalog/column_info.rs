//! Column identity and declaration metadata.

use crate::access::DataType;
use crate::catalog::table_info::TableId;
use crate::expression::Expression;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Column declaration used when creating a table
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub column_name: String,
    pub column_type: DataType,
}

impl ColumnInfo {
    pub fn new(column_name: impl Into<String>, column_type: DataType) -> Self {
        Self {
            column_name: column_name.into(),
            column_type,
        }
    }
}

/// Stable identity of a stored column: owning table plus ordinal position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnId {
    pub table_id: TableId,
    pub column_order: u32,
}

/// Handle to a column of a table.
///
/// Equality and hashing only look at the [`ColumnId`]; two handles to the
/// same table column are interchangeable no matter where they were cloned
/// from.
#[derive(Debug, Clone)]
pub struct Column {
    id: ColumnId,
    table_name: Arc<str>,
    name: Arc<str>,
    data_type: DataType,
}

impl Column {
    pub(crate) fn new(id: ColumnId, table_name: Arc<str>, info: &ColumnInfo) -> Self {
        Self {
            id,
            table_name,
            name: Arc::from(info.column_name.as_str()),
            data_type: info.column_type,
        }
    }

    pub fn id(&self) -> ColumnId {
        self.id
    }

    /// Column name as stored in the table
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn table_id(&self) -> TableId {
        self.id.table_id
    }

    /// Position of this column within a row of its table
    pub fn position(&self) -> usize {
        self.id.column_order as usize
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn is_boolean(&self) -> bool {
        self.data_type == DataType::Boolean
    }

    /// Bare column reference expression
    pub fn expr(&self) -> Expression {
        Expression::column(self)
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Column {}

impl Hash for Column {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table_name, self.name)
    }
}
