use crate::{
    error::AdapterError,
    query::{CompareOp, OrderDirection},
    value::Value,
};
use std::collections::BTreeMap;

/// One backend record, keyed by backend column name.
pub type Row = BTreeMap<String, Value>;

///
/// RawCondition
///
/// Backend-level predicate. `column` is the mapped column name, never the
/// entity property name.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawCondition {
    pub column: String,
    pub op: CompareOp,
    pub value: Value,
}

///
/// SelectOp
///
/// Fully mapped multi-row read. An empty projection means all columns; a
/// limit of 0 means unbounded.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SelectOp {
    pub resource: String,
    pub projection: Vec<String>,
    pub filter: Vec<RawCondition>,
    pub order: Vec<(String, OrderDirection)>,
    pub limit: u32,
    pub offset: u32,
}

///
/// Adapter
///
/// Backend boundary. Adapters speak rows and raw conditions only; they never
/// see entity definitions, association metadata, or property names. Errors
/// are passed upward untouched.
///

pub trait Adapter {
    /// Multi-row read.
    fn select(&self, op: &SelectOp) -> Result<Vec<Row>, AdapterError>;

    /// Single-row read by one key column.
    fn select_one(
        &self,
        resource: &str,
        key_column: &str,
        key: &Value,
        projection: &[String],
    ) -> Result<Option<Row>, AdapterError>;

    /// Insert one row, returning a backend-generated key when the backend
    /// produced one.
    fn insert(&self, resource: &str, row: Row) -> Result<Option<Value>, AdapterError>;

    /// Update matching rows, returning the affected count.
    fn update(&self, resource: &str, row: Row, filter: &[RawCondition])
    -> Result<u64, AdapterError>;

    /// Delete matching rows, returning the affected count.
    fn delete(&self, resource: &str, filter: &[RawCondition]) -> Result<u64, AdapterError>;
}
