//! In-memory adapter and row helpers shared by the unit tests. The shared
//! state records every backend call so tests can assert on query shape, not
//! just results.

use crate::{
    adapter::{Adapter, RawCondition, Row, SelectOp},
    error::AdapterError,
    query::{CompareOp, OrderDirection},
    value::Value,
};
use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    rc::Rc,
};

///
/// MemoryState
///

#[derive(Default)]
pub(crate) struct MemoryState {
    tables: RefCell<BTreeMap<String, Vec<Row>>>,
    next_key: Cell<u64>,
    fail: Cell<bool>,
    pub(crate) selects: RefCell<Vec<SelectOp>>,
    pub(crate) select_ones: RefCell<Vec<(String, Value)>>,
    pub(crate) inserted: RefCell<Vec<(String, Row)>>,
    pub(crate) updates: RefCell<Vec<(String, Row, Vec<RawCondition>)>>,
    pub(crate) deletes: RefCell<Vec<(String, Vec<RawCondition>)>>,
}

impl MemoryState {
    pub(crate) fn shared() -> Rc<Self> {
        Rc::new(Self {
            next_key: Cell::new(1),
            ..Default::default()
        })
    }

    pub(crate) fn seed(&self, resource: &str, rows: Vec<Row>) {
        self.tables.borrow_mut().insert(resource.to_string(), rows);
    }

    pub(crate) fn rows(&self, resource: &str) -> Vec<Row> {
        self.tables
            .borrow()
            .get(resource)
            .cloned()
            .unwrap_or_default()
    }

    /// Make the next backend call fail with an opaque error.
    pub(crate) fn fail_next(&self) {
        self.fail.set(true);
    }

    fn check(&self) -> Result<(), AdapterError> {
        if self.fail.replace(false) {
            return Err(AdapterError::message("induced backend failure"));
        }
        Ok(())
    }
}

pub(crate) fn row(pairs: &[(&str, Value)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

///
/// MemoryAdapter
///

pub(crate) struct MemoryAdapter {
    state: Rc<MemoryState>,
    key_column: Option<String>,
}

impl MemoryAdapter {
    pub(crate) fn new(state: &Rc<MemoryState>) -> Self {
        Self {
            state: state.clone(),
            key_column: None,
        }
    }

    /// Generate ascending keys for rows inserted without this column.
    pub(crate) fn with_key_column(mut self, column: &str) -> Self {
        self.key_column = Some(column.to_string());
        self
    }
}

fn matches(row: &Row, condition: &RawCondition) -> bool {
    let value = row.get(&condition.column).cloned().unwrap_or(Value::Null);

    match condition.op {
        CompareOp::Eq => value == condition.value,
        CompareOp::Ne => value != condition.value,
        CompareOp::In => condition
            .value
            .as_list()
            .is_some_and(|items| items.contains(&value)),
        CompareOp::Lt => value < condition.value,
        CompareOp::Lte => value <= condition.value,
        CompareOp::Gt => value > condition.value,
        CompareOp::Gte => value >= condition.value,
        CompareOp::Like => match (value.as_text(), condition.value.as_text()) {
            (Some(text), Some(pattern)) => like_match(text, pattern),
            _ => false,
        },
    }
}

// % wildcards at either end only
fn like_match(text: &str, pattern: &str) -> bool {
    let starts = pattern.starts_with('%');
    let ends = pattern.ends_with('%') && pattern.len() > 1;
    let needle = pattern.trim_matches('%');

    match (starts, ends) {
        (true, true) => text.contains(needle),
        (true, false) => text.ends_with(needle),
        (false, true) => text.starts_with(needle),
        (false, false) => text == needle,
    }
}

fn project(row: &Row, columns: &[String]) -> Row {
    if columns.is_empty() {
        return row.clone();
    }

    row.iter()
        .filter(|(k, _)| columns.iter().any(|c| c == *k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

impl Adapter for MemoryAdapter {
    fn select(&self, op: &SelectOp) -> Result<Vec<Row>, AdapterError> {
        self.state.check()?;
        self.state.selects.borrow_mut().push(op.clone());

        let mut rows: Vec<Row> = self
            .state
            .rows(&op.resource)
            .into_iter()
            .filter(|row| op.filter.iter().all(|c| matches(row, c)))
            .collect();

        // stable sort per key, least significant first
        for (column, direction) in op.order.iter().rev() {
            rows.sort_by(|a, b| {
                let left = a.get(column).cloned().unwrap_or(Value::Null);
                let right = b.get(column).cloned().unwrap_or(Value::Null);
                let ordering = left.cmp(&right);
                match direction {
                    OrderDirection::Asc => ordering,
                    OrderDirection::Desc => ordering.reverse(),
                }
            });
        }

        let limit = if op.limit == 0 {
            usize::MAX
        } else {
            op.limit as usize
        };

        Ok(rows
            .into_iter()
            .skip(op.offset as usize)
            .take(limit)
            .map(|row| project(&row, &op.projection))
            .collect())
    }

    fn select_one(
        &self,
        resource: &str,
        key_column: &str,
        key: &Value,
        projection: &[String],
    ) -> Result<Option<Row>, AdapterError> {
        self.state.check()?;
        self.state
            .select_ones
            .borrow_mut()
            .push((resource.to_string(), key.clone()));

        let found = self
            .state
            .rows(resource)
            .into_iter()
            .find(|row| row.get(key_column) == Some(key));

        Ok(found.map(|row| project(&row, projection)))
    }

    fn insert(&self, resource: &str, mut row: Row) -> Result<Option<Value>, AdapterError> {
        self.state.check()?;

        let mut generated = None;
        if let Some(column) = &self.key_column {
            if !row.contains_key(column) {
                let next = self.state.next_key.get();
                self.state.next_key.set(next + 1);

                let key = Value::Uint(next);
                row.insert(column.clone(), key.clone());
                generated = Some(key);
            }
        }

        self.state
            .inserted
            .borrow_mut()
            .push((resource.to_string(), row.clone()));
        self.state
            .tables
            .borrow_mut()
            .entry(resource.to_string())
            .or_default()
            .push(row);

        Ok(generated)
    }

    fn update(
        &self,
        resource: &str,
        row: Row,
        filter: &[RawCondition],
    ) -> Result<u64, AdapterError> {
        self.state.check()?;
        self.state
            .updates
            .borrow_mut()
            .push((resource.to_string(), row.clone(), filter.to_vec()));

        let mut tables = self.state.tables.borrow_mut();
        let Some(stored) = tables.get_mut(resource) else {
            return Ok(0);
        };

        let mut affected = 0;
        for existing in stored.iter_mut() {
            if filter.iter().all(|c| matches(existing, c)) {
                for (column, value) in &row {
                    existing.insert(column.clone(), value.clone());
                }
                affected += 1;
            }
        }

        Ok(affected)
    }

    fn delete(&self, resource: &str, filter: &[RawCondition]) -> Result<u64, AdapterError> {
        self.state.check()?;
        self.state
            .deletes
            .borrow_mut()
            .push((resource.to_string(), filter.to_vec()));

        let mut tables = self.state.tables.borrow_mut();
        let Some(stored) = tables.get_mut(resource) else {
            return Ok(0);
        };

        let before = stored.len();
        stored.retain(|row| !filter.iter().all(|c| matches(row, c)));

        Ok((before - stored.len()) as u64)
    }
}
