use crate::{error::QueryError, reflect::EntityDef, value::Value};
use serde::{Deserialize, Serialize};

///
/// CompareOp
///
/// Operator set shared by caller-facing predicates and the raw conditions
/// handed to adapters. `Like` is passed through untouched; its wildcard
/// dialect is the backend's business.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    Like,
}

///
/// Condition
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Condition {
    pub property: String,
    pub op: CompareOp,
    pub value: Value,
}

///
/// Filter
///
/// Conjunctive predicate list. Conditions are validated against the entity
/// reflection when appended, so a malformed filter fails at construction
/// time, before any adapter is invoked.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }

    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Property names referenced by this filter.
    pub fn properties(&self) -> impl Iterator<Item = &str> {
        self.conditions.iter().map(|c| c.property.as_str())
    }

    /// Validate and append one condition.
    pub(crate) fn push_checked(
        &mut self,
        def: &EntityDef,
        property: &str,
        op: CompareOp,
        value: Value,
    ) -> Result<(), QueryError> {
        let prop = def.require_property(property)?;

        let mismatch = |found: &'static str| QueryError::FilterType {
            entity: def.name.clone(),
            property: property.to_string(),
            expected: prop.kind.label(),
            found,
        };

        match op {
            CompareOp::In => {
                let Some(items) = value.as_list() else {
                    return Err(mismatch(value.kind_name()));
                };
                for item in items {
                    if !item.is_null() && !prop.kind.admits(item) {
                        return Err(mismatch(item.kind_name()));
                    }
                }
            }
            CompareOp::Like => {
                if value.as_text().is_none() {
                    return Err(mismatch(value.kind_name()));
                }
            }
            CompareOp::Eq | CompareOp::Ne => {
                if !value.is_null() && !prop.kind.admits(&value) {
                    return Err(mismatch(value.kind_name()));
                }
            }
            CompareOp::Lt | CompareOp::Lte | CompareOp::Gt | CompareOp::Gte => {
                if !prop.kind.admits(&value) {
                    return Err(mismatch(value.kind_name()));
                }
            }
        }

        self.conditions.push(Condition {
            property: property.to_string(),
            op,
            value,
        });

        Ok(())
    }
}
