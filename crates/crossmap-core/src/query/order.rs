use crate::{error::QueryError, reflect::EntityDef};
use serde::{Deserialize, Serialize};

///
/// OrderDirection
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

///
/// OrderSpec
///
/// Ordered list of (property, direction) sort keys; properties are validated
/// against the reflection when appended.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OrderSpec {
    fields: Vec<(String, OrderDirection)>,
}

impl OrderSpec {
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    #[must_use]
    pub fn fields(&self) -> &[(String, OrderDirection)] {
        &self.fields
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn properties(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub(crate) fn push_checked(
        &mut self,
        def: &EntityDef,
        property: &str,
        direction: OrderDirection,
    ) -> Result<(), QueryError> {
        def.require_property(property)?;
        self.fields.push((property.to_string(), direction));
        Ok(())
    }
}
