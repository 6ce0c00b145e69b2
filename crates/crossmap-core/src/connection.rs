use crate::{
    adapter::Adapter,
    error::QueryError,
    query::{DeleteQuery, FindAllQuery, InsertQuery, SelectOneQuery, SelectQuery, UpdateQuery},
    reflect::EntityDef,
    value::Value,
};
use std::{collections::BTreeMap, sync::Arc};

///
/// Connection
///
/// Adapter registry and query entry point. Adapters are registered once under
/// a name; entity definitions reference those names through their bindings.
/// Queries borrow the connection for their whole lifetime, so adapters stay
/// registered while any query built from them is alive.
///

#[derive(Default)]
pub struct Connection {
    adapters: BTreeMap<String, Box<dyn Adapter>>,
}

impl Connection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under a name, replacing any previous registration.
    pub fn register(&mut self, name: impl Into<String>, adapter: impl Adapter + 'static) {
        self.adapters.insert(name.into(), Box::new(adapter));
    }

    #[must_use]
    pub fn has_adapter(&self, name: &str) -> bool {
        self.adapters.contains_key(name)
    }

    pub(crate) fn adapter(&self, name: &str) -> Result<&dyn Adapter, QueryError> {
        self.adapters
            .get(name)
            .map(|adapter| &**adapter)
            .ok_or_else(|| QueryError::AdapterNotRegistered {
                name: name.to_string(),
            })
    }

    /// Multi-row read over an entity class, with an optional projection.
    pub fn select(&self, def: &Arc<EntityDef>) -> Result<SelectQuery<'_>, QueryError> {
        SelectQuery::new(self, def)
    }

    /// Multi-row read returning every declared property.
    pub fn find_all(&self, def: &Arc<EntityDef>) -> Result<FindAllQuery<'_>, QueryError> {
        FindAllQuery::new(self, def)
    }

    /// Single-row read by primary key.
    pub fn select_one(
        &self,
        def: &Arc<EntityDef>,
        key: impl Into<Value>,
    ) -> Result<SelectOneQuery<'_>, QueryError> {
        SelectOneQuery::new(self, def, key.into())
    }

    /// Insert one entity's changed data.
    pub fn insert(&self, def: &Arc<EntityDef>) -> InsertQuery<'_> {
        InsertQuery::new(self, def)
    }

    /// Update matching records with one entity's changed data.
    pub fn update(&self, def: &Arc<EntityDef>) -> UpdateQuery<'_> {
        UpdateQuery::new(self, def)
    }

    /// Delete matching records. Requires at least one condition.
    pub fn delete(&self, def: &Arc<EntityDef>) -> DeleteQuery<'_> {
        DeleteQuery::new(self, def)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("adapters", &self.adapters.keys().collect::<Vec<_>>())
            .finish()
    }
}
