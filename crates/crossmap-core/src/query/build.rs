use crate::{
    connection::Connection,
    entity::{Entity, EntityCollection},
    error::{Error, QueryError},
    query::{
        CompareOp, Filter, OrderDirection, OrderSpec, Page, Projection, Query, QueryOp, execute,
    },
    reflect::EntityDef,
    value::Value,
};
use std::sync::Arc;

/// Walk a dotted association path against the reflection graph.
fn validate_with_path(def: &EntityDef, path: &str) -> Result<(), QueryError> {
    let mut current = def;
    for segment in path.split('.') {
        let association = current.require_association(segment)?;
        current = &association.target;
    }

    Ok(())
}

///
/// SelectQuery
///
/// Multi-row read builder. Every refinement validates against the entity
/// reflection immediately, so an invalid query never reaches `execute`.
///

#[derive(Debug)]
pub struct SelectQuery<'c> {
    conn: &'c Connection,
    def: Arc<EntityDef>,
    filter: Filter,
    order: OrderSpec,
    page: Page,
    projection: Projection,
    with: Vec<String>,
}

impl<'c> SelectQuery<'c> {
    pub(crate) fn new(conn: &'c Connection, def: &Arc<EntityDef>) -> Result<Self, QueryError> {
        def.first_adapter()?;

        Ok(Self {
            conn,
            def: def.clone(),
            filter: Filter::new(),
            order: OrderSpec::new(),
            page: Page::default(),
            projection: Projection::new(),
            with: Vec::new(),
        })
    }

    /// Add one conjunctive condition.
    pub fn filter(
        mut self,
        property: &str,
        op: CompareOp,
        value: impl Into<Value>,
    ) -> Result<Self, QueryError> {
        self.filter
            .push_checked(&self.def, property, op, value.into())?;
        Ok(self)
    }

    /// Append a sort key; earlier keys take precedence.
    pub fn order_by(
        mut self,
        property: &str,
        direction: OrderDirection,
    ) -> Result<Self, QueryError> {
        self.order.push_checked(&self.def, property, direction)?;
        Ok(self)
    }

    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.page.limit = limit;
        self
    }

    #[must_use]
    pub const fn offset(mut self, offset: u32) -> Self {
        self.page.offset = offset;
        self
    }

    /// Restrict the output shape to the named properties.
    pub fn select(mut self, properties: &[&str]) -> Result<Self, QueryError> {
        self.projection.select_checked(&self.def, properties)?;
        Ok(self)
    }

    /// Request eager resolution of an association path. Dotted paths resolve
    /// nested associations level by level.
    pub fn with(mut self, path: &str) -> Result<Self, QueryError> {
        validate_with_path(&self.def, path)?;
        self.with.push(path.to_string());
        Ok(self)
    }

    pub fn execute(self) -> Result<EntityCollection, Error> {
        execute::select(
            self.conn,
            &self.def,
            &self.filter,
            &self.order,
            self.page,
            &self.projection,
            &self.with,
        )
    }

    #[must_use]
    pub fn build(self) -> Query<'c> {
        Query {
            conn: self.conn,
            def: self.def,
            op: QueryOp::Select {
                filter: self.filter,
                order: self.order,
                page: self.page,
                projection: self.projection,
                with: self.with,
            },
        }
    }
}

///
/// FindAllQuery
///
/// Multi-row read without a projection: every declared property comes back.
/// Otherwise identical to `SelectQuery`.
///

#[derive(Debug)]
pub struct FindAllQuery<'c> {
    conn: &'c Connection,
    def: Arc<EntityDef>,
    filter: Filter,
    order: OrderSpec,
    page: Page,
    with: Vec<String>,
}

impl<'c> FindAllQuery<'c> {
    pub(crate) fn new(conn: &'c Connection, def: &Arc<EntityDef>) -> Result<Self, QueryError> {
        def.first_adapter()?;

        Ok(Self {
            conn,
            def: def.clone(),
            filter: Filter::new(),
            order: OrderSpec::new(),
            page: Page::default(),
            with: Vec::new(),
        })
    }

    pub fn filter(
        mut self,
        property: &str,
        op: CompareOp,
        value: impl Into<Value>,
    ) -> Result<Self, QueryError> {
        self.filter
            .push_checked(&self.def, property, op, value.into())?;
        Ok(self)
    }

    pub fn order_by(
        mut self,
        property: &str,
        direction: OrderDirection,
    ) -> Result<Self, QueryError> {
        self.order.push_checked(&self.def, property, direction)?;
        Ok(self)
    }

    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.page.limit = limit;
        self
    }

    #[must_use]
    pub const fn offset(mut self, offset: u32) -> Self {
        self.page.offset = offset;
        self
    }

    pub fn with(mut self, path: &str) -> Result<Self, QueryError> {
        validate_with_path(&self.def, path)?;
        self.with.push(path.to_string());
        Ok(self)
    }

    pub fn execute(self) -> Result<EntityCollection, Error> {
        execute::select(
            self.conn,
            &self.def,
            &self.filter,
            &self.order,
            self.page,
            &Projection::new(),
            &self.with,
        )
    }

    #[must_use]
    pub fn build(self) -> Query<'c> {
        Query {
            conn: self.conn,
            def: self.def,
            op: QueryOp::FindAll {
                filter: self.filter,
                order: self.order,
                page: self.page,
                with: self.with,
            },
        }
    }
}

///
/// SelectOneQuery
///
/// Single-row read by primary key. Construction fails when the class has no
/// primary property or the key does not match its kind.
///

#[derive(Debug)]
pub struct SelectOneQuery<'c> {
    conn: &'c Connection,
    def: Arc<EntityDef>,
    key: Value,
    projection: Projection,
    with: Vec<String>,
}

impl<'c> SelectOneQuery<'c> {
    pub(crate) fn new(
        conn: &'c Connection,
        def: &Arc<EntityDef>,
        key: Value,
    ) -> Result<Self, QueryError> {
        def.first_adapter()?;
        let primary = def.require_primary()?;

        if key.is_null() || !primary.kind.admits(&key) {
            return Err(QueryError::FilterType {
                entity: def.name.clone(),
                property: primary.name.clone(),
                expected: primary.kind.label(),
                found: key.kind_name(),
            });
        }

        Ok(Self {
            conn,
            def: def.clone(),
            key,
            projection: Projection::new(),
            with: Vec::new(),
        })
    }

    pub fn select(mut self, properties: &[&str]) -> Result<Self, QueryError> {
        self.projection.select_checked(&self.def, properties)?;
        Ok(self)
    }

    pub fn with(mut self, path: &str) -> Result<Self, QueryError> {
        validate_with_path(&self.def, path)?;
        self.with.push(path.to_string());
        Ok(self)
    }

    /// Returns `None` on a miss; association resolution only runs on a hit.
    pub fn execute(self) -> Result<Option<Entity>, Error> {
        execute::select_one(self.conn, &self.def, &self.key, &self.projection, &self.with)
    }

    #[must_use]
    pub fn build(self) -> Query<'c> {
        Query {
            conn: self.conn,
            def: self.def,
            op: QueryOp::SelectOne {
                key: self.key,
                projection: self.projection,
                with: self.with,
            },
        }
    }
}

///
/// InsertQuery
///

#[derive(Debug)]
pub struct InsertQuery<'c> {
    conn: &'c Connection,
    def: Arc<EntityDef>,
    entity: Option<Entity>,
}

impl<'c> InsertQuery<'c> {
    pub(crate) fn new(conn: &'c Connection, def: &Arc<EntityDef>) -> Self {
        Self {
            conn,
            def: def.clone(),
            entity: None,
        }
    }

    /// Provide the entity whose changed data is persisted.
    pub fn entity(mut self, entity: Entity) -> Result<Self, QueryError> {
        if entity.def().name != self.def.name {
            return Err(QueryError::EntityMismatch {
                expected: self.def.name.clone(),
                found: entity.def().name.clone(),
            });
        }
        if entity.changed().is_empty() {
            return Err(QueryError::EmptyPayload {
                entity: self.def.name.clone(),
            });
        }

        self.entity = Some(entity);
        Ok(self)
    }

    /// Returns the primary key of the inserted record: the value set on the
    /// entity, or the backend-generated one.
    pub fn execute(self) -> Result<Value, Error> {
        let entity = self.entity.ok_or_else(|| QueryError::EmptyPayload {
            entity: self.def.name.clone(),
        })?;

        execute::insert(self.conn, &self.def, entity)
    }

    pub fn build(self) -> Result<Query<'c>, QueryError> {
        let entity = self.entity.ok_or_else(|| QueryError::EmptyPayload {
            entity: self.def.name.clone(),
        })?;

        Ok(Query {
            conn: self.conn,
            def: self.def,
            op: QueryOp::Insert { entity },
        })
    }
}

///
/// UpdateQuery
///

#[derive(Debug)]
pub struct UpdateQuery<'c> {
    conn: &'c Connection,
    def: Arc<EntityDef>,
    entity: Option<Entity>,
    filter: Filter,
}

impl<'c> UpdateQuery<'c> {
    pub(crate) fn new(conn: &'c Connection, def: &Arc<EntityDef>) -> Self {
        Self {
            conn,
            def: def.clone(),
            entity: None,
            filter: Filter::new(),
        }
    }

    pub fn entity(mut self, entity: Entity) -> Result<Self, QueryError> {
        if entity.def().name != self.def.name {
            return Err(QueryError::EntityMismatch {
                expected: self.def.name.clone(),
                found: entity.def().name.clone(),
            });
        }

        self.entity = Some(entity);
        Ok(self)
    }

    pub fn filter(
        mut self,
        property: &str,
        op: CompareOp,
        value: impl Into<Value>,
    ) -> Result<Self, QueryError> {
        self.filter
            .push_checked(&self.def, property, op, value.into())?;
        Ok(self)
    }

    /// Returns the affected record count.
    pub fn execute(self) -> Result<u64, Error> {
        let entity = self.entity.ok_or_else(|| QueryError::EmptyPayload {
            entity: self.def.name.clone(),
        })?;

        execute::update(self.conn, &self.def, &entity, &self.filter)
    }

    pub fn build(self) -> Result<Query<'c>, QueryError> {
        let entity = self.entity.ok_or_else(|| QueryError::EmptyPayload {
            entity: self.def.name.clone(),
        })?;

        Ok(Query {
            conn: self.conn,
            def: self.def,
            op: QueryOp::Update {
                entity,
                filter: self.filter,
            },
        })
    }
}

///
/// DeleteQuery
///
/// Deletion requires at least one condition; an unscoped delete is refused
/// at execution rather than silently emptying a resource.
///

#[derive(Debug)]
pub struct DeleteQuery<'c> {
    conn: &'c Connection,
    def: Arc<EntityDef>,
    filter: Filter,
}

impl<'c> DeleteQuery<'c> {
    pub(crate) fn new(conn: &'c Connection, def: &Arc<EntityDef>) -> Self {
        Self {
            conn,
            def: def.clone(),
            filter: Filter::new(),
        }
    }

    pub fn filter(
        mut self,
        property: &str,
        op: CompareOp,
        value: impl Into<Value>,
    ) -> Result<Self, QueryError> {
        self.filter
            .push_checked(&self.def, property, op, value.into())?;
        Ok(self)
    }

    /// Returns the affected record count.
    pub fn execute(self) -> Result<u64, Error> {
        execute::delete(self.conn, &self.def, &self.filter)
    }

    #[must_use]
    pub fn build(self) -> Query<'c> {
        Query {
            conn: self.conn,
            def: self.def,
            op: QueryOp::Delete {
                filter: self.filter,
            },
        }
    }
}
