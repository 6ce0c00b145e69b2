mod build;
pub(crate) mod execute;
mod filter;
mod order;
mod page;
mod projection;


pub use build::{DeleteQuery, FindAllQuery, InsertQuery, SelectOneQuery, SelectQuery, UpdateQuery};
pub use filter::{CompareOp, Condition, Filter};
pub use order::{OrderDirection, OrderSpec};
pub use page::Page;
pub use projection::Projection;

use crate::{
    connection::Connection,
    entity::{Entity, EntityCollection},
    error::Error,
    reflect::EntityDef,
    value::Value,
};
use std::sync::Arc;
use tracing::debug;

///
/// QueryOp
///
/// Closed sum of every operation the engine can execute. Values of this type
/// only exist after builder validation, so an op is executable by
/// construction; adding an operation means adding a variant here and an arm
/// to the executor.
///

#[derive(Clone, Debug)]
pub enum QueryOp {
    Select {
        filter: Filter,
        order: OrderSpec,
        page: Page,
        projection: Projection,
        with: Vec<String>,
    },
    SelectOne {
        key: Value,
        projection: Projection,
        with: Vec<String>,
    },
    FindAll {
        filter: Filter,
        order: OrderSpec,
        page: Page,
        with: Vec<String>,
    },
    Insert {
        entity: Entity,
    },
    Update {
        entity: Entity,
        filter: Filter,
    },
    Delete {
        filter: Filter,
    },
}

impl QueryOp {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Select { .. } => "select",
            Self::SelectOne { .. } => "select_one",
            Self::FindAll { .. } => "find_all",
            Self::Insert { .. } => "insert",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }
}

///
/// Query
///
/// A validated operation bound to a connection and an entity class, ready to
/// execute. Typed builders offer a typed `execute`; this form exists for
/// callers that dispatch over operations generically.
///

#[derive(Debug)]
pub struct Query<'c> {
    pub(crate) conn: &'c Connection,
    pub(crate) def: Arc<EntityDef>,
    pub(crate) op: QueryOp,
}

impl Query<'_> {
    #[must_use]
    pub const fn op(&self) -> &QueryOp {
        &self.op
    }

    pub fn execute(self) -> Result<QueryResult, Error> {
        let Self { conn, def, op } = self;

        debug!(entity = %def.name, op = op.label(), "dispatch");

        match op {
            QueryOp::Select {
                filter,
                order,
                page,
                projection,
                with,
            } => execute::select(conn, &def, &filter, &order, page, &projection, &with)
                .map(QueryResult::Collection),

            QueryOp::SelectOne {
                key,
                projection,
                with,
            } => execute::select_one(conn, &def, &key, &projection, &with).map(QueryResult::One),

            QueryOp::FindAll {
                filter,
                order,
                page,
                with,
            } => execute::select(conn, &def, &filter, &order, page, &Projection::new(), &with)
                .map(QueryResult::Collection),

            QueryOp::Insert { entity } => {
                execute::insert(conn, &def, entity).map(QueryResult::Key)
            }

            QueryOp::Update { entity, filter } => {
                execute::update(conn, &def, &entity, &filter).map(QueryResult::Affected)
            }

            QueryOp::Delete { filter } => {
                execute::delete(conn, &def, &filter).map(QueryResult::Affected)
            }
        }
    }
}

///
/// QueryResult
///

#[derive(Clone, Debug)]
pub enum QueryResult {
    Collection(EntityCollection),
    One(Option<Entity>),
    Key(Value),
    Affected(u64),
}

impl QueryResult {
    #[must_use]
    pub fn into_collection(self) -> Option<EntityCollection> {
        if let Self::Collection(collection) = self {
            Some(collection)
        } else {
            None
        }
    }

    #[must_use]
    pub fn into_one(self) -> Option<Option<Entity>> {
        if let Self::One(entity) = self {
            Some(entity)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn affected(&self) -> Option<u64> {
        if let Self::Affected(count) = self {
            Some(*count)
        } else {
            None
        }
    }
}
