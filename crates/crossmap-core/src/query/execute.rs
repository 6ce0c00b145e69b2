use crate::{
    adapter::{Row, SelectOp},
    association,
    connection::Connection,
    entity::{Entity, EntityCollection},
    error::{Error, QueryError},
    hybrid,
    mapper::Mapper,
    query::{CompareOp, Filter, OrderSpec, Page, Projection},
    reflect::EntityDef,
    value::Value,
};
use std::sync::Arc;
use tracing::debug;

/// Multi-row read. Widens the projection, runs the backend read (merged
/// across adapters for hybrid classes), then resolves requested associations
/// over the full result set.
pub(crate) fn select(
    conn: &Connection,
    def: &Arc<EntityDef>,
    filter: &Filter,
    order: &OrderSpec,
    page: Page,
    projection: &Projection,
    with: &[String],
) -> Result<EntityCollection, Error> {
    let mut projection = projection.clone();
    projection.widen(filter, order);

    debug!(
        entity = %def.name,
        hybrid = def.is_hybrid(),
        unbounded = page.is_unbounded(),
        "select"
    );

    let mut collection = if def.is_hybrid() {
        hybrid::select(conn, def, filter, order, page, &projection)?
    } else {
        let binding = def.first_adapter()?;
        let adapter = conn.adapter(&binding.adapter)?;

        let op = SelectOp {
            resource: Mapper::resource(def, &binding.adapter)?.to_string(),
            projection: projection.columns(def),
            filter: Mapper::unmap_filter(def, filter, &binding.adapter)?,
            order: Mapper::unmap_order(def, order)?,
            limit: page.limit,
            offset: page.offset,
        };

        collect(def, adapter.select(&op)?)?
    };

    if !with.is_empty() && !collection.is_empty() {
        association::resolve(conn, def, &mut collection, with)?;
    }

    Ok(collection)
}

/// Single-row read by primary key. A miss returns `None` and never invokes
/// the association resolver.
pub(crate) fn select_one(
    conn: &Connection,
    def: &Arc<EntityDef>,
    key: &Value,
    projection: &Projection,
    with: &[String],
) -> Result<Option<Entity>, Error> {
    debug!(entity = %def.name, hybrid = def.is_hybrid(), "select_one");

    let found = if def.is_hybrid() {
        hybrid::select_one(conn, def, key, projection)?
    } else {
        let primary = def.require_primary()?;
        let binding = def.first_adapter()?;
        let adapter = conn.adapter(&binding.adapter)?;

        let row = adapter.select_one(
            Mapper::resource(def, &binding.adapter)?,
            primary.column(),
            key,
            &projection.columns(def),
        )?;

        match row {
            Some(row) => Some(Mapper::map_entity(def, row)?),
            None => None,
        }
    };

    let Some(mut entity) = found else {
        return Ok(None);
    };

    if !with.is_empty() {
        association::resolve(conn, def, std::slice::from_mut(&mut entity), with)?;
    }

    Ok(Some(entity))
}

/// Insert one entity's changed data, returning the record's primary key.
pub(crate) fn insert(
    conn: &Connection,
    def: &Arc<EntityDef>,
    entity: Entity,
) -> Result<Value, Error> {
    if entity.changed().is_empty() {
        return Err(QueryError::EmptyPayload {
            entity: def.name.clone(),
        }
        .into());
    }

    debug!(entity = %def.name, hybrid = def.is_hybrid(), "insert");

    if def.is_hybrid() {
        return hybrid::insert(conn, def, entity);
    }

    let binding = def.first_adapter()?;
    let adapter = conn.adapter(&binding.adapter)?;

    let row = Mapper::unmap_entity(def, &entity);
    let generated = adapter.insert(Mapper::resource(def, &binding.adapter)?, row)?;

    let key = entity.primary_value().cloned().or(generated);
    match (key, def.primary()) {
        (Some(key), _) => Ok(key),
        (None, Some(_)) => Err(QueryError::PrimaryUnresolved {
            entity: def.name.clone(),
        }
        .into()),
        (None, None) => Ok(Value::Null),
    }
}

/// Update the record addressed by the entity's primary value with its
/// changed data. The primary property is identity, not payload: it scopes
/// the write and is stripped from the row even when locally changed.
pub(crate) fn update(
    conn: &Connection,
    def: &Arc<EntityDef>,
    entity: &Entity,
    filter: &Filter,
) -> Result<u64, Error> {
    let payload = update_payload(def, entity)?;
    let scope = update_scope(def, entity, filter)?;

    debug!(entity = %def.name, hybrid = def.is_hybrid(), "update");

    if def.is_hybrid() {
        return hybrid::update(conn, def, entity, &scope);
    }

    let binding = def.first_adapter()?;
    let adapter = conn.adapter(&binding.adapter)?;
    let raw = Mapper::unmap_filter(def, &scope, &binding.adapter)?;

    Ok(adapter.update(
        Mapper::resource(def, &binding.adapter)?,
        payload,
        &raw,
    )?)
}

/// Delete matching records. An empty filter is refused.
pub(crate) fn delete(
    conn: &Connection,
    def: &Arc<EntityDef>,
    filter: &Filter,
) -> Result<u64, Error> {
    if filter.is_empty() {
        return Err(QueryError::UnscopedDelete {
            entity: def.name.clone(),
        }
        .into());
    }

    debug!(entity = %def.name, hybrid = def.is_hybrid(), "delete");

    if def.is_hybrid() {
        return hybrid::delete(conn, def, filter);
    }

    let binding = def.first_adapter()?;
    let adapter = conn.adapter(&binding.adapter)?;
    let raw = Mapper::unmap_filter(def, filter, &binding.adapter)?;

    Ok(adapter.delete(Mapper::resource(def, &binding.adapter)?, &raw)?)
}

/// Primary-equality condition plus the caller's extra conditions. Updates
/// address one record by identity, so a class without a declared primary
/// cannot be updated and a missing primary value is an error, never an
/// unscoped write.
fn update_scope(def: &EntityDef, entity: &Entity, filter: &Filter) -> Result<Filter, QueryError> {
    let primary = def.require_primary()?;
    let Some(key) = entity.primary_value() else {
        return Err(QueryError::MissingPrimaryValue {
            entity: def.name.clone(),
        });
    };

    let mut scope = Filter::new();
    scope.push_checked(def, &primary.name, CompareOp::Eq, key.clone())?;

    for condition in filter.conditions() {
        scope.push_checked(def, &condition.property, condition.op, condition.value.clone())?;
    }

    Ok(scope)
}

/// Changed data as a backend row with the primary column stripped; fails
/// when nothing else remains.
fn update_payload(def: &EntityDef, entity: &Entity) -> Result<Row, QueryError> {
    let mut row = Mapper::unmap_entity(def, entity);
    if let Some(primary) = def.primary() {
        row.remove(primary.column());
    }

    if row.is_empty() {
        return Err(QueryError::EmptyPayload {
            entity: def.name.clone(),
        });
    }

    Ok(row)
}

pub(crate) fn collect(def: &Arc<EntityDef>, rows: Vec<Row>) -> Result<EntityCollection, Error> {
    let mut collection = EntityCollection::new(def.clone());
    for row in rows {
        let entity = Mapper::map_entity(def, row)?;
        collection.push(entity)?;
    }

    Ok(collection)
}
