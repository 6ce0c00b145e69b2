use crate::{
    adapter::SelectOp,
    connection::Connection,
    entity::{Entity, EntityCollection},
    error::{Error, QueryError},
    mapper::Mapper,
    query::{Filter, OrderSpec, Page, Projection},
    reflect::EntityDef,
    value::Value,
};
use std::{collections::BTreeMap, sync::Arc};
use tracing::debug;

//
// Coordinator for entity classes split across more than one adapter under a
// shared primary key. The first declared binding is authoritative: it decides
// row identity, filtering, ordering and pagination, and generates primary
// keys on insert. Writes fan out sequentially with no rollback; a failure
// aborts the query and leaves earlier adapters as they are.
//

/// Merged multi-row read. The authoritative adapter produces the row set;
/// secondaries are fetched with one key-batched query each and merged in.
pub(crate) fn select(
    conn: &Connection,
    def: &Arc<EntityDef>,
    filter: &Filter,
    order: &OrderSpec,
    page: Page,
    projection: &Projection,
) -> Result<EntityCollection, Error> {
    let first = def.first_adapter()?;
    let primary = def.require_primary()?;

    for name in order.properties() {
        let property = def.require_property(name)?;
        if !property.is_bound_to(&first.adapter) {
            return Err(QueryError::HybridFilter {
                entity: def.name.clone(),
                property: name.to_string(),
            }
            .into());
        }
    }

    let adapter = conn.adapter(&first.adapter)?;
    let op = SelectOp {
        resource: first.resource.clone(),
        projection: columns_for(def, projection, &first.adapter),
        filter: Mapper::unmap_filter(def, filter, &first.adapter)?,
        order: Mapper::unmap_order(def, order)?,
        limit: page.limit,
        offset: page.offset,
    };

    let mut entities = Vec::new();
    for row in adapter.select(&op)? {
        entities.push(Mapper::map_entity(def, row)?);
    }

    if entities.is_empty() {
        return Ok(EntityCollection::new(def.clone()));
    }

    let keys: Vec<Value> = entities
        .iter()
        .filter_map(|e| e.primary_value().cloned())
        .collect();

    for binding in def.adapters.iter().skip(1) {
        debug!(entity = %def.name, adapter = %binding.adapter, keys = keys.len(), "merge");

        let adapter = conn.adapter(&binding.adapter)?;
        let op = SelectOp {
            resource: binding.resource.clone(),
            projection: columns_for(def, projection, &binding.adapter),
            filter: vec![Mapper::key_in_condition(primary.column(), keys.clone())],
            order: Vec::new(),
            limit: 0,
            offset: 0,
        };

        let mut by_key: BTreeMap<Value, Entity> = BTreeMap::new();
        for row in adapter.select(&op)? {
            let secondary = Mapper::map_entity(def, row)?;
            if let Some(key) = secondary.primary_value().cloned() {
                by_key.insert(key, secondary);
            }
        }

        for entity in &mut entities {
            if let Some(key) = entity.primary_value() {
                if let Some(secondary) = by_key.get(key) {
                    entity.merge(secondary)?;
                }
            }
        }
    }

    let mut collection = EntityCollection::new(def.clone());
    for entity in entities {
        collection.push(entity)?;
    }

    Ok(collection)
}

/// Merged single-row read. A miss on the authoritative adapter is a miss for
/// the whole record; secondary misses just leave their properties unset.
pub(crate) fn select_one(
    conn: &Connection,
    def: &Arc<EntityDef>,
    key: &Value,
    projection: &Projection,
) -> Result<Option<Entity>, Error> {
    let first = def.first_adapter()?;
    let primary = def.require_primary()?;

    let adapter = conn.adapter(&first.adapter)?;
    let row = adapter.select_one(
        &first.resource,
        primary.column(),
        key,
        &columns_for(def, projection, &first.adapter),
    )?;

    let Some(row) = row else {
        return Ok(None);
    };
    let mut entity = Mapper::map_entity(def, row)?;

    for binding in def.adapters.iter().skip(1) {
        let adapter = conn.adapter(&binding.adapter)?;
        let row = adapter.select_one(
            &binding.resource,
            primary.column(),
            key,
            &columns_for(def, projection, &binding.adapter),
        )?;

        if let Some(row) = row {
            entity.merge(&Mapper::map_entity(def, row)?)?;
        }
    }

    Ok(Some(entity))
}

/// Sequential fan-out insert. A primary key generated by an earlier adapter
/// is set on the entity before later adapters run, so every fragment of the
/// record shares one key.
pub(crate) fn insert(
    conn: &Connection,
    def: &Arc<EntityDef>,
    mut entity: Entity,
) -> Result<Value, Error> {
    let mut key = entity.primary_value().cloned();

    for binding in &def.adapters {
        let adapter = conn.adapter(&binding.adapter)?;
        let row = Mapper::unmap_entity_for(def, &entity, &binding.adapter);
        if row.is_empty() {
            continue;
        }

        debug!(entity = %def.name, adapter = %binding.adapter, "insert fragment");
        let generated = adapter.insert(&binding.resource, row)?;

        if key.is_none() {
            if let Some(generated) = generated {
                if let Some(primary) = def.primary() {
                    entity.set(&primary.name, generated.clone())?;
                }
                key = Some(generated);
            }
        }
    }

    match (key, def.primary()) {
        (Some(key), _) => Ok(key),
        (None, Some(_)) => Err(QueryError::PrimaryUnresolved {
            entity: def.name.clone(),
        }
        .into()),
        (None, None) => Ok(Value::Null),
    }
}

/// Fan-out update. Each adapter receives the payload fragment bound to it;
/// every filter property must be bound to every participating adapter.
/// Counts are summed; no rollback on partial failure.
pub(crate) fn update(
    conn: &Connection,
    def: &Arc<EntityDef>,
    entity: &Entity,
    filter: &Filter,
) -> Result<u64, Error> {
    let primary_column = def.primary().map(|p| p.column().to_string());
    let mut affected = 0u64;

    for binding in &def.adapters {
        let adapter = conn.adapter(&binding.adapter)?;

        let mut row = Mapper::unmap_entity_for(def, entity, &binding.adapter);
        if let Some(column) = &primary_column {
            row.remove(column);
        }
        if row.is_empty() {
            continue;
        }

        let raw = Mapper::unmap_filter(def, filter, &binding.adapter)?;
        affected += adapter.update(&binding.resource, row, &raw)?;
    }

    Ok(affected)
}

/// Fan-out delete over every binding; counts are summed.
pub(crate) fn delete(
    conn: &Connection,
    def: &Arc<EntityDef>,
    filter: &Filter,
) -> Result<u64, Error> {
    let mut affected = 0u64;

    for binding in &def.adapters {
        let adapter = conn.adapter(&binding.adapter)?;
        let raw = Mapper::unmap_filter(def, filter, &binding.adapter)?;
        affected += adapter.delete(&binding.resource, &raw)?;
    }

    Ok(affected)
}

/// Projection columns restricted to one adapter's bound properties; the
/// primary column is always included so fragments can be joined back up.
fn columns_for(def: &EntityDef, projection: &Projection, adapter: &str) -> Vec<String> {
    if projection.is_empty() {
        return Vec::new();
    }

    let mut columns: Vec<String> = projection
        .properties()
        .iter()
        .filter_map(|name| def.property(name))
        .filter(|p| p.is_bound_to(adapter))
        .map(|p| p.column().to_string())
        .collect();

    if let Some(primary) = def.primary() {
        let column = primary.column();
        if !columns.iter().any(|c| c == column) {
            columns.push(column.to_string());
        }
    }

    columns
}
