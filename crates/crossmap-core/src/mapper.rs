use crate::{
    adapter::{RawCondition, Row},
    entity::Entity,
    error::{Error, PropertyError, QueryError},
    query::{Filter, OrderDirection, OrderSpec},
    reflect::{EntityDef, PropertyDef},
    value::Value,
};
use std::sync::Arc;

///
/// Mapper
///
/// Translation layer between entity space (property names, typed values) and
/// backend space (column names, rows). Pure and stateless; the same mapper
/// serves every adapter. Unknown backend columns are skipped on the way in,
/// so a wider backend row never poisons hydration.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct Mapper;

impl Mapper {
    /// Hydrate a backend row into an entity, keeping only columns that map
    /// to declared properties.
    pub fn map_entity(def: &Arc<EntityDef>, row: Row) -> Result<Entity, Error> {
        let mut entity = Entity::new(def.clone());

        for (column, value) in row {
            let Some(property) = def.properties.iter().find(|p| p.column() == column) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            let value = Self::map_value(&def.name, property, value)?;
            entity.set(&property.name, value)?;
        }

        Ok(entity)
    }

    /// Flatten an entity's changed data into a backend row.
    #[must_use]
    pub fn unmap_entity(def: &EntityDef, entity: &Entity) -> Row {
        let mut row = Row::new();

        for (name, value) in entity.changed() {
            if let Some(property) = def.property(name) {
                row.insert(
                    property.column().to_string(),
                    Self::unmap_value(property, value.clone()),
                );
            }
        }

        row
    }

    /// Flatten changed data restricted to properties bound to one adapter.
    #[must_use]
    pub fn unmap_entity_for(def: &EntityDef, entity: &Entity, adapter: &str) -> Row {
        let mut row = Row::new();

        for property in def.properties_for(adapter) {
            if let Some(value) = entity.get(&property.name) {
                row.insert(
                    property.column().to_string(),
                    Self::unmap_value(property, value.clone()),
                );
            }
        }

        row
    }

    /// Per-property hydration hook: validates the raw value against the
    /// declared kind. Backend-specific coercion would sit here.
    pub fn map_value(
        entity: &str,
        property: &PropertyDef,
        value: Value,
    ) -> Result<Value, PropertyError> {
        if !value.is_null() && !property.kind.admits(&value) {
            return Err(PropertyError::Type {
                entity: entity.to_string(),
                property: property.name.clone(),
                expected: property.kind.label(),
                found: value.kind_name(),
            });
        }

        Ok(value)
    }

    /// Per-property flattening hook, inverse of `map_value`.
    #[must_use]
    pub fn unmap_value(_property: &PropertyDef, value: Value) -> Value {
        value
    }

    /// Backend resource an entity maps to on one adapter.
    pub fn resource<'a>(def: &'a EntityDef, adapter: &str) -> Result<&'a str, QueryError> {
        def.binding(adapter)
            .map(|b| b.resource.as_str())
            .ok_or_else(|| QueryError::AdapterNotBound {
                entity: def.name.clone(),
                adapter: adapter.to_string(),
            })
    }

    /// Translate a validated filter into backend conditions for one adapter,
    /// restricted to properties bound to that adapter.
    pub fn unmap_filter(
        def: &EntityDef,
        filter: &Filter,
        adapter: &str,
    ) -> Result<Vec<RawCondition>, QueryError> {
        let mut out = Vec::with_capacity(filter.conditions().len());

        for condition in filter.conditions() {
            let property = def.require_property(&condition.property)?;
            if !property.is_bound_to(adapter) {
                return Err(QueryError::HybridFilter {
                    entity: def.name.clone(),
                    property: condition.property.clone(),
                });
            }
            out.push(RawCondition {
                column: property.column().to_string(),
                op: condition.op,
                value: condition.value.clone(),
            });
        }

        Ok(out)
    }

    /// Translate ordering to backend column names.
    pub fn unmap_order(
        def: &EntityDef,
        order: &OrderSpec,
    ) -> Result<Vec<(String, OrderDirection)>, QueryError> {
        let mut out = Vec::with_capacity(order.fields().len());

        for (name, direction) in order.fields() {
            let property = def.require_property(name)?;
            out.push((property.column().to_string(), *direction));
        }

        Ok(out)
    }

    /// Backend condition matching one key column against a set of values.
    #[must_use]
    pub fn key_in_condition(column: &str, keys: Vec<Value>) -> RawCondition {
        RawCondition {
            column: column.to_string(),
            op: crate::query::CompareOp::In,
            value: Value::List(keys),
        }
    }
}
