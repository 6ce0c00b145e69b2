use crate::{
    error::{PropertyError, QueryError},
    reflect::EntityDef,
    value::Value,
};
use derive_more::{Deref, DerefMut, IntoIterator};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::{collections::BTreeMap, sync::Arc};

///
/// Entity
///
/// One typed record of a declared class. Holds only explicitly assigned
/// properties ("changed data"): an unset property is a distinct state from
/// null, and assigning `Value::Null` never clears previously set data;
/// removal goes through `unset`.
///

#[derive(Clone, Debug)]
pub struct Entity {
    def: Arc<EntityDef>,
    values: BTreeMap<String, Value>,
    related: BTreeMap<String, Related>,
}

impl Entity {
    #[must_use]
    pub const fn new(def: Arc<EntityDef>) -> Self {
        Self {
            def,
            values: BTreeMap::new(),
            related: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn def(&self) -> &Arc<EntityDef> {
        &self.def
    }

    /// Assign a property value.
    ///
    /// Unknown names fail with `PropertyError::Undefined`, values that do not
    /// match the declared kind fail with `PropertyError::Type`, and `Null`
    /// is a no-op on an otherwise-holding record.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), PropertyError> {
        let value = value.into();

        let Some(property) = self.def.property(name) else {
            return Err(PropertyError::Undefined {
                entity: self.def.name.clone(),
                property: name.to_string(),
            });
        };

        if value.is_null() {
            return Ok(());
        }

        if !property.kind.admits(&value) {
            return Err(PropertyError::Type {
                entity: self.def.name.clone(),
                property: name.to_string(),
                expected: property.kind.label(),
                found: value.kind_name(),
            });
        }

        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Explicit removal; the only way to clear a previously set property.
    pub fn unset(&mut self, name: &str) {
        self.values.remove(name);
    }

    /// Value of a set property; `None` when unset or unknown.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    #[must_use]
    pub fn is_set(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Value of the primary property, when declared and set.
    #[must_use]
    pub fn primary_value(&self) -> Option<&Value> {
        self.def.primary().and_then(|p| self.values.get(&p.name))
    }

    /// Changed data only, keyed by property name.
    #[must_use]
    pub const fn changed(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    /// Snapshot of changed data keyed by property name.
    #[must_use]
    pub fn to_row(&self) -> BTreeMap<String, Value> {
        self.values.clone()
    }

    /// Fill properties not already set from another entity of the same class.
    pub fn merge(&mut self, other: &Self) -> Result<(), QueryError> {
        if self.def.name != other.def.name {
            return Err(QueryError::EntityMismatch {
                expected: self.def.name.clone(),
                found: other.def.name.clone(),
            });
        }

        for (name, value) in &other.values {
            if !self.values.contains_key(name) {
                self.values.insert(name.clone(), value.clone());
            }
        }

        Ok(())
    }

    /// Resolved association value attached under the association's property
    /// name, if any.
    #[must_use]
    pub fn related(&self, name: &str) -> Option<&Related> {
        self.related.get(name)
    }

    pub(crate) fn attach_related(&mut self, name: impl Into<String>, related: Related) {
        self.related.insert(name.into(), related);
    }
}

/// Serializes as a map of the set properties, with resolved associations
/// nested under their property names; nesting recurses through every
/// resolved level.
impl Serialize for Entity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.values.len() + self.related.len()))?;
        for (name, value) in &self.values {
            map.serialize_entry(name, value)?;
        }
        for (name, related) in &self.related {
            map.serialize_entry(name, related)?;
        }
        map.end()
    }
}

///
/// Related
///
/// One resolved association value: a single entity or an ordered collection,
/// depending on the declared cardinality.
///

#[derive(Clone, Debug)]
pub enum Related {
    One(Box<Entity>),
    Many(EntityCollection),
}

impl Related {
    #[must_use]
    pub fn as_one(&self) -> Option<&Entity> {
        if let Self::One(entity) = self {
            Some(entity)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn as_many(&self) -> Option<&EntityCollection> {
        if let Self::Many(collection) = self {
            Some(collection)
        } else {
            None
        }
    }
}

impl Serialize for Related {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::One(entity) => entity.serialize(serializer),
            Self::Many(collection) => collection.serialize(serializer),
        }
    }
}

///
/// EntityCollection
///
/// Ordered sequence of entities of one declared class. Created empty and
/// appended during association resolution.
///

#[derive(Clone, Debug, Deref, DerefMut, IntoIterator)]
pub struct EntityCollection {
    def: Arc<EntityDef>,
    #[deref]
    #[deref_mut]
    #[into_iterator(owned, ref, ref_mut)]
    entries: Vec<Entity>,
}

impl EntityCollection {
    #[must_use]
    pub const fn new(def: Arc<EntityDef>) -> Self {
        Self {
            def,
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub const fn def(&self) -> &Arc<EntityDef> {
        &self.def
    }

    /// Append an entity, rejecting instances of another class.
    pub fn push(&mut self, entity: Entity) -> Result<(), QueryError> {
        if entity.def().name != self.def.name {
            return Err(QueryError::EntityMismatch {
                expected: self.def.name.clone(),
                found: entity.def().name.clone(),
            });
        }

        self.entries.push(entity);
        Ok(())
    }
}

impl Serialize for EntityCollection {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(&self.entries)
    }
}
