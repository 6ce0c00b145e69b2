use crate::{error::QueryError, value::Value};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

///
/// PropertyKind
///
/// Runtime kind mirror of `Value`, used to validate assignments and filter
/// values before anything reaches an adapter.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum PropertyKind {
    Bool,
    Int,
    Uint,
    Float64,
    Text,
    Blob,
    List,
}

impl PropertyKind {
    /// Stable lowercase label used in error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Float64 => "float64",
            Self::Text => "text",
            Self::Blob => "blob",
            Self::List => "list",
        }
    }

    /// Returns true if a non-null value matches this kind.
    #[must_use]
    pub const fn admits(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Bool, Value::Bool(_))
                | (Self::Int, Value::Int(_))
                | (Self::Uint, Value::Uint(_))
                | (Self::Float64, Value::Float64(_))
                | (Self::Text, Value::Text(_))
                | (Self::Blob, Value::Blob(_))
                | (Self::List, Value::List(_))
        )
    }
}

///
/// PropertyDef
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PropertyDef {
    pub name: String,
    pub kind: PropertyKind,
    /// At most one property per entity is primary.
    pub primary: bool,
    /// Backend column name; `None` means the property name is used as-is.
    pub mapped: Option<String>,
    /// Adapter names this property is bound to; empty = every adapter.
    pub adapters: Vec<String>,
}

impl PropertyDef {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            kind,
            primary: false,
            mapped: None,
            adapters: Vec::new(),
        }
    }

    /// Mark this property as the primary property.
    #[must_use]
    pub const fn as_primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Override the backend column name.
    #[must_use]
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.mapped = Some(column.into());
        self
    }

    /// Restrict this property to a subset of the entity's adapters.
    #[must_use]
    pub fn bound_to<I, S>(mut self, adapters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.adapters = adapters.into_iter().map(Into::into).collect();
        self
    }

    /// Backend column name this property maps to.
    #[must_use]
    pub fn column(&self) -> &str {
        self.mapped.as_deref().unwrap_or(&self.name)
    }

    /// Returns true if this property lives on the given adapter.
    #[must_use]
    pub fn is_bound_to(&self, adapter: &str) -> bool {
        self.adapters.is_empty() || self.adapters.iter().any(|a| a == adapter)
    }
}

///
/// AdapterBinding
///
/// One (adapter name, backend resource) pair. Declaration order is
/// significant for hybrid entities: the first binding is authoritative.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AdapterBinding {
    pub adapter: String,
    pub resource: String,
}

///
/// Cardinality
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Cardinality {
    One,
    Many,
}

///
/// AssociationDef
///
/// Declared relation between an owning entity and a target entity. Locality
/// is derived, not declared: an association is remote when the target's
/// authoritative adapter differs from the owner's.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AssociationDef {
    /// Property name the resolved value is attached under.
    pub property: String,
    /// Key property on the owning entity.
    pub source_key: String,
    pub target: Arc<EntityDef>,
    /// Key property on the target entity.
    pub target_key: String,
    pub cardinality: Cardinality,
}

impl AssociationDef {
    #[must_use]
    pub fn new(
        property: impl Into<String>,
        source_key: impl Into<String>,
        target: Arc<EntityDef>,
        target_key: impl Into<String>,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            property: property.into(),
            source_key: source_key.into(),
            target,
            target_key: target_key.into(),
            cardinality,
        }
    }

    /// Remote associations cannot be expressed as a native join and are
    /// always resolved through a key-batched secondary query.
    #[must_use]
    pub fn is_remote(&self, owner: &EntityDef) -> bool {
        match (owner.adapters.first(), self.target.adapters.first()) {
            (Some(a), Some(b)) => a.adapter != b.adapter,
            _ => true,
        }
    }
}

///
/// EntityDef
///
/// Externally-supplied, read-only metadata for one entity class: property
/// list, adapter bindings (≥2 makes the entity hybrid), and declared
/// associations. Shared across queries behind an `Arc`.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EntityDef {
    pub name: String,
    pub properties: Vec<PropertyDef>,
    pub adapters: Vec<AdapterBinding>,
    pub associations: Vec<AssociationDef>,
}

impl EntityDef {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            adapters: Vec::new(),
            associations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_property(mut self, property: PropertyDef) -> Self {
        self.properties.push(property);
        self
    }

    #[must_use]
    pub fn with_adapter(mut self, adapter: impl Into<String>, resource: impl Into<String>) -> Self {
        self.adapters.push(AdapterBinding {
            adapter: adapter.into(),
            resource: resource.into(),
        });
        self
    }

    #[must_use]
    pub fn with_association(mut self, association: AssociationDef) -> Self {
        self.associations.push(association);
        self
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Property lookup that fails with the query-construction error.
    pub fn require_property(&self, name: &str) -> Result<&PropertyDef, QueryError> {
        self.property(name).ok_or_else(|| QueryError::UnknownProperty {
            entity: self.name.clone(),
            property: name.to_string(),
        })
    }

    #[must_use]
    pub fn primary(&self) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.primary)
    }

    pub fn require_primary(&self) -> Result<&PropertyDef, QueryError> {
        self.primary().ok_or_else(|| QueryError::NoPrimary {
            entity: self.name.clone(),
        })
    }

    #[must_use]
    pub fn association(&self, name: &str) -> Option<&AssociationDef> {
        self.associations.iter().find(|a| a.property == name)
    }

    pub fn require_association(&self, name: &str) -> Result<&AssociationDef, QueryError> {
        self.association(name)
            .ok_or_else(|| QueryError::UnknownAssociation {
                entity: self.name.clone(),
                property: name.to_string(),
            })
    }

    /// Properties split across more than one adapter under one primary key.
    #[must_use]
    pub fn is_hybrid(&self) -> bool {
        self.adapters.len() > 1
    }

    /// First declared binding; for hybrid entities this is the authoritative
    /// adapter for row identity and primary-key generation.
    pub fn first_adapter(&self) -> Result<&AdapterBinding, QueryError> {
        self.adapters.first().ok_or_else(|| QueryError::NoAdapter {
            entity: self.name.clone(),
        })
    }

    #[must_use]
    pub fn binding(&self, adapter: &str) -> Option<&AdapterBinding> {
        self.adapters.iter().find(|b| b.adapter == adapter)
    }

    /// Properties bound to the given adapter.
    pub fn properties_for<'a>(
        &'a self,
        adapter: &'a str,
    ) -> impl Iterator<Item = &'a PropertyDef> + 'a {
        self.properties.iter().filter(move |p| p.is_bound_to(adapter))
    }
}
