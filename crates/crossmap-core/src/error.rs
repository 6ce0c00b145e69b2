use thiserror::Error as ThisError;

///
/// QueryError
///
/// Malformed query construction or pre-execution failures. Raised at the
/// earliest possible point: builder methods validate property names and basic
/// type compatibility before any adapter is touched.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum QueryError {
    #[error("unknown property '{property}' on entity '{entity}'")]
    UnknownProperty { entity: String, property: String },

    #[error("unknown association '{property}' on entity '{entity}'")]
    UnknownAssociation { entity: String, property: String },

    #[error(
        "filter value of kind '{found}' is not admissible for property '{property}' ({expected}) on entity '{entity}'"
    )]
    FilterType {
        entity: String,
        property: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("entity '{entity}' declares no primary property")]
    NoPrimary { entity: String },

    #[error("entity '{entity}' has no primary value set")]
    MissingPrimaryValue { entity: String },

    #[error("nothing to persist for entity '{entity}'")]
    EmptyPayload { entity: String },

    #[error("refusing to delete '{entity}' without a filter scope")]
    UnscopedDelete { entity: String },

    #[error("expected an entity of class '{expected}', got '{found}'")]
    EntityMismatch { expected: String, found: String },

    #[error("entity '{entity}' declares no adapter binding")]
    NoAdapter { entity: String },

    #[error("no adapter registered under name '{name}'")]
    AdapterNotRegistered { name: String },

    #[error("entity '{entity}' is not bound to adapter '{adapter}'")]
    AdapterNotBound { entity: String, adapter: String },

    #[error("insert of '{entity}' finished without a known primary value")]
    PrimaryUnresolved { entity: String },

    #[error(
        "filter or ordering on property '{property}' is not usable for hybrid entity '{entity}': the property is not bound to the required adapter"
    )]
    HybridFilter { entity: String, property: String },
}

///
/// PropertyError
///
/// Raised by entity property assignment and by value mapping; propagated
/// unchanged through all mapping steps.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum PropertyError {
    #[error("undefined property '{property}' on entity '{entity}'")]
    Undefined { entity: String, property: String },

    #[error(
        "value of kind '{found}' is not valid for property '{property}' ({expected}) on entity '{entity}'"
    )]
    Type {
        entity: String,
        property: String,
        expected: &'static str,
        found: &'static str,
    },
}

///
/// AdapterError
///
/// Opaque backend failure. The core never wraps or rewrites these, so
/// backend-specific diagnostics surface to the caller verbatim.
///

#[derive(Debug, ThisError)]
#[error(transparent)]
pub struct AdapterError(#[from] Box<dyn std::error::Error + Send + Sync + 'static>);

impl AdapterError {
    /// Wrap any backend error.
    pub fn new(err: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>) -> Self {
        Self(err.into())
    }

    /// Convenience constructor for string-only diagnostics.
    pub fn message(msg: impl Into<String>) -> Self {
        Self(msg.into().into())
    }
}

///
/// Error
///
/// Top-level error surface. Every failure aborts the enclosing query; the
/// core performs no local recovery and no rollback of hybrid writes already
/// applied to earlier adapters.
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Property(#[from] PropertyError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),
}
