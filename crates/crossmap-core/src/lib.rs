//! Core runtime for CrossMap: entity reflection, values, the query engine,
//! the association resolver, and the hybrid coordinator over pluggable
//! backend adapters.
#![warn(unreachable_pub)]

pub mod adapter;
pub mod entity;
pub mod error;
pub mod mapper;
pub mod query;
pub mod reflect;
pub mod value;

mod association;
mod connection;
mod hybrid;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

pub use connection::Connection;
pub use error::Error;

///
/// Prelude
///
/// Prelude contains only domain vocabulary; errors, adapters, and the mapper
/// are imported explicitly.
///

pub mod prelude {
    pub use crate::{
        Connection,
        entity::{Entity, EntityCollection, Related},
        query::{CompareOp, OrderDirection},
        reflect::{
            AdapterBinding, AssociationDef, Cardinality, EntityDef, PropertyDef, PropertyKind,
        },
        value::Value,
    };
}
