use crate::{
    connection::Connection,
    entity::{Entity, EntityCollection, Related},
    error::Error,
    query::{CompareOp, Filter, OrderSpec, Page, Projection, execute},
    reflect::{AssociationDef, Cardinality, EntityDef},
    value::Value,
};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};
use tracing::debug;

/// Resolve requested association paths over a result set.
///
/// Paths are grouped by head segment, so each association is fetched with
/// exactly one key-batched secondary query per level regardless of the result
/// set size; dotted tails recurse through the same machinery on the fetched
/// targets.
pub(crate) fn resolve(
    conn: &Connection,
    def: &Arc<EntityDef>,
    entities: &mut [Entity],
    with: &[String],
) -> Result<(), Error> {
    let mut grouped: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for path in with {
        match path.split_once('.') {
            Some((head, tail)) => grouped.entry(head).or_default().push(tail.to_string()),
            None => {
                grouped.entry(path.as_str()).or_default();
            }
        }
    }

    for (name, tails) in grouped {
        let association = def.require_association(name)?;
        resolve_one(conn, entities, association, &tails)?;
    }

    Ok(())
}

fn resolve_one(
    conn: &Connection,
    entities: &mut [Entity],
    association: &AssociationDef,
    tails: &[String],
) -> Result<(), Error> {
    let mut keys: BTreeSet<Value> = BTreeSet::new();
    for entity in entities.iter() {
        if let Some(value) = entity.get(&association.source_key) {
            if !value.is_null() {
                keys.insert(value.clone());
            }
        }
    }

    debug!(
        association = %association.property,
        target = %association.target.name,
        keys = keys.len(),
        "resolve"
    );

    let targets = if keys.is_empty() {
        EntityCollection::new(association.target.clone())
    } else {
        let mut filter = Filter::new();
        filter.push_checked(
            &association.target,
            &association.target_key,
            CompareOp::In,
            Value::List(keys.into_iter().collect()),
        )?;

        execute::select(
            conn,
            &association.target,
            &filter,
            &OrderSpec::new(),
            Page::default(),
            &Projection::new(),
            tails,
        )?
    };

    let mut buckets: BTreeMap<Value, Vec<Entity>> = BTreeMap::new();
    for target in targets {
        if let Some(key) = target.get(&association.target_key).cloned() {
            buckets.entry(key).or_default().push(target);
        }
    }

    for entity in entities.iter_mut() {
        let Some(key) = entity.get(&association.source_key).cloned() else {
            continue;
        };
        if key.is_null() {
            continue;
        }

        match association.cardinality {
            // a missing target leaves the association absent
            Cardinality::One => {
                if let Some(first) = buckets.get(&key).and_then(|b| b.first()) {
                    entity.attach_related(
                        association.property.clone(),
                        Related::One(Box::new(first.clone())),
                    );
                }
            }
            // a missing target yields an empty collection
            Cardinality::Many => {
                let mut collection = EntityCollection::new(association.target.clone());
                if let Some(bucket) = buckets.get(&key) {
                    for target in bucket {
                        collection.push(target.clone())?;
                    }
                }
                entity.attach_related(association.property.clone(), Related::Many(collection));
            }
        }
    }

    Ok(())
}
