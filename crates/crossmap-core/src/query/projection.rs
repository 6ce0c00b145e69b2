use crate::{
    error::QueryError,
    query::{filter::Filter, order::OrderSpec},
    reflect::EntityDef,
};

///
/// Projection
///
/// Requested output shape. Empty means "all properties". Once non-empty, the
/// primary property is force-included, and any property referenced by a
/// filter or ordering is added before execution so the backend returns the
/// data needed to evaluate them.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Projection {
    properties: Vec<String>,
}

impl Projection {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            properties: Vec::new(),
        }
    }

    #[must_use]
    pub fn properties(&self) -> &[String] {
        &self.properties
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Validate and append requested property names, then force-include the
    /// primary property.
    pub(crate) fn select_checked(
        &mut self,
        def: &EntityDef,
        names: &[&str],
    ) -> Result<(), QueryError> {
        for name in names {
            def.require_property(name)?;
            self.ensure(name);
        }

        if !self.properties.is_empty() {
            if let Some(primary) = def.primary() {
                self.ensure(&primary.name);
            }
        }

        Ok(())
    }

    /// Add referenced filter/order properties to a non-empty projection.
    pub(crate) fn widen(&mut self, filter: &Filter, order: &OrderSpec) {
        if self.properties.is_empty() {
            return;
        }

        let referenced: Vec<String> = filter
            .properties()
            .chain(order.properties())
            .map(ToString::to_string)
            .collect();
        for name in referenced {
            self.ensure(&name);
        }
    }

    /// Backend column names for this projection; empty = all columns.
    pub(crate) fn columns(&self, def: &EntityDef) -> Vec<String> {
        self.properties
            .iter()
            .filter_map(|name| def.property(name))
            .map(|p| p.column().to_string())
            .collect()
    }

    fn ensure(&mut self, name: &str) {
        if !self.properties.iter().any(|p| p == name) {
            self.properties.push(name.to_string());
        }
    }
}
