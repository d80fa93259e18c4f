use crate::{Name, Value};

/// A declarative description of how to reshape tuples.
///
/// Definitions are plain values: two definitions with equal steps compile to
/// the same [`Pipeline`](super::Pipeline), whatever their names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MapperDef {
    /// Mapper name, unique within its relation.
    pub name: Name,

    /// Relation whose tuples this mapper shapes.
    pub relation: Name,

    /// Transformation steps, applied in order.
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Step {
    /// Rename an attribute, keeping its position
    Rename { from: Name, to: Name },

    /// Keep only the listed attributes, in the listed order
    Project(Vec<Name>),

    /// Drop the listed attributes
    Reject(Vec<Name>),

    /// Set an attribute when it is missing or null
    Default { attr: Name, value: Value },

    /// Convert an attribute's value to another type
    Coerce { attr: Name, to: Coercion },

    /// Move the listed attributes into a nested tuple stored under `into`
    Wrap { into: Name, attrs: Vec<Name> },

    /// Apply a nested mapper to the tuple, or list of tuples, under `attr`
    Nest { attr: Name, steps: Vec<Step> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Coercion {
    String,
    Integer,
    Bool,
}

impl MapperDef {
    pub fn new(relation: impl Into<Name>, name: impl Into<Name>) -> MapperDef {
        MapperDef {
            name: name.into(),
            relation: relation.into(),
            steps: vec![],
        }
    }

    pub fn rename(mut self, from: impl Into<Name>, to: impl Into<Name>) -> Self {
        self.steps.push(Step::Rename {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    pub fn project<N: Into<Name>>(mut self, attrs: impl IntoIterator<Item = N>) -> Self {
        self.steps
            .push(Step::Project(attrs.into_iter().map(Into::into).collect()));
        self
    }

    pub fn reject<N: Into<Name>>(mut self, attrs: impl IntoIterator<Item = N>) -> Self {
        self.steps
            .push(Step::Reject(attrs.into_iter().map(Into::into).collect()));
        self
    }

    pub fn default_value(mut self, attr: impl Into<Name>, value: impl Into<Value>) -> Self {
        self.steps.push(Step::Default {
            attr: attr.into(),
            value: value.into(),
        });
        self
    }

    pub fn coerce(mut self, attr: impl Into<Name>, to: Coercion) -> Self {
        self.steps.push(Step::Coerce {
            attr: attr.into(),
            to,
        });
        self
    }

    pub fn wrap<N: Into<Name>>(
        mut self,
        into: impl Into<Name>,
        attrs: impl IntoIterator<Item = N>,
    ) -> Self {
        self.steps.push(Step::Wrap {
            into: into.into(),
            attrs: attrs.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Shapes the nested value under `attr` with the steps of `nested`.
    pub fn nest(mut self, attr: impl Into<Name>, nested: MapperDef) -> Self {
        self.steps.push(Step::Nest {
            attr: attr.into(),
            steps: nested.steps,
        });
        self
    }
}
