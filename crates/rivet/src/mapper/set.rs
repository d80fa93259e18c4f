use super::{Mapper, MapperCompiler};
use crate::{Name, Registry, Result, Value};

/// The mappers registered for one relation, keyed by mapper name.
///
/// The first registered mapper is the set's default.
#[derive(Debug, Clone)]
pub struct MapperSet {
    relation: Name,
    mappers: Registry<Mapper>,
}

impl MapperSet {
    pub fn new(relation: impl Into<Name>, mappers: impl IntoIterator<Item = Mapper>) -> MapperSet {
        let mappers = mappers
            .into_iter()
            .map(|mapper| (mapper.name().clone(), mapper));

        MapperSet {
            relation: relation.into(),
            mappers: Registry::from_entries("mapper", mappers),
        }
    }

    pub fn relation(&self) -> &Name {
        &self.relation
    }

    pub fn get(&self, name: &str) -> Result<&Mapper> {
        self.mappers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.mappers.contains(name)
    }

    /// The first registered mapper.
    pub fn default_mapper(&self) -> Option<&Mapper> {
        self.mappers.values().next()
    }

    pub fn len(&self) -> usize {
        self.mappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mapper> {
        self.mappers.values()
    }

    /// Returns a copy with every mapper bound to `compiler`.
    pub fn with_compiler(&self, compiler: &MapperCompiler) -> MapperSet {
        MapperSet {
            relation: self.relation.clone(),
            mappers: self
                .mappers
                .map(|_, mapper| mapper.with_compiler(compiler.clone())),
        }
    }

    /// Applies the mapper named `name`, or the default mapper when `name` is
    /// `None`. An empty set leaves the value untouched.
    pub fn call(&self, name: Option<&str>, value: Value) -> Result<Value> {
        let mapper = match name {
            Some(name) => self.get(name)?,
            None => match self.default_mapper() {
                Some(mapper) => mapper,
                None => return Ok(value),
            },
        };

        mapper.call(value)
    }
}
