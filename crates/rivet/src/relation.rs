use crate::{Command, CommandSet, Error, Gateway, MapperSet, Name, Result, Tuple, Value};
use rivet_core::driver::operation;

use std::{fmt, sync::Arc};

/// A named, gateway-bound read view over a dataset.
///
/// Relations are values: every method that would change one returns a new
/// relation sharing the gateway handle.
#[derive(Clone)]
pub struct Relation {
    name: Name,
    gateway_name: Name,
    gateway: Arc<dyn Gateway>,
    dataset: Name,
    filter: Tuple,
    commands: CommandSet,
    mappers: Option<MapperSet>,
    mapper: Option<Name>,
}

impl Relation {
    pub fn new(
        name: impl Into<Name>,
        gateway_name: impl Into<Name>,
        gateway: Arc<dyn Gateway>,
    ) -> Relation {
        let name = name.into();

        Relation {
            dataset: name.clone(),
            name,
            gateway_name: gateway_name.into(),
            gateway,
            filter: Tuple::new(),
            commands: CommandSet::new("command"),
            mappers: None,
            mapper: None,
        }
    }

    /// Reads from `dataset` instead of the dataset named after the relation.
    pub fn dataset(mut self, dataset: impl Into<Name>) -> Self {
        self.dataset = dataset.into();
        self
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn gateway_name(&self) -> &Name {
        &self.gateway_name
    }

    pub fn gateway(&self) -> &Arc<dyn Gateway> {
        &self.gateway
    }

    pub fn dataset_name(&self) -> &Name {
        &self.dataset
    }

    pub fn commands(&self) -> &CommandSet {
        &self.commands
    }

    pub fn command(&self, name: &str) -> Result<&Arc<Command>> {
        self.commands
            .get(name)
            .map_err(|_| Error::not_found("command", format!("{}.{name}", self.name)))
    }

    pub fn mappers(&self) -> Option<&MapperSet> {
        self.mappers.as_ref()
    }

    pub fn has_mappers(&self) -> bool {
        self.mappers.as_ref().is_some_and(|set| !set.is_empty())
    }

    pub fn restriction(&self) -> &Tuple {
        &self.filter
    }

    /// Returns a copy carrying `commands`.
    pub fn with_commands(&self, commands: CommandSet) -> Relation {
        let mut relation = self.clone();
        relation.commands = commands;
        relation
    }

    /// Returns a copy whose tuples are shaped by `mappers`.
    pub fn with_mappers(&self, mappers: MapperSet) -> Relation {
        let mut relation = self.clone();
        relation.mappers = Some(mappers);
        relation
    }

    /// Returns a copy restricted to tuples whose `attr` equals `value`.
    pub fn filter(&self, attr: impl Into<Name>, value: impl Into<Value>) -> Relation {
        let mut relation = self.clone();
        relation.filter.insert(attr, value);
        relation
    }

    /// Returns a copy mapped by the mapper named `mapper` rather than the
    /// default one.
    pub fn map_with(&self, mapper: &str) -> Result<Relation> {
        let Some(mappers) = &self.mappers else {
            return Err(Error::not_found("mapper", format!("{}.{mapper}", self.name)));
        };
        let name = mappers.get(mapper)?.name().clone();

        let mut relation = self.clone();
        relation.mapper = Some(name);
        Ok(relation)
    }

    /// Reads every matching tuple, shaped by the selected mapper.
    pub async fn to_vec(&self) -> Result<Vec<Value>> {
        let tuples = self.read().await?;

        tuples
            .into_iter()
            .map(|tuple| self.map(Value::Record(tuple)))
            .collect()
    }

    pub async fn first(&self) -> Result<Option<Value>> {
        let Some(tuple) = self.read().await?.into_iter().next() else {
            return Ok(None);
        };
        self.map(Value::Record(tuple)).map(Some)
    }

    pub async fn count(&self) -> Result<usize> {
        Ok(self.read().await?.len())
    }

    async fn read(&self) -> Result<Vec<Tuple>> {
        let op = operation::Read {
            filter: self.filter.clone(),
        };
        self.gateway.exec(&self.dataset, op.into()).await?.into_tuples()
    }

    fn map(&self, value: Value) -> Result<Value> {
        match &self.mappers {
            Some(mappers) => mappers.call(self.mapper.as_deref(), value),
            None => Ok(value),
        }
    }
}

impl fmt::Debug for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relation")
            .field("name", &self.name)
            .field("gateway", &self.gateway_name)
            .field("dataset", &self.dataset)
            .field("filter", &self.filter)
            .field("commands", &self.commands.names().collect::<Vec<_>>())
            .field("mappers", &self.mappers.as_ref().map(MapperSet::relation))
            .field("mapper", &self.mapper)
            .finish()
    }
}
