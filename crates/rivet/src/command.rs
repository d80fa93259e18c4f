mod association;
pub use association::Association;

use crate::{Cache, Error, Gateway, MapperSet, Name, Registry, Result, Tuple, Value};
use rivet_core::driver::operation;

use std::{fmt, sync::Arc};

/// Cache of decorated commands, keyed by what was decorated and how.
pub type CommandCache = Cache<CommandKey, Command>;

/// The commands of one relation, keyed by command name.
pub type CommandSet = Registry<Arc<Command>>;

/// Every command set, keyed by relation name.
pub type CommandRegistry = Registry<CommandSet>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Create,
    Update,
    Delete,
}

/// Whether a command reports a single tuple or a list.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    #[default]
    One,
    Many,
}

/// Identifies a decorated command in the command cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandKey {
    relation: Name,
    command: Name,
    filter: Tuple,
    mappers: Option<Name>,
    mapper: Option<Name>,
}

/// A named mutating operation bound to one relation.
///
/// Commands are immutable; every rebinding method returns a new command
/// sharing the gateway handle.
#[derive(Clone)]
pub struct Command {
    name: Name,
    relation: Name,
    kind: CommandKind,
    result: Cardinality,
    gateway: Arc<dyn Gateway>,
    dataset: Name,
    filter: Tuple,
    required: Vec<Name>,
    associations: Vec<Association>,
    cache: Option<CommandCache>,
    mappers: Option<MapperSet>,
    mapper: Option<Name>,
}

/// The parent tuple a graph child runs against.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Parent<'a> {
    pub(crate) relation: &'a Name,
    pub(crate) tuple: &'a Tuple,
}

impl Command {
    pub fn new(
        kind: CommandKind,
        name: impl Into<Name>,
        relation: impl Into<Name>,
        gateway: Arc<dyn Gateway>,
    ) -> Command {
        let relation = relation.into();

        Command {
            name: name.into(),
            dataset: relation.clone(),
            relation,
            kind,
            result: Cardinality::default(),
            gateway,
            filter: Tuple::new(),
            required: vec![],
            associations: vec![],
            cache: None,
            mappers: None,
            mapper: None,
        }
    }

    pub fn create(relation: impl Into<Name>, gateway: Arc<dyn Gateway>) -> Command {
        Command::new(CommandKind::Create, "create", relation, gateway)
    }

    pub fn update(relation: impl Into<Name>, gateway: Arc<dyn Gateway>) -> Command {
        Command::new(CommandKind::Update, "update", relation, gateway)
    }

    pub fn delete(relation: impl Into<Name>, gateway: Arc<dyn Gateway>) -> Command {
        Command::new(CommandKind::Delete, "delete", relation, gateway)
    }

    /// Writes to `dataset` instead of the dataset named after the relation.
    pub fn dataset(mut self, dataset: impl Into<Name>) -> Self {
        self.dataset = dataset.into();
        self
    }

    pub fn result(mut self, result: Cardinality) -> Self {
        self.result = result;
        self
    }

    /// Attributes that must be present and non-null in every written tuple.
    pub fn requires<N: Into<Name>>(mut self, attrs: impl IntoIterator<Item = N>) -> Self {
        self.required.extend(attrs.into_iter().map(Into::into));
        self
    }

    /// Injects `<singular parent>_id` from the parent's `id` when run as a
    /// graph child of `parent`.
    pub fn associates(mut self, parent: impl Into<Name>) -> Self {
        self.associations.push(Association::infer(&parent.into()));
        self
    }

    /// Injects `key` from the parent's `references` attribute when run as a
    /// graph child of `parent`.
    pub fn associates_by(
        mut self,
        parent: impl Into<Name>,
        key: impl Into<Name>,
        references: impl Into<Name>,
    ) -> Self {
        self.associations
            .push(Association::new(parent, key, references));
        self
    }

    /// Returns a copy restricted to tuples whose `attr` equals `value`.
    pub fn by(&self, attr: impl Into<Name>, value: impl Into<Value>) -> Command {
        let mut command = self.clone();
        command.filter.insert(attr, value);
        command
    }

    /// Returns a copy carrying `cache`.
    pub fn with_cache(&self, cache: CommandCache) -> Command {
        let mut command = self.clone();
        command.cache = Some(cache);
        command
    }

    /// Returns a copy whose results are shaped by `mappers`.
    pub fn with_mappers(&self, mappers: MapperSet) -> Command {
        let mut command = self.clone();
        command.mappers = Some(mappers);
        command
    }

    /// Returns a copy whose results are shaped by the mapper named `mapper`.
    ///
    /// Fails with not-found if the command carries no mapper of that name.
    /// With a cache bound, repeated calls return the same instance.
    pub fn map_with(&self, mapper: &str) -> Result<Arc<Command>> {
        let Some(mappers) = &self.mappers else {
            return Err(Error::not_found("mapper", mapper));
        };
        let name = mappers.get(mapper)?.name().clone();

        let mut key = self.key();
        key.mapper = Some(name.clone());

        Ok(self.cached(key, || {
            let mut command = self.clone();
            command.mapper = Some(name);
            command
        }))
    }

    /// Decorates the command with `mappers`, memoized in the command cache.
    pub(crate) fn decorate(&self, mappers: &MapperSet) -> Arc<Command> {
        let mut key = self.key();
        key.mappers = Some(mappers.relation().clone());

        self.cached(key, || self.with_mappers(mappers.clone()))
    }

    fn cached(&self, key: CommandKey, build: impl FnOnce() -> Command) -> Arc<Command> {
        match &self.cache {
            Some(cache) => cache.fetch_or_store(key, build),
            None => Arc::new(build()),
        }
    }

    pub fn key(&self) -> CommandKey {
        CommandKey {
            relation: self.relation.clone(),
            command: self.name.clone(),
            filter: self.filter.clone(),
            mappers: self.mappers.as_ref().map(|set| set.relation().clone()),
            mapper: self.mapper.clone(),
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn relation(&self) -> &Name {
        &self.relation
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn cardinality(&self) -> Cardinality {
        self.result
    }

    pub fn gateway(&self) -> &Arc<dyn Gateway> {
        &self.gateway
    }

    pub fn dataset_name(&self) -> &Name {
        &self.dataset
    }

    pub fn associations(&self) -> &[Association] {
        &self.associations
    }

    pub fn cache(&self) -> Option<&CommandCache> {
        self.cache.as_ref()
    }

    pub fn mappers(&self) -> Option<&MapperSet> {
        self.mappers.as_ref()
    }

    /// Registry path of the command: `relation.command`.
    pub fn path(&self) -> String {
        format!("{}.{}", self.relation, self.name)
    }

    /// Runs the command and shapes the result with its mappers.
    pub async fn call(&self, input: impl Into<Value>) -> Result<Value> {
        let result = self.exec(input.into(), None).await?;
        self.map_result(result)
    }

    pub(crate) fn map_result(&self, value: Value) -> Result<Value> {
        match &self.mappers {
            Some(mappers) => mappers.call(self.mapper.as_deref(), value),
            None => Ok(value),
        }
    }

    /// Runs the command against the gateway, returning tuples as stored.
    pub(crate) async fn exec(&self, input: Value, parent: Option<Parent<'_>>) -> Result<Value> {
        tracing::debug!(
            command = %self.path(),
            kind = ?self.kind,
            dataset = %self.dataset,
            "executing command"
        );

        match self.kind {
            CommandKind::Create => {
                let (tuples, many) = match input {
                    Value::Record(tuple) => (vec![tuple], false),
                    Value::List(items) => (
                        items
                            .into_iter()
                            .map(Value::into_record)
                            .collect::<Result<Vec<_>>>()?,
                        true,
                    ),
                    other => return Err(self.invalid_input(&other)),
                };

                let tuples = tuples
                    .into_iter()
                    .map(|mut tuple| {
                        self.associate(&mut tuple, parent)?;
                        self.validate(&tuple)?;
                        Ok(tuple)
                    })
                    .collect::<Result<Vec<_>>>()?;

                let stored = self.run(operation::Insert { tuples }.into()).await?;
                Ok(self.shape(stored, many))
            }
            CommandKind::Update => {
                let changes = match input {
                    Value::Record(tuple) => tuple,
                    Value::Null => Tuple::new(),
                    other => return Err(self.invalid_input(&other)),
                };
                self.validate(&changes)?;

                // Under a parent, only the parent's own tuples are updated.
                let mut filter = self.filter.clone();
                self.associate(&mut filter, parent)?;

                let op = operation::Update { filter, changes };
                let stored = self.run(op.into()).await?;
                Ok(self.shape(stored, false))
            }
            CommandKind::Delete => {
                let mut filter = self.filter.clone();
                match input {
                    Value::Record(tuple) => filter.merge(&tuple),
                    Value::Null => {}
                    other => return Err(self.invalid_input(&other)),
                }
                self.associate(&mut filter, parent)?;

                let stored = self.run(operation::Delete { filter }.into()).await?;
                Ok(self.shape(stored, false))
            }
        }
    }

    async fn run(&self, op: rivet_core::driver::Operation) -> Result<Vec<Tuple>> {
        self.gateway
            .exec(&self.dataset, op)
            .await?
            .into_tuples()
            .map_err(|err| err.context(rivet_core::err!("command `{}`", self.path())))
    }

    fn shape(&self, tuples: Vec<Tuple>, many: bool) -> Value {
        if many || self.result == Cardinality::Many {
            return tuples.into();
        }
        tuples.into_iter().next().map(Value::Record).unwrap_or_default()
    }

    /// Copies the parent's referenced attributes into `tuple`.
    ///
    /// A command with no associations configured falls back to the inferred
    /// `<singular parent>_id -> id` association.
    fn associate(&self, tuple: &mut Tuple, parent: Option<Parent<'_>>) -> Result<()> {
        let Some(parent) = parent else {
            return Ok(());
        };

        let inferred;
        let associations: Vec<&Association> = if self.associations.is_empty() {
            inferred = Association::infer(parent.relation);
            vec![&inferred]
        } else {
            self.associations
                .iter()
                .filter(|association| association.parent == *parent.relation)
                .collect()
        };

        for association in associations {
            association.apply(parent, tuple)?;
        }

        Ok(())
    }

    fn validate(&self, tuple: &Tuple) -> Result<()> {
        for attr in &self.required {
            if tuple.get(attr).map_or(true, Value::is_null) {
                return Err(Error::validation(format!(
                    "`{attr}` is required by `{}`",
                    self.path()
                )));
            }
        }
        Ok(())
    }

    fn invalid_input(&self, input: &Value) -> Error {
        Error::invalid_argument(format!(
            "`{}` cannot take a {} input",
            self.path(),
            input.type_name()
        ))
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("relation", &self.relation)
            .field("kind", &self.kind)
            .field("result", &self.result)
            .field("dataset", &self.dataset)
            .field("filter", &self.filter)
            .field("associations", &self.associations)
            .field("cached", &self.cache.is_some())
            .field("mappers", &self.mappers.as_ref().map(MapperSet::relation))
            .field("mapper", &self.mapper)
            .finish()
    }
}
