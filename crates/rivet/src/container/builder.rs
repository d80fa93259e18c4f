use super::Container;
use crate::{
    command::Association, Cardinality, Command, CommandKind, CommandSet, Connect, Error, Gateway,
    Mapper, MapperDef, MapperSet, Name, Registry, Relation, Result, Tuple, Value,
};

use indexmap::IndexMap;

use std::sync::Arc;

/// Gateway a relation is bound to when none is named.
pub const DEFAULT_GATEWAY: &str = "default";

/// Collects component definitions and assembles them into a [`Container`].
#[derive(Debug, Default)]
pub struct Builder {
    gateways: Vec<(Name, Arc<dyn Gateway>)>,
    relations: Vec<RelationDef>,
    commands: Vec<CommandDef>,
    mappers: Vec<MapperDef>,

    /// Prepended to every dataset name
    dataset_prefix: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RelationDef {
    name: Name,
    gateway: Name,
    dataset: Option<Name>,
}

#[derive(Debug, Clone)]
pub struct CommandDef {
    name: Name,
    relation: Name,
    kind: CommandKind,
    result: Cardinality,
    dataset: Option<Name>,
    filter: Tuple,
    required: Vec<Name>,
    associations: Vec<Association>,
}

impl Builder {
    pub fn gateway(&mut self, name: impl Into<Name>, gateway: impl Gateway) -> &mut Self {
        self.shared_gateway(name, Arc::new(gateway))
    }

    /// Registers a gateway the caller keeps a handle to.
    pub fn shared_gateway(
        &mut self,
        name: impl Into<Name>,
        gateway: Arc<dyn Gateway>,
    ) -> &mut Self {
        self.gateways.push((name.into(), gateway));
        self
    }

    /// Resolves `url` to a gateway and registers it under `name`.
    pub async fn connect(&mut self, name: impl Into<Name>, url: &str) -> Result<&mut Self> {
        let gateway = Connect::new(url)?.connect().await?;
        Ok(self.shared_gateway(name, gateway))
    }

    /// Set the dataset name prefix for all relations and commands
    pub fn dataset_prefix(&mut self, prefix: &str) -> &mut Self {
        self.dataset_prefix = Some(prefix.to_string());
        self
    }

    pub fn relation(&mut self, def: RelationDef) -> &mut Self {
        self.relations.push(def);
        self
    }

    pub fn command(&mut self, def: CommandDef) -> &mut Self {
        self.commands.push(def);
        self
    }

    pub fn mapper(&mut self, def: MapperDef) -> &mut Self {
        self.mappers.push(def);
        self
    }

    /// Resolves the definitions and wires them into a container.
    ///
    /// Fails with not-found when a definition refers to an unknown gateway or
    /// relation, and with invalid-argument on duplicate names.
    pub fn build(&self) -> Result<Container> {
        let mut gateways = Registry::new("gateway");
        for (name, gateway) in &self.gateways {
            if gateways.insert(name.clone(), gateway.clone()).is_some() {
                return Err(duplicate("gateway", name));
            }
        }

        let mut relations = Registry::new("relation");
        for def in &self.relations {
            let gateway = gateways.get(&def.gateway)?.clone();
            let dataset = self.dataset(def.dataset.as_ref().unwrap_or(&def.name));
            let relation = Relation::new(&def.name, &def.gateway, gateway).dataset(dataset);

            if relations.insert(def.name.clone(), relation).is_some() {
                return Err(duplicate("relation", &def.name));
            }
        }

        let mut commands: IndexMap<Name, IndexMap<Name, Arc<Command>>> = IndexMap::new();
        for def in &self.commands {
            let relation: &Relation = relations.get(&def.relation)?;
            let dataset = match &def.dataset {
                Some(dataset) => self.dataset(dataset),
                None => relation.dataset_name().clone(),
            };
            let command = def.to_command(relation.gateway().clone(), dataset);

            let set = commands.entry(def.relation.clone()).or_default();
            if set.insert(def.name.clone(), Arc::new(command)).is_some() {
                return Err(duplicate("command", &format!("{}.{}", def.relation, def.name)));
            }
        }

        let mut mappers: IndexMap<Name, IndexMap<Name, Mapper>> = IndexMap::new();
        for def in &self.mappers {
            relations.get(&def.relation)?;

            let set = mappers.entry(def.relation.clone()).or_default();
            if set.insert(def.name.clone(), Mapper::new(def.clone())).is_some() {
                return Err(duplicate("mapper", &format!("{}.{}", def.relation, def.name)));
            }
        }

        Ok(Container::new(
            gateways,
            relations,
            Registry::from_entries(
                "mapper",
                mappers.into_iter().map(|(relation, set)| {
                    let mappers = MapperSet::new(&relation, set.into_values());
                    (relation, mappers)
                }),
            ),
            Registry::from_entries(
                "command",
                commands.into_iter().map(|(relation, set)| {
                    (relation, CommandSet::from_entries("command", set))
                }),
            ),
        ))
    }

    fn dataset(&self, name: &Name) -> Name {
        match &self.dataset_prefix {
            Some(prefix) => name.prefixed(prefix),
            None => name.clone(),
        }
    }
}

fn duplicate(kind: &str, name: &str) -> Error {
    Error::invalid_argument(format!("{kind} `{name}` is defined more than once"))
}

impl RelationDef {
    pub fn new(name: impl Into<Name>) -> RelationDef {
        RelationDef {
            name: name.into(),
            gateway: Name::from(DEFAULT_GATEWAY),
            dataset: None,
        }
    }

    pub fn gateway(mut self, gateway: impl Into<Name>) -> Self {
        self.gateway = gateway.into();
        self
    }

    pub fn dataset(mut self, dataset: impl Into<Name>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }
}

impl CommandDef {
    pub fn new(kind: CommandKind, name: impl Into<Name>, relation: impl Into<Name>) -> CommandDef {
        CommandDef {
            name: name.into(),
            relation: relation.into(),
            kind,
            result: Cardinality::default(),
            dataset: None,
            filter: Tuple::new(),
            required: vec![],
            associations: vec![],
        }
    }

    pub fn create(relation: impl Into<Name>) -> CommandDef {
        CommandDef::new(CommandKind::Create, "create", relation)
    }

    pub fn update(relation: impl Into<Name>) -> CommandDef {
        CommandDef::new(CommandKind::Update, "update", relation)
    }

    pub fn delete(relation: impl Into<Name>) -> CommandDef {
        CommandDef::new(CommandKind::Delete, "delete", relation)
    }

    pub fn result(mut self, result: Cardinality) -> Self {
        self.result = result;
        self
    }

    pub fn dataset(mut self, dataset: impl Into<Name>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }

    pub fn by(mut self, attr: impl Into<Name>, value: impl Into<Value>) -> Self {
        self.filter.insert(attr, value);
        self
    }

    pub fn requires<N: Into<Name>>(mut self, attrs: impl IntoIterator<Item = N>) -> Self {
        self.required.extend(attrs.into_iter().map(Into::into));
        self
    }

    pub fn associates(mut self, parent: impl Into<Name>) -> Self {
        self.associations.push(Association::infer(&parent.into()));
        self
    }

    pub fn associates_by(
        mut self,
        parent: impl Into<Name>,
        key: impl Into<Name>,
        references: impl Into<Name>,
    ) -> Self {
        self.associations.push(Association::new(parent, key, references));
        self
    }

    fn to_command(&self, gateway: Arc<dyn Gateway>, dataset: Name) -> Command {
        let mut command = Command::new(self.kind, &self.name, &self.relation, gateway)
            .dataset(dataset)
            .result(self.result)
            .requires(self.required.iter().cloned());

        for association in &self.associations {
            command = command.associates_by(
                &association.parent,
                &association.key,
                &association.references,
            );
        }

        for (attr, value) in &self.filter {
            command = command.by(attr, value.clone());
        }

        command
    }
}
