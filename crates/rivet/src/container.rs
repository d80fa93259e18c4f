mod builder;
pub use builder::{Builder, CommandDef, RelationDef, DEFAULT_GATEWAY};

mod request;
pub use request::{CommandPath, CommandRequest};

use crate::{
    graph, Command, CommandCache, CommandRegistry, CommandSet, Error, Gateway, Graph,
    GraphBuilder, GraphSpec, MapperCache, MapperCompiler, MapperSet, Registry, Relation, Result,
    Transaction, Value,
};

use std::sync::Arc;

/// The assembled runtime: gateways, relations, mappers and commands, wired
/// together once and never modified afterwards.
///
/// A container is shared by reference between tasks. It holds no global
/// state; every cache it uses is owned by it.
#[derive(Debug)]
pub struct Container {
    gateways: Registry<Arc<dyn Gateway>>,
    relations: Registry<Relation>,
    mappers: Registry<MapperSet>,
    commands: CommandRegistry,
    caches: Caches,
    compiler: MapperCompiler,
}

/// The memoization tables owned by a container.
#[derive(Debug, Clone)]
pub struct Caches {
    pub mappers: MapperCache,
    pub commands: CommandCache,
}

/// What [`Container::command`] resolved a request to.
#[derive(Debug)]
pub enum Dispatch<'a> {
    Command(Arc<Command>),
    Graph(Graph),
    Builder(GraphBuilder<'a>),
}

impl Container {
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Wires raw registries into a container.
    ///
    /// Mappers and commands are bound to this container's caches before
    /// relations are handed their command sets, so every relation carries
    /// already-wired commands.
    pub fn new(
        gateways: Registry<Arc<dyn Gateway>>,
        relations: Registry<Relation>,
        mappers: Registry<MapperSet>,
        commands: CommandRegistry,
    ) -> Container {
        let caches = Caches {
            mappers: MapperCache::new("mappers"),
            commands: CommandCache::new("commands"),
        };
        let compiler = MapperCompiler::new(caches.mappers.clone());

        let mappers = mappers.map(|_, set| set.with_compiler(&compiler));

        let commands = commands.map(|_, set| {
            set.map(|_, command| Arc::new(command.with_cache(caches.commands.clone())))
        });

        let relations = relations.map(|name, relation| {
            let set = match commands.get(name) {
                Ok(set) => set.clone(),
                Err(_) => CommandSet::new("command"),
            };
            relation.with_commands(set)
        });

        tracing::debug!(
            gateways = gateways.len(),
            relations = relations.len(),
            mappers = mappers.len(),
            commands = commands.values().map(Registry::len).sum::<usize>(),
            "container assembled"
        );

        Container {
            gateways,
            relations,
            mappers,
            commands,
            caches,
            compiler,
        }
    }

    pub fn gateways(&self) -> &Registry<Arc<dyn Gateway>> {
        &self.gateways
    }

    pub fn relations(&self) -> &Registry<Relation> {
        &self.relations
    }

    pub fn mappers(&self) -> &Registry<MapperSet> {
        &self.mappers
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn caches(&self) -> &Caches {
        &self.caches
    }

    pub fn mapper_compiler(&self) -> &MapperCompiler {
        &self.compiler
    }

    /// Returns the relation named `name`, carrying its mapper set when one is
    /// registered under the same name.
    pub fn relation(&self, name: &str) -> Result<Relation> {
        self.relation_with(name, |relation| relation)
    }

    /// Like [`relation`](Self::relation), refining the relation with `f`
    /// before the mapper set is attached.
    pub fn relation_with(
        &self,
        name: &str,
        f: impl FnOnce(Relation) -> Relation,
    ) -> Result<Relation> {
        let relation = f(self.relations.get(name)?.clone());

        Ok(match self.mappers.get(name) {
            Ok(mappers) => relation.with_mappers(mappers.clone()),
            Err(_) => relation,
        })
    }

    /// Resolves a command request.
    ///
    /// ```
    /// # use rivet::{Container, Dispatch, GraphSpec};
    /// # fn f(container: &Container) -> rivet::Result<()> {
    /// let Dispatch::Command(create) = container.command("users.create")? else {
    ///     unreachable!()
    /// };
    ///
    /// let graph = container.command(
    ///     GraphSpec::new("users", "create").child(GraphSpec::new("tasks", "create")),
    /// )?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn command<R>(&self, request: R) -> Result<Dispatch<'_>>
    where
        R: TryInto<CommandRequest>,
        R::Error: Into<Error>,
    {
        Ok(match request.try_into().map_err(Into::into)? {
            CommandRequest::Lookup(path) => {
                Dispatch::Command(self.command_at(&path.relation, &path.command)?)
            }
            CommandRequest::Graph(spec) => Dispatch::Graph(self.graph(&spec)?),
            CommandRequest::Builder => Dispatch::Builder(self.command_builder()),
        })
    }

    /// Untyped form of [`command`](Self::command).
    pub fn dispatch(&self, request: Value) -> Result<Dispatch<'_>> {
        self.command(request)
    }

    /// Returns the command `relation.command`, decorated with the relation's
    /// mapper set when one is registered.
    pub fn command_at(&self, relation: &str, command: &str) -> Result<Arc<Command>> {
        let found = self
            .commands
            .get(relation)
            .and_then(|set| set.get(command))
            .map_err(|_| Error::not_found("command", format!("{relation}.{command}")))?;

        Ok(match self.mappers.get(relation) {
            Ok(mappers) => found.decorate(mappers),
            Err(_) => found.clone(),
        })
    }

    /// Builds a command graph from `spec`. Graphs are not cached.
    pub fn graph(&self, spec: &GraphSpec) -> Result<Graph> {
        let graph = graph::build(&self.commands, spec)?;

        tracing::debug!(graph = %graph.name(), nodes = graph.nodes().len(), "graph built");

        Ok(match self.mappers.get(graph.name()) {
            Ok(mappers) => graph.with_mappers(mappers.clone()),
            Err(_) => graph,
        })
    }

    pub fn command_builder(&self) -> GraphBuilder<'_> {
        GraphBuilder::new(self)
    }

    /// Begins a transaction on the gateway named `gateway`.
    pub async fn transaction(&self, gateway: &str) -> Result<Transaction> {
        Transaction::begin(self.gateways.get(gateway)?).await
    }

    /// Disconnects every gateway and returns them for inspection.
    ///
    /// A gateway failing to disconnect does not stop the others from being
    /// released; the first failure is returned once all have been tried.
    /// Lookups keep working afterwards, but anything that reaches a gateway
    /// fails.
    pub async fn disconnect(&self) -> Result<&Registry<Arc<dyn Gateway>>> {
        let mut first_err = None;

        for (name, gateway) in &self.gateways {
            tracing::debug!(gateway = %name, "disconnecting gateway");

            if let Err(err) = gateway.disconnect().await {
                tracing::warn!(gateway = %name, error = %err, "gateway failed to disconnect");
                let err = err.context(rivet_core::err!("disconnecting gateway `{name}`"));
                first_err.get_or_insert(err);
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(&self.gateways),
        }
    }
}

impl Dispatch<'_> {
    pub fn into_command(self) -> Result<Arc<Command>> {
        match self {
            Dispatch::Command(command) => Ok(command),
            other => Err(other.unexpected("a command")),
        }
    }

    pub fn into_graph(self) -> Result<Graph> {
        match self {
            Dispatch::Graph(graph) => Ok(graph),
            other => Err(other.unexpected("a graph")),
        }
    }

    /// Runs the resolved command or graph. A builder has nothing to run.
    pub async fn call(&self, input: impl Into<Value>) -> Result<Value> {
        match self {
            Dispatch::Command(command) => command.call(input).await,
            Dispatch::Graph(graph) => graph.call(input).await,
            Dispatch::Builder(_) => Err(Error::invalid_argument(
                "a graph builder must be built before it is called",
            )),
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        let found = match self {
            Dispatch::Command(_) => "a command",
            Dispatch::Graph(_) => "a graph",
            Dispatch::Builder(_) => "a builder",
        };
        Error::invalid_argument(format!("expected {expected}, found {found}"))
    }
}
