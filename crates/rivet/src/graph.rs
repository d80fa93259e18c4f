mod builder;
pub use builder::GraphBuilder;
pub(crate) use builder::build;

mod spec;
pub use spec::GraphSpec;

use crate::{command::Parent, Command, Error, MapperSet, Name, Result, Tuple, Value};

use async_recursion::async_recursion;
use std::sync::Arc;

/// An executable tree of commands.
///
/// Each node runs its command, then runs every child against the stored
/// parent tuple, in the order the children were specified. Children never run
/// before their parent's write has completed.
#[derive(Debug, Clone)]
pub struct Graph {
    root: Arc<Command>,
    key: Name,
    nodes: Vec<Graph>,
    mappers: Option<MapperSet>,
}

/// Stored parent tuple handed down to child nodes.
#[derive(Debug, Clone)]
struct Context {
    relation: Name,
    tuple: Tuple,
}

impl Graph {
    /// Name of the root relation.
    pub fn name(&self) -> &Name {
        self.root.relation()
    }

    /// Attribute of the parent input holding this node's input.
    pub fn key(&self) -> &Name {
        &self.key
    }

    pub fn root(&self) -> &Arc<Command> {
        &self.root
    }

    pub fn nodes(&self) -> &[Graph] {
        &self.nodes
    }

    pub fn is_leaf(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn mappers(&self) -> Option<&MapperSet> {
        self.mappers.as_ref()
    }

    /// Returns a copy whose aggregated result is shaped by `mappers`.
    pub fn with_mappers(&self, mappers: MapperSet) -> Graph {
        let mut graph = self.clone();
        graph.mappers = Some(mappers);
        graph
    }

    /// Runs the graph.
    ///
    /// A failing node fails the whole graph and siblings that have not run yet
    /// are skipped. Writes already made are not undone; wrap the call in a
    /// [`Transaction`](crate::Transaction) when that matters.
    pub async fn call(&self, input: impl Into<Value>) -> Result<Value> {
        let result = self.exec(input.into(), None).await?;

        match &self.mappers {
            Some(mappers) => mappers.call(None, result),
            None => Ok(result),
        }
    }

    #[async_recursion]
    async fn exec(&self, input: Value, context: Option<Context>) -> Result<Value> {
        let mut tuple = match input {
            Value::Record(tuple) => tuple,
            Value::List(items) => {
                let mut results = Vec::with_capacity(items.len());
                for item in items {
                    results.push(self.exec(item, context.clone()).await?);
                }
                return Ok(Value::List(results));
            }
            other => {
                let stored = self
                    .root
                    .exec(other, context.as_ref().map(Context::as_parent))
                    .await?;
                return self.root.map_result(stored);
            }
        };

        // Split the children's inputs off before the root sees the tuple.
        let inputs: Vec<Option<Value>> = self
            .nodes
            .iter()
            .map(|node| tuple.remove(node.key()))
            .collect();

        tracing::debug!(
            graph = %self.name(),
            command = %self.root.path(),
            children = self.nodes.len(),
            "executing graph node"
        );

        let stored = self
            .root
            .exec(Value::Record(tuple), context.as_ref().map(Context::as_parent))
            .await?;

        if inputs.iter().all(Option::is_none) {
            return self.root.map_result(stored);
        }

        let context = Context {
            relation: self.root.relation().clone(),
            tuple: self.parent_tuple(&stored)?,
        };

        let mut children = Vec::with_capacity(self.nodes.len());
        for (node, input) in self.nodes.iter().zip(inputs) {
            let Some(input) = input else {
                continue;
            };

            let result = node
                .exec(input, Some(context.clone()))
                .await
                .map_err(|err| err.context(rivet_core::err!("graph node `{}`", node.key())))?;
            children.push((node.key().clone(), result));
        }

        let mut result = self.root.map_result(stored)?.into_record()?;
        for (key, value) in children {
            result.insert(key, value);
        }

        Ok(Value::Record(result))
    }

    fn parent_tuple(&self, stored: &Value) -> Result<Tuple> {
        match stored {
            Value::Record(tuple) => Ok(tuple.clone()),
            Value::List(items) if items.len() == 1 => Ok(items[0].clone().into_record()?),
            Value::Null => Err(Error::validation(format!(
                "`{}` stored no tuple for its children",
                self.root.path()
            ))),
            _ => Err(Error::invalid_argument(format!(
                "`{}` stored several tuples; children need exactly one parent",
                self.root.path()
            ))),
        }
    }
}

impl Context {
    fn as_parent(&self) -> Parent<'_> {
        Parent {
            relation: &self.relation,
            tuple: &self.tuple,
        }
    }
}
