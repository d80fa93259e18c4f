use super::{Graph, GraphSpec};
use crate::{CommandRegistry, Container, Error, Name, Result};

use std::collections::HashSet;

/// Resolves `spec` against `commands`, depth first.
///
/// Every relation/command pair is resolved before anything runs, so a spec
/// naming an unknown pair fails here rather than halfway through a write.
pub(crate) fn build(commands: &CommandRegistry, spec: &GraphSpec) -> Result<Graph> {
    let command = commands
        .get(spec.relation())
        .and_then(|set| set.get(spec.command()))
        .map_err(|_| {
            Error::not_found(
                "command",
                format!("{}.{}", spec.relation(), spec.command()),
            )
        })?;

    let mut keys = HashSet::new();
    let mut nodes = Vec::with_capacity(spec.children().len());

    for child in spec.children() {
        // Siblings may target the same relation, but each needs its own input
        // attribute.
        if !keys.insert(child.input_key()) {
            return Err(Error::invalid_argument(format!(
                "duplicate child input `{key}` under `{parent}`; give each `{relation}` \
                 child its own input key with `GraphSpec::key` or the `{{key: {relation}}}` \
                 alias",
                key = child.input_key(),
                parent = spec.relation(),
                relation = child.relation(),
            )));
        }

        nodes.push(build(commands, child)?);
    }

    Ok(Graph {
        root: command.clone(),
        key: spec.input_key().clone(),
        nodes,
        mappers: None,
    })
}

/// Fluent construction of a command graph against a container.
///
/// ```
/// # use rivet::{Container, GraphSpec};
/// # fn f(container: &Container) -> rivet::Result<()> {
/// let graph = container
///     .command_builder()
///     .create("users")
///     .child(GraphSpec::new("tasks", "create"))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct GraphBuilder<'a> {
    container: &'a Container,
    root: Option<GraphSpec>,
    children: Vec<GraphSpec>,
}

impl<'a> GraphBuilder<'a> {
    pub(crate) fn new(container: &'a Container) -> GraphBuilder<'a> {
        GraphBuilder {
            container,
            root: None,
            children: vec![],
        }
    }

    /// Sets the root relation/command pair.
    pub fn command(mut self, relation: impl Into<Name>, command: impl Into<Name>) -> Self {
        self.root = Some(GraphSpec::new(relation, command));
        self
    }

    pub fn create(self, relation: impl Into<Name>) -> Self {
        self.command(relation, "create")
    }

    pub fn update(self, relation: impl Into<Name>) -> Self {
        self.command(relation, "update")
    }

    pub fn delete(self, relation: impl Into<Name>) -> Self {
        self.command(relation, "delete")
    }

    pub fn child(mut self, child: GraphSpec) -> Self {
        self.children.push(child);
        self
    }

    /// The [`GraphSpec`] assembled so far.
    pub fn spec(&self) -> Option<GraphSpec> {
        let mut spec = self.root.clone()?;
        for child in &self.children {
            spec = spec.child(child.clone());
        }
        Some(spec)
    }

    pub fn build(&self) -> Result<Graph> {
        let Some(spec) = self.spec() else {
            return Err(Error::invalid_argument("graph builder has no root command"));
        };
        self.container.graph(&spec)
    }
}
