use crate::{Error, GraphSpec, Name, Result, Value};

use std::fmt;

/// What [`Container::command`](crate::Container::command) is asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandRequest {
    /// A single command, addressed as `relation.command`.
    Lookup(CommandPath),

    /// A command graph built from a nested spec.
    Graph(GraphSpec),

    /// A graph builder bound to the container.
    Builder,
}

/// Registry address of a command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandPath {
    pub relation: Name,
    pub command: Name,
}

impl CommandPath {
    pub fn new(relation: impl Into<Name>, command: impl Into<Name>) -> CommandPath {
        CommandPath {
            relation: relation.into(),
            command: command.into(),
        }
    }

    /// Parses `relation.command`. A path that does not name both parts cannot
    /// address any command and fails with not-found.
    pub fn parse(path: &str) -> Result<CommandPath> {
        match path.split_once('.') {
            Some((relation, command)) if !relation.is_empty() && !command.is_empty() => {
                Ok(CommandPath::new(relation, command))
            }
            _ => Err(Error::not_found("command", path)),
        }
    }
}

impl fmt::Display for CommandPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.relation, self.command)
    }
}

impl From<CommandPath> for CommandRequest {
    fn from(value: CommandPath) -> Self {
        CommandRequest::Lookup(value)
    }
}

impl From<GraphSpec> for CommandRequest {
    fn from(value: GraphSpec) -> Self {
        CommandRequest::Graph(value)
    }
}

impl TryFrom<&str> for CommandRequest {
    type Error = Error;

    fn try_from(path: &str) -> Result<CommandRequest> {
        CommandPath::parse(path).map(CommandRequest::Lookup)
    }
}

/// Untyped dispatch: null asks for a builder, a string is a command path and
/// a list is a nested graph spec. Anything else is a programming error.
impl TryFrom<Value> for CommandRequest {
    type Error = Error;

    fn try_from(value: Value) -> Result<CommandRequest> {
        match value {
            Value::Null => Ok(CommandRequest::Builder),
            Value::String(path) => CommandRequest::try_from(path.as_str()),
            value @ Value::List(_) => GraphSpec::try_from(&value).map(CommandRequest::Graph),
            other => Err(Error::invalid_argument(format!(
                "cannot dispatch a command from a {} value",
                other.type_name()
            ))),
        }
    }
}
