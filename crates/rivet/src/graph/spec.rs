use crate::{Error, Name, Result, Value};

/// A nested description of a command graph: a relation/command pair plus the
/// specs of the commands to run for each of its children.
///
/// The untyped canonical form is `[relation, [command, [child, ...]]]`, or
/// `[relation, [command]]` for a leaf. The relation may be given as a
/// single-entry record `{key: relation}` to read the child's input from an
/// attribute other than the relation name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphSpec {
    relation: Name,
    command: Name,
    key: Option<Name>,
    children: Vec<GraphSpec>,
}

impl GraphSpec {
    pub fn new(relation: impl Into<Name>, command: impl Into<Name>) -> GraphSpec {
        GraphSpec {
            relation: relation.into(),
            command: command.into(),
            key: None,
            children: vec![],
        }
    }

    /// Reads this node's input from the `key` attribute of its parent's input
    /// rather than from the attribute named after the relation.
    pub fn key(mut self, key: impl Into<Name>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn child(mut self, child: GraphSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn relation(&self) -> &Name {
        &self.relation
    }

    pub fn command(&self) -> &Name {
        &self.command
    }

    /// Attribute holding this node's input within the parent's input.
    pub fn input_key(&self) -> &Name {
        self.key.as_ref().unwrap_or(&self.relation)
    }

    pub fn children(&self) -> &[GraphSpec] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

impl TryFrom<&Value> for GraphSpec {
    type Error = Error;

    fn try_from(value: &Value) -> Result<GraphSpec> {
        let Value::List(items) = value else {
            return Err(malformed(value));
        };

        let [head, body] = items.as_slice() else {
            return Err(malformed(value));
        };

        let (relation, key) = match head {
            Value::String(relation) => (Name::from(relation), None),
            Value::Record(alias) if alias.len() == 1 => {
                let Some((key, Value::String(relation))) = alias.iter().next() else {
                    return Err(malformed(value));
                };
                (Name::from(relation), Some(key.clone()))
            }
            _ => return Err(malformed(value)),
        };

        let Value::List(body) = body else {
            return Err(malformed(value));
        };

        let (command, children) = match body.as_slice() {
            [Value::String(command)] => (command, &[][..]),
            [Value::String(command), Value::List(children)] => (command, &children[..]),
            _ => return Err(malformed(value)),
        };

        Ok(GraphSpec {
            relation,
            command: Name::from(command),
            key,
            children: children
                .iter()
                .map(GraphSpec::try_from)
                .collect::<Result<Vec<_>>>()?,
        })
    }
}

impl TryFrom<Value> for GraphSpec {
    type Error = Error;

    fn try_from(value: Value) -> Result<GraphSpec> {
        GraphSpec::try_from(&value)
    }
}

fn malformed(value: &Value) -> Error {
    Error::invalid_argument(format!(
        "malformed graph spec, expected [relation, [command, [children...]]]; got {value:?}"
    ))
}
