use super::Parent;
use crate::{Error, Name, Result, Tuple};

/// How a child command picks up its parent's key when it runs inside a
/// command graph: `child[key] = parent[references]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Association {
    /// Relation name of the parent.
    pub parent: Name,

    /// Attribute set on the child.
    pub key: Name,

    /// Attribute read from the parent.
    pub references: Name,
}

impl Association {
    pub fn new(
        parent: impl Into<Name>,
        key: impl Into<Name>,
        references: impl Into<Name>,
    ) -> Association {
        Association {
            parent: parent.into(),
            key: key.into(),
            references: references.into(),
        }
    }

    /// `users` -> `user_id` referencing `id`.
    pub fn infer(parent: &Name) -> Association {
        let singular = pluralizer::pluralize(parent, 1, false);
        Association::new(parent, format!("{singular}_id"), "id")
    }

    pub(crate) fn apply(&self, parent: Parent<'_>, tuple: &mut Tuple) -> Result<()> {
        let Some(value) = parent.tuple.get(&self.references) else {
            return Err(Error::validation(format!(
                "parent `{}` has no `{}` to assign to `{}`",
                self.parent, self.references, self.key
            )));
        };

        tuple.insert(&self.key, value.clone());
        Ok(())
    }
}
