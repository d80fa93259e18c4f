use super::Operation;
use crate::Tuple;

#[derive(Debug, Clone)]
pub struct Update {
    /// Tuples to update
    pub filter: Tuple,

    /// Attributes to assign on every matching tuple
    pub changes: Tuple,
}

impl From<Update> for Operation {
    fn from(value: Update) -> Operation {
        Operation::Update(value)
    }
}
