use super::Operation;
use crate::Tuple;

#[derive(Debug, Clone)]
pub struct Delete {
    pub filter: Tuple,
}

impl From<Delete> for Operation {
    fn from(value: Delete) -> Operation {
        Operation::Delete(value)
    }
}
