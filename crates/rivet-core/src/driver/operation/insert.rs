use super::Operation;
use crate::Tuple;

#[derive(Debug, Clone)]
pub struct Insert {
    pub tuples: Vec<Tuple>,
}

impl From<Insert> for Operation {
    fn from(value: Insert) -> Operation {
        Operation::Insert(value)
    }
}
