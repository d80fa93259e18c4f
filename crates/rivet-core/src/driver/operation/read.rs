use super::Operation;
use crate::Tuple;

#[derive(Debug, Clone, Default)]
pub struct Read {
    /// Attribute equality conditions; empty reads everything.
    pub filter: Tuple,
}

impl From<Read> for Operation {
    fn from(value: Read) -> Operation {
        Operation::Read(value)
    }
}
