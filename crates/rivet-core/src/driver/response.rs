use crate::{Error, Result, Tuple};

#[derive(Debug)]
pub struct Response {
    pub rows: Rows,
}

#[derive(Debug)]
pub enum Rows {
    /// Number of tuples impacted by the operation
    Count(u64),

    /// Tuples read, or written tuples as stored
    Tuples(Vec<Tuple>),
}

impl Response {
    pub fn count(count: u64) -> Self {
        Self {
            rows: Rows::Count(count),
        }
    }

    pub fn tuples(tuples: Vec<Tuple>) -> Self {
        Self {
            rows: Rows::Tuples(tuples),
        }
    }

    /// Extracts the tuples, failing if the adapter only reported a count.
    pub fn into_tuples(self) -> Result<Vec<Tuple>> {
        match self.rows {
            Rows::Tuples(tuples) => Ok(tuples),
            Rows::Count(count) => Err(Error::validation(format!(
                "expected tuples from adapter, got count {count}"
            ))),
        }
    }
}
