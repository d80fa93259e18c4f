#[derive(Debug)]
pub struct Capability {
    /// Supports `Operation::Transaction`.
    pub transactions: bool,

    /// Generates a primary key for inserted tuples that omit one.
    pub generated_keys: bool,

    /// Name of the primary key attribute.
    pub primary_key: &'static str,
}

impl Capability {
    /// In-memory reference adapter capabilities.
    pub const MEMORY: Self = Self {
        transactions: true,
        generated_keys: true,
        primary_key: "id",
    };
}
