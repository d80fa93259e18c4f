mod cache;
pub use cache::Cache;

pub mod command;
pub use command::{Cardinality, Command, CommandCache, CommandKind, CommandRegistry, CommandSet};

mod connect;
pub use connect::Connect;

pub mod container;
pub use container::{
    Caches, CommandDef, CommandPath, CommandRequest, Container, Dispatch, RelationDef,
};

pub mod graph;
pub use graph::{Graph, GraphBuilder, GraphSpec};

pub mod mapper;
pub use mapper::{
    Coercion, Mapper, MapperCache, MapperCompiler, MapperDef, MapperSet, Pipeline, Step,
};

mod registry;
pub use registry::Registry;

mod relation;
pub use relation::Relation;

mod transaction;
pub use transaction::Transaction;

pub use rivet_core::{bail, driver, err, tuple, Error, Gateway, Name, Result, Tuple, Value};

#[cfg(feature = "memory")]
pub use rivet_driver_memory::Memory;
