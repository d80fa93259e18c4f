mod compiler;
pub use compiler::{MapperCache, MapperCompiler, Pipeline};

mod def;
pub use def::{Coercion, MapperDef, Step};

mod set;
pub use set::MapperSet;

use crate::{Name, Result, Value};

use std::sync::Arc;

/// A named tuple transformer.
///
/// A mapper starts out unbound and compiles its definition on every call.
/// Once a container binds it to the shared [`MapperCompiler`], compilation
/// happens at most once per distinct definition.
#[derive(Debug, Clone)]
pub struct Mapper {
    def: Arc<MapperDef>,
    compiler: Option<MapperCompiler>,
}

impl Mapper {
    pub fn new(def: MapperDef) -> Mapper {
        Mapper {
            def: Arc::new(def),
            compiler: None,
        }
    }

    pub fn name(&self) -> &Name {
        &self.def.name
    }

    pub fn relation(&self) -> &Name {
        &self.def.relation
    }

    pub fn def(&self) -> &MapperDef {
        &self.def
    }

    pub fn compiler(&self) -> Option<&MapperCompiler> {
        self.compiler.as_ref()
    }

    /// Returns a copy bound to `compiler`, sharing the definition.
    pub fn with_compiler(&self, compiler: MapperCompiler) -> Mapper {
        Mapper {
            def: self.def.clone(),
            compiler: Some(compiler),
        }
    }

    pub fn compile(&self) -> Result<Arc<Pipeline>> {
        match &self.compiler {
            Some(compiler) => compiler.compile(&self.def),
            None => Ok(Arc::new(Pipeline::build(&self.def.steps, None)?)),
        }
    }

    pub fn call(&self, value: Value) -> Result<Value> {
        self.compile()?.call(value)
    }
}

impl From<MapperDef> for Mapper {
    fn from(def: MapperDef) -> Mapper {
        Mapper::new(def)
    }
}
