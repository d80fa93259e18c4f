use super::{Coercion, MapperDef, Step};
use crate::{Cache, Error, Name, Result, Tuple, Value};

use indexmap::IndexSet;

use std::sync::Arc;

/// Cache of compiled pipelines, keyed by step content.
pub type MapperCache = Cache<Vec<Step>, Pipeline>;

/// Compiles [`MapperDef`]s into [`Pipeline`]s through a shared cache.
///
/// The compiler holds no state besides its cache handle and is shared by every
/// mapper in a container.
#[derive(Debug, Clone)]
pub struct MapperCompiler {
    cache: MapperCache,
}

/// A compiled mapper: the steps of a definition resolved into stages ready to
/// run against tuples.
#[derive(Debug)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

#[derive(Debug)]
enum Stage {
    Rename { from: Name, to: Name },
    Project(IndexSet<Name>),
    Reject(IndexSet<Name>),
    Default { attr: Name, value: Value },
    Coerce { attr: Name, to: Coercion },
    Wrap { into: Name, attrs: IndexSet<Name> },
    Nest { attr: Name, pipeline: Arc<Pipeline> },
}

impl MapperCompiler {
    pub fn new(cache: MapperCache) -> MapperCompiler {
        MapperCompiler { cache }
    }

    pub fn cache(&self) -> &MapperCache {
        &self.cache
    }

    /// Compiles `def`, returning the cached pipeline when an equal definition
    /// has been compiled before.
    pub fn compile(&self, def: &MapperDef) -> Result<Arc<Pipeline>> {
        self.compile_steps(&def.steps)
    }

    fn compile_steps(&self, steps: &[Step]) -> Result<Arc<Pipeline>> {
        self.cache
            .try_fetch_or_store(steps.to_vec(), || Pipeline::build(steps, Some(self)))
    }
}

impl Pipeline {
    /// Resolves `steps` into stages. Nested steps go through `compiler` when
    /// one is given so they are shared as well.
    pub(crate) fn build(steps: &[Step], compiler: Option<&MapperCompiler>) -> Result<Pipeline> {
        let stages = steps
            .iter()
            .map(|step| Stage::build(step, compiler))
            .collect::<Result<Vec<_>>>()?;

        Ok(Pipeline { stages })
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Runs the pipeline. Records are transformed, lists are transformed
    /// element-wise and null passes through.
    pub fn call(&self, value: Value) -> Result<Value> {
        match value {
            Value::Record(tuple) => Ok(Value::Record(self.call_tuple(tuple)?)),
            Value::List(items) => items
                .into_iter()
                .map(|item| self.call(item))
                .collect::<Result<Vec<_>>>()
                .map(Value::List),
            Value::Null => Ok(Value::Null),
            other => Err(Error::validation(format!(
                "cannot map a {} value",
                other.type_name()
            ))),
        }
    }

    fn call_tuple(&self, mut tuple: Tuple) -> Result<Tuple> {
        for stage in &self.stages {
            tuple = stage.apply(tuple)?;
        }
        Ok(tuple)
    }
}

impl Stage {
    fn build(step: &Step, compiler: Option<&MapperCompiler>) -> Result<Stage> {
        Ok(match step {
            Step::Rename { from, to } => Stage::Rename {
                from: from.clone(),
                to: to.clone(),
            },
            Step::Project(attrs) => Stage::Project(attrs.iter().cloned().collect()),
            Step::Reject(attrs) => Stage::Reject(attrs.iter().cloned().collect()),
            Step::Default { attr, value } => Stage::Default {
                attr: attr.clone(),
                value: value.clone(),
            },
            Step::Coerce { attr, to } => Stage::Coerce {
                attr: attr.clone(),
                to: *to,
            },
            Step::Wrap { into, attrs } => {
                if attrs.is_empty() {
                    return Err(Error::invalid_argument(format!(
                        "wrap into `{into}` lists no attributes"
                    )));
                }
                Stage::Wrap {
                    into: into.clone(),
                    attrs: attrs.iter().cloned().collect(),
                }
            }
            Step::Nest { attr, steps } => {
                let pipeline = match compiler {
                    Some(compiler) => compiler.compile_steps(steps)?,
                    None => Arc::new(Pipeline::build(steps, None)?),
                };
                Stage::Nest {
                    attr: attr.clone(),
                    pipeline,
                }
            }
        })
    }

    fn apply(&self, mut tuple: Tuple) -> Result<Tuple> {
        match self {
            Stage::Rename { from, to } => tuple.rename(from, to),
            Stage::Project(attrs) => {
                tuple = attrs
                    .iter()
                    .filter_map(|attr| Some((attr.clone(), tuple.get(attr)?.clone())))
                    .collect();
            }
            Stage::Reject(attrs) => tuple.retain(|name, _| !attrs.contains(name)),
            Stage::Default { attr, value } => {
                if tuple.get(attr).map_or(true, Value::is_null) {
                    tuple.insert(attr, value.clone());
                }
            }
            Stage::Coerce { attr, to } => {
                if let Some(value) = tuple.get(attr).cloned() {
                    tuple.insert(attr, coerce(attr, value, *to)?);
                }
            }
            Stage::Wrap { into, attrs } => {
                let mut nested = Tuple::new();
                for attr in attrs {
                    if let Some(value) = tuple.remove(attr) {
                        nested.insert(attr, value);
                    }
                }
                tuple.insert(into, nested);
            }
            Stage::Nest { attr, pipeline } => {
                if let Some(value) = tuple.get(attr).cloned() {
                    tuple.insert(attr, pipeline.call(value)?);
                }
            }
        }

        Ok(tuple)
    }
}

fn coerce(attr: &Name, value: Value, to: Coercion) -> Result<Value> {
    let coerced = match (to, value) {
        (_, Value::Null) => Some(Value::Null),
        (Coercion::String, Value::String(v)) => Some(Value::String(v)),
        (Coercion::String, Value::I64(v)) => Some(Value::String(v.to_string())),
        (Coercion::String, Value::Bool(v)) => Some(Value::String(v.to_string())),
        (Coercion::Integer, Value::I64(v)) => Some(Value::I64(v)),
        (Coercion::Integer, Value::String(v)) => v.trim().parse().ok().map(Value::I64),
        (Coercion::Integer, Value::Bool(v)) => Some(Value::I64(v.into())),
        (Coercion::Bool, Value::Bool(v)) => Some(Value::Bool(v)),
        (Coercion::Bool, Value::I64(v)) => Some(Value::Bool(v != 0)),
        (Coercion::Bool, Value::String(v)) => match v.as_str() {
            "true" | "t" | "1" => Some(Value::Bool(true)),
            "false" | "f" | "0" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    };

    coerced.ok_or_else(|| Error::validation(format!("cannot coerce `{attr}` to {to:?}")))
}
