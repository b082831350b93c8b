// src/registry.rs

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::EvalError;
use crate::evaluator::Context;
use crate::value::{Value, ValueKind};

/// Shape of the data an operator consumes or produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rank {
    Scalar,
    Row,
    Column,
    Table,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rank::Scalar => write!(f, "scalar"),
            Rank::Row => write!(f, "row"),
            Rank::Column => write!(f, "column"),
            Rank::Table => write!(f, "table"),
        }
    }
}

/// Declared type of a parameter slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Any,
    Scalar,
    List,
}

impl ParamType {
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value.kind()) {
            (_, ValueKind::None) => false,
            (ParamType::Any, _) => true,
            (ParamType::Scalar, ValueKind::Scalar) => true,
            (ParamType::List, ValueKind::List) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Any => write!(f, "any"),
            ParamType::Scalar => write!(f, "scalar"),
            ParamType::List => write!(f, "list"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: &'static str,
    pub ty: ParamType,
    /// Present for optional parameters.
    pub default: Option<Value>,
}

impl Param {
    pub fn required(name: &'static str, ty: ParamType) -> Self {
        Param { name, ty, default: None }
    }

    pub fn optional(name: &'static str, ty: ParamType, default: Value) -> Self {
        Param { name, ty, default: Some(default) }
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperatorDescriptor {
    pub name: String,
    pub rank_in: Rank,
    pub rank_out: Rank,
    pub params: Vec<Param>,
    /// Number of required parameters. The context handle is not counted.
    pub arity: usize,
    pub needs_context: bool,
}

impl OperatorDescriptor {
    pub fn new(name: impl Into<String>, rank_in: Rank, rank_out: Rank, params: Vec<Param>) -> Self {
        let arity = params.iter().filter(|p| p.is_required()).count();
        OperatorDescriptor {
            name: name.into(),
            rank_in,
            rank_out,
            params,
            arity,
            needs_context: false,
        }
    }

    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }
}

impl fmt::Display for OperatorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", param.name, param.ty)?;
            if let Some(default) = &param.default {
                write!(f, " = {:?}", default.to_string())?;
            }
        }
        write!(
            f,
            ") arity={} rank={}->{}",
            self.arity, self.rank_in, self.rank_out
        )?;
        if self.needs_context {
            write!(f, " [context]")?;
        }
        Ok(())
    }
}

// The signatures for operator bodies. Arguments arrive in parameter order.
pub type PureFn = fn(&[Value]) -> Result<Value, EvalError>;
pub type ContextFn = fn(&mut Context<'_>, &[Value]) -> Result<Value, EvalError>;

#[derive(Clone, Copy)]
pub enum Implementation {
    Pure(PureFn),
    Contextual(ContextFn),
}

impl Implementation {
    pub fn needs_context(&self) -> bool {
        matches!(self, Implementation::Contextual(_))
    }
}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Implementation::Pure(_) => write!(f, "Pure(<fn>)"),
            Implementation::Contextual(_) => write!(f, "Contextual(<fn>)"),
        }
    }
}

#[derive(Debug)]
pub struct Operator {
    pub descriptor: OperatorDescriptor,
    pub implementation: Implementation,
}

/// Name -> operator table. Populated once, read-only afterwards.
#[derive(Debug, Default)]
pub struct Registry {
    operators: HashMap<String, Rc<Operator>>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// A registry holding the standard operator library.
    pub fn with_builtins() -> Result<Self, EvalError> {
        let mut registry = Registry::new();
        crate::ops::register_builtins(&mut registry)?;
        Ok(registry)
    }

    pub fn register(
        &mut self,
        mut descriptor: OperatorDescriptor,
        implementation: Implementation,
    ) -> Result<(), EvalError> {
        if self.operators.contains_key(&descriptor.name) {
            return Err(EvalError::DuplicateOperator(descriptor.name));
        }
        descriptor.needs_context = implementation.needs_context();
        tracing::trace!(operator = %descriptor.name, arity = descriptor.arity, "register");
        self.operators.insert(
            descriptor.name.clone(),
            Rc::new(Operator { descriptor, implementation }),
        );
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<(&OperatorDescriptor, &Implementation)> {
        self.operators
            .get(name)
            .map(|op| (&op.descriptor, &op.implementation))
    }

    pub(crate) fn get(&self, name: &str) -> Option<Rc<Operator>> {
        self.operators.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.operators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}
