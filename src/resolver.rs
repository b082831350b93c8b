// src/resolver.rs

//! Binds parsed arguments to an operator's parameter slots and decides whether the
//! operator runs now or waits for one more value.

use std::rc::Rc;

use crate::error::EvalError;
use crate::evaluator::Context;
use crate::parser::{ArgKey, ArgumentMap};
use crate::registry::{Implementation, Operator};
use crate::value::Value;

/// Result of resolving one pipeline segment.
#[derive(Debug)]
pub enum PipelineStage {
    Resolved(Value),
    Deferred(DeferredCall),
}

impl PipelineStage {
    /// Produces this stage's value, feeding `input` to a deferred call.
    pub fn finish(self, ctx: &mut Context<'_>, input: Option<Value>) -> Result<Value, EvalError> {
        match self {
            PipelineStage::Resolved(value) => Ok(value),
            PipelineStage::Deferred(call) => call.force(ctx, input),
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, PipelineStage::Deferred(_))
    }
}

/// An operator with some of its slots bound, awaiting one more value.
#[derive(Debug)]
pub struct DeferredCall {
    operator: Rc<Operator>,
    slots: Vec<Option<Value>>,
}

impl DeferredCall {
    pub fn operator_name(&self) -> &str {
        &self.operator.descriptor.name
    }

    pub fn bound(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn force(mut self, ctx: &mut Context<'_>, input: Option<Value>) -> Result<Value, EvalError> {
        tracing::debug!(operator = self.operator_name(), bound = self.bound(), "force deferred call");
        let descriptor = &self.operator.descriptor;
        let value = match input.filter(|v| !v.is_none()) {
            Some(value) => value,
            None => {
                return Err(EvalError::ArityMismatch {
                    operator: descriptor.name.clone(),
                    expected: descriptor.arity,
                    got: required_bound(&self.operator, &self.slots),
                })
            }
        };

        let empty_required = |slots: &[Option<Value>]| {
            descriptor
                .params
                .iter()
                .enumerate()
                .filter(|(i, p)| p.is_required() && slots[*i].is_none())
                .map(|(i, p)| (i, p.ty))
                .collect::<Vec<_>>()
        };
        let open = empty_required(&self.slots);
        let target = open
            .iter()
            .find(|(_, ty)| ty.accepts(&value))
            .or_else(|| open.first())
            .map(|(i, _)| *i);
        match target {
            Some(i) => self.slots[i] = Some(value),
            // Every required slot is filled already; the value has nowhere to go.
            None => {
                return Err(EvalError::ArityMismatch {
                    operator: descriptor.name.clone(),
                    expected: descriptor.arity,
                    got: descriptor.arity + 1,
                })
            }
        }
        call(ctx, &self.operator, self.slots)
    }
}

fn required_bound(operator: &Operator, slots: &[Option<Value>]) -> usize {
    operator
        .descriptor
        .params
        .iter()
        .zip(slots)
        .filter(|(p, s)| p.is_required() && s.is_some())
        .count()
}

// Places explicit arguments into parameter slots: names first, then positionals in order.
fn bind(operator: &Operator, args: ArgumentMap) -> Result<Vec<Option<Value>>, EvalError> {
    let descriptor = &operator.descriptor;
    let mut slots: Vec<Option<Value>> = vec![None; descriptor.params.len()];
    let mut positional = Vec::new();

    for (key, value) in args {
        match key {
            ArgKey::Named(name) => {
                let index = descriptor.param_index(&name).ok_or_else(|| EvalError::UnknownParameter {
                    operator: descriptor.name.clone(),
                    key: name.clone(),
                })?;
                slots[index] = Some(value);
            }
            ArgKey::Positional(ordinal) => positional.push((ordinal, value)),
        }
    }

    positional.sort_by_key(|(ordinal, _)| *ordinal);
    let explicit = slots.iter().filter(|s| s.is_some()).count() + positional.len();
    for (_, value) in positional {
        let free = slots.iter().position(Option::is_none).ok_or_else(|| EvalError::ArityMismatch {
            operator: descriptor.name.clone(),
            expected: descriptor.params.len(),
            got: explicit,
        })?;
        slots[free] = Some(value);
    }
    Ok(slots)
}

/// Runs an operator whose required slots are all bound.
fn call(ctx: &mut Context<'_>, operator: &Operator, slots: Vec<Option<Value>>) -> Result<Value, EvalError> {
    let descriptor = &operator.descriptor;
    let got = required_bound(operator, &slots);
    let mut args = Vec::with_capacity(slots.len());
    for (param, slot) in descriptor.params.iter().zip(slots) {
        match slot.or_else(|| param.default.clone()) {
            Some(value) => args.push(value),
            None => {
                return Err(EvalError::ArityMismatch {
                    operator: descriptor.name.clone(),
                    expected: descriptor.arity,
                    got,
                })
            }
        }
    }
    match operator.implementation {
        Implementation::Pure(f) => f(&args),
        Implementation::Contextual(f) => f(ctx, &args),
    }
}

/// Resolves one segment: binds `args`, injects `implicit` when the operator is short
/// of required arguments, then either calls the operator or defers it.
pub fn resolve(
    ctx: &mut Context<'_>,
    name: &str,
    args: ArgumentMap,
    implicit: Option<Value>,
) -> Result<PipelineStage, EvalError> {
    let operator = ctx
        .registry()
        .get(name)
        .ok_or_else(|| EvalError::UnknownOperator(name.to_string()))?;
    let descriptor = &operator.descriptor;

    let mut slots = bind(&operator, args)?;
    let bound = required_bound(&operator, &slots);
    let arity = descriptor.arity;

    let implicit = implicit.filter(|v| !v.is_none());
    let context_saturated = descriptor.needs_context && arity > 0 && bound == arity - 1;
    let mut injected = false;
    if let Some(value) = implicit {
        if bound < arity && !context_saturated {
            let target = descriptor
                .params
                .iter()
                .enumerate()
                .find(|(i, p)| p.is_required() && slots[*i].is_none() && p.ty.accepts(&value))
                .map(|(i, _)| i);
            if let Some(i) = target {
                slots[i] = Some(value);
                injected = true;
            }
        }
    }

    let saturated = bound + usize::from(injected) >= arity;
    tracing::debug!(operator = name, bound, injected, saturated, "resolve");
    if saturated {
        call(ctx, &operator, slots).map(PipelineStage::Resolved)
    } else {
        Ok(PipelineStage::Deferred(DeferredCall {
            operator: Rc::clone(&operator),
            slots,
        }))
    }
}
