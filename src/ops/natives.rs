// src/ops/natives.rs

use paste::paste;

use crate::error::EvalError;
use crate::evaluator::Context;
use crate::ops::prims::{self, bad_args, expect_list, expect_text};
use crate::parser;
use crate::registry::{Implementation, OperatorDescriptor, Param, ParamType, Rank, Registry};
use crate::value::Value;

// --- Macro Template System ---

macro_rules! define_operators {
    (@default) => { None };
    (@default $default:expr) => { Some(Value::from($default)) };
    (
        // Operators that only see their arguments
        pure_ops: [$(($p_name:literal, $p_func:ident, $p_in:ident => $p_out:ident,
            [$($p_param:literal : $p_ty:ident $(= $p_default:expr)?),*])),* $(,)?],
        // Operators that receive a Context handle for I/O or re-entrant calls
        context_ops: [$(($c_name:literal, $c_func:ident, $c_in:ident => $c_out:ident,
            [$($c_param:literal : $c_ty:ident $(= $c_default:expr)?),*])),* $(,)?]
    ) => {
        paste! {
            /// Registers the standard operator library. Fails only on a name clash
            /// with operators already present in `registry`.
            pub fn register_builtins(registry: &mut Registry) -> Result<(), EvalError> {
                $(
                    registry.register(
                        OperatorDescriptor::new($p_name, Rank::$p_in, Rank::$p_out, vec![
                            $(Param {
                                name: $p_param,
                                ty: ParamType::$p_ty,
                                default: define_operators!(@default $($p_default)?),
                            }),*
                        ]),
                        Implementation::Pure(prims::[<op_ $p_func>]),
                    )?;
                )*
                $(
                    registry.register(
                        OperatorDescriptor::new($c_name, Rank::$c_in, Rank::$c_out, vec![
                            $(Param {
                                name: $c_param,
                                ty: ParamType::$c_ty,
                                default: define_operators!(@default $($c_default)?),
                            }),*
                        ]),
                        Implementation::Contextual([<op_ $c_func>]),
                    )?;
                )*
                Ok(())
            }
        }
    };
}

// --- Context Operators ---

fn op_print(ctx: &mut Context<'_>, args: &[Value]) -> Result<Value, EvalError> {
    let [v] = args else { return Err(bad_args("print", 1, args)) };
    ctx.console().write_line(&v.to_string())?;
    Ok(v.clone())
}

fn op_input(ctx: &mut Context<'_>, args: &[Value]) -> Result<Value, EvalError> {
    let [prompt] = args else { return Err(bad_args("input", 1, args)) };
    let prompt = expect_text("input", prompt)?;
    let line = ctx.console().read_line(&prompt)?;
    Ok(Value::Str(line))
}

// `op` is operator text such as `int` or `format fmt="<{}>"`.
fn op_map(ctx: &mut Context<'_>, args: &[Value]) -> Result<Value, EvalError> {
    let [v, op] = args else { return Err(bad_args("map", 2, args)) };
    let items = expect_list("map", v)?;
    let segment = parser::parse_segment(&expect_text("map", op)?, ctx.history())?;
    items
        .iter()
        .map(|item| ctx.apply(&segment.operator, segment.args.clone(), Some(item.clone())))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::List)
}

fn op_chain(ctx: &mut Context<'_>, args: &[Value]) -> Result<Value, EvalError> {
    let [v, cmds] = args else { return Err(bad_args("chain", 2, args)) };
    let mut result = v.clone();
    for cmd in expect_list("chain", cmds)? {
        let segment = parser::parse_segment(&expect_text("chain", cmd)?, ctx.history())?;
        result = ctx.apply(&segment.operator, segment.args, Some(result))?;
    }
    Ok(result)
}

fn op_inspect(ctx: &mut Context<'_>, args: &[Value]) -> Result<Value, EvalError> {
    let [name] = args else { return Err(bad_args("inspect", 1, args)) };
    let name = expect_text("inspect", name)?;
    let (descriptor, _) = ctx
        .lookup(&name)
        .ok_or_else(|| EvalError::UnknownOperator(name.clone()))?;
    let description = descriptor.to_string();
    ctx.console().write_line(&description)?;
    Ok(Value::Str(description))
}

// --- The Registry Definition ---

define_operators! {
    pure_ops: [
        // name,     function, rank,              params
        ("join",    join,    Column => Scalar, ["v": List, "sep": Scalar = " "]),
        ("split",   split,   Scalar => Column, ["v": Scalar, "sep": Scalar = " "]),
        ("sum",     sum,     Column => Scalar, ["v": List]),
        ("int",     int,     Scalar => Scalar, ["v": Any]),
        ("float",   float,   Scalar => Scalar, ["v": Any]),
        ("format",  format,  Scalar => Scalar, ["fmt": Scalar, "v": Any]),
        ("+",       add,     Scalar => Scalar, ["a": Scalar, "v": Scalar]),
        ("choice",  choice,  Column => Scalar, ["v": List]),
        ("randint", randint, Scalar => Scalar, ["a": Scalar, "b": Scalar])
    ],
    context_ops: [
        ("print",   print,   Column => Column, ["v": Any]),
        ("input",   input,   Scalar => Scalar, ["prompt": Scalar = ""]),
        ("map",     map,     Column => Column, ["v": List, "op": Scalar]),
        ("chain",   chain,   Column => Column, ["v": Any, "cmds": List]),
        ("inspect", inspect, Scalar => Scalar, ["name": Scalar])
    ]
}
