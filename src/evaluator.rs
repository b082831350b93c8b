// src/evaluator.rs

use crate::console::{Console, StdConsole};
use crate::error::{EvalError, ScriptError};
use crate::history::ResultsHistory;
use crate::parser::{self, ArgumentMap};
use crate::registry::{Implementation, OperatorDescriptor, Registry};
use crate::resolver::{self, PipelineStage};
use crate::value::Value;

/// Classification of a single script line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind<'a> {
    /// Empty line or `#` comment.
    Blank,
    Literal(&'a str),
    Command(&'a str),
}

impl<'a> LineKind<'a> {
    pub fn classify(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            LineKind::Blank
        } else if line.starts_with('!') || line.starts_with('?') {
            LineKind::Command(line)
        } else {
            LineKind::Literal(line)
        }
    }
}

/// Handle given to operators that need to reach back into the interpreter.
pub struct Context<'a> {
    registry: &'a Registry,
    history: &'a ResultsHistory,
    console: &'a mut dyn Console,
}

impl<'a> Context<'a> {
    pub fn new(registry: &'a Registry, history: &'a ResultsHistory, console: &'a mut dyn Console) -> Self {
        Context { registry, history, console }
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    pub fn lookup(&self, name: &str) -> Option<(&'a OperatorDescriptor, &'a Implementation)> {
        self.registry.lookup(name)
    }

    pub fn history(&self) -> &'a ResultsHistory {
        self.history
    }

    pub fn console(&mut self) -> &mut dyn Console {
        &mut *self.console
    }

    /// Resolves `name` against `args` and `implicit`. A deferred result is forced with
    /// `implicit`, so the call always produces a value.
    pub fn apply(&mut self, name: &str, args: ArgumentMap, implicit: Option<Value>) -> Result<Value, EvalError> {
        let stage = resolver::resolve(self, name, args, implicit.clone())?;
        stage.finish(self, implicit)
    }

    /// Runs already-parsed pipeline segments left to right, starting from `current`.
    fn run_pipeline(&mut self, segments: Vec<parser::Segment>, current: Option<Value>) -> Result<Value, EvalError> {
        let mut segments = segments;
        let last = segments.pop().ok_or(EvalError::EmptyPipelineSegment)?;

        let mut current = current;
        for segment in segments {
            let stage = resolver::resolve(self, &segment.operator, segment.args, None)?;
            let value = match stage {
                PipelineStage::Resolved(value) => value,
                deferred => deferred.finish(self, current.take())?,
            };
            current = Some(value);
        }

        let stage = resolver::resolve(self, &last.operator, last.args, current.clone())?;
        stage.finish(self, current)
    }
}

// --- The Interpreter ---

pub struct Interpreter<C: Console = StdConsole> {
    registry: Registry,
    history: ResultsHistory,
    console: C,
}

impl Interpreter<StdConsole> {
    pub fn new(registry: Registry) -> Self {
        Interpreter::with_console(registry, StdConsole)
    }
}

impl<C: Console> Interpreter<C> {
    pub fn with_console(registry: Registry, console: C) -> Self {
        Interpreter {
            registry,
            history: ResultsHistory::new(),
            console,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn history(&self) -> &ResultsHistory {
        &self.history
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    fn context(&mut self) -> Context<'_> {
        Context::new(&self.registry, &self.history, &mut self.console)
    }

    /// Applies a single operator outside of any script line. The history is untouched.
    pub fn apply(&mut self, name: &str, args: ArgumentMap, implicit: Option<Value>) -> Result<Value, EvalError> {
        self.context().apply(name, args, implicit)
    }

    /// Evaluates one line and appends its result to the history.
    /// Nothing is appended when evaluation fails.
    pub fn process_line(&mut self, line: &str) -> Result<&Value, EvalError> {
        let index = self.history.len();
        let kind = LineKind::classify(line);
        tracing::debug!(index, ?kind, "process line");

        let result = match kind {
            LineKind::Blank => self.history.last().cloned().unwrap_or(Value::None),
            LineKind::Literal(text) => Value::Str(text.to_string()),
            LineKind::Command(text) => {
                // Parse every segment before running any of them.
                let segments = parser::parse_command(text, &self.history)?;
                let current = self.history.last().cloned();
                self.context().run_pipeline(segments, current)?
            }
        };

        self.history.push(result);
        Ok(&self.history.as_slice()[index])
    }

    /// Runs a whole script, stopping at the first failing line.
    pub fn run_script(&mut self, script: &str) -> Result<Value, ScriptError> {
        for (i, line) in script.lines().enumerate() {
            if let Err(error) = self.process_line(line) {
                tracing::debug!(line = i + 1, %error, "script aborted");
                return Err(ScriptError { line: i + 1, error });
            }
        }
        Ok(self.history.last().cloned().unwrap_or(Value::None))
    }
}
