// src/lib.rs

// --- Module Declarations ---
pub mod console;
pub mod error;
pub mod evaluator;
pub mod history;
pub mod ops;
pub mod parser;
pub mod registry;
pub mod resolver;
pub mod value;

// --- Public API Re-exports ---
pub use console::{Console, ScriptedConsole, StdConsole};
pub use error::{EvalError, ParseError, ParseErrorKind, ScriptError};
pub use evaluator::{Context, Interpreter, LineKind};
pub use history::ResultsHistory;
pub use parser::{parse_command, parse_literal, parse_segment, ArgKey, ArgumentMap, Segment};
pub use registry::{Implementation, OperatorDescriptor, Param, ParamType, Rank, Registry};
pub use resolver::{resolve, PipelineStage};
pub use value::Value;

#[cfg(test)]
mod tests {
    use super::*;

    fn interpreter(inputs: &[&str]) -> Interpreter<ScriptedConsole> {
        let registry = Registry::with_builtins().unwrap();
        Interpreter::with_console(registry, ScriptedConsole::new(inputs.iter().copied()))
    }

    // Helper to run a script and return its final result
    fn eval_ok(script: &str) -> Value {
        interpreter(&[]).run_script(script).unwrap()
    }

    fn eval_err(script: &str) -> ScriptError {
        interpreter(&[]).run_script(script).unwrap_err()
    }

    fn parse_one(line: &str) -> Segment {
        let mut segments = parse_command(line, &ResultsHistory::new()).unwrap();
        assert_eq!(segments.len(), 1);
        segments.remove(0)
    }

    fn parse_err(line: &str) -> EvalError {
        parse_command(line, &ResultsHistory::new()).unwrap_err()
    }

    // --- Line Classification ---

    #[test]
    fn test_classify_lines() {
        assert_eq!(LineKind::classify(""), LineKind::Blank);
        assert_eq!(LineKind::classify("   # note"), LineKind::Blank);
        assert_eq!(LineKind::classify("  hello world "), LineKind::Literal("hello world"));
        assert_eq!(LineKind::classify("!join"), LineKind::Command("!join"));
        assert_eq!(LineKind::classify("?join"), LineKind::Command("?join"));
    }

    // --- Parser ---

    #[test]
    fn test_parse_operator_only() {
        let segment = parse_one("!print");
        assert_eq!(segment.operator, "print");
        assert!(segment.args.is_empty());
    }

    #[test]
    fn test_parse_named_and_positional() {
        let segment = parse_one(r#"!format "a{}" fmt=x 7 sep="-""#);
        assert_eq!(segment.args.get(&ArgKey::Positional(0)), Some(&Value::from("a{}")));
        assert_eq!(segment.args.get(&ArgKey::Positional(1)), Some(&Value::Int(7)));
        assert_eq!(segment.args.get_named("fmt"), Some(&Value::from("x")));
        assert_eq!(segment.args.get_named("sep"), Some(&Value::from("-")));
    }

    #[test]
    fn test_parse_numbers_and_bare_words() {
        let segment = parse_one("!op a=42 b=-3 c=2.5 d=1e3 e=nan f=hello");
        assert_eq!(segment.args.get_named("a"), Some(&Value::Int(42)));
        assert_eq!(segment.args.get_named("b"), Some(&Value::Int(-3)));
        assert_eq!(segment.args.get_named("c"), Some(&Value::Float(2.5)));
        assert_eq!(segment.args.get_named("d"), Some(&Value::Float(1000.0)));
        assert_eq!(segment.args.get_named("e"), Some(&Value::from("nan")));
        assert_eq!(segment.args.get_named("f"), Some(&Value::from("hello")));
    }

    #[test]
    fn test_parse_escapes() {
        let segment = parse_one(r#"!op s="a\n\"b\"\\ c""#);
        assert_eq!(segment.args.get_named("s"), Some(&Value::from("a\n\"b\"\\ c")));
    }

    #[test]
    fn test_parse_list() {
        let segment = parse_one(r#"!op v=["a", "b, c", 3, 4.5, bare word] w=[]"#);
        assert_eq!(
            segment.args.get_named("v"),
            Some(&Value::List(vec![
                "a".into(),
                "b, c".into(),
                Value::Int(3),
                Value::Float(4.5),
                "bare word".into(),
            ]))
        );
        assert_eq!(segment.args.get_named("w"), Some(&Value::List(vec![])));
    }

    #[test]
    fn test_duplicate_key_last_write_wins() {
        let segment = parse_one("!op sep=a sep=b");
        assert_eq!(segment.args.len(), 1);
        assert_eq!(segment.args.get_named("sep"), Some(&Value::from("b")));
    }

    #[test]
    fn test_parse_errors() {
        let kind = |line: &str| match parse_err(line) {
            EvalError::Parse(e) => e.kind,
            other => panic!("expected a parse error, got {:?}", other),
        };
        assert_eq!(kind(r#"!op s="abc"#), ParseErrorKind::UnterminatedString);
        assert_eq!(kind(r#"!op s="a\qb""#), ParseErrorKind::InvalidEscape('q'));
        assert_eq!(kind("!op v=[1, 2"), ParseErrorKind::UnbalancedBracket);
        assert_eq!(kind("!op v=[1, [2]]"), ParseErrorKind::NestedList);
        assert_eq!(kind("!op v=[1,,2]"), ParseErrorKind::EmptyListElement);
        assert_eq!(kind("!op v=[1,]"), ParseErrorKind::EmptyListElement);
        assert_eq!(kind("!op v="), ParseErrorKind::MissingValue("v".to_string()));
    }

    #[test]
    fn test_parse_error_column() {
        match parse_err(r#"!op s="abc"#) {
            EvalError::Parse(e) => assert_eq!(e.col, 7),
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_arguments_need_separating_whitespace() {
        match parse_err(r#"!format "a{}"b"#) {
            EvalError::Parse(e) => {
                assert_eq!(e.kind, ParseErrorKind::UnexpectedChar('b'));
                assert_eq!(e.col, 14);
            }
            other => panic!("expected a parse error, got {:?}", other),
        }
        assert_eq!(
            parse_err("!sum v=[1, 2]x"),
            EvalError::Parse(ParseError { kind: ParseErrorKind::UnexpectedChar('x'), col: 14 })
        );
    }

    #[test]
    fn test_pipeline_split_ignores_quote_inside_word() {
        let segments = parse_command(r#"!format fmt=it"s{} |> print"#, &ResultsHistory::new()).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].args.get_named("fmt"), Some(&Value::from("it\"s{}")));
        assert_eq!(segments[1].operator, "print");
    }

    #[test]
    fn test_pipeline_split() {
        let segments = parse_command(r#"!split sep="|>" |> map op=int|>sum"#, &ResultsHistory::new()).unwrap();
        let names: Vec<&str> = segments.iter().map(|s| s.operator.as_str()).collect();
        assert_eq!(names, vec!["split", "map", "sum"]);
        assert_eq!(segments[0].args.get_named("sep"), Some(&Value::from("|>")));
    }

    #[test]
    fn test_empty_pipeline_segment() {
        assert_eq!(parse_err("!split |> |> sum"), EvalError::EmptyPipelineSegment);
        assert_eq!(parse_err("!sum |>"), EvalError::EmptyPipelineSegment);
        assert_eq!(parse_err("!"), EvalError::EmptyPipelineSegment);
    }

    #[test]
    fn test_question_mark_is_inspect() {
        let segment = parse_one("?join");
        assert_eq!(segment.operator, "inspect");
        assert_eq!(segment.args.get(&ArgKey::Positional(0)), Some(&Value::from("join")));
    }

    #[test]
    fn test_parse_literal_helper() {
        let history = ResultsHistory::new();
        assert_eq!(parse_literal("[1, 2]", &history).unwrap(), Value::List(vec![Value::Int(1), Value::Int(2)]));
        assert_eq!(parse_literal(" \"x\" ", &history).unwrap(), Value::from("x"));
        assert!(parse_literal("\"x\" y", &history).is_err());
    }

    // --- Engine ---

    #[test]
    fn test_literal_lines() {
        assert_eq!(eval_ok("  hello world  "), Value::from("hello world"));
    }

    #[test]
    fn test_unknown_operator() {
        let error = eval_err("hello\n!frobnicate");
        assert_eq!(error.line, 2);
        assert_eq!(error.error, EvalError::UnknownOperator("frobnicate".to_string()));
    }

    #[test]
    fn test_arity_mismatch_on_excess_args() {
        let error = eval_err("!sum [1] [2]");
        assert_eq!(
            error.error,
            EvalError::ArityMismatch { operator: "sum".to_string(), expected: 1, got: 2 }
        );
    }

    #[test]
    fn test_unknown_parameter() {
        let error = eval_err("!sum w=[1]");
        assert_eq!(
            error.error,
            EvalError::UnknownParameter { operator: "sum".to_string(), key: "w".to_string() }
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            eval_err("!frobnicate").to_string(),
            "line 1: Unknown operator: 'frobnicate'"
        );
        assert_eq!(
            eval_err("!print $4").to_string(),
            "line 1: Invalid result reference: $4"
        );
    }
}
