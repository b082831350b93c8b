// tests/engine_tests.rs

use aipl::{ArgumentMap, EvalError, ParseErrorKind, Value};
use test_utils::*;

#[cfg(test)]
mod history_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_literal_line_is_recorded_verbatim() {
        assert_eq!(history_of("  hello world  \n[1, 2]"), vec![
            Value::from("hello world"),
            Value::from("[1, 2]"),
        ]);
    }

    #[test]
    fn test_blank_and_comment_lines_repeat_last_result() {
        let history = history_of("hello\n# a note\n\n   ");
        assert_eq!(history, vec![Value::from("hello"); 4]);
    }

    #[test]
    fn test_leading_blank_line_records_none() {
        assert_eq!(history_of("\nhi"), vec![Value::None, Value::from("hi")]);
    }

    #[test]
    fn test_result_references() {
        let mut interp = interpreter(&[]);
        let result = interp
            .run_script("a\nb\n!format fmt=\"<{}>\" $0\n!format fmt=\"<{}>\" $-2")
            .unwrap();
        assert_eq!(result, Value::from("<b>"));
        assert_eq!(interp.history().get(2).unwrap(), &Value::from("<a>"));
    }

    #[test]
    fn test_reference_to_current_or_later_line_fails() {
        let error = run_err("a\n!print $1");
        assert_eq!(error.line, 2);
        assert_eq!(error.error, EvalError::InvalidResultReference(1));

        let error = run_err("a\n!print $-2");
        assert_eq!(error.error, EvalError::InvalidResultReference(-2));
    }

    #[test]
    fn test_failed_line_appends_nothing() {
        let mut interp = interpreter(&[]);
        interp.process_line("hello").unwrap();
        assert_eq!(
            interp.process_line("!frobnicate").unwrap_err(),
            EvalError::UnknownOperator("frobnicate".to_string())
        );
        assert_eq!(interp.history().len(), 1);

        // The next line still sees "hello" as its implicit value.
        assert_eq!(interp.process_line("!format fmt=\"[{}]\"").unwrap(), &Value::from("[hello]"));
    }
}

#[cfg(test)]
mod scenario_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_join_then_print() {
        let mut interp = interpreter(&[]);
        let result = interp.run_script("!join v=[\"a\",\"b\",\"c\"] sep=\"-\"\n!print").unwrap();
        assert_eq!(result, Value::from("a-b-c"));
        assert_eq!(interp.console().output(), &["a-b-c".to_string()]);
    }

    #[test]
    fn test_input_then_format() {
        let mut interp = interpreter(&["5"]);
        let result = interp.run_script("!input prompt=\"x\"\n!format fmt=\"n={}\"").unwrap();
        assert_eq!(result, Value::from("n=5"));
        assert_eq!(interp.console().prompts(), &["x".to_string()]);
    }

    #[test]
    fn test_input_then_format_by_reference() {
        let mut interp = interpreter(&["5"]);
        let result = interp
            .run_script("!input prompt=\"x\"\nhello\n!format $0 fmt=\"n={}\"")
            .unwrap();
        assert_eq!(result, Value::from("n=5"));
        assert_eq!(interp.history().len(), 3);
    }

    #[test]
    fn test_split_map_sum() {
        let mut interp = interpreter(&["1,2,3"]);
        let script = "!input prompt=\"numbers: \"\n,\n!split v=$0 sep=$1 |> map op=\"int\" |> sum";
        assert_eq!(interp.run_script(script).unwrap(), Value::Int(6));
    }

    #[test]
    fn test_inspect_shorthand() {
        let mut interp = interpreter(&[]);
        let result = interp.run_script("?sum").unwrap();
        let expected = "sum(v: list) arity=1 rank=column->scalar";
        assert_eq!(result, Value::from(expected));
        assert_eq!(interp.console().output(), &[expected.to_string()]);
    }

    #[test]
    fn test_unknown_operator_reports_line() {
        let error = run_err("hello\n!frobnicate");
        assert_eq!(error.line, 2);
        assert_eq!(error.to_string(), "line 2: Unknown operator: 'frobnicate'");
    }

    #[test]
    fn test_parse_error_runs_nothing() {
        let mut interp = interpreter(&[]);
        let error = interp.run_script("!print hi |> print v=[1,").unwrap_err();
        match error.error {
            EvalError::Parse(e) => assert_eq!(e.kind, ParseErrorKind::UnbalancedBracket),
            other => panic!("expected a parse error, got {:?}", other),
        }
        assert!(interp.console().output().is_empty());
        assert!(interp.history().is_empty());
    }

    #[test]
    fn test_print_without_input_is_arity_mismatch() {
        assert_eq!(
            run_err("!print").error,
            EvalError::ArityMismatch { operator: "print".to_string(), expected: 1, got: 0 }
        );
    }

    #[test]
    fn test_apply_leaves_history_alone() {
        let mut interp = interpreter(&[]);
        let joined = interp
            .apply("join", ArgumentMap::new().named("sep", "+"), Some(strs(&["a", "b"])))
            .unwrap();
        assert_eq!(joined, Value::from("a+b"));
        assert!(interp.history().is_empty());
    }
}
