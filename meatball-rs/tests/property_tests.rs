use proptest::prelude::*;

use meatball::context::ContextResolver;
use meatball::error::EvalError;
use meatball::expr::parse;
use meatball::registry::MacroRegistry;
use meatball::value::Value;
use meatball::{literal, process_value};

proptest! {
    /// The parser returns Ok or Err for any input, never panics.
    #[test]
    fn parser_does_not_panic(s in "\\PC*") {
        let outcome = std::panic::catch_unwind(|| {
            let _ = parse(&s);
        });
        prop_assert!(outcome.is_ok(), "parser panicked on {:?}", s);
    }
}

proptest! {
    /// The literal reader never panics either.
    #[test]
    fn literal_reader_does_not_panic(s in "\\PC*") {
        let outcome = std::panic::catch_unwind(|| {
            let _ = literal::parse_literal(&s);
        });
        prop_assert!(outcome.is_ok(), "literal reader panicked on {:?}", s);
    }
}

proptest! {
    /// Strings that carry no macro syntax come out byte-for-byte unchanged.
    #[test]
    fn plain_strings_are_identity(s in "[A-Za-z0-9 ,._/-]*") {
        let ctx = ContextResolver::default();
        let out = process_value(Value::str(s.clone()), &ctx).unwrap();
        prop_assert_eq!(out, Value::Str(s));
    }
}

proptest! {
    /// An extra open paren is always a parse failure, and a fatal one.
    #[test]
    fn unbalanced_parens_always_fail(body in "[a-z0-9 +*]*") {
        let src = format!("(+ 1 ({body}");
        prop_assert!(parse(&src).is_err());
        let registry = MacroRegistry::new();
        let ctx = ContextResolver::default();
        let result = registry.evaluate_sexpr(&src, &ctx);
        prop_assert!(matches!(result, Err(EvalError::Parse(_))));
    }
}

proptest! {
    /// Repetition with any count yields a value, never a panic.
    #[test]
    fn repetition_never_panics(n in any::<i64>()) {
        let registry = MacroRegistry::new();
        let ctx = ContextResolver::default();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = registry.evaluate_sexpr(&format!("(* 'ab' {n})"), &ctx);
            let _ = registry.evaluate_sexpr(&format!("(* (list 1 2) {n})"), &ctx);
        }));
        prop_assert!(outcome.is_ok());
    }
}

proptest! {
    /// Evaluation is deterministic and arithmetic matches i64.
    #[test]
    fn arithmetic_is_deterministic(a in -10_000i64..10_000, b in -10_000i64..10_000) {
        let registry = MacroRegistry::new();
        let mut ctx = ContextResolver::default();
        ctx.set("a", Value::Int(a));
        let src = format!("(list (+ a {b}) (* a {b}) (- a {b}))");
        let first = registry.evaluate_sexpr(&src, &ctx).unwrap();
        let second = registry.evaluate_sexpr(&src, &ctx).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(
            first,
            Value::List(vec![Value::Int(a + b), Value::Int(a * b), Value::Int(a - b)])
        );
    }
}

proptest! {
    /// Deep nesting is handled without overflowing the stack.
    #[test]
    fn deep_nesting_evaluates(depth in 1usize..600) {
        let src = format!("{}1{}", "(+ 1 ".repeat(depth), ")".repeat(depth));
        let registry = MacroRegistry::new();
        let ctx = ContextResolver::default();
        prop_assert_eq!(registry.evaluate_sexpr(&src, &ctx).unwrap(), Value::Int(depth as i64 + 1));
    }
}
