//! Parser integration tests.
//!
//! These go through the public parsing API only: whole scripts, snippet
//! bodies and the errors reported for malformed input.

extern crate jsprimer;

use jsprimer::parser::ast::{
    BinaryOperator, ExpressionType, FunctionBodyOrExpression, LiteralType, StatementType,
    VariableDeclarationKind,
};
use jsprimer::parser::{JsParser, ParseError};

/// Helper to parse a script that must be valid.
fn parse_ok(code: &str) -> jsprimer::parser::ast::ProgramData {
    match JsParser::parse_to_ast_from_str(code) {
        Ok(program) => program,
        Err(e) => panic!("Failed to parse {:?}: {}", code, e),
    }
}

/// Helper to parse a script that must be rejected.
fn parse_err(code: &str) -> ParseError {
    match JsParser::parse_to_ast_from_str(code) {
        Ok(program) => panic!("Expected {:?} to be rejected, got {:?}", code, program.body),
        Err(e) => e,
    }
}

// ============================================================================
// Scripts
// ============================================================================

#[test]
fn test_statement_count() {
    let program = parse_ok("var x = 5 + 3;\nconsole.log(x);\n");
    assert_eq!(program.body.len(), 2);
}

#[test]
fn test_var_names_are_hoisted_from_blocks() {
    let program = parse_ok("if (true) { var a = 1; } for (var i = 0; i < 2; i++) {} let b = 2;");
    assert_eq!(program.var_names, vec!["a".to_string(), "i".to_string()]);
}

#[test]
fn test_var_names_skip_nested_functions() {
    let program = parse_ok("var outer = 1; function f() { var inner = 2; }");
    assert_eq!(program.var_names, vec!["outer".to_string()]);
}

#[test]
fn test_declaration_kinds() {
    let program = parse_ok("var a = 1; let b = 2; const c = 3;");
    let kinds: Vec<VariableDeclarationKind> = program
        .body
        .iter()
        .map(|stmt| match stmt {
            StatementType::VariableDeclaration(decl) => decl.kind,
            other => panic!("Expected declaration, got {:?}", other),
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            VariableDeclarationKind::Var,
            VariableDeclarationKind::Let,
            VariableDeclarationKind::Const
        ]
    );
}

#[test]
fn test_binary_expression_shape() {
    let program = parse_ok("1 + 2;");
    match &program.body[0] {
        StatementType::ExpressionStatement {
            expression: ExpressionType::BinaryExpression { operator, left, right },
        } => {
            assert_eq!(*operator, BinaryOperator::Add);
            assert!(matches!(**left, ExpressionType::Literal(LiteralType::NumberLiteral(n)) if n == 1.0));
            assert!(matches!(**right, ExpressionType::Literal(LiteralType::NumberLiteral(n)) if n == 2.0));
        }
        other => panic!("Expected binary expression, got {:?}", other),
    }
}

#[test]
fn test_language_features_used_by_lessons() {
    let lessons = [
        "const add = (a, b) => a + b;",
        "const { name, age = 30, ...rest } = person;",
        "const [first, , third] = items;",
        "const msg = `Hello, ${name}!`;",
        "const label = age >= 18 ? 'adult' : 'minor';",
        "const city = user?.address?.city ?? 'unknown';",
        "for (const item of [1, 2, 3]) { console.log(item); }",
        "for (const key in obj) { console.log(key); }",
        "switch (day) { case 1: console.log('Mon'); break; default: console.log('?'); }",
        "try { risky(); } catch (e) { console.error(e.message); } finally { done(); }",
        "new Promise((resolve, reject) => resolve(1)).then(v => v * 2);",
        "setTimeout(() => console.log('later'), 0);",
        "let n = 0; do { n++; } while (n < 3);",
        "const copy = { ...original, extra: true };",
        "function greet(name = 'World', ...others) { return 'Hi ' + name; }",
    ];
    for lesson in lessons {
        parse_ok(lesson);
    }
}

#[test]
fn test_top_level_return_is_accepted() {
    let program = parse_ok("console.log('a'); return; console.log('b');");
    assert!(matches!(program.body[1], StatementType::ReturnStatement { argument: None }));
}

// ============================================================================
// Snippet bodies
// ============================================================================

#[test]
fn test_function_body_wraps_script() {
    let body = JsParser::parse_function_body("var x = 1; return x;").unwrap();
    assert!(body.id.is_none());
    assert!(body.params.is_empty());
    assert!(!body.is_arrow);
    assert_eq!(body.var_names, vec!["x".to_string()]);
    match &body.body {
        FunctionBodyOrExpression::FunctionBody(statements) => assert_eq!(statements.len(), 2),
        FunctionBodyOrExpression::Expression(_) => panic!("Expected a statement body"),
    }
}

#[test]
fn test_empty_snippet_is_an_empty_body() {
    let body = JsParser::parse_function_body("").unwrap();
    match &body.body {
        FunctionBodyOrExpression::FunctionBody(statements) => assert!(statements.is_empty()),
        FunctionBodyOrExpression::Expression(_) => panic!("Expected a statement body"),
    }
}

#[test]
fn test_comments_only_snippet() {
    let body = JsParser::parse_function_body("// nothing here\n/* still nothing */").unwrap();
    assert!(matches!(&body.body, FunctionBodyOrExpression::FunctionBody(s) if s.is_empty()));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_error_reports_line() {
    let err = parse_err("let a = 1;\nlet b = ;\n");
    assert_eq!(err.line, 2);
    assert!(err.column >= 1);
}

#[test]
fn test_error_display_includes_position() {
    let err = parse_err("console.log(\"unterminated);");
    let text = err.to_string();
    assert!(text.starts_with(&err.message), "{}", text);
    assert!(text.contains(&format!("(line {}, column {})", err.line, err.column)), "{}", text);
}

#[test]
fn test_unbalanced_braces_are_rejected() {
    parse_err("function f() { return 1;");
}

#[test]
fn test_function_body_propagates_errors() {
    let err = JsParser::parse_function_body("var x = ;").unwrap_err();
    assert_eq!(err.line, 1);
}

#[test]
fn test_redeclared_let_reports_second_declaration() {
    let err = parse_err("let a = 1;\nlet a = 2;\nconsole.log(a)");
    assert_eq!(err.message, "Identifier 'a' has already been declared");
    assert_eq!(err.line, 2);
    assert_eq!(err.column, 1);
}

#[test]
fn test_deep_nesting_is_rejected_with_position() {
    let code = format!("x = {}1{};", "(".repeat(300), ")".repeat(300));
    let err = parse_err(&code);
    assert_eq!(err.message, "Maximum nesting depth exceeded");
    assert_eq!(err.line, 1);
    assert_eq!(err.column, 4 + jsprimer::parser::MAX_NESTING_DEPTH + 1);
}

#[test]
fn test_brackets_in_strings_and_comments_do_not_nest() {
    let noise = "(".repeat(400);
    parse_ok(&format!(
        "var s = '{0}'; // {0}\n/* {0} */ var t = `{0}${{s}}`;",
        noise
    ));
}

#[test]
fn test_moderate_nesting_parses() {
    let code = format!("x = {}1{};", "(".repeat(100), ")".repeat(100));
    parse_ok(&code);
}

// ============================================================================
// Async functions
// ============================================================================

#[test]
fn test_async_function_forms() {
    let program = parse_ok(
        "async function a() { await 1; }\n\
         const b = async () => await a();\n\
         const c = async x => x;\n\
         const d = async function () {};\n\
         const o = { async m() { await b(); }, async: 1 };",
    );
    assert_eq!(program.body.len(), 5);
    match &program.body[0] {
        StatementType::FunctionDeclaration(f) => {
            assert!(f.is_async);
            assert_eq!(f.id.as_deref(), Some("a"));
            assert!(f.source_text.starts_with("async function"));
        }
        other => panic!("Expected function declaration, got {:?}", other),
    }
    match &program.body[2] {
        StatementType::VariableDeclaration(decl) => match &decl.declarations[0].init {
            Some(ExpressionType::FunctionExpression(f)) => assert!(f.is_async && f.is_arrow),
            other => panic!("Expected arrow function, got {:?}", other),
        },
        other => panic!("Expected declaration, got {:?}", other),
    }
}

#[test]
fn test_await_outside_async_function_is_rejected() {
    let err = parse_err("function f() { await g(); }");
    assert_eq!(
        err.message,
        "await is only valid in async functions and the top level bodies of modules"
    );
    parse_err("await 1;");
    parse_err("async function f() { [1].forEach(x => { await x; }); }");
}

#[test]
fn test_bigint_literals() {
    let program = parse_ok("10n; 0xFFn; 1_000n;");
    let values: Vec<i128> = program
        .body
        .iter()
        .map(|stmt| match stmt {
            StatementType::ExpressionStatement {
                expression: ExpressionType::Literal(LiteralType::BigIntLiteral(n)),
            } => *n,
            other => panic!("Expected BigInt literal, got {:?}", other),
        })
        .collect();
    assert_eq!(values, vec![10, 255, 1000]);
    parse_err("1.5n;");
}
