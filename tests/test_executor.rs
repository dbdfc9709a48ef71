//! Snippet executor tests.
//!
//! Each test runs real snippets through [`SnippetExecutor::run`] and checks
//! the transcript, the failure text, or the state of the host's console
//! bindings afterwards.

extern crate jsprimer;

use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use jsprimer::parser::JsParser;
use jsprimer::runner::ds::value::JsValue;
use jsprimer::runner::plugin::types::{ExecutionLimits, MAX_CALL_DEPTH_LIMIT};
use jsprimer::runner::std_lib::console::{format_args, ConsoleBindings, ConsoleWriter};
use jsprimer::snippet::{
    ConsoleInterceptor, ExecutionResult, OutputSink, SnippetExecutor, NO_OUTPUT_PLACEHOLDER,
};

/// Console writer that records what the host would have printed.
#[derive(Default)]
struct Recorder {
    lines: RefCell<Vec<String>>,
}

impl ConsoleWriter for Recorder {
    fn write(&self, args: &[JsValue]) {
        self.lines.borrow_mut().push(format_args(args));
    }
}

/// Helper to build an executor whose host console is recorded.
fn recorded_executor() -> (SnippetExecutor, Rc<Recorder>, ConsoleBindings) {
    let log = Rc::new(Recorder::default());
    let error = Rc::new(Recorder::default());
    let bindings = ConsoleBindings::new(log.clone(), error);
    let executor = SnippetExecutor::with_bindings(bindings.clone());
    (executor, log, bindings)
}

fn success(text: &str) -> ExecutionResult {
    ExecutionResult::Success(text.to_string())
}

fn failure(text: &str) -> ExecutionResult {
    ExecutionResult::Failure(text.to_string())
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_start_end() {
    let executor = SnippetExecutor::new();
    assert_eq!(
        executor.run("console.log('Start'); console.log('End')"),
        success("Start\nEnd")
    );
}

#[test]
fn test_thrown_error() {
    let executor = SnippetExecutor::new();
    assert_eq!(executor.run("throw new Error('boom')"), failure("Error: boom"));
}

#[test]
fn test_empty_snippet() {
    let executor = SnippetExecutor::new();
    assert_eq!(executor.run(""), success(NO_OUTPUT_PLACEHOLDER));
    assert_eq!(
        executor.run(""),
        success("Code executed successfully (no output)")
    );
}

#[test]
fn test_mixed_arguments() {
    let executor = SnippetExecutor::new();
    assert_eq!(executor.run("console.log(1, 'a', true)"), success("1 a true"));
}

// ============================================================================
// Capture ordering and stringification
// ============================================================================

#[test]
fn test_capture_order_across_channels() {
    let executor = SnippetExecutor::new();
    let result = executor.run(
        "console.log('one');\n\
         console.error('two');\n\
         function three() { console.log('three'); }\n\
         three();",
    );
    assert_eq!(result, success("one\nError: two\nthree"));
}

#[test]
fn test_error_channel_prefix() {
    let executor = SnippetExecutor::new();
    assert_eq!(
        executor.run("console.error('bad', 42)"),
        success("Error: bad 42")
    );
    assert_eq!(executor.run("console.warn('careful')"), success("Error: careful"));
}

#[test]
fn test_info_and_debug_use_log_channel() {
    let executor = SnippetExecutor::new();
    assert_eq!(
        executor.run("console.info('i'); console.debug('d')"),
        success("i\nd")
    );
}

#[test]
fn test_argument_stringification() {
    let executor = SnippetExecutor::new();
    let result = executor.run(
        "console.log([1, 2, 3], {}, null, undefined, 0.5, -0, NaN, [], [null, 'x'])",
    );
    assert_eq!(result, success("1,2,3 [object Object] null undefined 0.5 0 NaN  ,x"));
}

#[test]
fn test_empty_log_call_is_an_empty_line() {
    let executor = SnippetExecutor::new();
    assert_eq!(
        executor.run("console.log('a'); console.log(); console.log('b')"),
        success("a\n\nb")
    );
}

#[test]
fn test_error_object_stringifies_with_name() {
    let executor = SnippetExecutor::new();
    assert_eq!(
        executor.run("console.log(new TypeError('nope'))"),
        success("TypeError: nope")
    );
}

#[test]
fn test_top_level_return_stops_the_snippet() {
    let executor = SnippetExecutor::new();
    assert_eq!(
        executor.run("console.log('before'); return; console.log('after');"),
        success("before")
    );
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_output_before_error_is_dropped() {
    let executor = SnippetExecutor::new();
    assert_eq!(
        executor.run("console.log('partial'); throw new Error('late')"),
        failure("Error: late")
    );
}

#[test]
fn test_reference_error() {
    let executor = SnippetExecutor::new();
    assert_eq!(
        executor.run("console.log(missing)"),
        failure("Error: missing is not defined")
    );
}

#[test]
fn test_type_error_from_runtime() {
    let executor = SnippetExecutor::new();
    assert_eq!(
        executor.run("const user = undefined; user.name"),
        failure("Error: Cannot read properties of undefined (reading 'name')")
    );
    assert_eq!(
        executor.run("const x = 1; x = 2;"),
        failure("Error: Assignment to constant variable.")
    );
}

#[test]
fn test_thrown_primitive_has_undefined_message() {
    let executor = SnippetExecutor::new();
    assert_eq!(executor.run("throw 'plain string'"), failure("Error: undefined"));
    assert_eq!(executor.run("throw 42"), failure("Error: undefined"));
}

#[test]
fn test_thrown_object_uses_message_property() {
    let executor = SnippetExecutor::new();
    assert_eq!(
        executor.run("throw { message: 'custom' }"),
        failure("Error: custom")
    );
}

#[test]
fn test_syntax_error_is_a_failure() {
    let executor = SnippetExecutor::new();
    let code = "console.log('unclosed'";
    let parse_error = JsParser::parse_function_body(code).unwrap_err();
    assert_eq!(
        executor.run(code),
        failure(&format!("Error: {}", parse_error.message))
    );
}

#[test]
fn test_redeclared_let_is_a_syntax_failure() {
    let executor = SnippetExecutor::new();
    let (a_redeclared, name_redeclared) = (
        "Error: Identifier 'a' has already been declared",
        "Error: Identifier 'name' has already been declared",
    );
    assert_eq!(
        executor.run("let a = 1; let a = 2; console.log(a)"),
        failure(a_redeclared)
    );
    // Nothing runs: the check happens before evaluation.
    assert_eq!(
        executor.run("console.log('first'); var name = 'John';\nconst name = 'John';"),
        failure(name_redeclared)
    );
    assert_eq!(
        executor.run("let a = 1; { let a = 2; console.log(a); } console.log(a)"),
        success("2\n1")
    );
}

#[test]
fn test_caught_error_is_not_a_failure() {
    let executor = SnippetExecutor::new();
    let result = executor.run(
        "try { null.x; } catch (e) { console.log(e.name + ': ' + e.message); }",
    );
    assert_eq!(
        result,
        success("TypeError: Cannot read properties of null (reading 'x')")
    );
}

// ============================================================================
// Restoration
// ============================================================================

#[test]
fn test_bindings_restored_after_success_and_failure() {
    let (executor, _, original) = recorded_executor();
    for code in [
        "console.log('ok')",
        "throw new Error('boom')",
        "this is not javascript",
        "",
    ] {
        executor.run(code);
        assert!(executor.bindings().same_as(&original), "after {:?}", code);
    }
}

#[test]
fn test_bindings_restored_when_snippet_reassigns_console() {
    let (executor, host_log, original) = recorded_executor();
    let result = executor.run("console.log = function() {}; console.log('hidden');");
    assert_eq!(result, success(NO_OUTPUT_PLACEHOLDER));
    assert!(executor.bindings().same_as(&original));

    // The next run starts from a fresh realm with the real console.
    assert_eq!(executor.run("console.log('visible')"), success("visible"));
    assert!(host_log.lines.borrow().is_empty());
}

#[test]
fn test_host_console_not_written_during_run() {
    let (executor, host_log, _) = recorded_executor();
    executor.run("console.log('captured')");
    assert!(host_log.lines.borrow().is_empty());
}

#[test]
fn test_interceptor_restores_on_unwind() {
    let (executor, _, original) = recorded_executor();
    let shared = Rc::new(RefCell::new(executor.bindings()));
    let target = shared.clone();
    let outcome = panic::catch_unwind(AssertUnwindSafe(move || {
        let sink = OutputSink::new();
        let mut interceptor = ConsoleInterceptor::new(target);
        interceptor.install(&sink);
        panic!("writer blew up");
    }));
    assert!(outcome.is_err());
    assert!(shared.borrow().same_as(&original));
}

#[test]
fn test_restore_is_idempotent() {
    let (_, _, original) = recorded_executor();
    let shared = Rc::new(RefCell::new(original.clone()));
    let mut interceptor = ConsoleInterceptor::new(shared.clone());
    interceptor.install(&OutputSink::new());
    assert!(!shared.borrow().same_as(&original));
    interceptor.restore();
    interceptor.restore();
    assert!(!interceptor.is_installed());
    assert!(shared.borrow().same_as(&original));
}

// ============================================================================
// Isolation and deferred work
// ============================================================================

#[test]
fn test_runs_do_not_share_state() {
    let executor = SnippetExecutor::new();
    assert_eq!(executor.run("var counter = 1; console.log(counter)"), success("1"));
    assert_eq!(
        executor.run("console.log(typeof counter)"),
        success("undefined")
    );
}

#[test]
fn test_deferred_output_is_dropped() {
    let executor = SnippetExecutor::new();
    let result = executor.run(
        "console.log('Start');\n\
         setTimeout(() => console.log('Timeout'), 0);\n\
         Promise.resolve().then(() => console.log('Promise'));\n\
         queueMicrotask(() => console.log('Micro'));\n\
         console.log('End');",
    );
    assert_eq!(result, success("Start\nEnd"));
}

#[test]
fn test_promise_executor_runs_synchronously() {
    let executor = SnippetExecutor::new();
    let result = executor.run(
        "new Promise(resolve => { console.log('inside'); resolve(1); });\n\
         console.log('after');",
    );
    assert_eq!(result, success("inside\nafter"));
}

// ============================================================================
// Limits
// ============================================================================

#[test]
fn test_runaway_recursion_is_a_range_error() {
    let executor = SnippetExecutor::new();
    assert_eq!(
        executor.run("function f() { return f(); } f();"),
        failure("Error: Maximum call stack size exceeded")
    );
}

#[test]
fn test_recursion_error_can_be_caught() {
    let executor = SnippetExecutor::new();
    let result = executor.run(
        "function f() { return f(); }\n\
         try { f(); } catch (e) { console.log(e instanceof RangeError); }",
    );
    assert_eq!(result, success("true"));
}

#[test]
fn test_step_budget_stops_infinite_loop() {
    let executor = SnippetExecutor::new().with_limits(ExecutionLimits {
        max_steps: Some(10_000),
        ..ExecutionLimits::default()
    });
    assert_eq!(
        executor.run("console.log('looping'); while (true) {}"),
        failure("Error: Execution step budget exhausted")
    );
}

#[test]
fn test_step_budget_cannot_be_caught() {
    let executor = SnippetExecutor::new().with_limits(ExecutionLimits {
        max_steps: Some(10_000),
        ..ExecutionLimits::default()
    });
    let result = executor.run("try { for (;;) {} } catch (e) { console.log('caught'); }");
    assert_eq!(result, failure("Error: Execution step budget exhausted"));
}

#[test]
fn test_generous_budget_lets_snippets_finish() {
    let executor = SnippetExecutor::new().with_limits(ExecutionLimits {
        max_steps: Some(1_000_000),
        ..ExecutionLimits::default()
    });
    let result = executor.run("let sum = 0; for (let i = 1; i <= 100; i++) { sum += i; } console.log(sum);");
    assert_eq!(result, success("5050"));
}

#[test]
fn test_default_call_depth_fits_deep_recursion() {
    let executor = SnippetExecutor::new();
    let code = "function sum(n) { return n === 0 ? 0 : n + sum(n - 1); }\n\
                console.log(sum(900));";
    assert_eq!(executor.run(code), success("405450"));
    assert_eq!(
        executor.run("function sum(n) { return n === 0 ? 0 : n + sum(n - 1); } sum(5000);"),
        failure("Error: Maximum call stack size exceeded")
    );
}

#[test]
fn test_raised_call_depth_is_honored() {
    let executor = SnippetExecutor::new().with_limits(ExecutionLimits {
        max_call_depth: 3000,
        ..ExecutionLimits::default()
    });
    let code = "function sum(n) { return n === 0 ? 0 : n + sum(n - 1); }\n\
                console.log(sum(2500));";
    assert_eq!(executor.run(code), success("3126250"));
}

#[test]
fn test_call_depth_above_supported_limit_is_clamped() {
    let executor = SnippetExecutor::new().with_limits(ExecutionLimits {
        max_call_depth: usize::MAX,
        ..ExecutionLimits::default()
    });
    assert!(executor.limits().validate().is_err());
    let code = format!(
        "function f(n) {{ return n === 0 ? 0 : f(n - 1); }} f({});",
        MAX_CALL_DEPTH_LIMIT + 10
    );
    assert_eq!(
        executor.run(&code),
        failure("Error: Maximum call stack size exceeded")
    );
}

// ============================================================================
// Resource exhaustion
// ============================================================================

#[test]
fn test_deeply_nested_parentheses() {
    let executor = SnippetExecutor::new();
    let code = format!("console.log({}1{})", "(".repeat(50), ")".repeat(50));
    assert_eq!(executor.run(&code), success("1"));

    let code = format!("console.log({}1{})", "(".repeat(300), ")".repeat(300));
    assert_eq!(
        executor.run(&code),
        failure("Error: Maximum nesting depth exceeded")
    );
}

#[test]
fn test_deeply_nested_array_literal_evaluates() {
    let executor = SnippetExecutor::new();
    let code = format!(
        "const deep = {}1{}; console.log(JSON.stringify(deep).length);",
        "[".repeat(100),
        "]".repeat(100)
    );
    assert_eq!(executor.run(&code), success("201"));
}

#[test]
fn test_huge_arrays_are_range_errors() {
    let executor = SnippetExecutor::new();
    for code in [
        "const a = []; a[1e9] = 1;",
        "new Array(4294967295)",
        "const a = []; a.length = 1e9;",
        "Array.from({ length: 1e9 })",
    ] {
        assert_eq!(
            executor.run(code),
            failure("Error: Invalid array length"),
            "{}",
            code
        );
    }
    assert_eq!(
        executor.run("try { new Array(-1); } catch (e) { console.log(e.name); }"),
        success("RangeError")
    );
}

#[test]
fn test_huge_strings_are_range_errors() {
    let executor = SnippetExecutor::new();
    for code in [
        "'ab'.padStart(1e10)",
        "'ab'.padEnd(1e10, '-')",
        "'ab'.repeat(1e10)",
        "let s = 'x'; while (true) { s = s + s; }",
        "let s = 'x'; while (true) { s = `${s}${s}`; }",
    ] {
        assert_eq!(
            executor.run(code),
            failure("Error: Invalid string length"),
            "{}",
            code
        );
    }
}

#[test]
fn test_self_containing_array_flat_is_an_error() {
    let executor = SnippetExecutor::new();
    assert_eq!(
        executor.run("const a = [1]; a.push(a); a.flat(Infinity);"),
        failure("Error: Maximum call stack size exceeded")
    );
}

// ============================================================================
// Async functions
// ============================================================================

#[test]
fn test_async_function_body_runs_until_first_await() {
    let executor = SnippetExecutor::new();
    assert_eq!(
        executor.run("async function demo(){console.log('Start');} demo();"),
        success("Start")
    );
    assert_eq!(
        executor.run(
            "async function demo() {\n\
               console.log('Start');\n\
               await null;\n\
               console.log('After');\n\
             }\n\
             demo();\n\
             console.log('Sync');"
        ),
        success("Start\nSync")
    );
}

#[test]
fn test_async_function_returns_a_promise() {
    let executor = SnippetExecutor::new();
    let result = executor.run(
        "async function getData() { return 1; }\n\
         const p = getData();\n\
         console.log(p instanceof Promise, typeof p.then);",
    );
    assert_eq!(result, success("true function"));
}

#[test]
fn test_await_skips_catch_and_finally() {
    let executor = SnippetExecutor::new();
    let result = executor.run(
        "const load = async () => {\n\
           try {\n\
             console.log('Loading...');\n\
             await Promise.resolve(1);\n\
             console.log('Loaded');\n\
           } catch (e) {\n\
             console.log('caught');\n\
           } finally {\n\
             console.log('Done');\n\
           }\n\
         };\n\
         load();",
    );
    assert_eq!(result, success("Loading..."));
}

#[test]
fn test_errors_before_await_reject_the_promise() {
    let executor = SnippetExecutor::new();
    let result = executor.run(
        "async function fail() { throw new Error('inside'); }\n\
         fail();\n\
         console.log('still running');",
    );
    assert_eq!(result, success("still running"));
}

#[test]
fn test_async_methods_and_arrows() {
    let executor = SnippetExecutor::new();
    let result = executor.run(
        "const api = { async load() { console.log('method'); } };\n\
         const arrow = async x => console.log('arrow', x);\n\
         api.load();\n\
         arrow(1);",
    );
    assert_eq!(result, success("method\narrow 1"));
    assert_eq!(
        executor.run("const f = async () => {}; new f();"),
        failure("Error: f is not a constructor")
    );
}

#[test]
fn test_top_level_await_is_a_syntax_failure() {
    let executor = SnippetExecutor::new();
    assert_eq!(
        executor.run("await Promise.resolve(1);"),
        failure(
            "Error: await is only valid in async functions and the top level bodies of modules"
        )
    );
}

// ============================================================================
// Promise combinators, Symbol and BigInt
// ============================================================================

#[test]
fn test_promise_combinator_reactions_are_deferred() {
    let executor = SnippetExecutor::new();
    assert_eq!(
        executor.run(
            "Promise.all([Promise.resolve(1)]).then(v => console.log(v));\n\
             console.log('sync')"
        ),
        success("sync")
    );
    let result = executor.run(
        "const kinds = [Promise.all([]), Promise.allSettled([1]), Promise.race([1]), Promise.any([1])];\n\
         console.log(kinds.every(p => p instanceof Promise));",
    );
    assert_eq!(result, success("true"));
    assert_eq!(
        executor.run("Promise.all(5).catch(e => console.log(e.name)); console.log('after')"),
        success("after")
    );
}

#[test]
fn test_symbols() {
    let executor = SnippetExecutor::new();
    let result = executor.run(
        "const id = Symbol('userId');\n\
         const user = { name: 'Alice' };\n\
         user[id] = 7;\n\
         console.log(typeof id, String(id), id.description);\n\
         console.log(user[id], Object.keys(user).length, JSON.stringify(user));",
    );
    assert_eq!(result, success("symbol Symbol(userId) userId\n7 1 {\"name\":\"Alice\"}"));
    assert_eq!(
        executor.run("const s = Symbol('x'); console.log('' + s);"),
        failure("Error: Cannot convert a Symbol value to a string")
    );
    assert_eq!(
        executor.run("new Symbol('x')"),
        failure("Error: Symbol is not a constructor")
    );
}

#[test]
fn test_bigints() {
    let executor = SnippetExecutor::new();
    let result = executor.run(
        "const big = 9007199254740991n;\n\
         console.log(big + 1n, typeof big, 7n / 2n, -(2n ** 64n));\n\
         console.log(BigInt('12345678901234567890'), BigInt(10) === 10n, 10n == 10);",
    );
    assert_eq!(
        result,
        success("9007199254740992 bigint 3 -18446744073709551616\n12345678901234567890 true true")
    );
    assert_eq!(
        executor.run("1n + 1"),
        failure("Error: Cannot mix BigInt and other types, use explicit conversions")
    );
    assert_eq!(executor.run("1n / 0n"), failure("Error: Division by zero"));
    assert_eq!(
        executor.run("2n ** 200n"),
        failure("Error: Maximum BigInt size exceeded")
    );
    assert_eq!(
        executor.run("JSON.stringify({ n: 1n })"),
        failure("Error: Do not know how to serialize a BigInt")
    );
}

// ============================================================================
// Lesson snippets
// ============================================================================

/// One lesson snippet per row, with the transcript the lesson page shows.
/// Deferred output (timers, promise reactions, code after an `await`) never
/// appears.
const LESSON_SNIPPETS: &[(&str, &str, &str)] = &[
    (
        "variables/reassign",
        r#"let count = 0;
count = count + 1;
count = count + 1;
count++;
console.log('Count:', count);
let message = 'Hello';
message = 'Goodbye';
console.log('Message:', message);"#,
        "Count: 3\nMessage: Goodbye",
    ),
    (
        "variables/hoisting",
        r#"console.log('Before declaration:', x);
var x = 5;
console.log('After declaration:', x);"#,
        "Before declaration: undefined\nAfter declaration: 5",
    ),
    (
        "variables/var-scope",
        r#"var y = 10;
if (true) {
  var y = 20;
  console.log('Inside block:', y);
}
console.log('Outside block:', y);"#,
        "Inside block: 20\nOutside block: 20",
    ),
    (
        "data-types/symbol-bigint",
        r#"const id = Symbol('userId');
const anotherId = Symbol('userId');
console.log(typeof id);
console.log(id === anotherId);
console.log(id.toString());
const bigNumber = 9007199254740991n;
const anotherBig = BigInt('12345678901234567890');
console.log(typeof bigNumber);
console.log(bigNumber + 1n);"#,
        "symbol\nfalse\nSymbol(userId)\nbigint\n9007199254740992",
    ),
    (
        "data-types/typeof",
        r#"console.log(typeof 'hello');
console.log(typeof 42);
console.log(typeof true);
console.log(typeof undefined);
console.log(typeof null);
console.log(typeof {});
console.log(typeof []);
console.log(typeof function(){});
console.log(typeof Symbol('id'));
console.log(typeof 10n);"#,
        "string\nnumber\nboolean\nundefined\nobject\nobject\nobject\nfunction\nsymbol\nbigint",
    ),
    (
        "data-types/numbers",
        r#"const integer = 42;
const notANumber = NaN;
console.log(typeof integer);
console.log(typeof NaN);
console.log(0.1 + 0.2);
console.log(0.1 + 0.2 === 0.3);"#,
        "number\nnumber\n0.30000000000000004\nfalse",
    ),
    (
        "functions/defaults",
        r#"const greet = (name = 'Guest', greeting = 'Hello') => {
  return `${greeting}, ${name}!`;
};
console.log(greet());
console.log(greet('Alice'));
console.log(greet('Bob', 'Hi'));"#,
        "Hello, Guest!\nHello, Alice!\nHi, Bob!",
    ),
    (
        "functions/arrow-forms",
        r#"const sayHello = () => 'Hello!';
const square = x => x * x;
const add = (a, b) => a + b;
const makePerson = (name, age) => ({ name, age });
console.log(sayHello());
console.log('square(5):', square(5));
console.log('add(3, 7):', add(3, 7));
console.log(makePerson('Alice', 25));"#,
        "Hello!\nsquare(5): 25\nadd(3, 7): 10\n[object Object]",
    ),
    (
        "arrays/chain",
        r#"const numbers = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
const result = numbers
  .filter(n => n % 2 === 0)
  .map(n => n * 2);
console.log('Even numbers doubled:', result);"#,
        "Even numbers doubled: 4,8,12,16,20",
    ),
    (
        "arrays/todos",
        r#"const todos = [
  { id: 1, text: 'Learn React', completed: false },
  { id: 2, text: 'Build project', completed: false },
  { id: 3, text: 'Deploy app', completed: true }
];
const incompleteTodos = todos
  .filter(todo => !todo.completed)
  .map(todo => `• ${todo.text}`);
console.log('Incomplete tasks:');
console.log(incompleteTodos.join('\n'));"#,
        "Incomplete tasks:\n• Learn React\n• Build project",
    ),
    (
        "arrays/copying",
        r#"const fruits = ['apple', 'banana', 'orange', 'mango'];
const someFruits = fruits.slice(1, 3);
console.log('Slice (1-3):', someFruits);
const moreFruits = fruits.concat(['grape', 'kiwi']);
console.log('Concatenated:', moreFruits);
const evenMore = [...fruits, 'peach'];
console.log('With spread:', evenMore);"#,
        "Slice (1-3): banana,orange\n\
         Concatenated: apple,banana,orange,mango,grape,kiwi\n\
         With spread: apple,banana,orange,mango,peach",
    ),
    (
        "conditions/else-if",
        r#"const grade = 85;
if (grade >= 90) {
  console.log('Grade: A');
} else if (grade >= 80) {
  console.log('Grade: B');
} else {
  console.log('Grade: F');
}"#,
        "Grade: B",
    ),
    (
        "conditions/equality",
        r#"const num = 5;
const str = '5';
console.log('5 === "5":', num === str);
console.log('5 == "5":', num == str);
console.log('Always use === in React!');"#,
        "5 === \"5\": false\n5 == \"5\": true\nAlways use === in React!",
    ),
    (
        "ternary/nested",
        r#"const score = 75;
const grade = score >= 90 ? 'A'
  : score >= 80 ? 'B'
  : score >= 70 ? 'C'
  : 'F';
console.log('Score:', score, '→ Grade:', grade);"#,
        "Score: 75 → Grade: C",
    ),
    (
        "ternary/template",
        r#"const user = { name: 'Alice', isPremium: true };
const greeting = `Welcome ${user.isPremium ? 'Premium User' : 'User'} ${user.name}!`;
console.log(greeting);
const itemCount = 5;
const message = `You have ${itemCount} item${itemCount !== 1 ? 's' : ''}`;
console.log(message);"#,
        "Welcome Premium User Alice!\nYou have 5 items",
    ),
    (
        "ternary/discount",
        r#"const getDiscount = (isPremium) => {
  return isPremium ? 20 : 10;
};
const discount = getDiscount(true);
const price = 100;
const finalPrice = price - (price * discount / 100);
console.log('Discount:', discount + '%');
console.log('Final price: $' + finalPrice);"#,
        "Discount: 20%\nFinal price: $80",
    ),
    (
        "callbacks/timeout",
        r#"console.log('1. Start');
setTimeout(() => {
  console.log('3. Inside setTimeout (runs later)');
}, 1000);
console.log('2. End (runs before setTimeout!)');"#,
        "1. Start\n2. End (runs before setTimeout!)",
    ),
    (
        "callbacks/todo-app",
        r#"const TodoApp = () => {
  const todos = ['Learn callbacks', 'Learn promises'];
  const handleAddTodo = (newTodo) => {
    console.log('Adding todo:', newTodo);
    todos.push(newTodo);
    console.log('All todos:', todos);
  };
  const handleDeleteTodo = (index) => {
    console.log('Deleting todo at index:', index);
    todos.splice(index, 1);
    console.log('Remaining todos:', todos);
  };
  handleAddTodo('Learn async/await');
  handleDeleteTodo(0);
  return todos;
};
TodoApp();"#,
        "Adding todo: Learn async/await\n\
         All todos: Learn callbacks,Learn promises,Learn async/await\n\
         Deleting todo at index: 0\n\
         Remaining todos: Learn promises,Learn async/await",
    ),
    (
        "callbacks/nested-timers",
        r#"function step1(callback) {
  setTimeout(() => {
    console.log('Step 1 complete');
    callback();
  }, 100);
}
step1(() => console.log('All steps done!'));"#,
        NO_OUTPUT_PLACEHOLDER,
    ),
    (
        "promises/chain",
        r#"const step1 = () => {
  return Promise.resolve(5);
};
step1()
  .then(result => {
    console.log('Step 1 result:', result);
    return result * 2;
  })
  .then(result => {
    console.log('Final result:', result);
  });"#,
        NO_OUTPUT_PLACEHOLDER,
    ),
    (
        "promises/finally",
        r#"const fetchData = () => {
  return new Promise((resolve) => {
    setTimeout(() => resolve('Data loaded'), 1000);
  });
};
console.log('Loading...');
fetchData()
  .then(data => console.log(data))
  .catch(error => console.log('Error:', error))
  .finally(() => console.log('Done loading'));"#,
        "Loading...",
    ),
    (
        "promises/all",
        r#"const fetchUsers = () => Promise.resolve(['Alice', 'Bob']);
const fetchPosts = () => Promise.resolve(['Post 1', 'Post 2']);
Promise.all([fetchUsers(), fetchPosts()])
  .then(results => {
    const [users, posts] = results;
    console.log('Users:', users);
  });"#,
        NO_OUTPUT_PLACEHOLDER,
    ),
    (
        "async-await/delay",
        r#"const delay = (ms) => {
  return new Promise(resolve => setTimeout(resolve, ms));
};
async function demo() {
  console.log('Start');
  await delay(1000);
  console.log('After 1 second');
}
demo();"#,
        "Start",
    ),
    (
        "async-await/sequential-parallel",
        r#"const fetchData = (name, delay) => {
  return new Promise(resolve => {
    setTimeout(() => resolve(name), delay);
  });
};
async function sequential() {
  console.log('Sequential start');
  const a = await fetchData('First', 1000);
  const b = await fetchData('Second', 1000);
  console.log('Sequential done:', a, b);
}
async function parallel() {
  console.log('Parallel start');
  const [a, b] = await Promise.all([
    fetchData('First', 1000),
    fetchData('Second', 1000)
  ]);
  console.log('Parallel done:', a, b);
}
sequential();
parallel();"#,
        "Sequential start\nParallel start",
    ),
    (
        "async-await/use-effect",
        r#"const useEffectSimulation = () => {
  async function fetchData() {
    try {
      console.log('Fetching users...');
      const response = await Promise.resolve({
        users: ['Alice', 'Bob', 'Charlie']
      });
      console.log('Users loaded:', response.users);
    } catch (error) {
      console.log('Error:', error.message);
    }
  }
  fetchData();
};
useEffectSimulation();"#,
        "Fetching users...",
    ),
    (
        "async-await/arrow",
        r#"const getData2 = async () => {
  return 'data';
};
const fetchAndLog = async () => {
  const data = await getData2();
  console.log('Data:', data);
};
fetchAndLog();"#,
        NO_OUTPUT_PLACEHOLDER,
    ),
    (
        "event-loop/call-stack",
        r#"function first() {
  console.log('1. First function');
  second();
  console.log('5. First function done');
}
function second() {
  console.log('2. Second function');
  third();
  console.log('4. Second function done');
}
function third() {
  console.log('3. Third function');
}
first();"#,
        "1. First function\n2. Second function\n3. Third function\n\
         4. Second function done\n5. First function done",
    ),
    (
        "event-loop/set-state",
        r#"const simulateReactState = () => {
  let count = 0;
  const setState = (newValue) => {
    Promise.resolve().then(() => {
      count = newValue;
      console.log('State updated:', count);
    });
  };
  console.log('1. Before setState, count:', count);
  setState(1);
  console.log('2. After setState, count:', count);
};
simulateReactState();"#,
        "1. Before setState, count: 0\n2. After setState, count: 0",
    ),
    (
        "event-loop/debounce",
        r#"const debounce = (func, delay) => {
  let timeoutId;
  return (...args) => {
    clearTimeout(timeoutId);
    timeoutId = setTimeout(() => func(...args), delay);
  };
};
const debouncedSearch = debounce(q => console.log('Searching for:', q), 1000);
console.log('1. User types...');
debouncedSearch('a');
debouncedSearch('abc');
console.log('2. Waiting for debounce...');"#,
        "1. User types...\n2. Waiting for debounce...",
    ),
    (
        "es-standards/destructuring",
        r#"const user = {
  name: 'Alice',
  age: 30,
  email: 'alice@example.com'
};
const { name, age } = user;
console.log(name, age);
const colors = ['red', 'blue', 'green'];
const [first, second] = colors;
console.log(first, second);"#,
        "Alice 30\nred blue",
    ),
    (
        "es-standards/spread",
        r#"const fruits = ['apple', 'banana'];
const moreFruits = [...fruits, 'orange', 'mango'];
console.log(moreFruits);
const user = { name: 'John', age: 25 };
const updatedUser = { ...user, age: 26 };
console.log(updatedUser);"#,
        "apple,banana,orange,mango\n[object Object]",
    ),
];

#[test]
fn test_lesson_snippets() {
    let executor = SnippetExecutor::new();
    for (name, code, expected) in LESSON_SNIPPETS {
        assert_eq!(executor.run(code), success(expected), "lesson {}", name);
    }
}

#[test]
fn test_lesson_snippet_mixing_var_and_const_fails() {
    let executor = SnippetExecutor::new();
    let code = r#"// ES5 way
var name = 'John';
var age = 25;

// ES6 way
const name = 'John';
let age = 25;

console.log(name, age);"#;
    assert_eq!(
        executor.run(code),
        failure("Error: Identifier 'name' has already been declared")
    );
}
