//! Tests for the built-in library.
//!
//! Math is exercised by calling registry methods directly; everything else
//! runs snippets and compares the captured console transcript.

extern crate jsprimer;

use std::rc::Rc;

use jsprimer::runner::ds::value::JsValue;
use jsprimer::runner::plugin::registry::BuiltInRegistry;
use jsprimer::runner::plugin::types::{EvalContext, ExecutionLimits};
use jsprimer::runner::std_lib::console::ConsoleBindings;
use jsprimer::snippet::{ExecutionResult, SnippetExecutor};

/// Helper to run a snippet that must succeed and return its transcript.
fn output(code: &str) -> String {
    match SnippetExecutor::new().run(code) {
        ExecutionResult::Success(text) => text,
        ExecutionResult::Failure(text) => panic!("{:?} failed: {}", code, text),
    }
}

/// Helper to run a snippet that must fail and return the failure text.
fn failure(code: &str) -> String {
    match SnippetExecutor::new().run(code) {
        ExecutionResult::Success(text) => panic!("{:?} succeeded with {:?}", code, text),
        ExecutionResult::Failure(text) => text,
    }
}

// ============================================================================
// Math tests
// ============================================================================

mod math_tests {
    use super::*;

    fn call_math_method(method: &str, args: Vec<JsValue>) -> JsValue {
        let registry = Rc::new(BuiltInRegistry::with_core());
        let mut ctx = EvalContext::new(
            registry.clone(),
            ConsoleBindings::host(),
            ExecutionLimits::default(),
        );
        registry
            .get_method("Math", method)
            .unwrap_or_else(|| panic!("Math.{} should exist", method))
            .call(&mut ctx, JsValue::Undefined, args)
            .unwrap_or_else(|e| panic!("Math.{} should succeed: {}", method, e))
    }

    fn num(n: f64) -> JsValue {
        JsValue::Number(n)
    }

    #[test]
    fn test_math_abs() {
        assert_eq!(call_math_method("abs", vec![num(-42.0)]), num(42.0));
        assert_eq!(call_math_method("abs", vec![num(3.5)]), num(3.5));
    }

    #[test]
    fn test_math_rounding() {
        assert_eq!(call_math_method("floor", vec![num(3.7)]), num(3.0));
        assert_eq!(call_math_method("ceil", vec![num(3.2)]), num(4.0));
        assert_eq!(call_math_method("round", vec![num(2.5)]), num(3.0));
        assert_eq!(call_math_method("round", vec![num(-2.5)]), num(-2.0));
        assert_eq!(call_math_method("trunc", vec![num(-4.7)]), num(-4.0));
    }

    #[test]
    fn test_math_min_max() {
        assert_eq!(
            call_math_method("max", vec![num(1.0), num(5.0), num(3.0)]),
            num(5.0)
        );
        assert_eq!(
            call_math_method("min", vec![num(1.0), num(-5.0), num(3.0)]),
            num(-5.0)
        );
        assert_eq!(call_math_method("max", vec![]), num(f64::NEG_INFINITY));
        assert_eq!(call_math_method("min", vec![]), num(f64::INFINITY));
    }

    #[test]
    fn test_math_max_with_nan() {
        match call_math_method("max", vec![num(1.0), JsValue::String("x".to_string())]) {
            JsValue::Number(n) => assert!(n.is_nan()),
            other => panic!("Expected NaN, got {:?}", other),
        }
    }

    #[test]
    fn test_math_pow_sqrt() {
        assert_eq!(call_math_method("pow", vec![num(2.0), num(8.0)]), num(256.0));
        assert_eq!(call_math_method("sqrt", vec![num(81.0)]), num(9.0));
        assert_eq!(call_math_method("sign", vec![num(-3.0)]), num(-1.0));
    }

    #[test]
    fn test_math_random_range() {
        for _ in 0..100 {
            match call_math_method("random", vec![]) {
                JsValue::Number(n) => assert!((0.0..1.0).contains(&n)),
                other => panic!("Expected a number, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_math_constants_from_script() {
        assert_eq!(output("console.log(Math.PI.toFixed(4))"), "3.1416");
    }
}

// ============================================================================
// String tests
// ============================================================================

#[test]
fn test_string_case_and_trim() {
    assert_eq!(
        output("console.log('  Hello  '.trim().toUpperCase(), 'MiXeD'.toLowerCase())"),
        "HELLO mixed"
    );
    assert_eq!(output("console.log('[' + '  x '.trimStart() + ']')"), "[x ]");
}

#[test]
fn test_string_search() {
    assert_eq!(
        output(
            "const s = 'JavaScript';\n\
             console.log(s.indexOf('a'), s.lastIndexOf('a'), s.includes('Script'), s.startsWith('Java'), s.endsWith('x'))"
        ),
        "1 3 true true false"
    );
}

#[test]
fn test_string_slicing() {
    assert_eq!(
        output("const s = 'primer'; console.log(s.slice(1, 3), s.slice(-3), s.substring(4, 1), s.at(-1), s.charAt(0))"),
        "ri mer rim r p"
    );
}

#[test]
fn test_string_split() {
    assert_eq!(output("console.log('a,b,,c'.split(',').length)"), "4");
    assert_eq!(output("console.log('abc'.split('').join('|'))"), "a|b|c");
    assert_eq!(output("console.log('a b c'.split(' ', 2).join('+'))"), "a+b");
    assert_eq!(output("console.log('whole'.split().length)"), "1");
}

#[test]
fn test_string_padding_and_repeat() {
    assert_eq!(
        output("console.log('5'.padStart(3, '0'), 'ab'.padEnd(5, '-') + '|', 'ha'.repeat(3))"),
        "005 ab---| hahaha"
    );
    assert_eq!(failure("'x'.repeat(-1)"), "Error: Invalid count value: -1");
}

#[test]
fn test_string_replace() {
    assert_eq!(
        output("console.log('a-b-c'.replace('-', '+'), 'a-b-c'.replaceAll('-', '+'))"),
        "a+b-c a+b+c"
    );
    assert_eq!(
        output("console.log('cat'.replace('a', '[$&]'), 'x1x'.replaceAll('x', m => m.toUpperCase()))"),
        "c[a]t X1X"
    );
}

#[test]
fn test_string_char_codes() {
    assert_eq!(
        output("console.log('A'.charCodeAt(0), String.fromCharCode(72, 105))"),
        "65 Hi"
    );
}

#[test]
fn test_string_conversion() {
    assert_eq!(
        output("console.log(String(123) === '123', String(null), String([1, [2, 3]]), typeof String(1))"),
        "true null 1,2,3 string"
    );
}

// ============================================================================
// Number tests
// ============================================================================

#[test]
fn test_number_conversion() {
    assert_eq!(
        output("console.log(Number('42'), Number(''), Number('  7 '), Number('12px'), Number(true), Number(null))"),
        "42 0 7 NaN 1 0"
    );
}

#[test]
fn test_parse_int_and_float() {
    assert_eq!(
        output("console.log(parseInt('42px'), parseInt('0x1F'), parseInt('101', 2), parseFloat('3.14abc'), parseInt('abc'))"),
        "42 31 5 3.14 NaN"
    );
}

#[test]
fn test_number_predicates() {
    assert_eq!(
        output("console.log(Number.isInteger(5), Number.isInteger(5.5), Number.isNaN('x'), isNaN('x'), Number.isSafeInteger(2 ** 53))"),
        "true false false true false"
    );
}

#[test]
fn test_number_formatting() {
    assert_eq!(
        output("console.log((3.14159).toFixed(2), (255).toString(16), (5).toString(2), (0.1 + 0.2).toFixed(1), (1.005).toFixed(2))"),
        "3.14 ff 101 0.3 1.00"
    );
    assert_eq!(
        failure("(1).toString(1)"),
        "Error: toString() radix must be between 2 and 36"
    );
}

#[test]
fn test_number_display() {
    assert_eq!(
        output("console.log(0.1 + 0.2, 1 / 3, 1e21, 2 ** 53, -0, 100)"),
        "0.30000000000000004 0.3333333333333333 1e+21 9007199254740992 0 100"
    );
}

// ============================================================================
// Array tests
// ============================================================================

#[test]
fn test_array_mutators() {
    assert_eq!(
        output(
            "const a = [1, 2, 3];\n\
             a.push(4, 5); a.unshift(0);\n\
             console.log(a.pop(), a.shift(), a.join());\n\
             const removed = a.splice(1, 2, 'x');\n\
             console.log(removed.join(), a.join());\n\
             console.log(a.reverse().join())"
        ),
        "5 0 1,2,3,4\n2,3 1,x,4\n4,x,1"
    );
}

#[test]
fn test_array_iteration() {
    assert_eq!(
        output(
            "const n = [1, 2, 3, 4];\n\
             console.log(n.map(x => x * 2).join(), n.filter(x => x % 2).join(), n.reduce((a, b) => a + b, 0));\n\
             console.log(n.find(x => x > 2), n.findIndex(x => x > 2), n.some(x => x > 3), n.every(x => x > 0));\n\
             let seen = [];\n\
             n.forEach((x, i) => seen.push(i + ':' + x));\n\
             console.log(seen.join(' '))"
        ),
        "2,4,6,8 1,3 10\n3 2 true true\n0:1 1:2 2:3 3:4"
    );
}

#[test]
fn test_array_sort() {
    assert_eq!(
        output(
            "console.log([10, 9, 1, 100].sort().join());\n\
             console.log([10, 9, 1, 100].sort((a, b) => a - b).join());\n\
             const people = [{ n: 'b', a: 30 }, { n: 'a', a: 25 }, { n: 'c', a: 30 }];\n\
             console.log(people.sort((x, y) => x.a - y.a).map(p => p.n).join())"
        ),
        "1,10,100,9\n1,9,10,100\na,b,c"
    );
}

#[test]
fn test_array_search_and_slice() {
    assert_eq!(
        output("const a = ['x', 'y', 'z', 'y']; console.log(a.indexOf('y'), a.lastIndexOf('y'), a.includes('q'), a.slice(1, -1).join(), a.at(-2))"),
        "1 3 false y,z z"
    );
    assert_eq!(output("console.log([NaN].includes(NaN), [NaN].indexOf(NaN))"), "true -1");
}

#[test]
fn test_array_flat_and_concat() {
    assert_eq!(
        output("console.log([1, [2, [3, [4]]]].flat().length, [1, [2, [3]]].flat(Infinity).join(), [1].concat([2, 3], 4).join(), [[1, 2], [3]].flatMap(x => x).length)"),
        "3 1,2,3 1,2,3,4 3"
    );
}

#[test]
fn test_array_constructors() {
    assert_eq!(
        output("console.log(Array.isArray([]), Array.isArray('no'), Array.from('abc').join(), Array.of(7).length, new Array(3).length, Array.from({ length: 3 }, (_, i) => i * i).join())"),
        "true false a,b,c 1 3 0,1,4"
    );
    assert_eq!(failure("new Array(-1)"), "Error: Invalid array length");
}

#[test]
fn test_array_fill_and_reduce_right() {
    assert_eq!(
        output("console.log(new Array(3).fill(0).join(), ['a', 'b', 'c'].reduceRight((acc, x) => acc + x, ''))"),
        "0,0,0 cba"
    );
    assert_eq!(
        failure("[].reduce((a, b) => a + b)"),
        "Error: Reduce of empty array with no initial value"
    );
}

// ============================================================================
// Object tests
// ============================================================================

#[test]
fn test_object_reflection() {
    assert_eq!(
        output(
            "const o = { name: 'Ann', age: 30 };\n\
             console.log(Object.keys(o).join(), Object.values(o).join());\n\
             console.log(Object.entries(o).map(([k, v]) => k + '=' + v).join('&'))"
        ),
        "name,age Ann,30\nname=Ann&age=30"
    );
}

#[test]
fn test_object_assign_and_from_entries() {
    assert_eq!(
        output("const t = Object.assign({ a: 1 }, { b: 2 }, null, { a: 3 }); console.log(JSON.stringify(t), JSON.stringify(Object.fromEntries([['x', 1], ['y', 2]])))"),
        "{\"a\":3,\"b\":2} {\"x\":1,\"y\":2}"
    );
}

#[test]
fn test_object_freeze() {
    assert_eq!(
        output("const o = Object.freeze({ a: 1 }); console.log(Object.isFrozen(o), Object.isFrozen({}))"),
        "true false"
    );
    assert!(failure("const o = Object.freeze({ a: 1 }); o.a = 2;").starts_with("Error: Cannot assign"));
}

#[test]
fn test_object_prototype_methods() {
    assert_eq!(
        output("const o = { a: 1 }; console.log(o.hasOwnProperty('a'), o.hasOwnProperty('b'), o.toString(), [1, 2].toString())"),
        "true false [object Object] 1,2"
    );
}

#[test]
fn test_object_create() {
    assert_eq!(
        output("const base = { greet() { return 'hi ' + this.name; } }; const o = Object.create(base); o.name = 'Bo'; console.log(o.greet(), Object.getPrototypeOf(o) === base)"),
        "hi Bo true"
    );
    assert_eq!(
        failure("Object.keys(null)"),
        "Error: Cannot convert undefined or null to object"
    );
}

// ============================================================================
// JSON tests
// ============================================================================

#[test]
fn test_json_stringify() {
    assert_eq!(
        output("console.log(JSON.stringify({ a: [1, 'two', null, true], b: undefined, c: () => 1, d: NaN }))"),
        "{\"a\":[1,\"two\",null,true],\"d\":null}"
    );
    assert_eq!(output("console.log(JSON.stringify('he said \"hi\"'))"), "\"he said \\\"hi\\\"\"");
    assert_eq!(output("console.log(JSON.stringify(undefined))"), "undefined");
}

#[test]
fn test_json_stringify_indent() {
    assert_eq!(
        output("console.log(JSON.stringify({ a: 1, b: [1, 2] }, null, 2))"),
        "{\n  \"a\": 1,\n  \"b\": [\n    1,\n    2\n  ]\n}"
    );
}

#[test]
fn test_json_stringify_replacer_and_to_json() {
    assert_eq!(
        output("console.log(JSON.stringify({ a: 1, b: 2, c: 3 }, ['a', 'c']), JSON.stringify({ a: 1, b: 'x' }, (k, v) => typeof v === 'number' ? v * 10 : v))"),
        "{\"a\":1,\"c\":3} {\"a\":10,\"b\":\"x\"}"
    );
    assert_eq!(
        output("console.log(JSON.stringify({ when: { toJSON() { return 'today'; } } }))"),
        "{\"when\":\"today\"}"
    );
}

#[test]
fn test_json_circular() {
    assert_eq!(
        failure("const o = {}; o.self = o; JSON.stringify(o)"),
        "Error: Converting circular structure to JSON"
    );
}

#[test]
fn test_json_parse() {
    assert_eq!(
        output("const v = JSON.parse('{\"n\": 1.5, \"list\": [1, 2], \"ok\": true, \"none\": null}'); console.log(v.n, v.list.length, v.ok, v.none)"),
        "1.5 2 true null"
    );
    assert_eq!(
        output("console.log(JSON.stringify(JSON.parse('{\"a\":1,\"b\":2}', (k, v) => k === 'a' ? undefined : v)))"),
        "{\"b\":2}"
    );
    assert!(failure("JSON.parse('{bad json}')").starts_with("Error: Unexpected token in JSON"));
}

// ============================================================================
// Error tests
// ============================================================================

#[test]
fn test_error_constructors() {
    assert_eq!(
        output(
            "const e = new RangeError('out of range');\n\
             console.log(e.name, e.message, e instanceof RangeError, e instanceof Error, e instanceof TypeError);\n\
             console.log(String(new Error('plain')), String(Error()))"
        ),
        "RangeError out of range true true false\nError: plain Error"
    );
}

#[test]
fn test_error_cause() {
    assert_eq!(
        output("const e = new Error('outer', { cause: 'inner' }); console.log(e.cause)"),
        "inner"
    );
}

#[test]
fn test_custom_error_message_in_failure() {
    assert_eq!(
        failure("function check(age) { if (age < 0) throw new RangeError('Age must be positive'); } check(-1);"),
        "Error: Age must be positive"
    );
}

// ============================================================================
// Function tests
// ============================================================================

#[test]
fn test_call_apply_bind() {
    assert_eq!(
        output(
            "function intro(greeting, punct) { return greeting + ', ' + this.name + punct; }\n\
             const p = { name: 'Ada' };\n\
             console.log(intro.call(p, 'Hi', '!'), intro.apply(p, ['Hey', '?']));\n\
             const bound = intro.bind(p, 'Yo');\n\
             console.log(bound('.'), bound.name)"
        ),
        "Hi, Ada! Hey, Ada?\nYo, Ada. bound intro"
    );
}

#[test]
fn test_function_constructor_is_unsupported() {
    assert_eq!(
        failure("Function('return 1')"),
        "Error: Function constructor is not supported"
    );
}

// ============================================================================
// Promise and timer tests
// ============================================================================

#[test]
fn test_promise_values_are_objects() {
    assert_eq!(
        output("const p = Promise.resolve(1); console.log(typeof p, p instanceof Promise, typeof p.then(x => x))"),
        "object true object"
    );
}

#[test]
fn test_promise_executor_errors_reject_instead_of_throwing() {
    assert_eq!(
        output("new Promise(() => { throw new Error('inside'); }); console.log('still running')"),
        "still running"
    );
}

#[test]
fn test_promise_requires_executor() {
    assert!(failure("new Promise(42)").starts_with("Error: Promise resolver"));
}

#[test]
fn test_timers_return_ids() {
    assert_eq!(
        output("const a = setTimeout(() => {}, 100); const b = setInterval(() => {}, 100); console.log(typeof a, b > a); clearInterval(b)"),
        "number true"
    );
    assert_eq!(
        failure("setTimeout('not a function', 0)"),
        "Error: The \"callback\" argument must be of type function. Received \"not a function\""
    );
}
