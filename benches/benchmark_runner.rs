/// Benchmark runner for snippet execution.
///
/// Times whole `SnippetExecutor::run` calls against evaluation of an
/// already parsed body, then checks each benchmark's transcript.

extern crate jsprimer;

use std::rc::Rc;
use std::time::{Duration, Instant};

use jsprimer::parser::JsParser;
use jsprimer::runner::eval::evaluate_function_body;
use jsprimer::runner::plugin::registry::BuiltInRegistry;
use jsprimer::runner::plugin::types::{EvalContext, ExecutionLimits};
use jsprimer::runner::std_lib::console::ConsoleBindings;
use jsprimer::snippet::{ExecutionResult, OutputSink, SinkWriter, SnippetExecutor};

/// Time `iterations` full runs: parse, intercept, evaluate, restore.
fn run_benchmark(executor: &SnippetExecutor, code: &str, iterations: u32) -> Duration {
    let start = Instant::now();
    for _ in 0..iterations {
        let _ = executor.run(code);
    }
    start.elapsed()
}

/// Time `iterations` evaluations of a body parsed once up front.
fn run_benchmark_preparsed(name: &str, code: &str, iterations: u32) -> Duration {
    let body = JsParser::parse_function_body(code)
        .unwrap_or_else(|e| panic!("Failed to parse benchmark {}: {}", name, e));
    let registry = Rc::new(BuiltInRegistry::with_core());
    // Console output is discarded by writing into a sink nobody drains.
    let sink = OutputSink::new();
    let bindings = ConsoleBindings::new(
        Rc::new(SinkWriter::new(sink.clone())),
        Rc::new(SinkWriter::error_channel(sink.clone())),
    );

    let start = Instant::now();
    for _ in 0..iterations {
        let mut ctx = EvalContext::new(registry.clone(), bindings.clone(), ExecutionLimits::default());
        let _ = evaluate_function_body(body.clone(), &mut ctx);
        sink.drain();
    }
    start.elapsed()
}

// ============================================================================
// Benchmark definitions
// ============================================================================

const BENCH_FIBONACCI: &str = r#"
let a = 0, b = 1;
for (let i = 0; i < 20; i++) {
    [a, b] = [b, a + b];
}
console.log(a);
"#;

const BENCH_LOOP_SUM: &str = r#"
let sum = 0;
for (let i = 0; i < 10000; i++) {
    sum += i;
}
console.log(sum);
"#;

const BENCH_RECURSION: &str = r#"
function fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); }
console.log(fib(15));
"#;

const BENCH_ARRAY_PIPELINE: &str = r#"
const nums = Array.from({ length: 1000 }, (_, i) => i);
const total = nums
    .filter(n => n % 3 === 0)
    .map(n => n * 2)
    .reduce((acc, n) => acc + n, 0);
console.log(total);
"#;

const BENCH_STRINGS: &str = r#"
let words = [];
for (let i = 0; i < 200; i++) {
    words.push(`item-${i}`.toUpperCase().padStart(10, '.'));
}
console.log(words.join(',').split(',').length);
"#;

const BENCH_OBJECTS: &str = r#"
const people = [];
for (let i = 0; i < 300; i++) {
    people.push({ id: i, name: 'p' + i, age: i % 90 });
}
const adults = people.filter(({ age }) => age >= 18);
console.log(JSON.stringify(adults.slice(0, 2)));
"#;

const BENCH_PRIMES: &str = r#"
let count = 0;
for (let n = 2; n < 500; n++) {
    let isPrime = true;
    for (let i = 2; i * i <= n; i++) {
        if (n % i === 0) { isPrime = false; break; }
    }
    if (isPrime) count++;
}
console.log(count);
"#;

fn main() {
    println!("=======================================================");
    println!("  jsprimer Snippet Benchmarks");
    println!("=======================================================\n");

    let benchmarks: Vec<(&str, &str, u32, &str)> = vec![
        ("Fibonacci (n=20)", BENCH_FIBONACCI, 500, "6765"),
        ("Loop Sum (10K)", BENCH_LOOP_SUM, 20, "49995000"),
        ("Recursive fib(15)", BENCH_RECURSION, 20, "610"),
        ("Array Pipeline (1K)", BENCH_ARRAY_PIPELINE, 50, "333666"),
        ("Strings (200)", BENCH_STRINGS, 50, "200"),
        (
            "Objects (300)",
            BENCH_OBJECTS,
            50,
            r#"[{"id":18,"name":"p18","age":18},{"id":19,"name":"p19","age":19}]"#,
        ),
        ("Primes (<500)", BENCH_PRIMES, 20, "95"),
    ];

    let executor = SnippetExecutor::new();

    println!("{:<24} {:>14} {:>14} {:>10}", "Benchmark", "Full run", "Pre-parsed", "Ratio");
    println!("{}", "-".repeat(66));

    let mut total_full = Duration::ZERO;
    let mut total_preparsed = Duration::ZERO;

    for (name, code, iterations, _) in &benchmarks {
        let full = run_benchmark(&executor, code, *iterations);
        let preparsed = run_benchmark_preparsed(name, code, *iterations);
        total_full += full;
        total_preparsed += preparsed;

        println!(
            "{:<24} {:>12.2?} {:>12.2?} {:>9.2}x",
            name,
            full,
            preparsed,
            full.as_secs_f64() / preparsed.as_secs_f64()
        );
    }

    println!("{}", "-".repeat(66));
    println!(
        "{:<24} {:>12.2?} {:>12.2?} {:>9.2}x",
        "TOTAL",
        total_full,
        total_preparsed,
        total_full.as_secs_f64() / total_preparsed.as_secs_f64()
    );

    println!("\n=======================================================");
    println!("  Correctness Verification");
    println!("=======================================================\n");

    for (name, code, _, expected) in &benchmarks {
        let (status, text) = match executor.run(code) {
            ExecutionResult::Success(text) if text == *expected => ("✓", text),
            ExecutionResult::Success(text) => ("✗", text),
            ExecutionResult::Failure(text) => ("✗", text),
        };
        println!("{:<24} {:>4} {}", name, status, text);
    }
}
