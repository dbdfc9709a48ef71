use crate::parser::util::format_number;
use crate::parser::JsParser;

fn assert_parse(input: &str, expected_output: f64) {
    let actual_output = JsParser::parse_numeric_string(input);
    assert_eq!(
        actual_output, expected_output,
        "For the input: \"{}\", the expected out was: \"{:?}\", but got: \"{:?}\" ",
        input, expected_output, actual_output
    );
}

fn assert_nan(input: &str) {
    assert!(
        JsParser::parse_numeric_string(input).is_nan(),
        "Was expecting NaN for input \"{}\"",
        input
    );
}

#[test]
fn test_decimal_integer_parse() {
    assert_parse("1234", 1234.0);
    assert_parse("01234", 1234.0);
    assert_parse("    1234", 1234.0);
    assert_parse("1234\n\t ", 1234.0);
}

#[test]
fn test_signed_and_fractional_parse() {
    assert_parse("-12.5", -12.5);
    assert_parse("+.5", 0.5);
    assert_parse("5.", 5.0);
    assert_parse("1e3", 1000.0);
    assert_parse("1.5E-2", 0.015);
}

#[test]
fn test_radix_parse() {
    assert_parse("0x1f", 31.0);
    assert_parse("0B11", 3.0);
    assert_parse("0o777", 511.0);
    assert_nan("0x");
    assert_nan("0b102");
    assert_nan("-0x10");
}

#[test]
fn test_empty_is_zero() {
    assert_parse("", 0.0);
    assert_parse("   ", 0.0);
}

#[test]
fn test_infinity_parse() {
    assert_parse("Infinity", f64::INFINITY);
    assert_parse("-Infinity", f64::NEG_INFINITY);
    assert_nan("inf");
    assert_nan("infinity");
}

#[test]
fn test_garbage_is_nan() {
    assert_nan("12px");
    assert_nan("abc");
    assert_nan(".");
    assert_nan("1e");
    assert_nan("1_000");
    assert_nan("NaN");
}

#[test]
fn test_format_number() {
    assert_eq!(format_number(1.0), "1");
    assert_eq!(format_number(-0.0), "0");
    assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
    assert_eq!(format_number(1e21), "1e+21");
    assert_eq!(format_number(1.5e-7), "1.5e-7");
    assert_eq!(format_number(123456789012.0), "123456789012");
    assert_eq!(format_number(f64::NAN), "NaN");
    assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
}
