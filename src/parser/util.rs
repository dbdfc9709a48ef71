pub const TAB_WIDTH: usize = 2;

/// Remaining stack below which recursive code moves to a new segment.
const STACK_RED_ZONE: usize = 128 * 1024;
/// Size of each extra stack segment.
const STACK_SEGMENT_SIZE: usize = 2 * 1024 * 1024;

/// Run `f`, switching to a fresh heap-allocated stack segment first when
/// the current one is nearly exhausted. Every recursive walk over the AST
/// or over script values goes through here.
#[inline]
pub fn ensure_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT_SIZE, f)
}

pub fn spaces(time: usize) -> String {
    " ".repeat(time)
}

/// Format a number the way `Number.prototype.toString()` does.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        let formatted = format!("{:e}", n);
        match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => formatted,
        }
    } else {
        format!("{}", n)
    }
}

fn is_js_whitespace(c: char) -> bool {
    matches!(
        c,
        ' ' | '\t'
            | '\n'
            | '\r'
            | '\u{000B}'
            | '\u{000C}'
            | '\u{00A0}'
            | '\u{FEFF}'
            | '\u{2028}'
            | '\u{2029}'
    ) || c.is_whitespace()
}

/// `Number("...")`: whitespace is trimmed, the empty string is zero and
/// anything unparseable is `NaN`.
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim_matches(is_js_whitespace);
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    let radix = |prefixes: [&str; 2], radix: u32| {
        prefixes
            .iter()
            .find_map(|p| trimmed.strip_prefix(p))
            .map(|digits| {
                if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
                    f64::NAN
                } else {
                    digits.chars().fold(0f64, |acc, c| {
                        acc * radix as f64 + c.to_digit(radix).unwrap_or(0) as f64
                    })
                }
            })
    };
    if let Some(n) = radix(["0x", "0X"], 16)
        .or_else(|| radix(["0o", "0O"], 8))
        .or_else(|| radix(["0b", "0B"], 2))
    {
        return n;
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
        || !trimmed.chars().any(|c| c.is_ascii_digit())
    {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

fn hex_value(digits: &str) -> Option<u32> {
    if digits.is_empty() {
        None
    } else {
        u32::from_str_radix(digits, 16).ok()
    }
}

/// Resolve the escape sequences of a string or template literal body.
pub fn unescape_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    let mut pending_high_surrogate: Option<u32> = None;
    while let Some(c) = chars.next() {
        if c != '\\' {
            flush_surrogate(&mut out, &mut pending_high_surrogate);
            out.push(c);
            continue;
        }
        let escaped = match chars.next() {
            Some(e) => e,
            None => break,
        };
        let code_unit = match escaped {
            'n' => Some('\n' as u32),
            't' => Some('\t' as u32),
            'r' => Some('\r' as u32),
            'b' => Some(0x08),
            'f' => Some(0x0C),
            'v' => Some(0x0B),
            '0' if !chars.peek().map_or(false, |n| n.is_ascii_digit()) => Some(0),
            'x' => {
                let digits: String = chars.by_ref().take(2).collect();
                hex_value(&digits)
            }
            'u' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    let digits: String = chars.by_ref().take_while(|c| *c != '}').collect();
                    hex_value(&digits)
                } else {
                    let digits: String = chars.by_ref().take(4).collect();
                    hex_value(&digits)
                }
            }
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                None
            }
            '\n' | '\u{2028}' | '\u{2029}' => None,
            other => {
                flush_surrogate(&mut out, &mut pending_high_surrogate);
                out.push(other);
                None
            }
        };
        if let Some(unit) = code_unit {
            push_code_unit(&mut out, &mut pending_high_surrogate, unit);
        }
    }
    flush_surrogate(&mut out, &mut pending_high_surrogate);
    out
}

fn push_code_unit(out: &mut String, pending: &mut Option<u32>, unit: u32) {
    if (0xD800..0xDC00).contains(&unit) {
        flush_surrogate(out, pending);
        *pending = Some(unit);
        return;
    }
    if (0xDC00..0xE000).contains(&unit) {
        if let Some(high) = pending.take() {
            let combined = 0x10000 + ((high - 0xD800) << 10) + (unit - 0xDC00);
            out.push(char::from_u32(combined).unwrap_or(char::REPLACEMENT_CHARACTER));
            return;
        }
    }
    flush_surrogate(out, pending);
    out.push(char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER));
}

fn flush_surrogate(out: &mut String, pending: &mut Option<u32>) {
    if pending.take().is_some() {
        out.push(char::REPLACEMENT_CHARACTER);
    }
}
