//! Math built-in object.
//!
//! Provides mathematical constants and functions.

use rand::Rng;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::type_conversion::to_number;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Register the Math object with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let math = BuiltInObject::new("Math")
        // Constants
        .add_property("E", JsValue::Number(std::f64::consts::E))
        .add_property("LN10", JsValue::Number(std::f64::consts::LN_10))
        .add_property("LN2", JsValue::Number(std::f64::consts::LN_2))
        .add_property("PI", JsValue::Number(std::f64::consts::PI))
        .add_property("SQRT2", JsValue::Number(std::f64::consts::SQRT_2))
        // Methods
        .add_method("abs", math_abs)
        .add_method("floor", math_floor)
        .add_method("ceil", math_ceil)
        .add_method("round", math_round)
        .add_method("trunc", math_trunc)
        .add_method("sign", math_sign)
        .add_method("min", math_min)
        .add_method("max", math_max)
        .add_method("sqrt", math_sqrt)
        .add_method("cbrt", math_cbrt)
        .add_method("pow", math_pow)
        .add_method("log", math_log)
        .add_method("exp", math_exp)
        .add_method("hypot", math_hypot)
        .add_method("random", math_random);

    registry.register_object(math);
}

/// First argument as a number, `NaN` when absent.
fn first_number(args: &[JsValue]) -> f64 {
    to_number(&arg(args, 0))
}

fn unary(args: &[JsValue], f: impl Fn(f64) -> f64) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Number(f(first_number(args))))
}

/// Math.abs
fn math_abs(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(&args, f64::abs)
}

/// Math.floor
fn math_floor(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(&args, f64::floor)
}

/// Math.ceil
fn math_ceil(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(&args, f64::ceil)
}

/// Math.round: halves round towards +∞ (`Math.round(-2.5) === -2`).
fn math_round(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(&args, |x| {
        if !x.is_finite() || x.fract() == 0.0 {
            x
        } else if x < 0.0 && x >= -0.5 {
            -0.0
        } else {
            (x + 0.5).floor()
        }
    })
}

/// Math.trunc
fn math_trunc(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(&args, f64::trunc)
}

/// Math.sign
fn math_sign(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(&args, |x| {
        if x.is_nan() || x == 0.0 {
            x
        } else if x > 0.0 {
            1.0
        } else {
            -1.0
        }
    })
}

/// Math.min
fn math_min(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let mut result = f64::INFINITY;
    for arg in &args {
        let x = to_number(arg);
        if x.is_nan() {
            return Ok(JsValue::Number(f64::NAN));
        }
        if x < result || (x == 0.0 && result == 0.0 && x.is_sign_negative()) {
            result = x;
        }
    }
    Ok(JsValue::Number(result))
}

/// Math.max
fn math_max(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let mut result = f64::NEG_INFINITY;
    for arg in &args {
        let x = to_number(arg);
        if x.is_nan() {
            return Ok(JsValue::Number(f64::NAN));
        }
        if x > result || (x == 0.0 && result == 0.0 && x.is_sign_positive()) {
            result = x;
        }
    }
    Ok(JsValue::Number(result))
}

/// Math.sqrt
fn math_sqrt(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(&args, f64::sqrt)
}

/// Math.cbrt
fn math_cbrt(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(&args, f64::cbrt)
}

/// Math.pow
fn math_pow(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let base = to_number(&arg(&args, 0));
    let exponent = to_number(&arg(&args, 1));
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        return Ok(JsValue::Number(f64::NAN));
    }
    Ok(JsValue::Number(base.powf(exponent)))
}

/// Math.log (natural logarithm)
fn math_log(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(&args, f64::ln)
}

/// Math.exp
fn math_exp(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(&args, f64::exp)
}

/// Math.hypot
fn math_hypot(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let mut sum = 0.0;
    for arg in &args {
        let x = to_number(arg);
        if x.is_infinite() {
            return Ok(JsValue::Number(f64::INFINITY));
        }
        sum += x * x;
    }
    Ok(JsValue::Number(sum.sqrt()))
}

/// Math.random: uniform in `[0, 1)`.
fn math_random(_ctx: &mut EvalContext, _this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Number(rand::thread_rng().gen::<f64>()))
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::runner::plugin::types::ExecutionLimits;
    use crate::runner::std_lib::console::ConsoleBindings;

    fn ctx() -> EvalContext {
        EvalContext::new(
            Rc::new(BuiltInRegistry::with_core()),
            ConsoleBindings::host(),
            ExecutionLimits::default(),
        )
    }

    fn num(n: f64) -> JsValue {
        JsValue::Number(n)
    }

    #[test]
    fn test_round_half_towards_positive_infinity() {
        let mut ctx = ctx();
        assert_eq!(math_round(&mut ctx, JsValue::Undefined, vec![num(2.5)]).unwrap(), num(3.0));
        assert_eq!(math_round(&mut ctx, JsValue::Undefined, vec![num(-2.5)]).unwrap(), num(-2.0));
        assert_eq!(math_round(&mut ctx, JsValue::Undefined, vec![num(-2.6)]).unwrap(), num(-3.0));
    }

    #[test]
    fn test_min_max_edge_cases() {
        let mut ctx = ctx();
        assert_eq!(
            math_max(&mut ctx, JsValue::Undefined, vec![]).unwrap(),
            num(f64::NEG_INFINITY)
        );
        assert_eq!(math_min(&mut ctx, JsValue::Undefined, vec![]).unwrap(), num(f64::INFINITY));
        let nan = math_max(&mut ctx, JsValue::Undefined, vec![num(1.0), JsValue::Undefined]).unwrap();
        assert!(nan.as_number().unwrap().is_nan());
    }

    #[test]
    fn test_random_in_unit_interval() {
        let mut ctx = ctx();
        for _ in 0..100 {
            let r = math_random(&mut ctx, JsValue::Undefined, vec![])
                .unwrap()
                .as_number()
                .unwrap();
            assert!((0.0..1.0).contains(&r));
        }
    }
}
