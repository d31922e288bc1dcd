use miette::{Result, miette};
use proptest::{
    prelude::{any, prop},
    test_runner::{Config, TestCaseError, TestRunner},
};
use tern_rt::{
    FloatType, IntOp, IntType, NumericType, Scalar, checked_binary, fallible_cast, saturating_cast,
    truncating_cast, wrapping_binary,
};

fn runner() -> TestRunner {
    TestRunner::new(Config {
        cases: 512,
        ..Config::default()
    })
}

fn int_type() -> impl proptest::strategy::Strategy<Value = IntType> {
    prop::sample::select(IntType::ALL.to_vec())
}

/// Reference model: reduce modulo 2^W, then reinterpret in the destination
/// signedness.
fn modular(ty: IntType, x: i128) -> i128 {
    let m = 1i128 << ty.bits();
    let r = x.rem_euclid(m);
    if ty.is_signed() && r > ty.max_value() { r - m } else { r }
}

#[test]
fn truncation_is_reduction_modulo_width() -> Result<()> {
    let strat = (int_type(), any::<i64>());
    runner()
        .run(&strat, |(ty, x)| {
            let x = x as i128;
            let got = truncating_cast(Scalar::Int(x), NumericType::Int(ty));
            if got != Scalar::Int(modular(ty, x)) {
                return Err(TestCaseError::fail(format!("{x} as truncated {ty} = {got}")));
            }
            Ok(())
        })
        .map_err(|e| miette!("{e}"))
}

#[test]
fn saturation_clamps_and_agrees_with_fallible_in_range() -> Result<()> {
    let strat = (int_type(), any::<i64>());
    runner()
        .run(&strat, |(ty, x)| {
            let x = x as i128;
            let target = NumericType::Int(ty);
            let sat = saturating_cast(Scalar::Int(x), target);
            let expected = x.clamp(ty.min_value(), ty.max_value());
            if sat != Scalar::Int(expected) {
                return Err(TestCaseError::fail(format!("{x} as saturated {ty} = {sat}")));
            }
            let exact = fallible_cast(Scalar::Int(x), target);
            if ty.contains(x) != exact.is_some() {
                return Err(TestCaseError::fail(format!("{x} as? {ty} = {exact:?}")));
            }
            Ok(())
        })
        .map_err(|e| miette!("{e}"))
}

#[test]
fn float_saturation_stays_in_range() -> Result<()> {
    let strat = (int_type(), any::<f64>());
    runner()
        .run(&strat, |(ty, x)| {
            match saturating_cast(Scalar::Float(x), NumericType::Int(ty)) {
                Scalar::Int(v) if ty.contains(v) => {}
                other => {
                    return Err(TestCaseError::fail(format!("{x} as saturated {ty} = {other}")));
                }
            }
            let narrowed = saturating_cast(Scalar::Float(x), NumericType::Float(FloatType::F32));
            if let Scalar::Float(v) = narrowed {
                if v.is_infinite() {
                    return Err(TestCaseError::fail(format!("{x} saturated to {v}")));
                }
            }
            Ok(())
        })
        .map_err(|e| miette!("{e}"))
}

#[test]
fn checked_arithmetic_faults_exactly_when_wrapping_differs() -> Result<()> {
    let ops = prop::sample::select(vec![IntOp::Add, IntOp::Sub, IntOp::Mul]);
    let strat = (ops, int_type(), any::<i64>(), any::<i64>());
    runner()
        .run(&strat, |(op, ty, a, b)| {
            let a = modular(ty, a as i128);
            let b = modular(ty, b as i128);
            let wrapped = wrapping_binary(op, ty, a, b)
                .map_err(|f| TestCaseError::fail(f.to_string()))?;
            let exact = match op {
                IntOp::Add => a + b,
                IntOp::Sub => a - b,
                _ => a.checked_mul(b).unwrap_or(i128::MAX),
            };
            match checked_binary(op, ty, a, b) {
                Ok(v) if v == exact && v == wrapped => Ok(()),
                Err(f) if f.is_overflow() && !ty.contains(exact) => Ok(()),
                other => Err(TestCaseError::fail(format!("{a} {op} {b} on {ty}: {other:?}"))),
            }
        })
        .map_err(|e| miette!("{e}"))
}
