//! Host-side primitive functions. Each receives its already-evaluated
//! argument list and the interpreter context. Arithmetic accumulates left
//! to right and keeps the kind of the accumulator: an integer accumulator
//! truncates float operands, a float accumulator widens integer operands.

use crate::error::{LispError, Result};
use crate::eval::Interp;
use crate::heap::ListBuilder;
use crate::printer;
use crate::value::Value;

pub fn native_cons(args: Value, interp: &mut Interp) -> Result<Value> {
    let heap = &mut interp.heap;
    let car = heap.car_val(args)?;
    let rest = heap.cdr_val(args)?;
    let cdr = heap.car_val(rest)?;
    Ok(heap.cons(car, cdr))
}

pub fn native_car(args: Value, interp: &mut Interp) -> Result<Value> {
    let arg = interp.heap.car_val(args)?;
    interp.heap.car_val(arg)
}

pub fn native_cdr(args: Value, interp: &mut Interp) -> Result<Value> {
    let arg = interp.heap.car_val(args)?;
    interp.heap.cdr_val(arg)
}

/// `(nav "cadr" x)` — apply a car/cdr path to x.
pub fn native_nav(args: Value, interp: &mut Interp) -> Result<Value> {
    let heap = &interp.heap;
    let path = heap.car_val(args)?;
    let target = heap.at_index(args, 1);
    match path {
        Value::Str(r) => {
            let path = heap.string(r).to_string();
            Ok(heap.nav(target, &path))
        }
        _ => Err(LispError::BadArg),
    }
}

/// Identity comparison: handle equality for heap values, payload equality
/// for immediates.
pub fn native_eq(args: Value, interp: &mut Interp) -> Result<Value> {
    let heap = &interp.heap;
    let a = heap.car_val(args)?;
    let b = heap.at_index(args, 1);
    Ok(Value::Int((a == b) as i64))
}

/// True when every argument is Null.
pub fn native_is_null(args: Value, interp: &mut Interp) -> Result<Value> {
    for arg in interp.heap.list_to_vec(args) {
        if !arg.is_null() {
            return Ok(Value::Int(0));
        }
    }
    Ok(Value::Int(1))
}

pub fn native_list(args: Value, _interp: &mut Interp) -> Result<Value> {
    Ok(args)
}

pub fn native_append(args: Value, interp: &mut Interp) -> Result<Value> {
    let heap = &mut interp.heap;
    let mut l = heap.car_val(args)?;
    if !l.is_pair() {
        return Err(LispError::BadArg);
    }

    let mut rest = heap.cdr_val(args)?;
    while let Value::Pair(r) = rest {
        let next = heap.car(r);
        l = heap.append(l, next);
        rest = heap.cdr(r);
    }
    Ok(l)
}

/// `(map f l1 l2 ...)` — map each list through `f` independently. One input
/// list yields a single list; several yield a list of lists.
pub fn native_map(args: Value, interp: &mut Interp) -> Result<Value> {
    let op = interp.heap.car_val(args)?;
    if !matches!(op, Value::Lambda(_) | Value::Native(_)) {
        return Err(LispError::BadArg);
    }

    let lists = interp.heap.cdr_val(args)?;
    let lists = interp.heap.list_to_vec(lists);
    if lists.is_empty() {
        return Ok(Value::Null);
    }

    let quote_sym = interp.intern("QUOTE");
    let mut results = ListBuilder::new();
    for list in &lists {
        let mut mapped = ListBuilder::new();
        for item in interp.heap.list_to_vec(*list) {
            // (f (QUOTE item)): quoting keeps the element from being
            // re-evaluated when the application is
            let quoted = interp.heap.list(&[quote_sym, item]);
            let expr = interp.heap.list(&[op, quoted]);
            let value = interp.eval_global(expr)?;
            mapped.push(&mut interp.heap, value);
        }
        let mapped = mapped.list();
        results.push(&mut interp.heap, mapped);
    }

    if lists.len() == 1 {
        Ok(interp.heap.car_val(results.list())?)
    } else {
        Ok(results.list())
    }
}

pub fn native_nth(args: Value, interp: &mut Interp) -> Result<Value> {
    let heap = &interp.heap;
    let index = heap.car_val(args)?;
    let list = heap.at_index(args, 1);
    let i = index.as_int();
    if i < 0 {
        return Err(LispError::OutOfBounds);
    }
    Ok(heap.at_index(list, i))
}

pub fn native_length(args: Value, interp: &mut Interp) -> Result<Value> {
    let arg = interp.heap.car_val(args)?;
    Ok(Value::Int(interp.heap.length(arg)))
}

pub fn native_reverse_inplace(args: Value, interp: &mut Interp) -> Result<Value> {
    let arg = interp.heap.car_val(args)?;
    Ok(interp.heap.reverse_inplace(arg))
}

/// `(assoc alist key)` — the `(key . value)` pair from `alist`, or Null.
pub fn native_assoc(args: Value, interp: &mut Interp) -> Result<Value> {
    let heap = &interp.heap;
    let alist = heap.car_val(args)?;
    let key = heap.at_index(args, 1);
    Ok(heap.assoc(alist, key))
}

pub fn native_display(args: Value, interp: &mut Interp) -> Result<Value> {
    let arg = interp.heap.car_val(args)?;
    match arg {
        Value::Str(r) => print!("{}", interp.heap.string(r)),
        other => print!("{}", printer::print_val(&interp.heap, other)),
    }
    Ok(Value::Null)
}

pub fn native_newline(_args: Value, _interp: &mut Interp) -> Result<Value> {
    println!();
    Ok(Value::Null)
}

/// The expander has rewritten `(assert e)` to `(assert e' (quote e))`, so
/// the second argument is the unexpanded form for the diagnostic.
pub fn native_assert(args: Value, interp: &mut Interp) -> Result<Value> {
    let heap = &interp.heap;
    let outcome = heap.car_val(args)?;
    if outcome.as_int() != 1 {
        let form = heap.at_index(args, 1);
        eprintln!("assertion: {}", printer::print_val(heap, form));
        return Err(LispError::BadArg);
    }
    Ok(Value::Null)
}

pub fn native_read_path(args: Value, interp: &mut Interp) -> Result<Value> {
    let arg = interp.heap.car_val(args)?;
    match arg {
        Value::Str(r) => {
            let path = interp.heap.string(r).to_string();
            interp.read_path(&path)
        }
        _ => Err(LispError::BadArg),
    }
}

pub fn native_expand(args: Value, interp: &mut Interp) -> Result<Value> {
    let arg = interp.heap.car_val(args)?;
    interp.expand(arg)
}

/// Integer equality over every argument, compared through the integer
/// projection.
pub fn native_equals(args: Value, interp: &mut Interp) -> Result<Value> {
    let heap = &interp.heap;
    let first = heap.car_val(args)?;
    if first.is_null() {
        return Ok(Value::Int(1));
    }

    let mut rest = heap.cdr_val(args)?;
    while let Value::Pair(r) = rest {
        if heap.car(r).as_int() != first.as_int() {
            return Ok(Value::Int(0));
        }
        rest = heap.cdr(r);
    }
    Ok(Value::Int(1))
}

fn fold_arithmetic(
    args: Value,
    interp: &mut Interp,
    strict: bool,
    int_op: fn(i64, i64) -> i64,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value> {
    let heap = &interp.heap;
    let mut accum = heap.car_val(args)?;

    let mut rest = heap.cdr_val(args)?;
    while let Value::Pair(r) = rest {
        let operand = heap.car(r);
        accum = match accum {
            Value::Int(n) => Value::Int(int_op(n, operand.as_int())),
            Value::Float(x) => Value::Float(float_op(x, operand.as_float())),
            _ if strict => return Err(LispError::BadArg),
            other => other,
        };
        rest = heap.cdr(r);
    }
    Ok(accum)
}

pub fn native_add(args: Value, interp: &mut Interp) -> Result<Value> {
    fold_arithmetic(args, interp, false, i64::wrapping_add, |a, b| a + b)
}

pub fn native_sub(args: Value, interp: &mut Interp) -> Result<Value> {
    fold_arithmetic(args, interp, true, i64::wrapping_sub, |a, b| a - b)
}

pub fn native_mult(args: Value, interp: &mut Interp) -> Result<Value> {
    fold_arithmetic(args, interp, true, i64::wrapping_mul, |a, b| a * b)
}

pub fn native_divide(args: Value, interp: &mut Interp) -> Result<Value> {
    let heap = &interp.heap;
    let mut accum = heap.car_val(args)?;

    let mut rest = heap.cdr_val(args)?;
    while let Value::Pair(r) = rest {
        let operand = heap.car(r);
        accum = match accum {
            Value::Int(n) => {
                let d = operand.as_int();
                if d == 0 {
                    return Err(LispError::BadArg);
                }
                Value::Int(n / d)
            }
            Value::Float(x) => Value::Float(x / operand.as_float()),
            _ => return Err(LispError::BadArg),
        };
        rest = heap.cdr(r);
    }
    Ok(accum)
}

pub fn native_less(args: Value, interp: &mut Interp) -> Result<Value> {
    let heap = &interp.heap;
    let a = heap.car_val(args)?;
    let b = heap.at_index(args, 1);
    let result = match a {
        Value::Int(n) => n < b.as_int(),
        Value::Float(x) => x < b.as_float(),
        _ => return Err(LispError::BadArg),
    };
    Ok(Value::Int(result as i64))
}

pub fn native_greater(args: Value, interp: &mut Interp) -> Result<Value> {
    let heap = &interp.heap;
    let a = heap.car_val(args)?;
    let b = heap.at_index(args, 1);
    let result = match a {
        Value::Int(n) => n > b.as_int(),
        Value::Float(x) => x > b.as_float(),
        _ => return Err(LispError::BadArg),
    };
    Ok(Value::Int(result as i64))
}

pub fn native_less_equal(args: Value, interp: &mut Interp) -> Result<Value> {
    let gt = native_greater(args, interp)?;
    Ok(Value::Int((gt.as_int() == 0) as i64))
}

pub fn native_greater_equal(args: Value, interp: &mut Interp) -> Result<Value> {
    let lt = native_less(args, interp)?;
    Ok(Value::Int((lt.as_int() == 0) as i64))
}

pub fn native_even(args: Value, interp: &mut Interp) -> Result<Value> {
    for arg in interp.heap.list_to_vec(args) {
        if arg.as_int() & 1 == 1 {
            return Ok(Value::Int(0));
        }
    }
    Ok(Value::Int(1))
}

pub fn native_odd(args: Value, interp: &mut Interp) -> Result<Value> {
    for arg in interp.heap.list_to_vec(args) {
        if arg.as_int() & 1 == 0 {
            return Ok(Value::Int(0));
        }
    }
    Ok(Value::Int(1))
}
