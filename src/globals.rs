//! Environments and the default global environment. An environment is a
//! list of frames (tables); lookup walks car to cdr, `define` writes the
//! head frame, `set` writes the nearest frame that already binds the name.

use crate::error::{LispError, Result};
use crate::heap::Heap;
use crate::primitives;
use crate::symbol;
use crate::table;
use crate::value::{NativeFn, Value};

/// Wrap a single frame as an environment.
pub fn make_env(heap: &mut Heap, frame: Value) -> Value {
    heap.cons(frame, Value::Null)
}

/// Cons a new frame onto an existing environment. The original environment
/// is untouched, so closures over it keep a stable capture.
pub fn env_extend(heap: &mut Heap, env: Value, frame: Value) -> Value {
    heap.cons(frame, env)
}

/// Find the `(symbol . value)` binding for `sym`, or Null if unbound.
pub fn env_lookup(heap: &Heap, env: Value, sym: Value) -> Value {
    let mut it = env;
    while let Value::Pair(r) = it {
        let binding = table::table_get(heap, heap.car(r), sym);
        if !binding.is_null() {
            return binding;
        }
        it = heap.cdr(r);
    }
    Value::Null
}

/// Bind `sym` in the head frame, shadowing any outer binding.
pub fn env_define(heap: &mut Heap, env: Value, sym: Value, value: Value) {
    let frame = match env {
        Value::Pair(r) => heap.car(r),
        _ => panic!("internal error: define in an empty environment"),
    };
    table::table_set(heap, frame, sym, value);
}

/// Overwrite the nearest binding of `sym`. Unbound names are diagnosed on
/// stderr and reported through the error channel.
pub fn env_set(heap: &mut Heap, env: Value, sym: Value, value: Value) -> Result<()> {
    let binding = env_lookup(heap, env, sym);
    match binding {
        Value::Pair(r) => {
            heap.set_cdr(r, value);
            Ok(())
        }
        _ => {
            let name = match sym {
                Value::Symbol(s) => heap.symbol_name(s).to_string(),
                _ => sym.type_name().to_string(),
            };
            eprintln!("error: unknown variable: {}", name);
            Err(LispError::UnknownVar(name))
        }
    }
}

/// Build the default global environment: a single frame holding the `NULL`
/// binding and the primitive table.
pub fn build_globals(heap: &mut Heap, symtab: Value, frame_capacity: usize) -> Value {
    let frame = table::make_table(heap, frame_capacity);

    let null_sym = symbol::intern(heap, symtab, "NULL");
    table::table_set(heap, frame, null_sym, Value::Null);

    let natives: &[(&str, NativeFn)] = &[
        ("CONS", primitives::native_cons),
        ("CAR", primitives::native_car),
        ("CDR", primitives::native_cdr),
        ("NAV", primitives::native_nav),
        ("EQ?", primitives::native_eq),
        ("NULL?", primitives::native_is_null),
        ("LIST", primitives::native_list),
        ("APPEND", primitives::native_append),
        ("MAP", primitives::native_map),
        ("NTH", primitives::native_nth),
        ("LENGTH", primitives::native_length),
        ("REVERSE!", primitives::native_reverse_inplace),
        ("ASSOC", primitives::native_assoc),
        ("DISPLAY", primitives::native_display),
        ("NEWLINE", primitives::native_newline),
        ("ASSERT", primitives::native_assert),
        ("READ-PATH", primitives::native_read_path),
        ("EXPAND", primitives::native_expand),
        ("=", primitives::native_equals),
        ("+", primitives::native_add),
        ("-", primitives::native_sub),
        ("*", primitives::native_mult),
        ("/", primitives::native_divide),
        ("<", primitives::native_less),
        (">", primitives::native_greater),
        ("<=", primitives::native_less_equal),
        (">=", primitives::native_greater_equal),
        ("EVEN?", primitives::native_even),
        ("ODD?", primitives::native_odd),
    ];

    for &(name, func) in natives {
        let sym = symbol::intern(heap, symtab, name);
        table::table_set(heap, frame, sym, Value::Native(func));
    }

    make_env(heap, frame)
}
