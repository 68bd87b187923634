//! The interpreter context and the evaluator. All state lives in `Interp`
//! so the collector can find its roots: the two heaps, the symbol table,
//! the global environment, and the lambda id counter.
//!
//! The evaluator is a single trampoline loop: `IF`, `BEGIN`, and lambda
//! application update the loop variables instead of recursing, so tail
//! calls run in constant Rust stack. Recursion is only used for
//! sub-evaluations (predicates, operators, arguments).

use std::mem;

use crate::error::{LispError, Result};
use crate::expand;
use crate::globals;
use crate::heap::{gc_move, gc_scan, BlockData, Heap, ListBuilder};
use crate::reader;
use crate::symbol;
use crate::table;
use crate::value::{NativeFn, Value};

/// Capacity of the process symbol table.
const SYMBOL_TABLE_CAPACITY: usize = 512;

/// Capacity of the global frame.
const GLOBAL_FRAME_CAPACITY: usize = 256;

/// Capacity of a lambda call frame.
const CALL_FRAME_CAPACITY: usize = 13;

pub struct Interp {
    pub heap: Heap,
    to_heap: Heap,
    /// Heap-resident intern table; a GC root.
    pub symbol_table: Value,
    /// List of frames; a GC root. `DEFINE` at top level writes its head.
    pub global_env: Value,
    lambda_counter: u32,
}

impl Interp {
    /// Full interpreter: symbol table plus a global environment preloaded
    /// with the primitive set.
    pub fn new() -> Interp {
        let mut interp = Interp::new_reader();
        interp.global_env = globals::build_globals(
            &mut interp.heap,
            interp.symbol_table,
            GLOBAL_FRAME_CAPACITY,
        );
        interp
    }

    /// Bare context for hosts that only want to read S-expression data:
    /// no primitives, empty global environment.
    pub fn new_reader() -> Interp {
        let mut heap = Heap::new();
        let symbol_table = table::make_table(&mut heap, SYMBOL_TABLE_CAPACITY);
        Interp {
            heap,
            to_heap: Heap::new(),
            symbol_table,
            global_env: Value::Null,
            lambda_counter: 0,
        }
    }

    pub fn global_env(&self) -> Value {
        self.global_env
    }

    pub fn intern(&mut self, name: &str) -> Value {
        symbol::intern(&mut self.heap, self.symbol_table, name)
    }

    /// Register a host callback under `name` in the global head frame.
    pub fn register_native(&mut self, name: &str, func: NativeFn) {
        let sym = self.intern(name);
        let env = self.global_env;
        globals::env_define(&mut self.heap, env, sym, Value::Native(func));
    }

    /// Read one S-expression tree from a string. Multiple top-level
    /// expressions come back wrapped in `(BEGIN ...)`.
    pub fn read(&mut self, program: &str) -> Result<Value> {
        reader::read_str(&mut self.heap, self.symbol_table, program)
    }

    /// Read a file through the streaming lexer.
    pub fn read_path(&mut self, path: &str) -> Result<Value> {
        reader::read_path(&mut self.heap, self.symbol_table, path)
    }

    /// Lower surface forms to the primitive language.
    pub fn expand(&mut self, x: Value) -> Result<Value> {
        expand::expand(&mut self.heap, self.symbol_table, x)
    }

    /// Evaluate in the global environment.
    pub fn eval_global(&mut self, x: Value) -> Result<Value> {
        let env = self.global_env;
        self.eval(x, env)
    }

    /// read -> expand -> eval, the usual top-level pipeline.
    pub fn run(&mut self, program: &str) -> Result<Value> {
        let parsed = self.read(program)?;
        let expanded = self.expand(parsed)?;
        self.eval_global(expanded)
    }

    fn op_is(&self, op: Value, name: &str) -> bool {
        matches!(op, Value::Symbol(r) if self.heap.symbol_name(r) == name)
    }

    /// Only the integer zero is false; every other value, including floats
    /// and Null, is true. Expanded code only ever tests the integers the
    /// expander emits, so this is observable only from raw `IF`.
    fn truthy(v: Value) -> bool {
        !matches!(v, Value::Int(0))
    }

    pub fn eval(&mut self, x: Value, env: Value) -> Result<Value> {
        let mut x = x;
        let mut env = env;

        loop {
            let head = match x {
                Value::Int(_)
                | Value::Float(_)
                | Value::Str(_)
                | Value::Lambda(_)
                | Value::Native(_)
                | Value::Null => return Ok(x),
                Value::Symbol(r) => {
                    let binding = globals::env_lookup(&self.heap, env, x);
                    match binding {
                        Value::Pair(b) => return Ok(self.heap.cdr(b)),
                        _ => {
                            let name = self.heap.symbol_name(r).to_string();
                            eprintln!("cannot find variable: {}", name);
                            return Err(LispError::UnknownVar(name));
                        }
                    }
                }
                Value::Table(_) => return Err(LispError::UnknownEval),
                Value::Pair(head) => head,
            };

            let op = self.heap.car(head);

            if self.op_is(op, "IF") {
                let pred = self.heap.at_index(x, 1);
                let conseq = self.heap.at_index(x, 2);
                let alt = self.heap.at_index(x, 3);

                if Self::truthy(self.eval(pred, env)?) {
                    x = conseq;
                } else {
                    x = alt;
                }
            } else if self.op_is(op, "BEGIN") {
                let Value::Pair(mut r) = self.heap.cdr(head) else {
                    return Ok(Value::Null);
                };

                // evaluate all but the last for effect
                while let Value::Pair(next) = self.heap.cdr(r) {
                    let e = self.heap.car(r);
                    self.eval(e, env)?;
                    r = next;
                }
                x = self.heap.car(r);
            } else if self.op_is(op, "QUOTE") {
                return Ok(self.heap.at_index(x, 1));
            } else if self.op_is(op, "DEFINE") {
                let sym = self.heap.at_index(x, 1);
                if !sym.is_symbol() {
                    return Err(LispError::BadDefine);
                }
                let expr = self.heap.at_index(x, 2);
                let value = self.eval(expr, env)?;
                globals::env_define(&mut self.heap, env, sym, value);
                return Ok(Value::Null);
            } else if self.op_is(op, "SET!") {
                let sym = self.heap.at_index(x, 1);
                if !sym.is_symbol() {
                    return Err(LispError::BadSet);
                }
                let expr = self.heap.at_index(x, 2);
                let value = self.eval(expr, env)?;
                globals::env_set(&mut self.heap, env, sym, value)?;
                return Ok(Value::Null);
            } else if self.op_is(op, "LAMBDA") {
                let params = self.heap.at_index(x, 1);
                let body = self.heap.at_index(x, 2);
                let id = self.lambda_counter;
                self.lambda_counter += 1;
                return Ok(Value::Lambda(self.heap.alloc(BlockData::Lambda {
                    id,
                    params,
                    body,
                    env,
                })));
            } else {
                // application: operator first, then arguments left to right
                let operator = self.eval(op, env)?;

                let mut args = ListBuilder::new();
                let mut it = self.heap.cdr(head);
                while let Value::Pair(r) = it {
                    let expr = self.heap.car(r);
                    let value = self.eval(expr, env)?;
                    args.push(&mut self.heap, value);
                    it = self.heap.cdr(r);
                }
                let args = args.list();

                match operator {
                    Value::Lambda(l) => {
                        let lambda = self.heap.lambda(l);
                        let frame = table::make_table(&mut self.heap, CALL_FRAME_CAPACITY);

                        // bind parameters positionally; missing arguments
                        // bind to Null, extras are dropped
                        let mut key_it = lambda.params;
                        let mut val_it = args;
                        while let Value::Pair(k) = key_it {
                            let key = self.heap.car(k);
                            if !key.is_symbol() {
                                return Err(LispError::BadLambda);
                            }
                            let val = self.heap.car_val(val_it)?;
                            table::table_set(&mut self.heap, frame, key, val);
                            key_it = self.heap.cdr(k);
                            val_it = self.heap.cdr_val(val_it)?;
                        }

                        x = lambda.body;
                        env = globals::env_extend(&mut self.heap, lambda.env, frame);
                    }
                    Value::Native(func) => return func(args, self),
                    other => {
                        eprintln!("apply error: not an operator {}", other.type_name());
                        return Err(LispError::BadOp);
                    }
                }
            }
        }
    }

    /// Copy everything reachable from the roots (symbol table, global
    /// environment, and `root`) into to-space, then swap the heaps. Every
    /// other handle the host holds is invalid afterwards.
    pub fn collect(&mut self, root: Value) -> Value {
        self.symbol_table = gc_move(self.symbol_table, &mut self.heap, &mut self.to_heap);
        self.global_env = gc_move(self.global_env, &mut self.heap, &mut self.to_heap);
        let result = gc_move(root, &mut self.heap, &mut self.to_heap);

        gc_scan(&mut self.heap, &mut self.to_heap);

        let live = self.to_heap.size();
        self.heap.reset(live);
        mem::swap(&mut self.heap, &mut self.to_heap);

        result
    }

    /// Live bytes in the current heap.
    pub fn heap_size(&self) -> usize {
        self.heap.size()
    }
}

impl Default for Interp {
    fn default() -> Self {
        Interp::new()
    }
}
