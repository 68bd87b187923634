//! Macro expansion: a structural rewrite that lowers the surface forms
//! (`define`, `set!`, `cond`, `and`, `or`, `let`, `lambda`, `assert`) to the
//! primitive language the evaluator understands (`if`, `begin`, `quote`,
//! `define`, `set!`, `lambda`, application). Nothing here evaluates.

use crate::error::{LispError, Result};
use crate::heap::{Heap, ListBuilder};
use crate::symbol;
use crate::value::Value;

fn sym_is(heap: &Heap, v: Value, name: &str) -> bool {
    matches!(v, Value::Symbol(r) if heap.symbol_name(r) == name)
}

pub fn expand(heap: &mut Heap, symtab: Value, x: Value) -> Result<Value> {
    // a bare QUOTE symbol is left alone so quoted forms survive re-expansion
    if sym_is(heap, x, "QUOTE") {
        return Ok(x);
    }

    let Value::Pair(head) = x else {
        return Ok(x);
    };

    let op = heap.car(head);

    if sym_is(heap, op, "QUOTE") {
        if heap.length(x) != 2 {
            return Err(LispError::BadQuote);
        }
        Ok(x)
    } else if sym_is(heap, op, "DEFINE") {
        expand_define(heap, symtab, x)
    } else if sym_is(heap, op, "SET!") {
        expand_set(heap, symtab, x)
    } else if sym_is(heap, op, "COND") {
        expand_cond(heap, symtab, x)
    } else if sym_is(heap, op, "AND") {
        expand_and_or(heap, symtab, x, true)
    } else if sym_is(heap, op, "OR") {
        expand_and_or(heap, symtab, x, false)
    } else if sym_is(heap, op, "LET") {
        expand_let(heap, symtab, x)
    } else if sym_is(heap, op, "LAMBDA") {
        expand_lambda(heap, symtab, x)
    } else if sym_is(heap, op, "ASSERT") && heap.length(x) == 2 {
        expand_assert(heap, symtab, x)
    } else {
        expand_elements(heap, symtab, x)
    }
}

/// `(DEFINE (name p...) body...)` -> `(DEFINE name (LAMBDA (p...) body...))`
/// `(DEFINE name expr)` -> recurse on expr.
fn expand_define(heap: &mut Heap, symtab: Value, x: Value) -> Result<Value> {
    if heap.length(x) < 3 {
        return Err(LispError::BadDefine);
    }

    let define_sym = heap.at_index(x, 0);
    let sig = heap.at_index(x, 1);

    match sig {
        Value::Pair(sig_ref) => {
            let name = heap.car(sig_ref);
            if !name.is_symbol() {
                return Err(LispError::BadDefine);
            }

            let params = heap.cdr(sig_ref);
            let body = heap.nav(x, "cddr");
            let lambda_sym = symbol::intern(heap, symtab, "LAMBDA");
            let params_and_body = heap.cons(params, body);
            let lambda = heap.cons(lambda_sym, params_and_body);
            let lambda = expand(heap, symtab, lambda)?;

            Ok(heap.list(&[define_sym, name, lambda]))
        }
        Value::Symbol(_) => {
            let raw = heap.at_index(x, 2);
            let expr = expand(heap, symtab, raw)?;
            Ok(heap.list(&[define_sym, sig, expr]))
        }
        _ => Err(LispError::BadDefine),
    }
}

/// `(SET! var expr)` — var must be a symbol; expr is recursed.
fn expand_set(heap: &mut Heap, symtab: Value, x: Value) -> Result<Value> {
    if heap.length(x) != 3 {
        return Err(LispError::BadSet);
    }
    let var = heap.at_index(x, 1);
    if !var.is_symbol() {
        return Err(LispError::BadSet);
    }

    let set_sym = heap.at_index(x, 0);
    let raw = heap.at_index(x, 2);
    let expr = expand(heap, symtab, raw)?;
    Ok(heap.list(&[set_sym, var, expr]))
}

/// `(COND (p0 e0) ... (ELSE en))` right-folds into nested IFs; the ELSE
/// branch, if present, becomes the innermost alternative.
fn expand_cond(heap: &mut Heap, symtab: Value, x: Value) -> Result<Value> {
    let clauses = heap.list_to_vec(heap.cdr_val(x)?);
    if clauses.is_empty() {
        return Err(LispError::BadCond);
    }
    for &clause in &clauses {
        if !clause.is_pair() || heap.length(clause) != 2 {
            return Err(LispError::BadCond);
        }
    }

    let if_sym = symbol::intern(heap, symtab, "IF");

    let mut rest = &clauses[..];
    let mut outer = Value::Null;

    let last = clauses[clauses.len() - 1];
    if sym_is(heap, heap.at_index(last, 0), "ELSE") {
        let else_expr = heap.at_index(last, 1);
        outer = expand(heap, symtab, else_expr)?;
        rest = &clauses[..clauses.len() - 1];
    }

    for &clause in rest.iter().rev() {
        let raw_pred = heap.at_index(clause, 0);
        let raw_expr = heap.at_index(clause, 1);
        let pred = expand(heap, symtab, raw_pred)?;
        let expr = expand(heap, symtab, raw_expr)?;
        outer = heap.list(&[if_sym, pred, expr, outer]);
    }
    Ok(outer)
}

/// `(AND a0 ... an)` -> `(IF a0 (IF a1 ... (IF an 1 0) 0) 0)`
/// `(OR a0 ... an)`  -> `(IF a0 1 (IF a1 1 ... (IF an 1 0)))`
fn expand_and_or(heap: &mut Heap, symtab: Value, x: Value, is_and: bool) -> Result<Value> {
    let operands = heap.list_to_vec(heap.cdr_val(x)?);
    if operands.is_empty() {
        return Err(if is_and {
            LispError::BadAnd
        } else {
            LispError::BadOr
        });
    }

    let if_sym = symbol::intern(heap, symtab, "IF");

    let last = expand(heap, symtab, operands[operands.len() - 1])?;
    let mut outer = heap.list(&[if_sym, last, Value::Int(1), Value::Int(0)]);

    for &operand in operands[..operands.len() - 1].iter().rev() {
        let p = expand(heap, symtab, operand)?;
        outer = if is_and {
            heap.list(&[if_sym, p, outer, Value::Int(0)])
        } else {
            heap.list(&[if_sym, p, Value::Int(1), outer])
        };
    }
    Ok(outer)
}

/// `(LET ((v0 e0) ...) body...)` -> `((LAMBDA (v0 ...) body...) e0 ...)`
fn expand_let(heap: &mut Heap, symtab: Value, x: Value) -> Result<Value> {
    let bindings = heap.at_index(x, 1);
    if !bindings.is_pair() {
        return Err(LispError::BadLet);
    }

    let mut vars = ListBuilder::new();
    let mut exprs = ListBuilder::new();

    for binding in heap.list_to_vec(bindings) {
        if !binding.is_pair() || heap.length(binding) != 2 {
            return Err(LispError::BadLet);
        }
        let var = heap.at_index(binding, 0);
        if !var.is_symbol() {
            return Err(LispError::BadLet);
        }
        vars.push(heap, var);
        let raw = heap.at_index(binding, 1);
        let expr = expand(heap, symtab, raw)?;
        exprs.push(heap, expr);
    }

    let body = heap.nav(x, "cddr");
    let lambda_sym = symbol::intern(heap, symtab, "LAMBDA");
    let params_and_body = heap.cons(vars.list(), body);
    let lambda = heap.cons(lambda_sym, params_and_body);
    let lambda = expand(heap, symtab, lambda)?;

    Ok(heap.cons(lambda, exprs.list()))
}

/// A lambda with more than one body expression gets the body wrapped in a
/// single `(BEGIN ...)`.
fn expand_lambda(heap: &mut Heap, symtab: Value, x: Value) -> Result<Value> {
    let lambda_sym = heap.at_index(x, 0);
    let params = heap.at_index(x, 1);
    if !params.is_pair() && !params.is_null() {
        return Err(LispError::BadLambda);
    }

    if heap.length(x) > 3 {
        let mut body = ListBuilder::new();
        let begin_sym = symbol::intern(heap, symtab, "BEGIN");
        body.push(heap, begin_sym);
        for expr in heap.list_to_vec(heap.nav(x, "cddr")) {
            let expanded = expand(heap, symtab, expr)?;
            body.push(heap, expanded);
        }
        Ok(heap.list(&[lambda_sym, params, body.list()]))
    } else {
        let raw = heap.at_index(x, 2);
        let body = expand(heap, symtab, raw)?;
        Ok(heap.list(&[lambda_sym, params, body]))
    }
}

/// `(ASSERT expr)` -> `(ASSERT expr' (QUOTE expr))`; the unexpanded form
/// rides along for diagnostics. Already-lowered three-element asserts take
/// the generic path so expansion stays idempotent.
fn expand_assert(heap: &mut Heap, symtab: Value, x: Value) -> Result<Value> {
    let assert_sym = heap.at_index(x, 0);
    let statement = heap.at_index(x, 1);

    let quote_sym = symbol::intern(heap, symtab, "QUOTE");
    let quoted = heap.list(&[quote_sym, statement]);
    let expanded = expand(heap, symtab, statement)?;
    Ok(heap.list(&[assert_sym, expanded, quoted]))
}

/// Any other pair: recurse on every element, preserving a dotted tail.
fn expand_elements(heap: &mut Heap, symtab: Value, x: Value) -> Result<Value> {
    let mut items = ListBuilder::new();
    let mut it = x;
    loop {
        match it {
            Value::Pair(r) => {
                let raw = heap.car(r);
                let element = expand(heap, symtab, raw)?;
                items.push(heap, element);
                it = heap.cdr(r);
            }
            Value::Null => return Ok(items.list()),
            tail => {
                let list = items.list();
                // re-attach the dotted tail to the rebuilt spine
                let mut last = list;
                while let Value::Pair(r) = last {
                    if heap.cdr(r).is_null() {
                        let expanded_tail = expand(heap, symtab, tail)?;
                        heap.set_cdr(r, expanded_tail);
                        break;
                    }
                    last = heap.cdr(r);
                }
                return Ok(list);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer;
    use crate::reader;
    use crate::table;

    fn setup() -> (Heap, Value) {
        let mut heap = Heap::new();
        let symtab = table::make_table(&mut heap, 64);
        (heap, symtab)
    }

    fn expand_str(heap: &mut Heap, symtab: Value, src: &str) -> Result<Value> {
        let parsed = reader::read_str(heap, symtab, src)?;
        expand(heap, symtab, parsed)
    }

    fn expanded_text(src: &str) -> String {
        let (mut heap, symtab) = setup();
        let v = expand_str(&mut heap, symtab, src).unwrap();
        printer::print_val(&heap, v)
    }

    #[test]
    fn define_function_sugar_becomes_lambda() {
        assert_eq!(
            expanded_text("(define (sq x) (* x x))"),
            "(DEFINE SQ (LAMBDA (X) (* X X)))"
        );
    }

    #[test]
    fn define_with_multi_body_gets_begin() {
        assert_eq!(
            expanded_text("(define (f x) (display x) x)"),
            "(DEFINE F (LAMBDA (X) (BEGIN (DISPLAY X) X)))"
        );
    }

    #[test]
    fn cond_right_folds_into_ifs() {
        assert_eq!(
            expanded_text("(cond ((= 1 2) 'a) ((= 2 2) 'b) (else 'c))"),
            "(IF (= 1 2) (QUOTE A) (IF (= 2 2) (QUOTE B) (QUOTE C)))"
        );
    }

    #[test]
    fn cond_without_else_falls_to_null() {
        assert_eq!(expanded_text("(cond ((= 1 1) 2))"), "(IF (= 1 1) 2 NIL)");
    }

    #[test]
    fn and_lowers_to_nested_ifs() {
        assert_eq!(
            expanded_text("(and a b c)"),
            "(IF A (IF B (IF C 1 0) 0) 0)"
        );
    }

    #[test]
    fn or_lowers_to_nested_ifs() {
        assert_eq!(expanded_text("(or a b c)"), "(IF A 1 (IF B 1 (IF C 1 0)))");
    }

    #[test]
    fn let_becomes_immediate_lambda_application() {
        assert_eq!(
            expanded_text("(let ((a 1) (b 2)) (+ a b))"),
            "((LAMBDA (A B) (+ A B)) 1 2)"
        );
    }

    #[test]
    fn assert_preserves_the_unexpanded_form() {
        assert_eq!(
            expanded_text("(assert (and 1 2))"),
            "(ASSERT (IF 1 (IF 2 1 0) 0) (QUOTE (AND 1 2)))"
        );
    }

    #[test]
    fn quote_contents_are_not_expanded() {
        assert_eq!(expanded_text("'(and 1 2)"), "(QUOTE (AND 1 2))");
    }

    #[test]
    fn atoms_pass_through() {
        assert_eq!(expanded_text("42"), "42");
        assert_eq!(expanded_text("foo"), "FOO");
    }

    #[test]
    fn expansion_is_idempotent() {
        let sources = [
            "(define (sq x) (* x x))",
            "(cond ((= 1 2) 'a) (else 'b))",
            "(and 1 2 3)",
            "(or x y)",
            "(let ((a 1)) a)",
            "(lambda (x y) (display x) y)",
            "(assert (and 1 2))",
            "(quote (a b c))",
        ];
        for src in sources {
            let (mut heap, symtab) = setup();
            let once = expand_str(&mut heap, symtab, src).unwrap();
            let twice = expand(&mut heap, symtab, once).unwrap();
            assert_eq!(
                printer::print_val(&heap, once),
                printer::print_val(&heap, twice),
                "expansion not idempotent for {}",
                src
            );
        }
    }

    #[test]
    fn malformed_forms_report_their_kind() {
        let cases = [
            ("(define x)", LispError::BadDefine),
            ("(define 5 1)", LispError::BadDefine),
            ("(define (5 x) 1)", LispError::BadDefine),
            ("(set! 5 1)", LispError::BadSet),
            ("(set! x)", LispError::BadSet),
            ("(cond)", LispError::BadCond),
            ("(cond (1))", LispError::BadCond),
            ("(cond 5)", LispError::BadCond),
            ("(and)", LispError::BadAnd),
            ("(or)", LispError::BadOr),
            ("(let 5 x)", LispError::BadLet),
            ("(let ((5 1)) x)", LispError::BadLet),
            ("(let ((x)) x)", LispError::BadLet),
            ("(lambda 5 x y)", LispError::BadLambda),
            ("(quote)", LispError::BadQuote),
            ("(quote a b)", LispError::BadQuote),
        ];
        for (src, want) in cases {
            let (mut heap, symtab) = setup();
            assert_eq!(expand_str(&mut heap, symtab, src), Err(want), "{}", src);
        }
    }
}
