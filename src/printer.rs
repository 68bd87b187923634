use crate::heap::Heap;
use crate::value::Value;

/// Print a value to a string.
pub fn print_val(heap: &Heap, val: Value) -> String {
    let mut out = String::new();
    print_inner(heap, val, &mut out, false, 0);
    out
}

fn print_inner(heap: &Heap, val: Value, out: &mut String, is_cdr: bool, depth: usize) {
    if depth > 1000 {
        out.push_str("...");
        return;
    }

    match val {
        Value::Null => out.push_str("NIL"),
        Value::Int(n) => out.push_str(&n.to_string()),
        // {:?} keeps the decimal point, so floats re-read as floats
        Value::Float(x) => out.push_str(&format!("{:?}", x)),
        Value::Native(_) => out.push_str("<native-fn>"),
        Value::Symbol(r) => out.push_str(heap.symbol_name(r)),
        Value::Str(r) => {
            out.push('"');
            out.push_str(heap.string(r));
            out.push('"');
        }
        Value::Lambda(r) => {
            out.push_str(&format!("lambda-{}", heap.lambda(r).id));
        }
        Value::Table(r) => {
            out.push('{');
            let capacity = crate::table::capacity(heap, Value::Table(r));
            for i in 0..capacity {
                let chain = crate::table::bucket(heap, Value::Table(r), i);
                if chain.is_null() {
                    continue;
                }
                print_inner(heap, chain, out, false, depth + 1);
                out.push(' ');
            }
            out.push('}');
        }
        Value::Pair(r) => {
            if !is_cdr {
                out.push('(');
            }
            print_inner(heap, heap.car(r), out, false, depth + 1);

            let cdr = heap.cdr(r);
            match cdr {
                Value::Pair(_) => {
                    out.push(' ');
                    print_inner(heap, cdr, out, true, depth + 1);
                }
                Value::Null => out.push(')'),
                other => {
                    out.push_str(" . ");
                    print_inner(heap, other, out, false, depth + 1);
                    out.push(')');
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader;
    use crate::table;

    fn print_read(src: &str) -> String {
        let mut heap = Heap::new();
        let symtab = table::make_table(&mut heap, 64);
        let v = reader::read_str(&mut heap, symtab, src).unwrap();
        print_val(&heap, v)
    }

    #[test]
    fn atoms() {
        assert_eq!(print_read("42"), "42");
        assert_eq!(print_read("-7"), "-7");
        assert_eq!(print_read("2.5"), "2.5");
        assert_eq!(print_read("3.0"), "3.0");
        assert_eq!(print_read("foo"), "FOO");
        assert_eq!(print_read("\"hi\""), "\"hi\"");
        assert_eq!(print_read("()"), "NIL");
    }

    #[test]
    fn lists_and_nesting() {
        assert_eq!(print_read("(1 2 3)"), "(1 2 3)");
        assert_eq!(print_read("(a (b c) d)"), "(A (B C) D)");
        assert_eq!(print_read("'x"), "(QUOTE X)");
    }

    #[test]
    fn dotted_pair_output() {
        let mut heap = Heap::new();
        let pair = heap.cons(Value::Int(1), Value::Int(2));
        assert_eq!(print_val(&heap, pair), "(1 . 2)");

        let improper = heap.cons(Value::Int(0), pair);
        assert_eq!(print_val(&heap, improper), "(0 1 . 2)");
    }

    #[test]
    fn read_print_round_trip_is_stable() {
        let sources = [
            "(1 2 3)",
            "(a \"b\" 2.5 (c (d)))",
            "NIL",
            "(QUOTE (X Y))",
        ];
        for src in sources {
            let printed = print_read(src);
            assert_eq!(print_read(&printed), printed, "round trip for {}", src);
        }
    }
}
