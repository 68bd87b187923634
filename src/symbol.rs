//! Symbol interning. At most one Symbol block exists per case-folded name;
//! after interning, symbol equality is handle equality. The intern table
//! itself is an ordinary heap table, so it is a GC root like any other.

use crate::heap::{BlockData, Heap};
use crate::table;
use crate::value::Value;

/// Fold a symbol name to its canonical stored form.
pub fn fold(name: &str) -> String {
    name.to_ascii_uppercase()
}

/// Adler-32 over the case-folded bytes. Computed once at intern time and
/// stored in the Symbol block.
pub fn hash(name: &str) -> u32 {
    let mut s1: u32 = 1;
    let mut s2: u32 = 0;
    for b in name.bytes() {
        s1 = (s1 + b.to_ascii_uppercase() as u32) % 65521;
        s2 = (s2 + s1) % 65521;
    }
    (s2 << 16) | s1
}

/// Intern `name` in `symtab`, returning the unique Symbol for its folded
/// form. Allocates only on a miss.
pub fn intern(heap: &mut Heap, symtab: Value, name: &str) -> Value {
    let folded = fold(name);
    let h = hash(&folded);

    let index = h as usize % table::capacity(heap, symtab);
    let mut it = table::bucket(heap, symtab, index);
    while let Value::Pair(r) = it {
        let entry = heap.car(r);
        if let Value::Pair(e) = entry {
            if let Value::Symbol(s) = heap.car(e) {
                if heap.symbol_name(s) == folded {
                    return Value::Symbol(s);
                }
            }
        }
        it = heap.cdr(r);
    }

    let sym = Value::Symbol(heap.alloc(BlockData::Symbol {
        hash: h,
        name: folded.into_boxed_str(),
    }));
    table::table_set(heap, symtab, sym, Value::Null);
    sym
}
