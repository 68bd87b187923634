//! Open hash table with chained buckets. Entries are `(key . value)` pairs
//! strung on ordinary heap pairs, so the collector traverses them for free.
//!
//! Resizing is deferred to collection time (see `heap::gc_move`): between
//! collections a table may exceed the ideal load factor, which a program
//! that never collects should expect.

use crate::heap::{BlockData, Heap};
use crate::value::{BlockRef, Value};

pub fn make_table(heap: &mut Heap, capacity: usize) -> Value {
    debug_assert!(capacity >= 1);
    Value::Table(heap.alloc(BlockData::Table {
        size: 0,
        buckets: vec![Value::Null; capacity].into_boxed_slice(),
    }))
}

fn table_ref(table: Value) -> BlockRef {
    match table {
        Value::Table(r) => r,
        _ => panic!("internal error: expected a table, got {}", table.type_name()),
    }
}

pub fn capacity(heap: &Heap, table: Value) -> usize {
    match &heap.block(table_ref(table)).data {
        BlockData::Table { buckets, .. } => buckets.len(),
        _ => panic!("internal error: table block without table data"),
    }
}

pub fn size(heap: &Heap, table: Value) -> usize {
    match &heap.block(table_ref(table)).data {
        BlockData::Table { size, .. } => *size,
        _ => panic!("internal error: table block without table data"),
    }
}

pub fn bucket(heap: &Heap, table: Value, index: usize) -> Value {
    match &heap.block(table_ref(table)).data {
        BlockData::Table { buckets, .. } => buckets[index],
        _ => panic!("internal error: table block without table data"),
    }
}

fn set_bucket(heap: &mut Heap, table: Value, index: usize, val: Value) {
    match &mut heap.block_mut(table_ref(table)).data {
        BlockData::Table { buckets, .. } => buckets[index] = val,
        _ => panic!("internal error: table block without table data"),
    }
}

fn bump_size(heap: &mut Heap, table: Value) {
    match &mut heap.block_mut(table_ref(table)).data {
        BlockData::Table { size, .. } => *size += 1,
        _ => panic!("internal error: table block without table data"),
    }
}

fn key_index(heap: &Heap, table: Value, key: Value) -> usize {
    let hash = match key {
        Value::Symbol(r) => heap.symbol_hash(r),
        _ => panic!("internal error: table key must be a symbol"),
    };
    hash as usize % capacity(heap, table)
}

/// Overwrite the value cell if `key` is already present, otherwise prepend
/// a new `(key . value)` entry to its bucket.
pub fn table_set(heap: &mut Heap, table: Value, key: Value, value: Value) {
    let index = key_index(heap, table, key);
    let chain = bucket(heap, table, index);

    let entry = heap.assoc(chain, key);
    if let Value::Pair(e) = entry {
        heap.set_cdr(e, value);
    } else {
        let entry = heap.cons(key, value);
        let cell = heap.cons(entry, chain);
        set_bucket(heap, table, index, cell);
        bump_size(heap, table);
    }
}

/// The `(key . value)` pair bound to `key`, or Null.
pub fn table_get(heap: &Heap, table: Value, key: Value) -> Value {
    let index = key_index(heap, table, key);
    heap.assoc(bucket(heap, table, index), key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol;

    fn setup() -> (Heap, Value, Value) {
        let mut heap = Heap::new();
        let symtab = make_table(&mut heap, 16);
        let table = make_table(&mut heap, 4);
        (heap, symtab, table)
    }

    #[test]
    fn set_then_get() {
        let (mut heap, symtab, table) = setup();
        let a = symbol::intern(&mut heap, symtab, "a");
        let b = symbol::intern(&mut heap, symtab, "b");

        table_set(&mut heap, table, a, Value::Int(1));
        table_set(&mut heap, table, b, Value::Int(2));
        assert_eq!(size(&heap, table), 2);

        let entry = table_get(&heap, table, a);
        let Value::Pair(e) = entry else { panic!() };
        assert_eq!(heap.cdr(e), Value::Int(1));

        let entry = table_get(&heap, table, b);
        let Value::Pair(e) = entry else { panic!() };
        assert_eq!(heap.cdr(e), Value::Int(2));
    }

    #[test]
    fn set_overwrites_in_place() {
        let (mut heap, symtab, table) = setup();
        let a = symbol::intern(&mut heap, symtab, "a");

        table_set(&mut heap, table, a, Value::Int(1));
        table_set(&mut heap, table, a, Value::Int(99));
        assert_eq!(size(&heap, table), 1);

        let Value::Pair(e) = table_get(&heap, table, a) else {
            panic!()
        };
        assert_eq!(heap.cdr(e), Value::Int(99));
    }

    #[test]
    fn missing_key_is_null() {
        let (mut heap, symtab, table) = setup();
        let a = symbol::intern(&mut heap, symtab, "a");
        assert_eq!(table_get(&heap, table, a), Value::Null);
    }

    #[test]
    fn capacity_one_table_chains_everything() {
        let mut heap = Heap::new();
        let symtab = make_table(&mut heap, 16);
        let table = make_table(&mut heap, 1);

        let syms: Vec<Value> = (0..10)
            .map(|i| symbol::intern(&mut heap, symtab, &format!("k{}", i)))
            .collect();
        for (i, &s) in syms.iter().enumerate() {
            table_set(&mut heap, table, s, Value::Int(i as i64));
        }

        assert_eq!(size(&heap, table), 10);
        for (i, &s) in syms.iter().enumerate() {
            let Value::Pair(e) = table_get(&heap, table, s) else {
                panic!()
            };
            assert_eq!(heap.cdr(e), Value::Int(i as i64));
        }
    }
}
