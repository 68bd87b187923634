//! Reader: turns a token stream into S-expressions. Quote sugar becomes
//! `(QUOTE x)`, and when a source holds more than one top-level expression
//! the whole sequence is wrapped in a `(BEGIN ...)`.

use std::fs::File;

use crate::error::{LispError, Result};
use crate::heap::{Heap, ListBuilder};
use crate::lexer::{Lexer, Token};
use crate::symbol;
use crate::value::Value;

pub struct Reader<'a> {
    lex: Lexer,
    heap: &'a mut Heap,
    symtab: Value,
}

impl<'a> Reader<'a> {
    pub fn new(lex: Lexer, heap: &'a mut Heap, symtab: Value) -> Self {
        Reader { lex, heap, symtab }
    }

    fn intern(&mut self, name: &str) -> Value {
        symbol::intern(self.heap, self.symtab, name)
    }

    fn parse_atom(&mut self) -> Result<Value> {
        let val = match self.lex.token {
            Token::Int => {
                let text = self.lex.token_text();
                Value::Int(text.parse().map_err(|_| LispError::BadToken)?)
            }
            Token::Float => {
                let text = self.lex.token_text();
                Value::Float(text.parse().map_err(|_| LispError::BadToken)?)
            }
            Token::Str => {
                let text = self.lex.string_text();
                self.heap.make_string(&text)
            }
            Token::Symbol => {
                let text = self.lex.token_text();
                self.intern(&text)
            }
            _ => return Err(LispError::BadToken),
        };

        self.lex.next_token()?;
        Ok(val)
    }

    fn parse_expr(&mut self) -> Result<Value> {
        match self.lex.token {
            Token::None => Err(LispError::ParenExpected),
            Token::LParen => {
                self.lex.next_token()?; // (
                let mut items = ListBuilder::new();
                while self.lex.token != Token::RParen {
                    let item = self.parse_expr()?;
                    items.push(self.heap, item);
                }
                self.lex.next_token()?; // )
                Ok(items.list())
            }
            Token::RParen => Err(LispError::ParenUnexpected),
            Token::Quote => {
                self.lex.next_token()?; // '
                let quoted = self.parse_expr()?;
                let quote_sym = self.intern("QUOTE");
                let inner = self.heap.cons(quoted, Value::Null);
                Ok(self.heap.cons(quote_sym, inner))
            }
            _ => self.parse_atom(),
        }
    }

    /// Parse everything in the source. More than one top-level expression
    /// comes back as `(BEGIN e1 e2 ...)`.
    pub fn parse(&mut self) -> Result<Value> {
        self.lex.next_token()?;
        let first = self.parse_expr()?;

        if self.lex.token == Token::None {
            return Ok(first);
        }

        let begin_sym = self.intern("BEGIN");
        let mut items = ListBuilder::new();
        items.push(self.heap, begin_sym);
        items.push(self.heap, first);
        while self.lex.token != Token::None {
            let next = self.parse_expr()?;
            items.push(self.heap, next);
        }
        Ok(items.list())
    }
}

/// Read from an in-memory string.
pub fn read_str(heap: &mut Heap, symtab: Value, program: &str) -> Result<Value> {
    Reader::new(Lexer::from_str(program), heap, symtab).parse()
}

/// Read from an already-open file via the streaming lexer. The handle is
/// dropped (closed) on every path out of here.
pub fn read_file(heap: &mut Heap, symtab: Value, file: File) -> Result<Value> {
    Reader::new(Lexer::from_file(file), heap, symtab).parse()
}

/// Open `path` and read its contents.
pub fn read_path(heap: &mut Heap, symtab: Value, path: &str) -> Result<Value> {
    let file = File::open(path).map_err(|_| LispError::FileOpen(path.to_string()))?;
    read_file(heap, symtab, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table;

    fn setup() -> (Heap, Value) {
        let mut heap = Heap::new();
        let symtab = table::make_table(&mut heap, 64);
        (heap, symtab)
    }

    #[test]
    fn reads_mixed_atom_list() {
        let (mut heap, symtab) = setup();
        let v = read_str(&mut heap, symtab, "(a 'b \"c\" 1 2.5)").unwrap();

        assert_eq!(heap.length(v), 5);
        assert_eq!(heap.at_index(v, 0), symbol::intern(&mut heap, symtab, "A"));

        // 'b reads as (QUOTE B)
        let quoted = heap.at_index(v, 1);
        let quote_sym = symbol::intern(&mut heap, symtab, "QUOTE");
        assert_eq!(heap.at_index(quoted, 0), quote_sym);
        assert_eq!(
            heap.at_index(quoted, 1),
            symbol::intern(&mut heap, symtab, "B")
        );

        let Value::Str(s) = heap.at_index(v, 2) else {
            panic!("third element should be a string")
        };
        assert_eq!(heap.string(s), "c");

        assert_eq!(heap.at_index(v, 3), Value::Int(1));
        assert_eq!(heap.at_index(v, 4), Value::Float(2.5));
    }

    #[test]
    fn empty_list_reads_as_null() {
        let (mut heap, symtab) = setup();
        assert_eq!(read_str(&mut heap, symtab, "()").unwrap(), Value::Null);
    }

    #[test]
    fn symbols_fold_at_read() {
        let (mut heap, symtab) = setup();
        let a = read_str(&mut heap, symtab, "foo").unwrap();
        let b = read_str(&mut heap, symtab, "FoO").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn multiple_top_level_expressions_wrap_in_begin() {
        let (mut heap, symtab) = setup();
        let v = read_str(&mut heap, symtab, "1 2 3").unwrap();
        let begin = symbol::intern(&mut heap, symtab, "BEGIN");
        assert_eq!(heap.at_index(v, 0), begin);
        assert_eq!(heap.length(v), 4);
        assert_eq!(heap.at_index(v, 3), Value::Int(3));
    }

    #[test]
    fn single_expression_is_not_wrapped() {
        let (mut heap, symtab) = setup();
        let v = read_str(&mut heap, symtab, "(1 2)").unwrap();
        assert_eq!(heap.at_index(v, 0), Value::Int(1));
    }

    #[test]
    fn paren_errors() {
        let (mut heap, symtab) = setup();
        assert_eq!(
            read_str(&mut heap, symtab, ")"),
            Err(LispError::ParenUnexpected)
        );
        assert_eq!(
            read_str(&mut heap, symtab, "(1 2"),
            Err(LispError::ParenExpected)
        );
        assert_eq!(
            read_str(&mut heap, symtab, "'"),
            Err(LispError::ParenExpected)
        );
    }

    #[test]
    fn nested_lists() {
        let (mut heap, symtab) = setup();
        let v = read_str(&mut heap, symtab, "(1 (2 (3)) 4)").unwrap();
        assert_eq!(heap.length(v), 3);
        let inner = heap.at_index(v, 1);
        assert_eq!(heap.at_index(inner, 0), Value::Int(2));
        let innermost = heap.at_index(inner, 1);
        assert_eq!(heap.at_index(innermost, 0), Value::Int(3));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::printer;
    use crate::table;
    use proptest::prelude::*;

    fn arb_atom() -> impl Strategy<Value = String> {
        prop_oneof![
            any::<i32>().prop_map(|n| n.to_string()),
            (any::<i32>(), 0u32..1000).prop_map(|(n, f)| format!("{}.{}", n, f)),
            "[a-z][a-z0-9?!*+-]{0,6}".prop_map(|s| s),
            "[a-z ]{0,10}".prop_map(|s| format!("\"{}\"", s)),
        ]
    }

    fn arb_expr() -> impl Strategy<Value = String> {
        arb_atom().prop_recursive(3, 24, 5, |inner| {
            prop::collection::vec(inner, 0..5).prop_map(|items| format!("({})", items.join(" ")))
        })
    }

    proptest! {
        // after one read+print, further read+print cycles are fixed points
        #[test]
        fn read_print_round_trip(src in arb_expr()) {
            let mut heap = Heap::new();
            let symtab = table::make_table(&mut heap, 64);

            let v = read_str(&mut heap, symtab, &src).unwrap();
            let printed = printer::print_val(&heap, v);

            let v2 = read_str(&mut heap, symtab, &printed).unwrap();
            prop_assert_eq!(printed, printer::print_val(&heap, v2));
        }
    }
}
