use std::{iter::Peekable, slice::Iter};
use crate::{
    error::{Error, Thing},
    lex::{lex, Lexeme, Token},
    util::{with_stack, SrcRegion},
    walker::{
        heap::{Heap, HeapRef},
        value::{symbol, Value},
    },
};

type Tokens<'a> = Peekable<Iter<'a, Token>>;

/// Build one value per top-level form.
pub fn parse(heap: &mut Heap<Value>, tokens: &[Token]) -> Result<Vec<HeapRef>, Error> {
    let mut tokens = tokens.iter().peekable();
    let mut forms = Vec::new();
    while tokens.peek().is_some() {
        forms.push(parse_expr(heap, &mut tokens)?);
    }
    Ok(forms)
}

/// Lex and parse `code`. When lexing fails in several places, the error
/// furthest into the source is reported.
pub fn read(heap: &mut Heap<Value>, code: &str) -> Result<Vec<HeapRef>, Error> {
    let tokens = lex(code).map_err(|errors| errors
        .into_iter()
        .reduce(Error::max)
        .unwrap_or_else(Error::unexpected_eof))?;
    parse(heap, &tokens)
}

fn parse_expr(heap: &mut Heap<Value>, tokens: &mut Tokens) -> Result<HeapRef, Error> {
    with_stack(|| parse_token(heap, tokens))
}

fn parse_token(heap: &mut Heap<Value>, tokens: &mut Tokens) -> Result<HeapRef, Error> {
    let token = match tokens.next() {
        Some(token) => token,
        None => return Err(Error::unexpected_eof()),
    };

    Ok(match token.lexeme {
        Lexeme::LParen => parse_list(heap, tokens, token.region)?,
        Lexeme::RParen => return Err(Error::unexpected(Thing::CloseParen)
            .at(token.region)
            .hint("there is no matching '('")),
        Lexeme::Quote => {
            let quoted = parse_expr(heap, tokens)
                .map_err(|err| err.while_parsing(Thing::Quote))?;
            let head = heap.symbol(symbol("quote"));
            heap.list(vec![head, quoted])
        },
        Lexeme::Symbol(name) => heap.symbol(name),
        Lexeme::String(s) => heap.string(s.as_str()),
        Lexeme::Int(x) => heap.int(x),
        Lexeme::Dec(x) => heap.dec(x),
        Lexeme::Bool(x) => heap.boolean(x),
    })
}

fn parse_list(heap: &mut Heap<Value>, tokens: &mut Tokens, open: SrcRegion) -> Result<HeapRef, Error> {
    let mut items = Vec::new();
    loop {
        match tokens.peek() {
            None => return Err(Error::unclosed_delimiter('(').at(open)),
            Some(token) if token.lexeme == Lexeme::RParen => {
                tokens.next();
                return Ok(heap.list(items));
            },
            Some(_) => items.push(parse_expr(heap, tokens).map_err(|err| err.while_parsing(Thing::List))?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::{error::ErrorKind, walker::print::Printer};

    fn reprint(code: &str) -> Vec<String> {
        let mut heap: Heap<Value> = Heap::new();
        let forms = read(&mut heap, code).unwrap();
        forms
            .into_iter()
            .map(|form| Printer::new(&heap, form).to_string())
            .collect()
    }

    #[test]
    fn parse_forms() {
        assert_eq!(reprint("(define (sq x) (* x x)) (sq 5)"), vec![
            "(define (sq x) (* x x))",
            "(sq 5)",
        ]);
    }

    #[test]
    fn parse_quote_sugar() {
        assert_eq!(reprint("'a '(1 2) ''b"), vec![
            "(quote a)",
            "(quote (1 2))",
            "(quote (quote b))",
        ]);
    }

    #[test]
    fn parse_atoms() {
        assert_eq!(reprint("1 -2.5 #t \"s\" () sym"), vec!["1", "-2.5", "#t", "\"s\"", "()", "sym"]);
    }

    #[test]
    fn printed_values_read_back() {
        let mut heap: Heap<Value> = Heap::new();
        let code = r#"(a "b \"c\"" (1 2.0 #f) () -7 3.25e-7)"#;
        let original = read(&mut heap, code).unwrap()[0];
        let printed = Printer::new(&heap, original).to_string();
        let reread = read(&mut heap, &printed).unwrap()[0];
        assert!(heap.structural_eq(original, reread));
    }

    #[test]
    fn unterminated_list_is_incomplete() {
        let mut heap: Heap<Value> = Heap::new();
        let err = read(&mut heap, "(define (f x)\n  (+ x 1)").unwrap_err();
        assert!(err.is_incomplete());
        assert_eq!(err.kind(), &ErrorKind::UnclosedDelimiter('('));
        assert_eq!(err.describe("(define (f x)\n  (+ x 1)"), "Unterminated list (line 1, column 1)");
    }

    #[test]
    fn dangling_quote_is_incomplete() {
        let mut heap: Heap<Value> = Heap::new();
        assert!(read(&mut heap, "'").unwrap_err().is_incomplete());
    }

    #[test]
    fn stray_close_paren() {
        let mut heap: Heap<Value> = Heap::new();
        let err = read(&mut heap, "1 )").unwrap_err();
        assert!(!err.is_incomplete());
        assert_eq!(err.region(), SrcRegion::from(2));
        assert_eq!(err.to_string(), "Unexpected ')' (there is no matching '(')");
    }

    #[test]
    fn lex_errors_surface() {
        let mut heap: Heap<Value> = Heap::new();
        let err = read(&mut heap, "(a [b])").unwrap_err();
        assert_eq!(err.to_string(), "Unknown token: ]");
    }
}
