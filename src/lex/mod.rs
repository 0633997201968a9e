use std::fmt;
use internment::Intern;
use crate::{
    Error,
    util::{SrcLoc, SrcRegion},
};

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Lexeme {
    Symbol(Intern<String>),
    String(Intern<String>),
    Int(i64),
    Dec(f64),
    Bool(bool),

    LParen,
    RParen,
    Quote,
}

impl fmt::Display for Lexeme {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Lexeme::Symbol(s) => write!(f, "{}", s.as_str()),
            Lexeme::String(s) => write!(f, "{:?}", s.as_str()),
            Lexeme::Int(x) => write!(f, "{}", x),
            Lexeme::Dec(x) => write!(f, "{:?}", x),
            Lexeme::Bool(true) => write!(f, "#t"),
            Lexeme::Bool(false) => write!(f, "#f"),
            Lexeme::LParen => write!(f, "("),
            Lexeme::RParen => write!(f, ")"),
            Lexeme::Quote => write!(f, "'"),
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct Token {
    pub lexeme: Lexeme,
    pub region: SrcRegion,
}

impl Token {
    pub fn new(lexeme: Lexeme, region: SrcRegion) -> Self {
        Self {
            lexeme,
            region,
        }
    }
}

pub fn is_symbol_char(c: char) -> bool {
    c.is_alphanumeric() || "@#$&:|?._-+*!/%=^<>".contains(c)
}

/// Decide whether the text of an atom is a number or a symbol. Decimals must
/// contain a `.` and be finite, which keeps `inf` and `nan` as plain symbols.
fn classify_atom(atom: &str) -> Lexeme {
    if atom.contains('.') {
        match atom.parse::<f64>() {
            Ok(x) if x.is_finite() => return Lexeme::Dec(x),
            _ => {},
        }
    } else if let Ok(x) = atom.parse::<i64>() {
        return Lexeme::Int(x);
    }
    Lexeme::Symbol(Intern::new(atom.to_string()))
}

fn classify_constant(name: &str) -> Option<Lexeme> {
    match name {
        "t" | "true" => Some(Lexeme::Bool(true)),
        "f" | "false" => Some(Lexeme::Bool(false)),
        _ => None,
    }
}

pub fn lex(s: &str) -> Result<Vec<Token>, Vec<Error>> {
    enum State {
        Default,
        Atom(SrcLoc, String),
        String(SrcLoc, String),
        Escape(SrcLoc, String),
        Constant(SrcLoc, String),
        Comment,
    }

    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    let mut chars = s.chars();
    let mut state = State::Default;
    let mut loc = SrcLoc::start();

    loop {
        let c = chars.clone().next();
        let mut to_next = true;
        match &mut state {
            State::Default => match c {
                Some(c) if c.is_whitespace() => {},
                Some('(') => tokens.push(Token::new(Lexeme::LParen, SrcRegion::single(loc))),
                Some(')') => tokens.push(Token::new(Lexeme::RParen, SrcRegion::single(loc))),
                Some('\'') => tokens.push(Token::new(Lexeme::Quote, SrcRegion::single(loc))),
                Some(';') => state = State::Comment,
                Some('"') => state = State::String(loc, String::new()),
                Some('#') => state = State::Constant(loc, String::new()),
                Some(c) if is_symbol_char(c) => state = State::Atom(loc, Some(c).iter().collect()),
                Some(c) => errors.push(Error::unexpected_char(c).at(SrcRegion::single(loc))),
                None => break,
            },
            State::Comment => match c {
                Some('\n') => state = State::Default,
                Some(_) => {},
                None => break,
            },
            State::String(start, string) => match c {
                Some('"') => {
                    let lexeme = Lexeme::String(Intern::new(std::mem::take(string)));
                    tokens.push(Token::new(lexeme, SrcRegion::range(*start, loc.next())));
                    state = State::Default;
                },
                Some('\\') => state = State::Escape(*start, std::mem::take(string)),
                Some(c) => string.push(c),
                None => {
                    errors.push(Error::unclosed_delimiter('"').at(SrcRegion::range(*start, loc)));
                    break;
                },
            },
            State::Escape(start, string) => match c {
                Some(c @ '\\') | Some(c @ '"') => {
                    string.push(c);
                    state = State::String(*start, std::mem::take(string));
                },
                Some(c) => {
                    errors.push(Error::invalid_escape(c)
                        .at(SrcRegion::range(*start, loc.next()))
                        .hint("only \\\\ and \\\" may be escaped"));
                    state = State::String(*start, std::mem::take(string));
                },
                None => {
                    errors.push(Error::unclosed_delimiter('"').at(SrcRegion::range(*start, loc)));
                    break;
                },
            },
            State::Constant(start, name) => match c {
                Some(c) if c.is_alphabetic() => name.push(c),
                _ => {
                    let region = SrcRegion::range(*start, loc);
                    match classify_constant(name) {
                        Some(lexeme) => tokens.push(Token::new(lexeme, region)),
                        None => errors.push(Error::unknown_constant(format!("#{}", name)).at(region)),
                    }
                    to_next = false;
                    state = State::Default;
                },
            },
            State::Atom(start, atom) => match c {
                Some(c) if is_symbol_char(c) => atom.push(c),
                _ => {
                    tokens.push(Token::new(classify_atom(atom), SrcRegion::range(*start, loc)));
                    to_next = false;
                    state = State::Default;
                },
            },
        }

        if to_next {
            chars.next();
            loc = loc.next();
        }
    }

    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lexemes(code: &str) -> Vec<Lexeme> {
        lex(code)
            .unwrap()
            .into_iter()
            .map(|tok| tok.lexeme)
            .collect()
    }

    fn sym(name: &str) -> Lexeme {
        Lexeme::Symbol(Intern::new(name.to_string()))
    }

    #[test]
    fn lex_call() {
        assert_eq!(lexemes("(+ 1 2.5)"), vec![
            Lexeme::LParen,
            sym("+"),
            Lexeme::Int(1),
            Lexeme::Dec(2.5),
            Lexeme::RParen,
        ]);
    }

    #[test]
    fn lex_operators_and_symbols() {
        assert_eq!(lexemes("<= >= - null? string-append"), vec![
            sym("<="),
            sym(">="),
            sym("-"),
            sym("null?"),
            sym("string-append"),
        ]);
    }

    #[test]
    fn lex_negative_numbers() {
        assert_eq!(lexemes("-4 -0.5"), vec![Lexeme::Int(-4), Lexeme::Dec(-0.5)]);
    }

    #[test]
    fn lex_out_of_range_decimal_is_a_symbol() {
        assert_eq!(lexemes("1.0e400"), vec![sym("1.0e400")]);
    }

    #[test]
    fn lex_constants_and_quote() {
        assert_eq!(lexemes("'(#t #f)"), vec![
            Lexeme::Quote,
            Lexeme::LParen,
            Lexeme::Bool(true),
            Lexeme::Bool(false),
            Lexeme::RParen,
        ]);
    }

    #[test]
    fn lex_string_escapes() {
        assert_eq!(
            lexemes(r#""say \"hi\" \\ bye""#),
            vec![Lexeme::String(Intern::new("say \"hi\" \\ bye".to_string()))],
        );
    }

    #[test]
    fn lexemes_display_as_source() {
        let shown = lexemes("'(f \"a\\\"b\" 2.0 -3 #t)")
            .into_iter()
            .map(|l| l.to_string())
            .collect::<Vec<_>>();
        assert_eq!(shown, vec!["'", "(", "f", "\"a\\\"b\"", "2.0", "-3", "#t", ")"]);
    }

    #[test]
    fn lex_skips_comments() {
        assert_eq!(lexemes("; nothing here\n42 ; trailing"), vec![Lexeme::Int(42)]);
    }

    #[test]
    fn lex_invalid_escape() {
        let errors = lex(r#""bad \n escape""#).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().starts_with("Invalid escape character"));
    }

    #[test]
    fn lex_unterminated_string_is_incomplete() {
        let errors = lex("(display \"abc").unwrap_err();
        assert!(errors[0].is_incomplete());
    }

    #[test]
    fn lex_unknown_char() {
        let errors = lex("(a [b])").unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].to_string(), "Unknown token: [");
    }

    #[test]
    fn lex_unknown_constant() {
        let errors = lex("#maybe").unwrap_err();
        assert_eq!(errors[0].to_string(), "Unknown constant: #maybe");
    }
}
