use std::fmt;
use thiserror::Error as ThisError;
use crate::util::SrcRegion;

#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum Thing {
    CloseParen,
    Quote,
    List,
}

impl fmt::Display for Thing {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Thing::CloseParen => write!(f, "')'"),
            Thing::Quote => write!(f, "quote"),
            Thing::List => write!(f, "list"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, ThisError)]
pub enum ErrorKind {
    #[error("Unknown token: {0}")]
    UnexpectedChar(char),
    #[error("Invalid escape character: \\{0}")]
    InvalidEscape(char),
    #[error("Unknown constant: {0}")]
    UnknownConstant(String),
    #[error("Unterminated {}", delimiter_name(.0))]
    UnclosedDelimiter(char),
    #[error("Unexpected {0}")]
    Unexpected(Thing),
    #[error("Unexpected end of input")]
    UnexpectedEof,
}

fn delimiter_name(c: &char) -> &'static str {
    match c {
        '"' => "string",
        _ => "list",
    }
}

/// An error produced while turning source text into values.
#[derive(Clone, Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    region: SrcRegion,
    while_parsing: Vec<Thing>,
    hint: Option<&'static str>,
}

impl Error {
    pub fn unexpected_char(c: char) -> Self {
        Self::from(ErrorKind::UnexpectedChar(c))
    }

    pub fn invalid_escape(c: char) -> Self {
        Self::from(ErrorKind::InvalidEscape(c))
    }

    pub fn unknown_constant(name: String) -> Self {
        Self::from(ErrorKind::UnknownConstant(name))
    }

    pub fn unexpected(thing: impl Into<Thing>) -> Self {
        Self::from(ErrorKind::Unexpected(thing.into()))
    }

    pub fn unclosed_delimiter(c: char) -> Self {
        Self::from(ErrorKind::UnclosedDelimiter(c))
    }

    pub fn unexpected_eof() -> Self {
        Self::from(ErrorKind::UnexpectedEof)
    }

    pub fn at(mut self, region: impl Into<SrcRegion>) -> Self {
        self.region = region.into();
        self
    }

    pub fn while_parsing(mut self, thing: impl Into<Thing>) -> Self {
        self.while_parsing.push(thing.into());
        self
    }

    pub fn hint(mut self, hint: &'static str) -> Self {
        self.hint = Some(hint);
        self
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn region(&self) -> SrcRegion {
        self.region
    }

    /// Whether more input could turn this error into a successful read.
    /// The REPL uses this to keep reading lines until the parens balance.
    pub fn is_incomplete(&self) -> bool {
        match self.kind {
            ErrorKind::UnclosedDelimiter(_) | ErrorKind::UnexpectedEof => true,
            _ => false,
        }
    }

    /// Of two errors, keep the one that occurred further into the source.
    pub fn max(self, other: Self) -> Self {
        if self.region.later_than(other.region) {
            self
        } else {
            other
        }
    }

    /// Render the error with a line and column taken from `code`.
    pub fn describe(&self, code: &str) -> String {
        let mut msg = self.to_string();
        if let Some(((line, col), _)) = self.region.in_context(code) {
            msg += &format!(" (line {}, column {})", line + 1, col + 1);
        }
        msg
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(thing) = self.while_parsing.last() {
            write!(f, " while parsing {}", thing)?;
        }
        if let Some(hint) = self.hint {
            write!(f, " ({})", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            region: SrcRegion::none(),
            while_parsing: Vec::new(),
            hint: None,
        }
    }
}
