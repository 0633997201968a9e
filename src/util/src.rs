use std::fmt;

/// A character offset into a piece of source text.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SrcLoc(usize);

impl SrcLoc {
    pub fn start() -> Self {
        Self(0)
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn later_than(self, other: Self) -> bool {
        self.0 > other.0
    }

    /// Zero-based (line, column) of this location within `code`.
    pub fn in_context(&self, code: &str) -> (usize, usize) {
        let mut line = 0;
        let mut col = 0;
        for c in code.chars().take(self.0) {
            if c == '\n' {
                line += 1;
                col = 0;
            } else {
                col += 1;
            }
        }
        (line, col)
    }
}

impl fmt::Debug for SrcLoc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl From<usize> for SrcLoc {
    fn from(pos: usize) -> Self {
        Self(pos)
    }
}

#[derive(Copy, Clone, PartialEq)]
pub enum SrcRegion {
    None,
    Range(SrcLoc, SrcLoc),
}

impl SrcRegion {
    pub fn none() -> Self {
        SrcRegion::None
    }

    pub fn single(loc: SrcLoc) -> Self {
        SrcRegion::Range(loc, loc.next())
    }

    pub fn range(from: SrcLoc, until: SrcLoc) -> SrcRegion {
        if from < until {
            SrcRegion::Range(from, until)
        } else {
            SrcRegion::single(from)
        }
    }

    pub fn later_than(self, other: Self) -> bool {
        match (self, other) {
            (SrcRegion::Range(_, until_a), SrcRegion::Range(_, until_b)) =>
                until_a.later_than(until_b),
            _ => false,
        }
    }

    pub fn in_context(&self, code: &str) -> Option<((usize, usize), (usize, usize))> {
        match self {
            SrcRegion::Range(from, until) => Some((from.in_context(code), until.in_context(code))),
            SrcRegion::None => None,
        }
    }
}

impl fmt::Debug for SrcRegion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SrcRegion::None => write!(f, "<none>"),
            SrcRegion::Range(from, to) => write!(f, "{:?}:{:?}", from, to),
        }
    }
}

impl From<usize> for SrcRegion {
    fn from(pos: usize) -> Self {
        SrcRegion::single(SrcLoc::from(pos))
    }
}

impl From<(usize, usize)> for SrcRegion {
    fn from((from, to): (usize, usize)) -> Self {
        SrcRegion::range(SrcLoc::from(from), SrcLoc::from(to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_in_context() {
        let code = "(define x\n  42)";
        assert_eq!(SrcLoc::from(0).in_context(code), (0, 0));
        assert_eq!(SrcLoc::from(12).in_context(code), (1, 2));
    }

    #[test]
    fn later_regions_end_further_in() {
        let a = SrcRegion::from((2, 4));
        let b = SrcRegion::from((7, 9));
        assert!(b.later_than(a));
        assert!(!a.later_than(b));
        assert!(!SrcRegion::none().later_than(a));
        assert!(SrcRegion::from((5, 5)) == SrcRegion::from(5));
    }
}
