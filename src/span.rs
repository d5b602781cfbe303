//! Source locations carried by document AST nodes.

use std::fmt;

/// A reference to a line and column in an input source file.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SourcePosition {
    index: usize,
    line: usize,
    col: usize,
}

impl SourcePosition {
    #[doc(hidden)]
    pub fn new(index: usize, line: usize, col: usize) -> SourcePosition {
        assert!(index >= line + col);

        SourcePosition { index, line, col }
    }

    #[doc(hidden)]
    pub fn new_origin() -> SourcePosition {
        SourcePosition {
            index: 0,
            line: 0,
            col: 0,
        }
    }

    /// The index of this position in the input source.
    ///
    /// This is a zero-based index counting Unicode code points.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The line of this position in the input source, zero-based.
    pub fn line(&self) -> usize {
        self.line
    }

    /// The column of this position in the input source, zero-based.
    pub fn column(&self) -> usize {
        self.col
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// A "span" is a range of characters in the input source, starting at the
/// character pointed by the `start` field and ending just before the `end`
/// marker.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Span {
    /// Start position of the span.
    pub start: SourcePosition,

    /// End position of the span.
    ///
    /// This points to the first source position _after_ the span.
    pub end: SourcePosition,
}

impl Span {
    #[doc(hidden)]
    pub fn new(start: SourcePosition, end: SourcePosition) -> Span {
        Span { start, end }
    }

    #[doc(hidden)]
    pub fn zero_width(pos: SourcePosition) -> Span {
        Span::new(pos, pos)
    }

    #[doc(hidden)]
    pub fn unlocated() -> Span {
        Span::zero_width(SourcePosition::new_origin())
    }
}

/// Data structure used to wrap items with start and end markers in the input
/// source.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Spanning<T> {
    /// The wrapped item.
    pub item: T,

    /// The span.
    pub span: Span,
}

impl<T> Spanning<T> {
    #[doc(hidden)]
    pub fn new(span: Span, item: T) -> Spanning<T> {
        Spanning { item, span }
    }

    /// Wraps an `item` without any location information.
    ///
    /// Useful when constructing documents by hand, e.g. in tests.
    pub fn unlocated(item: T) -> Spanning<T> {
        Spanning::new(Span::unlocated(), item)
    }

    #[doc(hidden)]
    pub fn start(&self) -> &SourcePosition {
        &self.span.start
    }

    #[doc(hidden)]
    pub fn end(&self) -> &SourcePosition {
        &self.span.end
    }

    /// Modify the contents of the spanned item.
    pub fn map<O, F: FnOnce(T) -> O>(self, f: F) -> Spanning<O> {
        Spanning::new(self.span, f(self.item))
    }
}
