use crate::lexer::{self, RawKind};

/// Lexical category of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Keyword,
    Identifier,
    Constant,
    Str,
    Operator,
    Special,
    Comment,
    Other,
}

/// One token of C source plus the exact whitespace that followed it.
///
/// Tokens are immutable value objects: after crossover the same token may
/// sit in several individuals' streams, so an edit must never write through
/// a shared token. All edit paths build a fresh token (see [`Token::with_value`])
/// and replace it at its index in the owning stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    value: String,
    kind: TokenKind,
    line: usize,
    column: usize,
    end_line: usize,
    end_column: usize,
    trailing_ws: String,
}

impl Token {
    /// A token fabricated by a mutation. It has no source position, which
    /// keeps it out of line-based slicing.
    pub fn synthetic(value: impl Into<String>) -> Self {
        let value = value.into();
        let end_column = value.len() + 1;
        Self {
            value,
            kind: TokenKind::Other,
            line: 0,
            column: 0,
            end_line: 0,
            end_column,
            trailing_ws: String::new(),
        }
    }

    /// Clone with a different text. Position and category are kept so the
    /// replacement still participates in line slicing and category filters.
    pub fn with_value(&self, value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..self.clone()
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// 1-indexed line the token starts on (0 for synthetic tokens).
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn end_line(&self) -> usize {
        self.end_line
    }

    pub fn end_column(&self) -> usize {
        self.end_column
    }

    pub fn trailing_ws(&self) -> &str {
        &self.trailing_ws
    }
}

/// Byte offset of each line start, so spans can be mapped to line/column.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let mut starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                starts.push(i + 1);
            }
        }
        Self { starts }
    }

    /// 1-indexed (line, column) of a byte offset.
    fn position(&self, offset: usize) -> (usize, usize) {
        let line = match self.starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        (line + 1, offset - self.starts[line] + 1)
    }
}

fn classify(kind: Option<RawKind>, text: &str) -> TokenKind {
    match kind {
        Some(RawKind::Word) => {
            if lexer::is_c_keyword(text) {
                TokenKind::Keyword
            } else {
                TokenKind::Identifier
            }
        }
        Some(RawKind::Constant) => TokenKind::Constant,
        Some(RawKind::Str) => TokenKind::Str,
        Some(RawKind::Operator) => TokenKind::Operator,
        Some(RawKind::Special) => TokenKind::Special,
        Some(RawKind::Comment) => TokenKind::Comment,
        None => TokenKind::Other,
    }
}

/// Tokenize source text into a stream that renders back to it exactly.
///
/// The whitespace between one token's end and the next token's start is
/// attached to the earlier token verbatim. Source that begins with
/// whitespace gets an empty leading token to carry it, so the round-trip
/// law holds for any input.
pub fn parse(text: &str) -> Vec<Token> {
    let index = LineIndex::new(text);
    let raw = lexer::lex(text);
    let mut tokens = Vec::with_capacity(raw.len() + 1);

    // Leading whitespace (or an all-whitespace file) has no token to hang
    // off; give it an empty carrier token so the round-trip law holds.
    let leading = raw.first().map_or(text.len(), |t| t.start);
    if leading > 0 {
        tokens.push(Token {
            value: String::new(),
            kind: TokenKind::Other,
            line: 1,
            column: 1,
            end_line: 1,
            end_column: 1,
            trailing_ws: text[..leading].to_string(),
        });
    }

    for (i, tk) in raw.iter().enumerate() {
        let next_start = raw.get(i + 1).map_or(text.len(), |n| n.start);
        let (line, column) = index.position(tk.start);
        let (end_line, end_column) = index.position(tk.end);
        tokens.push(Token {
            value: text[tk.start..tk.end].to_string(),
            kind: classify(tk.kind, &text[tk.start..tk.end]),
            line,
            column,
            end_line,
            end_column,
            trailing_ws: text[tk.end..next_start].to_string(),
        });
    }
    tokens
}

/// Concatenate every token's text and trailing whitespace.
/// Exact inverse of [`parse`] for an unmutated stream.
pub fn render(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        out.push_str(&token.value);
        out.push_str(&token.trailing_ws);
    }
    out
}

/// The maximal contiguous run of tokens starting on a line in
/// `first..=last`, with the run's index bounds in the stream.
///
/// A token starting before `first` is excluded, one starting at or before
/// `last` extends the run, and scanning stops at the first token past
/// `last`. Returns `(&[], 0, 0)` when no token qualifies.
pub fn slice_by_lines(tokens: &[Token], first: usize, last: usize) -> (&[Token], usize, usize) {
    let mut i_first = 0;
    let mut i_last = 0;
    for (i, token) in tokens.iter().enumerate() {
        if token.line() < first {
            i_first = i + 1;
        } else if token.line() <= last {
            i_last = i + 1;
        } else {
            break;
        }
    }
    if i_last <= i_first {
        return (&[], 0, 0);
    }
    (&tokens[i_first..i_last], i_first, i_last)
}
