use logos::Logos;

/// Raw lexical category straight out of the lexer, before keyword
/// classification and whitespace attachment happen in `token`.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\x0c]+")]
pub enum RawKind {
    // Line comments run to end of line; block comments are matched whole,
    // so a comment always arrives as a single token spanning its full text.
    #[regex(r"//[^\n]*")]
    #[regex(r"/\*[^*]*\*+([^/*][^*]*\*+)*/")]
    Comment,

    #[regex(r#""([^"\\\n]|\\(.|\n))*""#)]
    Str,

    // Integer (decimal/hex with suffixes), then float forms.
    #[regex(r"0[xX][0-9a-fA-F]+[uUlL]*")]
    #[regex(r"[0-9]+[uUlL]*")]
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?[fFlL]?")]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?[fFlL]?")]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+[fFlL]?")]
    #[regex(r"'([^'\\\n]|\\.)*'")]
    Constant,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Word,

    #[token("<<=")]
    #[token(">>=")]
    #[token("->")]
    #[token("++")]
    #[token("--")]
    #[token("<<")]
    #[token(">>")]
    #[token("<=")]
    #[token(">=")]
    #[token("==")]
    #[token("!=")]
    #[token("&&")]
    #[token("||")]
    #[token("+=")]
    #[token("-=")]
    #[token("*=")]
    #[token("/=")]
    #[token("%=")]
    #[token("&=")]
    #[token("|=")]
    #[token("^=")]
    #[token("+")]
    #[token("-")]
    #[token("*")]
    #[token("/")]
    #[token("%")]
    #[token("<")]
    #[token(">")]
    #[token("=")]
    #[token("!")]
    #[token("&")]
    #[token("|")]
    #[token("^")]
    #[token("~")]
    #[token("?")]
    #[token(":")]
    #[token(".")]
    #[token(",")]
    Operator,

    #[token("(")]
    #[token(")")]
    #[token("[")]
    #[token("]")]
    #[token("{")]
    #[token("}")]
    #[token(";")]
    #[token("#")]
    Special,
}

/// One raw token: category plus its byte span in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawToken {
    pub kind: Option<RawKind>,
    pub start: usize,
    pub end: usize,
}

/// Actual C keywords, used to split `Word` into keyword vs identifier.
/// This is distinct from the mutation keyword vocabulary in `mutate::ops`.
pub const C_KEYWORDS: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do",
    "double", "else", "enum", "extern", "float", "for", "goto", "if",
    "inline", "int", "long", "register", "restrict", "return", "short",
    "signed", "sizeof", "static", "struct", "switch", "typedef", "union",
    "unsigned", "void", "volatile", "while",
];

pub fn is_c_keyword(word: &str) -> bool {
    C_KEYWORDS.contains(&word)
}

/// Lex the source into raw tokens. Bytes no rule matches become tokens
/// with `kind: None` rather than errors; the search has no use for lexer
/// diagnostics, it only needs full coverage of the text.
pub fn lex(source: &str) -> Vec<RawToken> {
    let mut tokens = Vec::new();
    let mut lexer = RawKind::lexer(source);
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(kind) => tokens.push(RawToken {
                kind: Some(kind),
                start: span.start,
                end: span.end,
            }),
            Err(()) => {
                // Merge runs of unmatched bytes into one token.
                match tokens.last_mut() {
                    Some(last) if last.kind.is_none() && last.end == span.start => {
                        last.end = span.end;
                    }
                    _ => tokens.push(RawToken {
                        kind: None,
                        start: span.start,
                        end: span.end,
                    }),
                }
            }
        }
    }
    tokens
}
