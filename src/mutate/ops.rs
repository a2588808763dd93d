//! The mutation strategies. Each one makes a single structural edit at a
//! random position and returns the edited stream; a strategy that finds no
//! eligible token returns its input unchanged and the driver retries.

use super::MutatorSet;
use crate::error::Result;
use crate::token::{Token, TokenKind};
use rand::Rng;

/// Words worth splicing in or swapping to. Not all are strictly C keywords
/// (`true`/`false`), and not every keyword is here; this is the vocabulary
/// that tends to matter for codegen.
pub const KEYWORD_VOCAB: &[&str] = &[
    "break", "case", "char", "const", "default", "do", "double", "else",
    "enum", "extern", "false", "float", "goto", "if", "inline", "int",
    "long", "register", "return", "short", "signed", "static", "struct",
    "switch", "true", "union", "unsigned", "void", "volatile", "while",
];

/// Replacement operators, picked without regard to arity or context.
pub const OPERATOR_VOCAB: &[&str] = &[
    "+", "-", "*", "/", "<<", ">>", "&", "|", "^", "%", "++", "--", "=",
    "==", "!=", ">", "<", ">=", "<=", "->", ".", ",",
];

/// Picks per strategy invocation when hunting for a parsable numeric token.
const NUMBER_RETRY_LIMIT: usize = 1000;

/// The closed set of mutation strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    AddCast,
    AddKeyword,
    AddString,
    RenameIdentifier,
    ChangeKeyword,
    ReformatNumber,
    ChangeOperator,
    DeleteToken,
    SwapTokens,
    SwapLines,
}

pub const MUTATIONS: [Mutation; 10] = [
    Mutation::AddCast,
    Mutation::AddKeyword,
    Mutation::AddString,
    Mutation::RenameIdentifier,
    Mutation::ChangeKeyword,
    Mutation::ReformatNumber,
    Mutation::ChangeOperator,
    Mutation::DeleteToken,
    Mutation::SwapTokens,
    Mutation::SwapLines,
];

impl Mutation {
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        MUTATIONS[rng.gen_range(0..MUTATIONS.len())]
    }

    pub fn apply<R: Rng>(
        self,
        code: Vec<Token>,
        set: &MutatorSet,
        rng: &mut R,
    ) -> Result<Vec<Token>> {
        match self {
            Mutation::AddCast => add_cast(code, set, rng),
            Mutation::AddKeyword => Ok(add_keyword(code, rng)),
            Mutation::AddString => Ok(add_string(code, rng)),
            Mutation::RenameIdentifier => Ok(rename_identifier(code, set, rng)),
            Mutation::ChangeKeyword => Ok(change_keyword(code, set, rng)),
            Mutation::ReformatNumber => Ok(reformat_number(code, set, rng)),
            Mutation::ChangeOperator => Ok(change_operator(code, set, rng)),
            Mutation::DeleteToken => Ok(delete_token(code, rng)),
            Mutation::SwapTokens => Ok(swap_tokens(code, rng)),
            Mutation::SwapLines => Ok(swap_lines(code, rng)),
        }
    }
}

/// Splice `( identifier )` in front of a random token.
fn add_cast<R: Rng>(mut code: Vec<Token>, set: &MutatorSet, rng: &mut R) -> Result<Vec<Token>> {
    let pos = rng.gen_range(0..code.len());
    let name = set.random_identifier(None, rng)?.to_string();
    code.splice(
        pos..pos,
        [
            Token::synthetic("("),
            Token::synthetic(name),
            Token::synthetic(")"),
        ],
    );
    Ok(code)
}

fn add_keyword<R: Rng>(mut code: Vec<Token>, rng: &mut R) -> Vec<Token> {
    let pos = rng.gen_range(0..code.len());
    let word = KEYWORD_VOCAB[rng.gen_range(0..KEYWORD_VOCAB.len())];
    code.insert(pos, Token::synthetic(word));
    code
}

/// Insert a uniquely numbered dummy string statement on its own line.
fn add_string<R: Rng>(mut code: Vec<Token>, rng: &mut R) -> Vec<Token> {
    let pos = rng.gen_range(0..code.len());
    let n: u32 = rng.gen_range(0..=999_999_999);
    code.insert(pos, Token::synthetic(format!("\n\"Dummy string {}\";", n)));
    code
}

/// Swap a random identifier for a different name from the pool. No-op when
/// the stream has no identifier token or the pool offers no alternative.
fn rename_identifier<R: Rng>(mut code: Vec<Token>, set: &MutatorSet, rng: &mut R) -> Vec<Token> {
    let Some(idx) = set.random_token_index(&code, rng, |t| t.kind() == TokenKind::Identifier)
    else {
        return code;
    };
    match set.random_identifier(Some(code[idx].value()), rng) {
        Ok(name) => {
            let replacement = code[idx].with_value(name);
            code[idx] = replacement;
            code
        }
        Err(_) => code,
    }
}

fn change_keyword<R: Rng>(mut code: Vec<Token>, set: &MutatorSet, rng: &mut R) -> Vec<Token> {
    let Some(idx) = set.random_token_index(&code, rng, |t| t.kind() == TokenKind::Keyword)
    else {
        return code;
    };
    let word = KEYWORD_VOCAB[rng.gen_range(0..KEYWORD_VOCAB.len())];
    code[idx] = code[idx].with_value(word);
    code
}

/// The numeric value a constant token spells, when it spells one.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Number {
    Int(i64),
    Float(f64),
}

fn parse_number(text: &str) -> Option<Number> {
    let int = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2).ok()
    } else {
        text.parse::<i64>().ok()
    };
    if let Some(v) = int {
        return Some(Number::Int(v));
    }
    text.parse::<f64>().ok().map(Number::Float)
}

fn format_int<R: Rng>(v: i64, rng: &mut R) -> String {
    match rng.gen_range(0..9) {
        0 => format!("{}", v),
        1 => format!("{}u", v),
        2 => format!("0x{:x}", v),
        3 => format!("(int){}", v),
        4 => format!("(uint){}", v),
        5 => format!("(short){}", v),
        6 => format!("(ushort){}", v),
        7 => format!("(char){}", v),
        _ => format!("(uchar){}", v),
    }
}

fn format_float<R: Rng>(v: f64, rng: &mut R) -> String {
    match rng.gen_range(0..6) {
        0 => format!("{:.6}", v),
        1 => format!("{:.1}", v),
        2 => format!("{:.6}f", v),
        3 => format!("{:.1}f", v),
        4 => format!("(float){:.6}", v),
        _ => format!("(double){:.6}", v),
    }
}

/// Rewrite a random numeric constant in a different textual form without
/// changing its value. Zero and unparsable constants are left alone.
fn reformat_number<R: Rng>(mut code: Vec<Token>, set: &MutatorSet, rng: &mut R) -> Vec<Token> {
    let mut found = None;
    for _ in 0..NUMBER_RETRY_LIMIT {
        let Some(idx) = set.random_token_index(&code, rng, |t| t.kind() == TokenKind::Constant)
        else {
            return code;
        };
        if let Some(value) = parse_number(code[idx].value()) {
            found = Some((idx, value));
            break;
        }
    }
    let Some((idx, value)) = found else {
        return code;
    };
    let text = match value {
        Number::Int(0) => return code,
        Number::Float(v) if v == 0.0 => return code,
        Number::Int(v) => format_int(v, rng),
        Number::Float(v) => format_float(v, rng),
    };
    code[idx] = code[idx].with_value(text);
    code
}

fn change_operator<R: Rng>(mut code: Vec<Token>, set: &MutatorSet, rng: &mut R) -> Vec<Token> {
    let Some(idx) = set.random_token_index(&code, rng, |t| t.kind() == TokenKind::Operator)
    else {
        return code;
    };
    let op = OPERATOR_VOCAB[rng.gen_range(0..OPERATOR_VOCAB.len())];
    code[idx] = code[idx].with_value(op);
    code
}

fn delete_token<R: Rng>(mut code: Vec<Token>, rng: &mut R) -> Vec<Token> {
    let pos = rng.gen_range(0..code.len());
    code.remove(pos);
    code
}

fn swap_tokens<R: Rng>(mut code: Vec<Token>, rng: &mut R) -> Vec<Token> {
    if code.len() > 2 {
        let pos = rng.gen_range(0..code.len() - 1);
        code.swap(pos, pos + 1);
    }
    code
}

/// Swap a random source line with the one below it, moving whole token runs.
fn swap_lines<R: Rng>(code: Vec<Token>, rng: &mut R) -> Vec<Token> {
    if code.len() <= 2 {
        return code;
    }
    let pos = rng.gen_range(0..code.len() - 1);
    let line = code[pos].line();
    let (run, i_first, i_last) = crate::token::slice_by_lines(&code, line, line + 1);
    if run.is_empty() {
        return code;
    }
    let (first_line, second_line): (Vec<Token>, Vec<Token>) =
        run.iter().cloned().partition(|t| t.line() == line);

    let mut result = Vec::with_capacity(code.len());
    result.extend_from_slice(&code[..i_first]);
    result.extend(second_line);
    result.extend(first_line);
    result.extend_from_slice(&code[i_last..]);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{parse, render};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn values(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.value()).collect()
    }

    #[test]
    fn add_cast_inserts_paren_identifier_paren() {
        // Scenario: 5 tokens in, 8 tokens out, with the original 5 intact
        // in order around one contiguous ( name ) insertion.
        let tokens = parse("foo = bar + 1;");
        assert_eq!(tokens.len(), 6);
        let five = tokens[..5].to_vec();
        let set = MutatorSet::new(&tokens);
        let mut rng = StdRng::seed_from_u64(11);
        let out = add_cast(five.clone(), &set, &mut rng).unwrap();
        assert_eq!(out.len(), 8);

        let pos = out
            .iter()
            .position(|t| t.value() == "(" && t.line() == 0)
            .unwrap();
        assert!(["foo", "bar"].contains(&out[pos + 1].value()));
        assert_eq!(out[pos + 2].value(), ")");

        let mut rest: Vec<&Token> = out[..pos].iter().collect();
        rest.extend(out[pos + 3..].iter());
        let rest_values: Vec<&str> = rest.iter().map(|t| t.value()).collect();
        assert_eq!(rest_values, values(&five));
    }

    #[test]
    fn add_keyword_grows_by_one() {
        let tokens = parse("a = b;");
        let mut rng = StdRng::seed_from_u64(4);
        let out = add_keyword(tokens.clone(), &mut rng);
        assert_eq!(out.len(), tokens.len() + 1);
        let added = out.iter().find(|t| t.line() == 0).unwrap();
        assert!(KEYWORD_VOCAB.contains(&added.value()));
    }

    #[test]
    fn add_string_embeds_dummy_marker() {
        let tokens = parse("a = b;");
        let mut rng = StdRng::seed_from_u64(4);
        let out = add_string(tokens, &mut rng);
        let text = render(&out);
        assert!(text.contains("\n\"Dummy string "));
    }

    #[test]
    fn rename_with_two_name_pool_is_deterministic() {
        // Scenario: pool {foo, bar}, token "foo" must become "bar".
        let tokens = parse("foo bar");
        let set = MutatorSet::new(&tokens);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let out = rename_identifier(tokens.clone(), &set, &mut rng);
            let renamed: Vec<&str> = out.iter().map(|t| t.value()).collect();
            assert!(renamed == ["bar", "bar"] || renamed == ["foo", "foo"]);
        }
    }

    #[test]
    fn rename_with_single_name_pool_is_noop() {
        let tokens = parse("foo + foo");
        let set = MutatorSet::new(&tokens);
        let mut rng = StdRng::seed_from_u64(9);
        let out = rename_identifier(tokens.clone(), &set, &mut rng);
        assert_eq!(out, tokens);
    }

    #[test]
    fn rename_without_identifiers_is_noop() {
        let tokens = parse("1 + 2");
        let set = MutatorSet::new(&tokens);
        let mut rng = StdRng::seed_from_u64(9);
        let out = rename_identifier(tokens.clone(), &set, &mut rng);
        assert_eq!(out, tokens);
    }

    #[test]
    fn change_keyword_stays_in_vocabulary() {
        let tokens = parse("return x;");
        let set = MutatorSet::new(&tokens);
        let mut rng = StdRng::seed_from_u64(2);
        let out = change_keyword(tokens, &set, &mut rng);
        assert!(KEYWORD_VOCAB.contains(&out[0].value()));
        assert_eq!(out[0].kind(), TokenKind::Keyword);
    }

    #[test]
    fn reformat_preserves_integer_value() {
        let tokens = parse("x = 255;");
        let set = MutatorSet::new(&tokens);
        for seed in 0..40 {
            let mut rng = StdRng::seed_from_u64(seed);
            let out = reformat_number(tokens.clone(), &set, &mut rng);
            let text = out[2].value();
            let digits = text.trim_start_matches(|c: char| !c.is_ascii_digit());
            let value = parse_number(digits.trim_end_matches('u')).unwrap();
            assert_eq!(value, Number::Int(255), "seed {}: {}", seed, text);
        }
    }

    #[test]
    fn reformat_skips_zero() {
        let tokens = parse("x = 0;");
        let set = MutatorSet::new(&tokens);
        let mut rng = StdRng::seed_from_u64(5);
        let out = reformat_number(tokens.clone(), &set, &mut rng);
        assert_eq!(out, tokens);
    }

    #[test]
    fn reformat_parses_hex() {
        assert_eq!(parse_number("0x1f"), Some(Number::Int(31)));
        assert_eq!(parse_number("2.5"), Some(Number::Float(2.5)));
        assert_eq!(parse_number("'a'"), None);
    }

    #[test]
    fn change_operator_stays_in_vocabulary() {
        let tokens = parse("a + b");
        let set = MutatorSet::new(&tokens);
        let mut rng = StdRng::seed_from_u64(6);
        let out = change_operator(tokens, &set, &mut rng);
        assert!(OPERATOR_VOCAB.contains(&out[1].value()));
    }

    #[test]
    fn delete_token_shrinks_by_one() {
        let tokens = parse("a b c d");
        let mut rng = StdRng::seed_from_u64(1);
        let out = delete_token(tokens.clone(), &mut rng);
        assert_eq!(out.len(), tokens.len() - 1);
    }

    #[test]
    fn swap_tokens_is_adjacent() {
        let tokens = parse("a b c");
        let mut rng = StdRng::seed_from_u64(0);
        let out = swap_tokens(tokens.clone(), &mut rng);
        assert_eq!(out.len(), tokens.len());
        let diff: Vec<usize> = (0..tokens.len()).filter(|&i| out[i] != tokens[i]).collect();
        assert_eq!(diff.len(), 2);
        assert_eq!(diff[1], diff[0] + 1);
        assert_eq!(out[diff[0]], tokens[diff[1]]);
        assert_eq!(out[diff[1]], tokens[diff[0]]);
    }

    #[test]
    fn swap_tokens_short_stream_is_noop() {
        let tokens = parse("a b");
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(swap_tokens(tokens.clone(), &mut rng), tokens);
    }

    #[test]
    fn swap_lines_moves_whole_runs() {
        // Scenario: line 1 holds 2 tokens, line 2 holds 3; after a swap at
        // an index on line 1, line 2's tokens come first, length unchanged.
        let tokens = parse("a b\nc d e\n");
        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let out = swap_lines(tokens.clone(), &mut rng);
            assert_eq!(out.len(), tokens.len());
            let vals = values(&out);
            assert!(
                vals == ["c", "d", "e", "a", "b"] || vals == ["a", "b", "c", "d", "e"],
                "seed {}: {:?}",
                seed,
                vals
            );
        }
    }

    #[test]
    fn swap_lines_at_line_one_index() {
        let tokens = parse("a b\nc d e\n");
        // Find a seed whose random index lands on line 1 and verify the
        // exact swapped arrangement.
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let pos_probe = {
                let mut probe = StdRng::seed_from_u64(seed);
                probe.gen_range(0..tokens.len() - 1)
            };
            if tokens[pos_probe].line() != 1 {
                continue;
            }
            let out = swap_lines(tokens.clone(), &mut rng);
            assert_eq!(values(&out), ["c", "d", "e", "a", "b"]);
            return;
        }
        panic!("no seed landed on line 1");
    }
}
