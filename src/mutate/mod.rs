//! Randomized structural edits over token streams.
//!
//! A [`MutatorSet`] is built once per baseline source and owns the pool of
//! identifier names seen there. The pool is deliberately never refreshed:
//! names introduced by mid-run renames do not become candidates.

pub mod ops;

use crate::error::{GendecError, Result};
use crate::token::{Token, TokenKind};
use ops::Mutation;
use rand::Rng;
use std::collections::BTreeSet;

/// Streams are never reduced below this length, so strategies can always
/// draw a random index from `0..len`.
pub const MIN_STREAM_LEN: usize = 2;

/// Attempts per mutation round before accepting a no-op result.
pub const MUTATE_RETRY_LIMIT: usize = 100;

pub struct MutatorSet {
    identifiers: Vec<String>,
}

impl MutatorSet {
    /// Collect the distinct identifier names of `baseline` as the rename
    /// and cast pool for the whole run.
    pub fn new(baseline: &[Token]) -> Self {
        let names: BTreeSet<&str> = baseline
            .iter()
            .filter(|t| t.kind() == TokenKind::Identifier)
            .map(|t| t.value())
            .collect();
        Self {
            identifiers: names.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    /// One random pool name, optionally excluding a current value.
    pub fn random_identifier<R: Rng>(
        &self,
        exclude: Option<&str>,
        rng: &mut R,
    ) -> Result<&str> {
        let eligible: Vec<&String> = self
            .identifiers
            .iter()
            .filter(|name| Some(name.as_str()) != exclude)
            .collect();
        if eligible.is_empty() {
            return Err(GendecError::Mutation(
                "no identifiers available".to_string(),
            ));
        }
        Ok(eligible[rng.gen_range(0..eligible.len())])
    }

    /// Apply `count` rounds of random mutation to a copy of `tokens`.
    ///
    /// Each round draws strategies until one changes the stream, up to
    /// [`MUTATE_RETRY_LIMIT`] attempts; after that the round's last result
    /// stands even if it is a no-op. A strategy result shorter than
    /// [`MIN_STREAM_LEN`] is discarded and the round retries from the
    /// pre-round stream.
    pub fn mutate<R: Rng>(
        &self,
        tokens: &[Token],
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<Token>> {
        let mut code = tokens.to_vec();
        for _ in 0..count {
            code = self.mutate_once(code, rng)?;
        }
        Ok(code)
    }

    fn mutate_once<R: Rng>(&self, mut code: Vec<Token>, rng: &mut R) -> Result<Vec<Token>> {
        for _ in 0..MUTATE_RETRY_LIMIT {
            let old = code.clone();
            let mutation = Mutation::random(rng);
            code = mutation.apply(code, self, rng)?;
            if code.len() < MIN_STREAM_LEN {
                code = old;
                continue;
            }
            if code != old {
                break;
            }
        }
        Ok(code)
    }

    /// One random token matching `filter`, as an index into `tokens`.
    fn random_token_index<R: Rng>(
        &self,
        tokens: &[Token],
        rng: &mut R,
        filter: impl Fn(&Token) -> bool,
    ) -> Option<usize> {
        let eligible: Vec<usize> = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| filter(t))
            .map(|(i, _)| i)
            .collect();
        if eligible.is_empty() {
            return None;
        }
        Some(eligible[rng.gen_range(0..eligible.len())])
    }
}
