//! The generational loop: seed a population from the baseline source,
//! score, select, and breed until the process is stopped from outside.

use crate::config::SearchConfig;
use crate::error::{GendecError, Result};
use crate::mutate::{MutatorSet, MIN_STREAM_LEN, MUTATE_RETRY_LIMIT};
use crate::token::{self, Token};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Pairing attempts allowed per reproduction, times the selected pool size.
pub const PAIRING_BUDGET_FACTOR: usize = 20;

/// Stop pairing once the next population reaches this share of the target
/// size; the rest is filled with fresh mutants of the baseline.
pub const REPRODUCE_FILL_RATIO: f64 = 0.8;

/// Where the best-scoring source seen so far is persisted.
pub const BEST_PATH: &str = "best.c";

/// One candidate: a token stream plus a run-unique id.
///
/// The id is the identity used for score caching. Individuals carried
/// forward between generations keep their id (and share the stream via
/// `Arc`), so elites and the baseline are recognized as already scored.
/// Two individuals with identical token content but different lineages get
/// different ids and are scored separately on purpose.
#[derive(Debug, Clone)]
pub struct Individual {
    id: u64,
    tokens: Arc<Vec<Token>>,
}

impl Individual {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

/// Scores a candidate stream. Lower is better: 0 is a byte-exact object
/// match, `f64::INFINITY` a failed compile. Errors are run-fatal.
pub trait FitnessEval {
    /// Called once on the baseline before the search starts, so toolchain
    /// misconfiguration surfaces with full compiler output instead of as
    /// an infinitely-scored first generation.
    fn check_baseline(&mut self, tokens: &[Token]) -> Result<()> {
        let _ = tokens;
        Ok(())
    }

    fn fitness(&mut self, tokens: &[Token]) -> Result<f64>;
}

/// Single-point crossover: parent1's prefix up to a random cut in
/// `1..=len(parent1)`, then parent2's suffix from the same cut.
pub fn crossover<R: Rng>(parent1: &[Token], parent2: &[Token], rng: &mut R) -> Vec<Token> {
    let cut = rng.gen_range(1..=parent1.len());
    let mut child = parent1[..cut].to_vec();
    if cut < parent2.len() {
        child.extend_from_slice(&parent2[cut..]);
    }
    child
}

pub struct SearchEngine<E> {
    config: SearchConfig,
    eval: E,
    mutators: MutatorSet,
    rng: StdRng,
    next_id: u64,
    baseline: Individual,
    best: Individual,
    best_score: f64,
    initial_score: f64,
    generation: u64,
    best_path: PathBuf,
}

impl<E: FitnessEval> SearchEngine<E> {
    pub fn new(config: SearchConfig, baseline_tokens: Vec<Token>, eval: E) -> Result<Self> {
        config.validate()?;
        if baseline_tokens.len() < MIN_STREAM_LEN {
            return Err(GendecError::Configuration(
                "source tokenizes to fewer than 2 tokens".to_string(),
            ));
        }
        let (first, last) = config.line_range;
        let (window, _, _) = token::slice_by_lines(&baseline_tokens, first, last);
        if window.is_empty() {
            return Err(GendecError::Configuration(format!(
                "line range {},{} selects no tokens",
                first, last
            )));
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mutators = MutatorSet::new(&baseline_tokens);
        let baseline = Individual {
            id: 0,
            tokens: Arc::new(baseline_tokens),
        };
        Ok(Self {
            config,
            eval,
            mutators,
            rng,
            next_id: 1,
            best: baseline.clone(),
            baseline,
            best_score: f64::INFINITY,
            initial_score: f64::INFINITY,
            generation: 0,
            best_path: PathBuf::from(BEST_PATH),
        })
    }

    /// Override where the best-so-far source is persisted.
    pub fn set_best_path(&mut self, path: PathBuf) {
        self.best_path = path;
    }

    pub fn evaluator(&self) -> &E {
        &self.eval
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn baseline(&self) -> &Individual {
        &self.baseline
    }

    pub fn best(&self) -> (&Individual, f64) {
        (&self.best, self.best_score)
    }

    pub fn initial_score(&self) -> f64 {
        self.initial_score
    }

    fn new_individual(&mut self, tokens: Vec<Token>) -> Individual {
        let id = self.next_id;
        self.next_id += 1;
        Individual {
            id,
            tokens: Arc::new(tokens),
        }
    }

    /// Mutate `tokens` inside the configured line window with a round count
    /// drawn from `1..=mutation_rate`. `None` means the window was empty or
    /// the mutation pass failed; both leave the caller's slot unfilled.
    fn mutate_windowed(&mut self, tokens: &[Token]) -> Option<Vec<Token>> {
        let (first, last) = self.config.line_range;
        let (window, i_first, i_last) = token::slice_by_lines(tokens, first, last);
        if window.is_empty() {
            return None;
        }
        let rounds = self.rng.gen_range(1..=self.config.mutation_rate);
        match self.mutators.mutate(window, rounds, &mut self.rng) {
            Ok(mutated) => {
                let mut out =
                    Vec::with_capacity(tokens.len() - window.len() + mutated.len());
                out.extend_from_slice(&tokens[..i_first]);
                out.extend(mutated);
                out.extend_from_slice(&tokens[i_last..]);
                Some(out)
            }
            Err(err) => {
                log::debug!("mutation pass failed: {}", err);
                None
            }
        }
    }

    /// Verify and score the baseline, then breed the initial population
    /// from it. Fatal when the baseline does not compile or score.
    pub fn seed_population(&mut self) -> Result<Vec<Individual>> {
        let baseline = self.baseline.clone();
        self.eval.check_baseline(baseline.tokens())?;
        self.initial_score = self.eval.fitness(baseline.tokens())?;
        if !self.initial_score.is_finite() {
            return Err(GendecError::ScoreTool(
                "initial score is not finite".to_string(),
            ));
        }
        self.best_score = self.initial_score;
        log::info!("original score: {:.0}", self.initial_score);

        let mut population = vec![baseline.clone()];
        let mut failures = 0usize;
        while population.len() < self.config.population_size {
            match self.mutate_windowed(baseline.tokens()) {
                Some(tokens) => {
                    failures = 0;
                    let child = self.new_individual(tokens);
                    population.push(child);
                }
                None => {
                    failures += 1;
                    if failures > MUTATE_RETRY_LIMIT {
                        return Err(GendecError::Mutation(
                            "could not generate initial population".to_string(),
                        ));
                    }
                }
            }
        }
        Ok(population)
    }

    /// Score every individual not already in this generation's cache.
    /// Individuals sharing an id reuse the cached score.
    pub fn evaluate(&mut self, population: &[Individual]) -> Result<HashMap<u64, f64>> {
        let mut scores = HashMap::new();
        for member in population {
            if scores.contains_key(&member.id) {
                log::debug!("individual {} already scored", member.id);
                continue;
            }
            let score = self.eval.fitness(member.tokens())?;
            scores.insert(member.id, score);
        }
        Ok(scores)
    }

    /// Keep the best third, scores ascending, ties in original order.
    pub fn select(
        &self,
        mut population: Vec<Individual>,
        scores: &HashMap<u64, f64>,
    ) -> Vec<Individual> {
        population.sort_by(|a, b| {
            let sa = scores.get(&a.id).copied().unwrap_or(f64::INFINITY);
            let sb = scores.get(&b.id).copied().unwrap_or(f64::INFINITY);
            sa.partial_cmp(&sb).unwrap_or(std::cmp::Ordering::Equal)
        });
        population.truncate(population.len() / 3);
        population
    }

    /// Build the next generation: the untouched baseline and the best-known
    /// individual always survive, then parents are paired cyclically from
    /// the selected pool, each pair carried forward plus one attempted
    /// crossover-and-mutate child, until the pairing budget runs out or the
    /// population reaches the fill ratio. Remaining slots are fresh mutants
    /// of the baseline.
    pub fn reproduce(&mut self, selected: &[Individual]) -> Result<Vec<Individual>> {
        let mut population = vec![self.baseline.clone(), self.best.clone()];
        let fill_limit = self.config.population_size as f64 * REPRODUCE_FILL_RATIO;

        let mut budget = selected.len() * PAIRING_BUDGET_FACTOR;
        let mut i = 0usize;
        while budget > 0 && i + 1 < selected.len() && (population.len() as f64) < fill_limit {
            let parent1 = selected[i % selected.len()].clone();
            let parent2 = selected[(i + 1) % selected.len()].clone();
            let child_tokens = crossover(parent1.tokens(), parent2.tokens(), &mut self.rng);
            population.push(parent1);
            population.push(parent2);
            if child_tokens.len() >= MIN_STREAM_LEN {
                if let Some(mutated) = self.mutate_windowed(&child_tokens) {
                    let child = self.new_individual(mutated);
                    population.push(child);
                    i += 2;
                }
            }
            budget -= 1;
        }

        let baseline = self.baseline.clone();
        let mut failures = 0usize;
        while population.len() < self.config.population_size {
            match self.mutate_windowed(baseline.tokens()) {
                Some(tokens) => {
                    failures = 0;
                    let child = self.new_individual(tokens);
                    population.push(child);
                }
                None => {
                    failures += 1;
                    if failures > MUTATE_RETRY_LIMIT {
                        break;
                    }
                }
            }
        }
        Ok(population)
    }

    /// One full generation: evaluate, track the best, select, reproduce.
    /// Returns the next population and the generation's best score.
    pub fn step(&mut self, population: Vec<Individual>) -> Result<(Vec<Individual>, f64)> {
        self.generation += 1;
        let scores = self.evaluate(&population)?;
        let selected = self.select(population, &scores);

        let gen_best = selected
            .first()
            .map(|ind| scores.get(&ind.id).copied().unwrap_or(f64::INFINITY))
            .unwrap_or(f64::INFINITY);
        if gen_best < self.best_score {
            self.best_score = gen_best;
            self.best = selected[0].clone();
            std::fs::write(&self.best_path, token::render(self.best.tokens()))?;
        }
        log::info!(
            "gen {:5} score {:7.0} ({:+6.0}) best {:7.0} ({:+6.0})",
            self.generation,
            gen_best,
            gen_best - self.initial_score,
            self.best_score,
            self.best_score - self.initial_score
        );

        let next = self.reproduce(&selected)?;
        Ok((next, gen_best))
    }

    /// Run until `max_generations` (when configured) or until the process
    /// is stopped externally.
    pub fn run(&mut self) -> Result<()> {
        let mut population = self.seed_population()?;
        loop {
            if let Some(limit) = self.config.max_generations {
                if self.generation >= limit {
                    return Ok(());
                }
            }
            let (next, _) = self.step(population)?;
            population = next;
        }
    }
}
