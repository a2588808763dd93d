use gendec::config::{Config, SearchConfig, ToolchainConfig};
use gendec::error::Result;
use gendec::search::{FitnessEval, SearchEngine};
use gendec::token::{self, parse, Token};
use gendec::toolchain::Toolchain;
use std::collections::HashMap;

const SOURCE: &str = "int add(int a, int b) {\n    int c = a + b;\n    return c;\n}\n";

/// Scores by character distance between the rendered candidate and a
/// target text; zero when identical.
struct TextDistance {
    target: String,
    calls: usize,
}

impl TextDistance {
    fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            calls: 0,
        }
    }
}

impl FitnessEval for TextDistance {
    fn fitness(&mut self, tokens: &[Token]) -> Result<f64> {
        self.calls += 1;
        let text = token::render(tokens);
        let longer = text.len().max(self.target.len());
        let common = text
            .bytes()
            .zip(self.target.bytes())
            .filter(|(a, b)| a == b)
            .count();
        Ok((longer - common) as f64)
    }
}

fn search_config(population_size: usize, seed: u64) -> SearchConfig {
    SearchConfig {
        population_size,
        mutation_rate: 3,
        line_range: (1, 1_000_000),
        seed: Some(seed),
        max_generations: None,
    }
}

#[test]
fn seeded_population_has_target_size_and_baseline_first() {
    let eval = TextDistance::new(SOURCE);
    let mut engine = SearchEngine::new(search_config(16, 1), parse(SOURCE), eval).unwrap();
    let population = engine.seed_population().unwrap();
    assert_eq!(population.len(), 16);
    assert_eq!(population[0].id(), engine.baseline().id());
    assert_eq!(engine.initial_score(), 0.0);
}

#[test]
fn selection_keeps_at_most_a_third_and_only_best_scores() {
    let eval = TextDistance::new(SOURCE);
    let mut engine = SearchEngine::new(search_config(20, 5), parse(SOURCE), eval).unwrap();
    let population = engine.seed_population().unwrap();
    let scores = engine.evaluate(&population).unwrap();

    let all_scores: HashMap<u64, f64> = scores.clone();
    let selected = engine.select(population.clone(), &scores);
    assert!(selected.len() <= population.len() / 3);

    let kept: Vec<f64> = selected.iter().map(|i| all_scores[&i.id()]).collect();
    let kept_ids: Vec<u64> = selected.iter().map(|i| i.id()).collect();
    let dropped: Vec<f64> = population
        .iter()
        .filter(|i| !kept_ids.contains(&i.id()))
        .map(|i| all_scores[&i.id()])
        .collect();
    let max_kept = kept.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    for score in dropped {
        assert!(score >= max_kept);
    }
}

#[test]
fn baseline_survives_every_generation_with_its_score() {
    let eval = TextDistance::new(SOURCE);
    let mut engine = SearchEngine::new(search_config(12, 9), parse(SOURCE), eval).unwrap();
    let baseline_id = engine.baseline().id();

    let mut population = engine.seed_population().unwrap();
    for _ in 0..4 {
        let (next, _) = engine.step(population).unwrap();
        population = next;
        assert_eq!(population[0].id(), baseline_id);
        let scores = engine.evaluate(&population).unwrap();
        assert_eq!(scores[&baseline_id], engine.initial_score());
    }
}

#[test]
fn best_score_is_monotone_across_generations() {
    let dir = tempfile::tempdir().unwrap();
    let eval = TextDistance::new("int add(int a, int b) { return a + b; }\n");
    let mut engine = SearchEngine::new(search_config(14, 3), parse(SOURCE), eval).unwrap();
    engine.set_best_path(dir.path().join("best.c"));
    let mut population = engine.seed_population().unwrap();
    let mut previous_best = f64::INFINITY;
    for _ in 0..4 {
        let (next, _) = engine.step(population).unwrap();
        population = next;
        let (_, best) = engine.best();
        assert!(best <= previous_best);
        assert!(best <= engine.initial_score());
        previous_best = best;
    }
}

#[test]
fn carried_forward_individuals_are_not_rescored() {
    let eval = TextDistance::new(SOURCE);
    let mut engine = SearchEngine::new(search_config(10, 2), parse(SOURCE), eval).unwrap();
    let population = engine.seed_population().unwrap();
    let mut tripled = population.clone();
    tripled.extend(population.iter().cloned());
    tripled.extend(population.iter().cloned());

    let before = engine.evaluator().calls;
    let scores = engine.evaluate(&tripled).unwrap();
    assert_eq!(scores.len(), population.len());
    assert_eq!(engine.evaluator().calls - before, population.len());
}

// Scenario: the baseline compiled and diffed against itself must score 0
// and be accepted. The "compiler" copies source to object; the "differ"
// prints the textual diff but always exits 0.
#[test]
fn baseline_against_itself_scores_zero_through_toolchain() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("main.c");
    let target_path = dir.path().join("target.o");
    std::fs::write(&source_path, SOURCE).unwrap();
    std::fs::write(&target_path, SOURCE).unwrap();

    let sh = |script: &str| {
        vec!["/bin/sh".to_string(), "-c".to_string(), script.to_string()]
    };
    let toolchain_config = ToolchainConfig {
        // Positional args after the script: -c -o <obj> <src>.
        compiler: sh("cp \"$3\" \"$2\""),
        cflags: vec![],
        // Positional args: diff -1 <target> -2 <candidate> -o -.
        differ: sh("diff \"$2\" \"$4\"; exit 0"),
    };
    let config = Config {
        search: search_config(6, 4),
        toolchain: toolchain_config,
    };

    let toolchain = Toolchain::new(
        config.toolchain.clone(),
        source_path.clone(),
        target_path.clone(),
    );
    let baseline = parse(SOURCE);
    let mut engine = SearchEngine::new(config.search, baseline, toolchain).unwrap();

    let population = engine.seed_population().unwrap();
    assert_eq!(engine.initial_score(), 0.0);
    assert_eq!(population.len(), 6);

    // Mutants that still "compile" get the size of their textual diff.
    let scores = engine.evaluate(&population).unwrap();
    assert_eq!(scores[&engine.baseline().id()], 0.0);
    for score in scores.values() {
        assert!(*score >= 0.0);
    }
}
