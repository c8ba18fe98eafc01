//! Property-based tests for evostrat
//!
//! Uses proptest to verify invariants of fitness shaping and the ask-tell
//! protocol.

use evostrat::prelude::*;
use evostrat::strategy::Strategy as AskTell;
use proptest::prelude::*;

fn fitness_batch(max_len: usize) -> impl proptest::strategy::Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1e3..1e3f64, 2..max_len)
}

proptest! {
    // ==================== Fitness Shaping Properties ====================

    #[test]
    fn centered_rank_is_permutation_of_grid(fitness in fitness_batch(40)) {
        let shaped = centered_rank(&fitness);
        let n = fitness.len();
        let mut sorted = shaped.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());

        for (i, value) in sorted.iter().enumerate() {
            let expected = i as f64 / (n - 1) as f64 - 0.5;
            prop_assert!((value - expected).abs() < 1e-12);
        }
        prop_assert!((sorted[0] + 0.5).abs() < 1e-12);
        prop_assert!((sorted[n - 1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn centered_rank_orders_like_fitness(fitness in fitness_batch(30)) {
        let shaped = centered_rank(&fitness);
        for i in 0..fitness.len() {
            for j in 0..fitness.len() {
                if fitness[i] < fitness[j] {
                    prop_assert!(shaped[i] < shaped[j]);
                }
            }
        }
    }

    #[test]
    fn z_score_has_zero_mean_unit_std(fitness in fitness_batch(40)) {
        let spread = nan_max(&fitness) - nan_min(&fitness);
        prop_assume!(spread > 1.0);

        let shaped = z_score(&fitness);
        prop_assert!(nan_mean(&shaped).abs() < 1e-8);
        prop_assert!((nan_std(&shaped) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn norm_range_stays_in_unit_interval(fitness in fitness_batch(40)) {
        let shaped = range_norm(&fitness, -1.0, 1.0);
        for value in shaped {
            prop_assert!((-1.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn maximize_mirrors_centered_rank(fitness in fitness_batch(20)) {
        let pop = Population::filled(fitness.len(), 1, 0.0);
        let shaper = FitnessShaper::with_transform(FitnessTransform::CenteredRank);
        let maximizing = FitnessShaper::new(FitnessTransform::CenteredRank, 0.0, true).unwrap();
        let negated: Vec<f64> = fitness.iter().map(|f| -f).collect();

        prop_assert_eq!(
            maximizing.apply(&pop, &fitness).unwrap(),
            shaper.apply(&pop, &negated).unwrap()
        );
    }

    // ==================== Ask-Tell Properties ====================

    #[test]
    fn generation_counter_counts_tells(generations in 0u64..12, seed in any::<u64>()) {
        let strategy = SimpleGa::new(6, 2).unwrap();
        let params = SimpleGaParams { init_min: -1.0, init_max: 1.0, ..Default::default() };
        let problem = Sphere::new(2);

        let mut key = PrngKey::new(seed);
        let mut state = strategy.init(key, &params).unwrap();
        for _ in 0..generations {
            let [next, ask_key, tell_key] = key.split_n();
            key = next;
            let (population, asked) = strategy.ask(ask_key, &state, &params).unwrap();
            prop_assert_eq!(asked.generation_counter(), state.generation_counter());
            let fitness = problem.evaluate_population(&population);
            state = strategy.tell(tell_key, &population, &fitness, &asked, &params).unwrap();
        }
        prop_assert_eq!(state.generation_counter(), generations);
    }

    #[test]
    fn best_fitness_never_increases(seed in any::<u64>()) {
        let strategy = SimAnneal::new(4, 3).unwrap();
        let params = SimAnnealParams { init_min: -2.0, init_max: 2.0, ..Default::default() };
        let problem = Rastrigin::new(3);

        let mut key = PrngKey::new(seed);
        let mut state = strategy.init(key, &params).unwrap();
        let mut previous = state.best_fitness();
        for _ in 0..10 {
            let [next, ask_key, tell_key] = key.split_n();
            key = next;
            let (population, asked) = strategy.ask(ask_key, &state, &params).unwrap();
            let fitness = problem.evaluate_population(&population);
            state = strategy.tell(tell_key, &population, &fitness, &asked, &params).unwrap();

            prop_assert!(state.best_fitness() <= previous);
            prop_assert!(state.best_fitness() <= nan_min(&fitness));
            prop_assert!((problem.evaluate(state.best_solution()) - state.best_fitness()).abs() < 1e-9);
            previous = state.best_fitness();
        }
    }

    #[test]
    fn ask_is_deterministic_in_key(seed in any::<u64>()) {
        let strategy = OpenEs::new(6, 3).unwrap();
        let params = OpenEsParams::default();
        let state = strategy.init(PrngKey::new(0), &params).unwrap();

        let (first, _) = strategy.ask(PrngKey::new(seed), &state, &params).unwrap();
        let (second, _) = strategy.ask(PrngKey::new(seed), &state, &params).unwrap();
        prop_assert_eq!(first, second);
    }
}
