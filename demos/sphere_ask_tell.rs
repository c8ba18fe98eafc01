//! Sphere Function Optimization
//!
//! Runs every registered strategy on a 10-D sphere through the ask-tell
//! loop and prints per-generation statistics.
//!
//! Set `RUST_LOG=evostrat=debug` to see strategy-level logging.

use evostrat::prelude::*;
use tracing_subscriber::EnvFilter;

const DIM: usize = 10;
const POPULATION_SIZE: usize = 32;
const GENERATIONS: u64 = 200;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Sphere Function Optimization ===\n");

    let problem = Sphere::new(DIM);
    for kind in StrategyKind::ALL {
        let mut config = StrategyConfig::new(kind.name(), POPULATION_SIZE, DIM);
        if matches!(kind, StrategyKind::OpenEs) {
            config.fitness.centered_rank = true;
        }
        let strategy = config.build()?;
        let params = with_init_range(strategy.default_params(), -5.0, 5.0);

        let mut stats = EvolutionStats::new();
        let mut key = PrngKey::new(42);
        let [init_key, next] = key.split_n();
        key = next;
        let mut state = strategy.init(init_key, &params)?;

        while state.generation_counter() < GENERATIONS {
            let [next, ask_key, tell_key] = key.split_n();
            key = next;
            let (population, asked) = strategy.ask(ask_key, &state, &params)?;
            let fitness = problem.evaluate_population(&population);
            state = strategy.tell(tell_key, &population, &fitness, &asked, &params)?;
            stats.record(GenerationStats::from_generation(&fitness, state.progress()));

            if state.generation_counter() % 50 == 0 {
                println!(
                    "{:>10} gen {:>4}: best = {:.6e}",
                    kind,
                    state.generation_counter(),
                    state.best_fitness()
                );
            }
        }

        println!("\n{}\n{}\n", kind, stats.summary());
    }

    Ok(())
}

fn with_init_range(params: AnyParams, init_min: f64, init_max: f64) -> AnyParams {
    match params {
        AnyParams::SimpleGa(p) => AnyParams::SimpleGa(SimpleGaParams {
            init_min,
            init_max,
            std_decay: 0.98,
            std_limit: 0.01,
            crossover_rate: 0.5,
            ..p
        }),
        AnyParams::SimAnneal(p) => AnyParams::SimAnneal(SimAnnealParams {
            init_min,
            init_max,
            std_decay: 0.98,
            std_limit: 0.01,
            ..p
        }),
        AnyParams::OpenEs(p) => AnyParams::OpenEs(OpenEsParams {
            init_min,
            init_max,
            std_init: 0.5,
            ..p
        }),
        AnyParams::MaEs(p) => AnyParams::MaEs(MaEsParams {
            init_min,
            init_max,
            ..p
        }),
        AnyParams::Les(p) => AnyParams::Les(LesParams {
            init_min,
            init_max,
            ..p
        }),
    }
}
