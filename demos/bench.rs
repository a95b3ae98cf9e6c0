mod crn;

use crn::{sir, Bounds, CrnGenerator};
use statetrie::*;

fn main() -> Result<(), BoxError> {
    env_logger::init_from_env(env_logger::Env::default()
        .default_filter_or("warn")); // `RUST_LOG=${LEVEL}` env variable to override

    let mut args = pico_args::Arguments::from_env();
    let population: u32 = args.opt_value_from_str("--population")?.unwrap_or(1_000);
    let max_budget: usize = args.opt_value_from_str("--max-budget")?.unwrap_or(100_000);
    let backends: Vec<Backend> = match args.opt_value_from_str::<_, Backend>("--backend")? {
        Some(backend) => vec![backend],
        None => Backend::ALL.to_vec(),
    };
    println!(
        "Benchmarking an epidemic over {} individuals with budgets up to {}.",
        population, max_budget
    );
    println!("backend\tbudget\tunique\tlookups\tlookup_mean_ns\tinserts\tinsert_mean_ns\tindex_bytes\tsec");

    let budgets = std::iter::successors(Some(10usize), |b| b.checked_mul(10))
        .take_while(|&b| b <= max_budget);
    for budget in budgets {
        for &backend in &backends {
            let generator = CrnGenerator::new(sir(population), Bounds::default(), SliceLayout::default())?;
            let mut explorer = generator
                .explorer()
                .target_state_count(budget)
                .build(backend.index());
            explorer.run()?;
            let data = explorer.report_data();
            println!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.3}",
                data.backend,
                budget,
                data.unique_states,
                data.summary.lookups.count,
                data.summary.lookups.mean.as_nanos(),
                data.summary.inserts.count,
                data.summary.inserts.mean.as_nanos(),
                data.index_bytes,
                data.duration.as_secs_f64(),
            );
        }
    }

    Ok(())
}
