mod crn;

use crn::CrnSource;
use statetrie::report::{JsonReporter, Reporter, WriteReporter};
use statetrie::*;
use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init_from_env(env_logger::Env::default()
        .default_filter_or("info")); // `RUST_LOG=${LEVEL}` env variable to override

    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        print_usage();
        return Ok(());
    }
    let json = args.contains("--json");
    let backend: Option<Backend> = args.opt_value_from_str("--backend")?;
    let max_states: Option<usize> = args.opt_value_from_str("--max-states")?;
    let lookups: Option<PathBuf> = args.opt_value_from_str("--lookups")?;
    let inserts: Option<PathBuf> = args.opt_value_from_str("--inserts")?;
    let settings_path: PathBuf = match args.opt_free_from_str()? {
        Some(path) => path,
        None => {
            print_usage();
            return Ok(());
        }
    };
    let unused = args.finish();
    if !unused.is_empty() {
        log::warn!("Ignoring arguments. unused={:?}", unused);
    }

    let mut settings = Settings::load(&settings_path)?;
    if let Some(dir) = settings_path.parent() {
        settings.model_path = dir.join(&settings.model_path);
        settings.property_path = settings.property_path.map(|p| dir.join(p));
    }
    if let Some(backend) = backend {
        settings.backend = backend;
    }
    if max_states.is_some() {
        settings.max_states = max_states;
    }

    println!(
        "Exploring {} with the {} index.",
        settings.model_path.display(),
        settings.backend
    );
    let outcome = explore(&settings, &CrnSource::new(settings.layout()?))?;

    let mut stdout = std::io::stdout();
    if json {
        JsonReporter::new(&mut stdout).report_exploration(&outcome.report);
    } else {
        WriteReporter::new(&mut stdout).report_exploration(&outcome.report);
    }

    if let Some(path) = lookups {
        let mut w = create(&path)?;
        outcome.instrumentation.write_lookups_tsv(&mut w)?;
        w.flush()?;
    }
    if let Some(path) = inserts {
        let mut w = create(&path)?;
        outcome.instrumentation.write_inserts_tsv(&mut w)?;
        w.flush()?;
    }

    Ok(())
}

fn create(path: &Path) -> std::io::Result<BufWriter<File>> {
    log::info!("Writing samples. path={}", path.display());
    Ok(BufWriter::new(File::create(path)?))
}

fn print_usage() {
    println!("USAGE:");
    println!("  ./explore [--json] [--backend trie|hash|kd] [--max-states N]");
    println!("            [--lookups LOOKUPS.tsv] [--inserts INSERTS.tsv] SETTINGS.json");
    println!();
    println!("Paths in SETTINGS.json are relative to its directory, for example:");
    println!("  ./explore demos/models/sir.settings.json");
}
