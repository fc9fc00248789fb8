use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use frsynth::{Classifier, CompileRequest, CompilerParams, Dataset, Predicate, compile_program, compile_to_path};

#[derive(Parser)]
#[command(name = "frsynth")]
#[command(about = "Compile a dataset and a trained classifier into a FairSquare program", long_about = None)]
struct Cli {
    /// CSV dataset with a header row of column names
    #[arg(long)]
    data: PathBuf,

    /// Classifier description (JSON with a "kind" field)
    #[arg(long)]
    classifier: PathBuf,

    /// Variable assigned by the classifier
    #[arg(long)]
    target: String,

    /// Sensitive attribute predicate, e.g. "sex < 1" (repeatable)
    #[arg(long, value_parser = Predicate::parse)]
    sensitive: Vec<Predicate>,

    /// Qualification predicate, e.g. "age > 18" (repeatable)
    #[arg(long, value_parser = Predicate::parse)]
    qualified: Vec<Predicate>,

    /// Fairness target predicate, e.g. "income > 0.5" (repeatable)
    #[arg(long, value_parser = Predicate::parse)]
    fairness: Vec<Predicate>,

    /// Maximum nesting depth of the population model (1 = simple mode)
    #[arg(long, default_value_t = 2)]
    max_depth: usize,

    /// Decimal places of classifier literals in F(); raise for scaled pipelines
    #[arg(long, default_value_t = 4)]
    literal_precision: usize,

    /// Comma-separated classifier inputs; defaults to every non-target column
    #[arg(long, value_delimiter = ',')]
    features: Option<Vec<String>>,

    /// Output file; the program is printed to stdout when omitted
    #[arg(long, short)]
    output: Option<PathBuf>,
}

fn run(cli: Cli) -> frsynth::Result<()> {
    let dataset = Dataset::from_csv_path(&cli.data)?;
    let classifier = Classifier::from_json_path(&cli.classifier)?;

    let params = CompilerParams::default()
        .with_max_depth(cli.max_depth)
        .with_literal_precision(cli.literal_precision);
    let mut request = CompileRequest::new(cli.target).with_params(params);
    request.features = cli.features;
    request.sensitive = cli.sensitive;
    request.qualified = cli.qualified;
    request.fairness = cli.fairness;

    match cli.output {
        Some(path) => compile_to_path(&dataset, &classifier, &request, path),
        None => {
            print!("{}", compile_program(&dataset, &classifier, &request)?);
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "compilation failed");
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}
