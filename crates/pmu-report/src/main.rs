use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

mod charts;
mod config;
mod dataset;
mod parquet_writer;
mod pipeline;

use config::{BenchTarget, ChartConfig, ImageFormat, ResultsConfig};

/// Tabulate and chart PMU benchmark statistics
#[derive(Debug, Parser)]
#[command(name = "pmu-report")]
struct Cli {
    /// Verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Chart a results CSV with one row per workload
    Workloads {
        #[arg(short = 'i', long, default_value = "results.csv", help = "Input CSV file")]
        input: PathBuf,

        #[arg(long, default_value = "workload", help = "Column holding the row labels")]
        index_column: String,

        #[command(flatten)]
        charts: ChartArgs,
    },

    /// Run benchmark executables and chart each one's phases
    Phases {
        #[arg(
            long = "bench",
            value_name = "PREFIX=PATH",
            default_values = ["random=./bin/random_access_phases", "matrix=./bin/matrix_phases"],
            help = "Benchmark to run; outputs are named after PREFIX"
        )]
        benches: Vec<BenchTarget>,

        #[command(flatten)]
        results: ResultsArgs,

        #[command(flatten)]
        charts: ChartArgs,
    },

    /// Chart the phases of previously saved benchmark output
    Parse {
        #[arg(short = 'i', long, help = "Text file holding benchmark output")]
        input: PathBuf,

        #[arg(
            long,
            help = "Prefix for output names (defaults to base name of input file)"
        )]
        prefix: Option<String>,

        #[command(flatten)]
        results: ResultsArgs,

        #[command(flatten)]
        charts: ChartArgs,
    },
}

#[derive(Debug, Args)]
struct ChartArgs {
    #[arg(short, long, default_value = "plot", help = "Directory for chart images")]
    output_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = ImageFormat::Png)]
    format: ImageFormat,

    #[arg(long, default_value_t = 1200, help = "Chart width in pixels")]
    width: u32,

    #[arg(long, default_value_t = 750, help = "Chart height in pixels")]
    height: u32,
}

impl From<ChartArgs> for ChartConfig {
    fn from(args: ChartArgs) -> Self {
        Self {
            output_dir: args.output_dir,
            format: args.format,
            width: args.width,
            height: args.height,
        }
    }
}

#[derive(Debug, Args)]
struct ResultsArgs {
    #[arg(long, default_value = ".", help = "Directory for the results tables")]
    results_dir: PathBuf,

    #[arg(long, help = "Also write each results table as Parquet")]
    parquet: bool,
}

impl From<ResultsArgs> for ResultsConfig {
    fn from(args: ResultsArgs) -> Self {
        Self {
            results_dir: args.results_dir,
            parquet: args.parquet,
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let generated = match cli.command {
        Command::Workloads {
            input,
            index_column,
            charts,
        } => pipeline::workloads(&input, &index_column, &charts.into())?,
        Command::Phases {
            benches,
            results,
            charts,
        } => pipeline::benches(&benches, &results.into(), &charts.into())?,
        Command::Parse {
            input,
            prefix,
            results,
            charts,
        } => {
            let prefix = match prefix {
                Some(prefix) => prefix,
                None => input
                    .file_stem()
                    .ok_or_else(|| anyhow::anyhow!("Invalid input filename"))?
                    .to_string_lossy()
                    .into_owned(),
            };
            pipeline::saved_output(&input, &prefix, &results.into(), &charts.into())?
        }
    };

    println!("\nDone. Generated:");
    for path in &generated {
        println!("  {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_benches() {
        let cli = Cli::try_parse_from(["pmu-report", "phases"]).unwrap();
        match cli.command {
            Command::Phases {
                benches, results, ..
            } => {
                assert_eq!(
                    benches,
                    vec![
                        "random=./bin/random_access_phases".parse().unwrap(),
                        "matrix=./bin/matrix_phases".parse::<BenchTarget>().unwrap(),
                    ]
                );
                assert_eq!(results.results_dir, PathBuf::from("."));
                assert!(!results.parquet);
            }
            other => panic!("Expected phases command, got {:?}", other),
        }
    }

    #[test]
    fn test_chart_args() {
        let cli = Cli::try_parse_from([
            "pmu-report",
            "workloads",
            "--input",
            "data/results.csv",
            "--format",
            "svg",
            "--output-dir",
            "out",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::Workloads {
                input,
                index_column,
                charts,
            } => {
                assert_eq!(input, PathBuf::from("data/results.csv"));
                assert_eq!(index_column, "workload");
                let config = ChartConfig::from(charts);
                assert_eq!(config.format, ImageFormat::Svg);
                assert_eq!(config.output_dir, PathBuf::from("out"));
                assert_eq!((config.width, config.height), (1200, 750));
            }
            other => panic!("Expected workloads command, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_bad_bench() {
        assert!(Cli::try_parse_from(["pmu-report", "phases", "--bench", "matrix"]).is_err());
    }
}
