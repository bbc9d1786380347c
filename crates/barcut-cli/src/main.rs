use std::path::{Path, PathBuf};
use std::time::Duration;

use barcut_core::{
    Catalog, CatalogInput, Objective, OptimizerConfig, PlanOptimizer, generate_patterns_bounded,
    parse_stock_lengths,
};
use clap::{ArgAction, Parser, Subcommand};
use tracing::Level;

mod report;

#[derive(Parser)]
#[command(name = "barcut")]
#[command(about = "One-dimensional cutting stock optimizer", long_about = None)]
struct Cli {
    /// Log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize a catalog file and print the cutting plan
    Optimize {
        /// JSON catalog: {"stock_lengths": [...], "demand": [{"code", "length", "qty"}]}
        file: PathBuf,
        /// Replace the catalog's stock lengths (comma separated, e.g. 6000,12000)
        #[arg(long)]
        stock: Option<String>,
        /// What to minimize: waste or bars
        #[arg(long, default_value = "waste")]
        objective: Objective,
        /// Solver time limit in seconds
        #[arg(long, value_parser = parse_seconds)]
        time_limit: Option<Duration>,
        /// Branch-and-bound node budget
        #[arg(long)]
        max_nodes: Option<u64>,
        /// Maximum patterns per stock length
        #[arg(long)]
        max_patterns: Option<usize>,
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// List the cutting patterns of one stock length
    Patterns {
        /// Stock length
        #[arg(long)]
        stock: u64,
        /// Demand lengths (comma separated)
        #[arg(long, value_delimiter = ',', required = true)]
        lengths: Vec<u64>,
        /// Maximum patterns to enumerate
        #[arg(long, default_value_t = 200_000)]
        max_patterns: usize,
    },
    /// Check a catalog file for errors
    Check {
        /// The file to check
        file: PathBuf,
    },
}

fn parse_seconds(s: &str) -> Result<Duration, String> {
    let secs: f64 = s
        .parse()
        .map_err(|_| format!("invalid number of seconds '{}'", s))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(format!("time limit must be positive, got '{}'", s));
    }
    Ok(Duration::from_secs_f64(secs))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(level)
        .init();
}

fn load_catalog(path: &Path) -> Result<CatalogInput, String> {
    let source = std::fs::read_to_string(path).map_err(|e| format!("Error reading file: {}", e))?;
    serde_json::from_str(&source).map_err(|e| format!("Invalid catalog {}: {}", path.display(), e))
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{}", message);
    std::process::exit(1);
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Optimize {
            file,
            stock,
            objective,
            time_limit,
            max_nodes,
            max_patterns,
            format,
        } => {
            let input = load_catalog(&file).unwrap_or_else(|e| fail(e));
            let mut catalog = Catalog::from_input(&input).unwrap_or_else(|e| fail(e));
            if let Some(stock) = stock {
                catalog = parse_stock_lengths(&stock)
                    .and_then(|lengths| catalog.replace_stock(&lengths))
                    .unwrap_or_else(|e| fail(e));
            }

            let mut config = OptimizerConfig::new().with_objective(objective);
            if let Some(limit) = time_limit {
                config = config.with_time_limit(limit);
            }
            if let Some(max) = max_nodes {
                config = config.with_max_nodes(max);
            }
            if let Some(max) = max_patterns {
                config = config.with_max_patterns(max);
            }

            let plan = PlanOptimizer::new(config)
                .optimize(&catalog)
                .unwrap_or_else(|e| fail(e));

            if format == "json" {
                let json = serde_json::to_string_pretty(&plan).unwrap_or_else(|e| fail(e));
                println!("{}", json);
            } else {
                print!("{}", report::render_plan(&plan));
            }
        }
        Commands::Patterns {
            stock,
            lengths,
            max_patterns,
        } => {
            if stock == 0 || lengths.contains(&0) {
                fail("Error: lengths must be positive");
            }
            let patterns =
                generate_patterns_bounded(stock, &lengths, max_patterns).unwrap_or_else(|e| fail(e));

            println!("Stock length {}: {} patterns", stock, patterns.len());
            for pattern in &patterns {
                let cuts = pattern
                    .counts
                    .iter()
                    .zip(&lengths)
                    .filter(|(count, _)| **count > 0)
                    .map(|(count, length)| format!("{}x{}", count, length))
                    .collect::<Vec<_>>()
                    .join(" + ");
                println!("  {:40} waste {}", cuts, pattern.waste);
            }
        }
        Commands::Check { file } => {
            let input = load_catalog(&file).unwrap_or_else(|e| fail(e));
            match Catalog::from_input(&input) {
                Ok(catalog) => {
                    let pieces: u64 = catalog.demand().iter().map(|d| d.qty).sum();
                    println!("✓ {} is valid", file.display());
                    println!("  version {}", catalog.version());
                    println!("  {} stock lengths", catalog.stock_lengths().len());
                    println!("  {} demand lines", catalog.demand().len());
                    println!("  {} pieces required", pieces);
                }
                Err(e) => {
                    eprintln!("✗ {} has errors:", file.display());
                    eprintln!("  {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_seconds("1.5"), Ok(Duration::from_millis(1500)));
        assert!(parse_seconds("0").is_err());
        assert!(parse_seconds("-3").is_err());
        assert!(parse_seconds("soon").is_err());
    }

    #[test]
    fn test_cli_parses_optimize() {
        let cli = Cli::try_parse_from([
            "barcut", "-vv", "optimize", "catalog.json", "--stock", "6000,12000", "--objective", "bars",
            "--time-limit", "2",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Optimize {
                stock,
                objective,
                time_limit,
                format,
                ..
            } => {
                assert_eq!(stock.as_deref(), Some("6000,12000"));
                assert_eq!(objective, Objective::MinimizeBars);
                assert_eq!(time_limit, Some(Duration::from_secs(2)));
                assert_eq!(format, "text");
            }
            _ => panic!("expected optimize"),
        }
    }

    #[test]
    fn test_cli_parses_patterns() {
        let cli = Cli::try_parse_from(["barcut", "patterns", "--stock", "6000", "--lengths", "1000,1500"]).unwrap();

        match cli.command {
            Commands::Patterns { stock, lengths, .. } => {
                assert_eq!(stock, 6000);
                assert_eq!(lengths, vec![1000, 1500]);
            }
            _ => panic!("expected patterns"),
        }
    }

    #[test]
    fn test_catalog_file_shape() {
        let input: CatalogInput = serde_json::from_str(
            r#"{"stock_lengths": [6000], "demand": [{"code": "A", "length": 1000, "qty": 5}]}"#,
        )
        .unwrap();

        assert_eq!(input.version, 0);
        let catalog = Catalog::from_input(&input).unwrap();
        assert_eq!(catalog.demand()[0].label(), "A-1000");
    }
}
