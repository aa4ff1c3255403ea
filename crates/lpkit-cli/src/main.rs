use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use lpkit_solver::{MessageLevel, SolveKind, Solver, VERSION};
use lpkit_spec::{ModelBuilder, Options, ProblemSpec, Request};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "lpkit")]
#[command(about = "Solve linear and mixed-integer programs described in JSON", long_about = None)]
struct Cli {
    /// Log format on stderr
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a problem and print the result object
    Solve(SolveArgs),
    /// Print a problem in CPLEX LP format
    Write {
        /// Problem file, or `-` for stdin
        file: PathBuf,
    },
    /// Build a problem and print its statistics
    Check {
        /// Problem file, or `-` for stdin
        file: PathBuf,
    },
    /// Print the solver version
    Version,
}

#[derive(Args)]
struct SolveArgs {
    /// Problem file, or `-` for stdin
    file: PathBuf,
    /// Message level 0-4 (off, error, on, all, debug)
    #[arg(long)]
    msg_level: Option<i64>,
    /// Time limit in seconds
    #[arg(long)]
    time_limit: Option<f64>,
    /// Simplex iteration limit
    #[arg(long)]
    iteration_limit: Option<usize>,
    /// Skip presolve
    #[arg(long)]
    no_presolve: bool,
    /// Relative MIP gap
    #[arg(long)]
    mip_gap: Option<f64>,
    #[arg(long, value_enum, default_value_t = Kind::Auto)]
    kind: Kind,
    /// Solve an LP in rounds of this many pivots, logging each round
    #[arg(long)]
    increment: Option<usize>,
    /// Include row activities in the output
    #[arg(long)]
    rows: bool,
    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Auto,
    Lp,
    Mip,
}

impl SolveArgs {
    fn options(&self) -> Result<Options> {
        let msg_level = match self.msg_level {
            Some(code) => Some(
                MessageLevel::from_code(code)
                    .with_context(|| format!("invalid message level {code}, expected 0-4"))?,
            ),
            None => None,
        };
        Ok(Options {
            mip_gap: self.mip_gap.filter(|g| *g >= 0.0),
            time_limit: self.time_limit.filter(|t| *t >= 0.0),
            msg_level,
            presolve: self.no_presolve.then_some(false),
            iteration_limit: self.iteration_limit,
            rows: self.rows.then_some(true),
        })
    }

    fn kind(&self) -> Option<SolveKind> {
        match self.kind {
            Kind::Auto => None,
            Kind::Lp => Some(SolveKind::Lp),
            Kind::Mip => Some(SolveKind::Mip),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Solve(args) => {
            let options = args.options()?;
            let spec = read_spec(&args.file)?;
            let level = options
                .msg_level
                .or(spec.options.msg_level)
                .unwrap_or_default();
            init_logging(level.as_filter(), cli.log_format);

            let request = Request {
                options,
                kind: args.kind(),
                increment: args.increment,
            };
            let start = Instant::now();
            let output = request.run_with(&Solver::new(), &spec, |round| {
                info!(status = ?round.status, z = round.z, "round");
                anyhow::Ok(())
            })?;
            let output = output.with_time(start.elapsed().as_secs_f64());
            println!("{}", output.to_json(args.pretty)?);
        }
        Commands::Write { file } => {
            init_logging("warn", cli.log_format);
            let spec = read_spec(&file)?;
            let problem = ModelBuilder::build(&spec)?;
            print!("{}", lpkit_spec::write_lp(&problem));
        }
        Commands::Check { file } => {
            init_logging("warn", cli.log_format);
            let spec = read_spec(&file)?;
            let problem = ModelBuilder::build(&spec)?;
            let kind = match SolveKind::for_problem(&problem) {
                SolveKind::Lp => "LP",
                SolveKind::Mip => "MIP",
            };
            println!("Problem: {}", problem.name);
            println!("Kind: {kind}");
            println!("Rows: {}", problem.num_rows());
            println!("Columns: {}", problem.num_columns());
            println!("Non-zeros: {}", problem.num_nonzeros());
            println!("Integer columns: {}", problem.num_integer());
            println!("Binary columns: {}", problem.num_binary());
        }
        Commands::Version => println!("{VERSION}"),
    }
    Ok(())
}

fn read_spec(path: &Path) -> Result<ProblemSpec> {
    let text = if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Error reading stdin")?;
        text
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Error reading file {}", path.display()))?
    };
    Ok(ProblemSpec::parse(&text)?)
}

/// `RUST_LOG` wins over the level derived from the command line.
fn init_logging(default: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
