#![forbid(unsafe_code)]

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use miette::IntoDiagnostic;
use simplelog::{ColorChoice, LevelFilter, TermLogger, TerminalMode};

use testgen::{Config, default_calls, load_spec, resolve_config, run};
use testgen_apps::App1;
use testgen_ast::format_spec;
use testgen_atc::SuffixScheme;
use testgen_solver::BackendKind;

#[derive(Parser, Debug)]
#[command(name = "testgen", version, about = "Concrete test cases from API specifications")]
struct Cli {
    /// More log output (repeatable: -v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Generate a concrete test case for a call sequence against `app1`
    Generate {
        /// JSON specification tree
        spec: PathBuf,

        /// API to call (repeatable, in order). Defaults to every block in
        /// declaration order.
        #[arg(long = "call")]
        calls: Vec<String>,

        /// Configuration file. Defaults to the nearest `testgen.toml`.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Solver backend. Overrides `testgen.toml`.
        #[arg(long, value_enum)]
        backend: Option<BackendArg>,

        /// Rename suffix scheme. Overrides `testgen.toml`.
        #[arg(long, value_enum)]
        suffix: Option<SuffixArg>,

        /// Also print the abstract test case
        #[arg(long, default_value_t = false)]
        show_atc: bool,
    },

    /// Print a specification in its surface syntax
    Show {
        /// JSON specification tree
        spec: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendArg {
    Z3,
    Z3Cli,
    Bounded,
}

impl From<BackendArg> for BackendKind {
    fn from(v: BackendArg) -> Self {
        match v {
            BackendArg::Z3 => BackendKind::Z3,
            BackendArg::Z3Cli => BackendKind::Z3Cli,
            BackendArg::Bounded => BackendKind::Bounded,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SuffixArg {
    CallOccurrence,
    BlockIndex,
}

impl From<SuffixArg> for SuffixScheme {
    fn from(v: SuffixArg) -> Self {
        match v {
            SuffixArg::CallOccurrence => SuffixScheme::CallOccurrence,
            SuffixArg::BlockIndex => SuffixScheme::BlockIndex,
        }
    }
}

fn init_logging(verbose: u8) -> miette::Result<()> {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    TermLogger::init(
        level,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .into_diagnostic()
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.cmd {
        Cmd::Generate {
            spec,
            calls,
            config,
            backend,
            suffix,
            show_atc,
        } => {
            let cwd = std::env::current_dir().into_diagnostic()?;
            let (mut cfg, _): (Config, _) = resolve_config(config.as_deref(), &cwd)?;
            if let Some(b) = backend {
                cfg.solver.backend = b.into();
            }
            if let Some(s) = suffix {
                cfg.generation.suffix = s.into();
            }

            let spec = load_spec(&spec)?;
            let calls = if calls.is_empty() { default_calls(&spec) } else { calls };
            let app = App1::new();
            let generated = run(&spec, &calls, &app, &cfg)?;

            if show_atc {
                println!("# ATC");
                print!("{}", generated.atc);
                println!();
                println!("# CTC");
            }
            print!("{}", generated.ctc.program);
        }
        Cmd::Show { spec } => {
            let spec = load_spec(&spec)?;
            print!("{}", format_spec(&spec));
        }
    }

    Ok(())
}
