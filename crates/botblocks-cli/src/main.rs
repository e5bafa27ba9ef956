use botblocks_cli::commands::{self, RunOptions};
use botblocks_program::test_harness::SimulatorConfig;
use botblocks_runtime::RunOutcome;
use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

fn cli() -> Command {
    Command::new("botblocks")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Run and inspect block-composed robot programs")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("run")
                .about("Execute a program file")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Program file (JSON)"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("Motion config (TOML)"),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Log commands instead of publishing them"),
                ),
        )
        .subcommand(
            Command::new("plan")
                .about("Print a program and its timing without running it")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Program file (JSON)"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("Motion config (TOML)"),
                ),
        )
        .subcommand(
            Command::new("simulate")
                .about("Run the seeded edit simulator")
                .arg(
                    Arg::new("ops")
                        .long("ops")
                        .default_value("10000")
                        .value_parser(value_parser!(u64))
                        .help("Number of edit operations to simulate"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("42")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("stop-on-violation")
                        .long("stop-on-violation")
                        .action(ArgAction::SetTrue)
                        .help("Stop simulation on first violation"),
                ),
        )
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let matches = cli().get_matches();

    match matches.subcommand() {
        Some(("run", args)) => {
            let Some(file) = args.get_one::<PathBuf>("file") else {
                anyhow::bail!("missing program file");
            };
            let options = RunOptions {
                config: args.get_one::<PathBuf>("config").cloned(),
                dry_run: args.get_flag("dry-run"),
            };

            let report = commands::run(file, &options).await?;
            eprintln!(
                "run {} {:?}: {} commands in {:?}",
                report.run_id, report.outcome, report.commands_emitted, report.elapsed
            );
            if let Some(id) = report.interrupted_at {
                eprintln!("interrupted at {id}");
            }
            std::process::exit(if report.outcome == RunOutcome::Completed { 0 } else { 130 });
        }
        Some(("plan", args)) => {
            let Some(file) = args.get_one::<PathBuf>("file") else {
                anyhow::bail!("missing program file");
            };
            let config = args.get_one::<PathBuf>("config");
            print!("{}", commands::plan(file, config.map(PathBuf::as_path))?);
        }
        Some(("simulate", args)) => {
            let config = SimulatorConfig {
                seed: args.get_one::<u64>("seed").copied().unwrap_or(42),
                total_operations: args.get_one::<u64>("ops").copied().unwrap_or(10_000),
                stop_on_first_violation: args.get_flag("stop-on-violation"),
                ..Default::default()
            };

            println!("Running edit simulator...");
            println!("Operations: {}", config.total_operations);
            println!("Seed: {}", config.seed);
            println!();

            let report = commands::simulate(config);
            println!("{}", report.generate_text());

            std::process::exit(if report.passed() { 0 } else { 1 });
        }
        _ => {}
    }
    Ok(())
}
