use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod console;

#[derive(Parser)]
#[command(name = "breaktime", version, about = "Break reminder for your eyes and posture")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a break session in the foreground, reading commands from stdin
    Run(commands::run::RunArgs),
    /// List the available techniques
    Techniques {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Techniques { json } => commands::techniques::run(json),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            commands::completions::run::<Cli>(shell);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
