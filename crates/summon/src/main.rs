mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "summon",
    version,
    about = "A background utility summoned by a global hotkey or its tray icon"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run in the foreground until Ctrl+C or the window closes
    Run,
    /// Create the default configuration file
    Init,
    /// List the key names a binding may use
    Keys,
    /// Validate a binding such as "Ctrl+Alt+Space" without registering it
    Check {
        /// The binding to check
        binding: String,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run => commands::run::execute(),
        Commands::Init => commands::init::execute(),
        Commands::Keys => commands::keys::execute(),
        Commands::Check { binding } => commands::check::execute(&binding),
    }
}
