//! CLI frontend for the Forktale interactive-fiction engine.

use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use colored::Colorize;

use forktale_engine::{Interpreter, NullSpeech, Settings};
use forktale_script::diagnostics::{Diagnostic, render_diagnostics};
use forktale_tui::TuiConsole;

#[derive(Parser)]
#[command(
    name = "forktale",
    about = "Forktale — a scripted interactive-fiction engine",
    version
)]
struct Cli {
    /// Game file to run
    #[arg(default_value = "game.txt")]
    game: PathBuf,

    /// Starting fork, written as @name (defaults to the file's first fork)
    fork: Option<String>,

    /// Skip faulty script constructs instead of raising errors
    #[arg(long)]
    lenient: bool,

    /// Propagate errors to the terminal instead of displaying them in-game
    #[arg(long)]
    no_print_errors: bool,

    /// Parse the game file and report diagnostics without running it
    #[arg(long)]
    check: bool,
}

fn main() {
    let cli = Cli::parse();
    if let Err(message) = run(cli) {
        eprintln!("{} {message}", "error:".red().bold());
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    if cli.check {
        return check(&cli.game);
    }

    let fork = cli
        .fork
        .as_deref()
        .map(|f| f.trim_start_matches('@'))
        .filter(|f| !f.is_empty());

    let settings = Settings {
        strict_errors: !cli.lenient,
        print_errors: !cli.no_print_errors,
    };

    let mut interp = Interpreter::new(TuiConsole::new(), NullSpeech, settings);
    interp
        .load_file(&cli.game, fork, 0)
        .map_err(|e| e.to_string())?;

    forktale_tui::run(interp)
}

/// Parse the game file and report what was found, or render the fault with
/// its source location.
fn check(path: &Path) -> Result<(), String> {
    match forktale_script::parse_file(path) {
        Ok(game) => {
            println!(
                "  {} {} ({} fork{})",
                "Checked".green().bold(),
                path.display(),
                game.len(),
                if game.len() == 1 { "" } else { "s" }
            );
            for name in game.fork_names() {
                println!("    @{name}");
            }
            Ok(())
        }
        Err(e) => {
            let diag = Diagnostic::from(&e);
            if diag.span != (0..0) {
                let source = std::fs::read_to_string(path).unwrap_or_default();
                let rendered =
                    render_diagnostics(&source, &path.display().to_string(), &[diag]);
                eprint!("{rendered}");
            }
            Err(e.to_string())
        }
    }
}
