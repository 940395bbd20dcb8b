//! relquery CLI entry point
//!
//! Parses arguments and dispatches through `cli::run`; errors go to stderr
//! with their code and a non-zero exit status.

use relquery::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}: {}", e.code(), e);
        std::process::exit(1);
    }
}
