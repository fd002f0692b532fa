//! rowsplice CLI entry point
//!
//! Parses arguments and dispatches via `cli::run`. Errors print to
//! stderr with their code and the process exits non-zero.

use rowsplice::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
