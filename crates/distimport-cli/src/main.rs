mod cli;

use crate::cli::{error_line, Cli};

fn main() {
    if let Err(err) = Cli::run_from_args() {
        eprintln!("{}", error_line(&err));
        std::process::exit(1);
    }
}
