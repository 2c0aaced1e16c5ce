use std::io;
use std::process::ExitCode;

use billingo_cli::{logging, output, Opts};
use clap::{CommandFactory, Parser};

fn main() -> ExitCode {
    if std::env::args_os().len() <= 1 {
        let _ = Opts::command().print_help();
        println!();
        return ExitCode::SUCCESS;
    }

    let opts = match Opts::try_parse() {
        Ok(opts) => opts,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    logging::init(opts.verbose);

    let stdout = io::stdout();
    match billingo_cli::run(opts, &mut stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", output::failure(&e.to_string()));
            ExitCode::FAILURE
        }
    }
}
