use std::process::ExitCode;

use rusty_retouch::cli;

fn main() -> ExitCode {
    env_logger::init();

    let options = match cli::parse_args(std::env::args().skip(1)) {
        Ok(Some(options)) => options,
        Ok(None) => {
            println!("{}", cli::USAGE);
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("{err}\n\n{}", cli::USAGE);
            return ExitCode::from(2);
        }
    };

    match cli::run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
