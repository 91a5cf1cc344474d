use kanblock::cli;
use simplelog::{ColorChoice, LevelFilter, TermLogger, TerminalMode};
use std::env;
use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();

    let parsed = match cli::parse_args(&args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            eprintln!("Run 'kanblock help' for usage.");
            return ExitCode::from(2);
        }
    };

    let level = if parsed.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    // Logs go to stderr so `show` output stays clean for piping.
    if let Err(e) = TermLogger::init(
        level,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    match cli::run(&parsed, &mut stdin.lock(), &mut stdout.lock()) {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            log::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
