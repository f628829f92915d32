use std::path::PathBuf;

mod compiler;

use compiler::{check_file, print_file};

fn main() {
    if let Err(message) = run() {
        eprintln!("{message}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = std::env::args().collect::<Vec<_>>();
    let command = parse_cli(&args)?;

    match command {
        Command::Check { input } => {
            let report = check_file(&input)?;
            if report.errors > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Print { input } => {
            let printed = print_file(&input)?;
            print!("{printed}");
            Ok(())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Parse and type check a source file.
    Check { input: PathBuf },
    /// Parse a source file and pretty-print it back.
    Print { input: PathBuf },
}

const USAGE: &str = "usage: tern <check|print> <file.tn>";

fn parse_cli(args: &[String]) -> Result<Command, String> {
    match args {
        [_, command, input] => {
            let input = PathBuf::from(input);
            match command.as_str() {
                "check" => Ok(Command::Check { input }),
                "print" => Ok(Command::Print { input }),
                other => Err(format!("unknown command `{other}`\n{USAGE}")),
            }
        }
        _ => Err(USAGE.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn cli_parses_check_and_print() {
        assert_eq!(
            parse_cli(&args(&["tern", "check", "demo.tn"])).unwrap(),
            Command::Check {
                input: PathBuf::from("demo.tn")
            }
        );
        assert_eq!(
            parse_cli(&args(&["tern", "print", "demo.tn"])).unwrap(),
            Command::Print {
                input: PathBuf::from("demo.tn")
            }
        );
    }

    #[test]
    fn cli_rejects_unknown_commands_and_missing_args() {
        assert!(parse_cli(&args(&["tern"])).is_err());
        assert!(parse_cli(&args(&["tern", "frobnicate", "demo.tn"])).is_err());
    }
}
