use std::env;
use std::io;
use std::process::ExitCode;

use bridge_cli::{run, CommandKind, CommonOptions};

fn main() -> ExitCode {
    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliFailure::Usage(message)) => {
            eprintln!("{message}");
            ExitCode::from(1)
        }
        Err(CliFailure::Client(error)) => {
            eprintln!("{error}");
            ExitCode::from(error.exit_code())
        }
    }
}

enum CliFailure {
    Usage(String),
    Client(bridge_cli::ClientError),
}

impl From<String> for CliFailure {
    fn from(message: String) -> Self {
        CliFailure::Usage(message)
    }
}

fn run_cli() -> Result<(), CliFailure> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    if args.is_empty() {
        return Err(usage_text().into());
    }
    if args[0] == "-h" || args[0] == "--help" {
        println!("{}", usage_text());
        return Ok(());
    }

    let mut options = CommonOptions::default();
    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "--port" => {
                options.port = parse_flag_value(&args, index, "--port", "u16")?;
                index += 2;
            }
            "--timeout-ms" => {
                options.timeout_ms = parse_flag_value(&args, index, "--timeout-ms", "u64")?;
                index += 2;
            }
            "--retry-ms" => {
                options.retry_ms = parse_flag_value(&args, index, "--retry-ms", "u64")?;
                index += 2;
            }
            "--include-telemetry" => {
                options.include_telemetry = true;
                index += 1;
            }
            "--strict" => {
                options.strict = true;
                index += 1;
            }
            "--pretty" => {
                options.pretty = true;
                index += 1;
            }
            _ => break,
        }
    }

    let command = args
        .get(index)
        .ok_or_else(|| "missing subcommand".to_string())?
        .as_str();
    let command_args = &args[(index + 1)..];

    let kind = match command {
        "wait-ready" => {
            if !command_args.is_empty() {
                return Err("wait-ready takes no arguments".to_string().into());
            }
            CommandKind::WaitReady
        }
        "send" => {
            if command_args.is_empty() {
                return Err("send requires a JSON request".to_string().into());
            }
            CommandKind::Send {
                request: command_args.join(" "),
            }
        }
        "script" => {
            let Some((path, rest)) = command_args.split_first() else {
                return Err("script requires a file path".to_string().into());
            };
            let mut barrier = false;
            for arg in rest {
                if arg == "--barrier" {
                    barrier = true;
                } else {
                    return Err(
                        format!("unknown script argument '{arg}' (expected --barrier)").into(),
                    );
                }
            }
            CommandKind::Script {
                path: path.clone(),
                barrier,
            }
        }
        "barrier" => {
            if !command_args.is_empty() {
                return Err("barrier takes no arguments".to_string().into());
            }
            CommandKind::Barrier
        }
        other => return Err(format!("unknown subcommand '{other}'").into()),
    };

    run(kind, options, &mut io::stdout()).map_err(CliFailure::Client)
}

fn parse_flag_value<T: std::str::FromStr>(
    args: &[String],
    index: usize,
    flag: &str,
    expected: &str,
) -> Result<T, String> {
    let value = args
        .get(index + 1)
        .ok_or_else(|| format!("missing value for {flag}"))?;
    value
        .parse::<T>()
        .map_err(|_| format!("invalid {flag} value '{value}' (expected {expected})"))
}

fn usage_text() -> String {
    [
        "bridge_cli - deterministic scene bridge client",
        "",
        "Usage:",
        "  bridge_cli [options] wait-ready",
        "  bridge_cli [options] send <json...>",
        "  bridge_cli [options] script <file> [--barrier]",
        "  bridge_cli [options] barrier",
        "",
        "Options:",
        "  --port <u16>          default 46011",
        "  --timeout-ms <u64>    default 5000",
        "  --retry-ms <u64>      default 100",
        "  --include-telemetry   also print T lines (warnings)",
        "  --strict              exit 2 on ok:false or fullSuccess:false",
        "  --pretty              pretty-print JSON responses",
    ]
    .join("\n")
}
