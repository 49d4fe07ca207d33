//! Command-line argument parsing.
//!
//! Usage:
//!   meatball [-c<context>] [-D<name>=<value>]... [-a<alias>=<target>]...
//!            [-o<yaml|json>] [-dh] [<input>|-]

use std::path::PathBuf;

pub const USAGE: &str = "\
usage: meatball [-c<context>] [-D<name>=<value>]... [-a<alias>=<target>]...
                [-o<yaml|json>] [-dh] [<input>|-]

  -c<file>         load context variables from a JSON or YAML file
  -D<name>=<value> define a context variable
  -a<alias>=<path> resolve <alias> as if <path> had been written
  -o<format>       output format: yaml (default) or json
  -d               debug logging
  -h               show this help";

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Context file (`-c<file>`).
    pub context_file: Option<PathBuf>,
    /// Context definitions (`-D<name>=<value>`), in order.
    pub defines: Vec<(String, String)>,
    /// Resolver aliases (`-a<alias>=<target>`), in order.
    pub aliases: Vec<(String, String)>,
    /// Output format (`-o<format>`).
    pub format: OutputFormat,
    /// Debug logging (`-d`).
    pub debug: bool,
    /// Print usage and exit (`-h`).
    pub help: bool,
    /// Document to process.
    pub input: Input,
}

/// Where the document comes from.
#[derive(Debug, Default, PartialEq, Eq)]
pub enum Input {
    /// Standard input (no positional argument, or `-`).
    #[default]
    Stdin,
    File(PathBuf),
}

/// How the processed document is written.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(raw.get(1..).unwrap_or_default())
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut positional: Vec<String> = Vec::new();
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();

        // `--` ends flag processing.
        if arg == "--" {
            i += 1;
            positional.extend(argv[i..].iter().cloned());
            break;
        }

        // Non-flag argument.
        if !arg.starts_with('-') || arg == "-" {
            positional.push(arg.to_owned());
            i += 1;
            continue;
        }

        // Flag argument: iterate over characters after the leading `-`.
        let chars: Vec<char> = arg[1..].chars().collect();
        let mut j = 0;
        while j < chars.len() {
            match chars[j] {
                'd' => args.debug = true,
                'h' => args.help = true,

                // Flags taking a value, embedded (`-cfile`) or separate (`-c file`).
                flag @ ('c' | 'D' | 'a' | 'o') => {
                    let value = if j + 1 < chars.len() {
                        let s: String = chars[j + 1..].iter().collect();
                        j = chars.len();
                        s
                    } else if i + 1 < argv.len() {
                        i += 1;
                        argv[i].clone()
                    } else {
                        return Err(format!("-{flag} requires an argument"));
                    };
                    match flag {
                        'c' => args.context_file = Some(PathBuf::from(value)),
                        'D' => args.defines.push(split_assignment(&value, flag)?),
                        'a' => args.aliases.push(split_assignment(&value, flag)?),
                        _ => args.format = value.parse()?,
                    }
                }

                c => return Err(format!("unknown option: -{c}")),
            }
            j += 1;
        }
        i += 1;
    }

    match positional.len() {
        0 => {}
        1 => {
            let path = positional.remove(0);
            if path != "-" {
                args.input = Input::File(PathBuf::from(path));
            }
        }
        n => return Err(format!("too many arguments ({n})")),
    }

    Ok(args)
}

fn split_assignment(s: &str, flag: char) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_owned(), value.to_owned())),
        _ => Err(format!("-{flag} expects <name>=<value>, got '{s}'")),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
