//! yaml12 command-line tool for checking YAML 1.2 streams and converting
//! them to other formats.
//!
//! Usage: yaml12 [OPTIONS] [FILE|DIR|-]
//!
//! Options:
//!   -t, --to <FORMAT>      Output format (json, events, cbor, diag, debug) [default: json]
//!   -o, --output <FILE>    Write output to specified file
//!   --check                Check if input loads (exit 0 if valid, 1 if invalid)
//!   --single               Require exactly one document
//!   --max-depth <N>        Maximum collection nesting
//!   --max-nodes <N>        Maximum nodes a document may expand to
//!   -v                     More diagnostics on stderr (repeatable)
//!   -h, --help             Print help
//!   -V, --version          Print version

use libyaml12::{encode_json, LoadOptions, Loader, Value};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info};

mod logging;
mod transcode;

/// Output format for -t.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    /// One JSON text per document
    Json,
    /// The line-per-event dump of the parser
    Events,
    /// An RFC 8742 CBOR sequence, one item per document
    Cbor,
    /// CBOR diagnostic notation (RFC 8949 §8)
    CborDiag,
    /// Rust `Debug` of each value
    Debug,
}

impl Format {
    fn parse(s: &str) -> Option<Format> {
        match s {
            "json" => Some(Format::Json),
            "events" => Some(Format::Events),
            "cbor" => Some(Format::Cbor),
            "diag" => Some(Format::CborDiag),
            "debug" => Some(Format::Debug),
            _ => None,
        }
    }
}

/// Everything that decides how one input is processed.
struct Settings<'a> {
    loader: Loader,
    format: Format,
    output_file: Option<&'a str>,
    single: bool,
    check_only: bool,
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: Option<&String>) -> T {
    let value = match value {
        Some(value) => value,
        None => {
            eprintln!("Error: {} requires a number argument", flag);
            process::exit(1);
        }
    };
    match value.parse() {
        Ok(n) => n,
        Err(_) => {
            eprintln!("Error: {} expects a number, got: {}", flag, value);
            process::exit(1);
        }
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut format = Format::Json;
    let mut output_file: Option<&str> = None;
    let mut check_only = false;
    let mut single = false;
    let mut options = LoadOptions::default();
    let mut verbosity: u8 = 0;
    let mut input_path: Option<&str> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                return;
            }
            "-V" | "--version" => {
                println!("yaml12 {}", env!("CARGO_PKG_VERSION"));
                return;
            }
            "-t" | "--to" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: -t requires a format argument");
                    process::exit(1);
                }
                format = match Format::parse(&args[i]) {
                    Some(format) => format,
                    None => {
                        eprintln!("Error: Unknown format: {}", args[i]);
                        process::exit(1);
                    }
                };
            }
            "-o" | "--output" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --output requires an argument");
                    process::exit(1);
                }
                output_file = Some(&args[i]);
            }
            "--check" => {
                check_only = true;
            }
            "--single" => {
                single = true;
            }
            "--max-depth" => {
                i += 1;
                options = options.max_depth(parse_number("--max-depth", args.get(i)));
            }
            "--max-nodes" => {
                i += 1;
                options = options.max_expanded_nodes(parse_number("--max-nodes", args.get(i)));
            }
            "-v" | "--verbose" => {
                verbosity = verbosity.saturating_add(1);
            }
            "-vv" => {
                verbosity = verbosity.saturating_add(2);
            }
            "-" => {
                // Standard input is also the default with no path.
            }
            arg if arg.starts_with('-') => {
                eprintln!("Error: Unknown option: {}", arg);
                process::exit(1);
            }
            _ => {
                if input_path.is_some() {
                    eprintln!("Error: Multiple input paths not supported");
                    process::exit(1);
                }
                input_path = Some(&args[i]);
            }
        }
        i += 1;
    }

    logging::init(verbosity);

    let settings = Settings {
        loader: Loader::new(options),
        format,
        output_file,
        single,
        check_only,
    };

    // Check if input is a directory
    if let Some(path) = input_path {
        let path_ref = Path::new(path);
        if path_ref.is_dir() {
            if output_file.is_some() {
                eprintln!("Error: --output cannot be used with directory input");
                process::exit(1);
            }
            process_directory(path_ref, &settings);
            return;
        }
    }

    let input: Vec<u8> = match input_path {
        Some(path) => match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("Error reading {}: {}", path, e);
                process::exit(1);
            }
        },
        None => {
            let mut buffer = Vec::new();
            if let Err(e) = io::stdin().read_to_end(&mut buffer) {
                eprintln!("Error reading stdin: {}", e);
                process::exit(1);
            }
            buffer
        }
    };

    let exit_code = process_input(&input, input_path, &settings);
    process::exit(exit_code);
}

/// The `*.yaml` and `*.yml` files directly inside `dir`, sorted.
fn yaml_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .map(|e| e == "yaml" || e == "yml")
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

fn process_directory(dir_path: &Path, settings: &Settings) {
    let files = match yaml_files(dir_path) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Error reading directory {}: {}", dir_path.display(), e);
            process::exit(1);
        }
    };
    info!(dir = %dir_path.display(), files = files.len(), "processing directory");

    let mut had_errors = false;

    for path in files {
        let path_str = path.to_string_lossy();
        let input = match fs::read(&path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error reading {}: {}", path_str, e);
                had_errors = true;
                continue;
            }
        };

        if process_input(&input, Some(&path_str), settings) != 0 {
            had_errors = true;
        }
    }

    process::exit(if had_errors { 1 } else { 0 });
}

fn load_documents(input: &[u8], settings: &Settings) -> libyaml12::Result<Vec<Value>> {
    if settings.single {
        settings.loader.load_one(input).map(|value| vec![value])
    } else {
        settings.loader.load_all(input).collect()
    }
}

fn report_error(input_file: Option<&str>, e: &libyaml12::Error) {
    if let Some(path) = input_file {
        eprintln!("{}: {}", path, e);
    } else {
        eprintln!("Error: {}", e);
    }
}

fn process_input(input: &[u8], input_file: Option<&str>, settings: &Settings) -> i32 {
    // Events come straight from the parser.
    if settings.format == Format::Events && !settings.check_only {
        return match settings.loader.dump_events(input) {
            Ok(output) => {
                write_output(output.as_bytes(), settings.output_file);
                0
            }
            Err(e) => {
                report_error(input_file, &e);
                1
            }
        };
    }

    let documents = match load_documents(input, settings) {
        Ok(documents) => documents,
        Err(e) => {
            report_error(input_file, &e);
            return 1;
        }
    };
    debug!(
        input = input_file.unwrap_or("-"),
        documents = documents.len(),
        "loaded stream"
    );

    if settings.check_only {
        if let Some(path) = input_file {
            println!("{}: ok", path);
        }
        return 0;
    }

    write_output(&render(&documents, settings.format), settings.output_file);
    0
}

/// Encode every document in the chosen format.
fn render(documents: &[Value], format: Format) -> Vec<u8> {
    let mut output = Vec::new();
    for value in documents {
        match format {
            Format::Json => {
                output.extend_from_slice(encode_json(value).as_bytes());
                output.push(b'\n');
            }
            Format::Debug => {
                output.extend_from_slice(format!("{:?}\n", value).as_bytes());
            }
            Format::Cbor => output.extend_from_slice(&transcode::cbor::encode(value)),
            Format::CborDiag => {
                output.extend_from_slice(transcode::cbor::diagnostic(value).as_bytes());
                output.push(b'\n');
            }
            Format::Events => unreachable!("events are dumped from the parser"),
        }
    }
    output
}

fn write_output(output: &[u8], output_file: Option<&str>) {
    if let Some(path) = output_file {
        if let Err(e) = fs::write(path, output) {
            eprintln!("Error writing {}: {}", path, e);
            process::exit(1);
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        if let Err(e) = handle.write_all(output) {
            eprintln!("Error writing to stdout: {}", e);
            process::exit(1);
        }
    }
}

fn print_help() {
    println!(
        "yaml12 - YAML 1.2 command-line tool

USAGE:
    yaml12 [OPTIONS] [FILE|DIR|-]

ARGS:
    [FILE|DIR|-]    Input file or directory (reads from stdin if not provided)
                    When a directory is given, processes all .yaml and .yml
                    files in it

OPTIONS:
    -t, --to <FORMAT>      Output format [default: json]
                           Supported: json, events, cbor, diag, debug

                           'json' writes one JSON text per document. 'events'
                           writes the parser events, one per line. 'cbor'
                           writes a CBOR sequence with one item per document.

    -o, --output <FILE>    Write output to specified file (not valid with directory input)

    --check                Check if input loads (exit 0 if valid, 1 if invalid)

    --single               Require exactly one document in the stream

    --max-depth <N>        Maximum collection nesting [default: 128]

    --max-nodes <N>        Maximum nodes a document may expand to once aliases
                           are substituted [default: 1000000]

    -v, --verbose          Log more on stderr; repeat for trace output.
                           YAML12_LOG sets the base level (e.g. debug)

    -h, --help             Print help

    -V, --version          Print version

EXAMPLES:
    # Convert YAML to JSON
    yaml12 config.yaml

    # Check every YAML file in a directory
    yaml12 --check ./configs/

    # Show the parser events of a stream
    yaml12 -t events config.yaml

    # Convert YAML to CBOR (binary)
    yaml12 -t cbor config.yaml -o config.cbor

    # View the CBOR in diagnostic notation (RFC 8949 §8)
    yaml12 -t diag config.yaml

    # Refuse alias-heavy input
    yaml12 --max-nodes 10000 untrusted.yaml
"
    );
}
