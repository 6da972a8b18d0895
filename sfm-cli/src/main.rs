// Command-line interface for sfm
//
// This binary converts Scripture documents between marker streams (USFM, Toolbox)
// and the formats the codec registry knows about, and offers a few inspection
// helpers. All conversion work is done by the sfm-codec library.
//
// Converting:
//
// Every input is parsed into one document, in order, so a vernacular file
// followed by a back-translation file merges the translations into the books the
// first file created. The source format is detected from each file's extension
// unless --from is given.
//
// Usage:
//  sfm <input>... --to <format> [--from <format>] [--output <file>]  - Convert (default)
//  sfm convert <input>... --to <format> [...]                        - Same as above (explicit)
//  sfm inspect <path> [--from <format>] [--report]                   - Tree view or import report
//  sfm styles [--json]                                               - Effective marker mapping
//  sfm --list-formats                                                - List registered formats

mod logging;
mod progress;

use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use logging::{init_logging, LogConfig};
use progress::SpinnerProgress;
use sfm_codec::{BookOutcome, CodecConfig, FormatRegistry, ImportReport, Scripture};
use sfm_config::{LogFormat, Loader, SfmConfig};
use std::fs;
use std::str::FromStr;
use tracing::Level;

const SUBCOMMANDS: &[&str] = &["convert", "inspect", "styles", "help"];

fn build_cli() -> Command {
    Command::new("sfm")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert and inspect Standard Format Marker Scripture files")
        .long_about(
            "sfm converts Scripture documents between USFM, Toolbox databases and\n\
            the codec's JSON model, and inspects their structure.\n\n\
            Examples:\n  \
            sfm 41MRK.SFM --to json -o mark.json        # USFM to JSON\n  \
            sfm mark.db mark-bt.db --to usfm            # Merge a back translation\n  \
            sfm inspect 41MRK.SFM                       # Tree view\n  \
            sfm inspect 41MRK.SFM --report              # Import report as JSON",
        )
        .arg_required_else_help(true)
        .subcommand_required(false)
        .arg(
            Arg::new("list-formats")
                .long("list-formats")
                .help("List available formats")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Path to an sfm.toml configuration file")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log verbosity (-v info, -vv debug, -vvv trace)")
                .action(ArgAction::Count)
                .global(true),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .help("Log output format")
                .value_parser(["pretty", "compact", "json"])
                .global(true),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert between document formats (default command)")
                .arg(
                    Arg::new("input")
                        .help("Input files, parsed in order into one document")
                        .required(true)
                        .num_args(1..)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("from")
                        .long("from")
                        .help("Source format (auto-detected from file extension if not specified)")
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .help("Target format (required)")
                        .required(true)
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Output file path (defaults to stdout)")
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("inspect")
                .about("Show the structure of a document")
                .arg(
                    Arg::new("path")
                        .help("Path to the document")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("from")
                        .long("from")
                        .help("Source format (auto-detected from file extension if not specified)")
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("report")
                        .long("report")
                        .help("Print the import report as JSON instead of the tree")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("styles")
                .about("List the marker to style mapping in effect")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the mapping as JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let cli = build_cli();
    let matches = match cli.clone().try_get_matches_from(&args) {
        Ok(m) => m,
        Err(e) => {
            // A leading file argument means the convert subcommand was omitted
            if args.len() > 1 && !args[1].starts_with('-') && !SUBCOMMANDS.contains(&args[1].as_str()) {
                let mut new_args = vec![args[0].clone(), "convert".to_string()];
                new_args.extend_from_slice(&args[1..]);
                match cli.try_get_matches_from(&new_args) {
                    Ok(m) => m,
                    Err(e2) => e2.exit(),
                }
            } else {
                e.exit();
            }
        }
    };

    let config = load_cli_config(matches.get_one::<String>("config").map(|s| s.as_str()));
    init_cli_logging(&matches, &config);

    let codec = CodecConfig::from(&config);
    let registry = FormatRegistry::with_config(&codec);

    if matches.get_flag("list-formats") {
        handle_list_formats_command(&registry);
        return;
    }

    match matches.subcommand() {
        Some(("convert", sub_matches)) => {
            let inputs: Vec<&String> = sub_matches
                .get_many::<String>("input")
                .map(|values| values.collect())
                .unwrap_or_default();
            let from = sub_matches.get_one::<String>("from").map(|s| s.as_str());
            let Some(to) = sub_matches.get_one::<String>("to") else {
                fail("Error: --to is required");
            };
            let output = sub_matches.get_one::<String>("output").map(|s| s.as_str());
            handle_convert_command(&registry, &inputs, from, to, output);
        }
        Some(("inspect", sub_matches)) => {
            let Some(path) = sub_matches.get_one::<String>("path") else {
                fail("Error: a path is required");
            };
            let from = sub_matches.get_one::<String>("from").map(|s| s.as_str());
            handle_inspect_command(&registry, path, from, sub_matches.get_flag("report"));
        }
        Some(("styles", sub_matches)) => {
            handle_styles_command(&codec, sub_matches.get_flag("json"));
        }
        _ => fail("Unknown subcommand. Use --help for usage information."),
    }
}

fn fail(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

fn load_cli_config(explicit_path: Option<&str>) -> SfmConfig {
    let loader = Loader::new().with_optional_file("sfm.toml");
    let loader = if let Some(path) = explicit_path {
        loader.with_file(path)
    } else {
        loader
    };

    loader.build().unwrap_or_else(|err| {
        fail(&format!("Failed to load configuration: {err}"));
    })
}

fn init_cli_logging(matches: &ArgMatches, config: &SfmConfig) {
    let base = Level::from_str(&config.logging.level).unwrap_or_else(|_| {
        fail(&format!("Invalid logging.level '{}'", config.logging.level));
    });
    let format = match matches.get_one::<String>("log-format").map(|s| s.as_str()) {
        Some("pretty") => LogFormat::Pretty,
        Some("json") => LogFormat::Json,
        Some(_) => LogFormat::Compact,
        None => config.logging.format,
    };
    let verbosity = matches.get_count("verbose");
    init_logging(&LogConfig::from_verbosity(base, verbosity).with_format(format));
}

fn handle_list_formats_command(registry: &FormatRegistry) {
    println!("Available formats:\n");
    for name in registry.list_formats() {
        let Ok(format) = registry.get(&name) else {
            continue;
        };
        let mut modes = Vec::new();
        if format.supports_parsing() {
            modes.push("read");
        }
        if format.supports_serialization() {
            modes.push("write");
        }
        println!(
            "  {name:<10} {:<12} {} (.{})",
            modes.join("/"),
            format.description(),
            format.file_extensions().join(", .")
        );
    }
}

/// The explicit format, or the one registered for the file's extension.
fn source_format(registry: &FormatRegistry, path: &str, explicit: Option<&str>) -> String {
    if let Some(format) = explicit {
        return format.to_string();
    }
    registry
        .detect_format_from_filename(path)
        .unwrap_or_else(|| {
            eprintln!("Error: Could not detect format from filename '{path}'");
            fail("Please specify --from explicitly");
        })
}

fn parse_file(
    registry: &FormatRegistry,
    path: &str,
    from: Option<&str>,
    doc: &mut Scripture,
    progress: &SpinnerProgress,
) -> ImportReport {
    let format = source_format(registry, path, from);
    let source = fs::read_to_string(path).unwrap_or_else(|e| {
        fail(&format!("Error reading file '{path}': {e}"));
    });
    let report = registry
        .parse_into(&source, path, &format, doc, progress)
        .unwrap_or_else(|e| {
            progress.finish();
            fail(&format!("Parse error: {e}"));
        });
    for book in &report.books {
        if let BookOutcome::Aborted { failure } = &book.outcome {
            eprintln!("Warning: book {} not imported: {failure}", book.code);
        }
    }
    if !report.new_styles.is_empty() {
        tracing::info!(file = path, styles = ?report.new_styles, "styles created by import");
    }
    report
}

fn handle_convert_command(
    registry: &FormatRegistry,
    inputs: &[&String],
    from: Option<&str>,
    to: &str,
    output: Option<&str>,
) {
    if let Err(e) = registry.get(to) {
        fail(&format!("Error: {e}"));
    }

    let progress = SpinnerProgress::new();
    let mut doc = Scripture::default();
    for input in inputs {
        parse_file(registry, input, from, &mut doc, &progress);
    }

    let text = registry
        .serialize_with_progress(&doc, to, &progress)
        .unwrap_or_else(|e| {
            progress.finish();
            fail(&format!("Serialization error: {e}"));
        });
    progress.finish();

    match output {
        Some(path) => fs::write(path, text).unwrap_or_else(|e| {
            fail(&format!("Error writing file '{path}': {e}"));
        }),
        None => print!("{text}"),
    }
}

fn handle_inspect_command(registry: &FormatRegistry, path: &str, from: Option<&str>, report: bool) {
    let progress = SpinnerProgress::new();
    let mut doc = Scripture::default();
    let import_report = parse_file(registry, path, from, &mut doc, &progress);
    progress.finish();

    let output = if report {
        serde_json::to_string_pretty(&import_report).map(|mut s| {
            s.push('\n');
            s
        })
        .unwrap_or_else(|e| fail(&format!("Serialization error: {e}")))
    } else {
        registry
            .serialize(&doc, "tree")
            .unwrap_or_else(|e| fail(&format!("Serialization error: {e}")))
    };
    print!("{output}");
}

fn handle_styles_command(codec: &CodecConfig, json: bool) {
    let mappings = codec.marker_map().mappings();
    if json {
        let entries: Vec<_> = mappings
            .iter()
            .map(|(marker, style)| serde_json::json!({ "marker": marker, "style": style }))
            .collect();
        match serde_json::to_string_pretty(&entries) {
            Ok(text) => println!("{text}"),
            Err(e) => fail(&format!("Serialization error: {e}")),
        }
        return;
    }
    for (marker, style) in mappings {
        println!("{marker:<8} {style}");
    }
}
