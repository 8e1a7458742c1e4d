//! Command-line interface for sfm
//! This binary parses SFM and USFM files, reports problems and converts them into other formats.
//!
//! Usage:
//!   sfm parse `<path>` [--format `<format>`] [parser options]  - Parse a file and print it in a format
//!   sfm check `<path>` [parser options]                      - Parse a file and list its diagnostics
//!   sfm stylesheet `<path>`                                 - Dump a .sty stylesheet as JSON
//!
//! Parser options: --usfm, --stylesheet `<file.sty>`, --error-level `<level>`,
//! --private-prefix `<prefix>`, --config `<file.toml>`. Repeat -v for more logging.

use clap::{Arg, ArgAction, ArgMatches, Command};
use sfm::sfm::config::{Flavour, Loader, ParserConfig, SfmConfig};
use sfm::sfm::error::{Diagnostic, ErrorLevel, ParseError};
use sfm::sfm::formats::FormatRegistry;
use sfm::sfm::lexer::lines;
use sfm::sfm::style::{self, Stylesheet};
use sfm::sfm::{usfm, Node, Parser};
use std::process;

fn parser_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("path")
                .help("Path to the SFM file")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("usfm")
                .long("usfm")
                .help("Use the built-in USFM stylesheet and text types")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("stylesheet")
                .long("stylesheet")
                .short('s')
                .help("Stylesheet (.sty) to parse with; layered over USFM with --usfm"),
        )
        .arg(
            Arg::new("error-level")
                .long("error-level")
                .short('e')
                .help("Lowest severity that aborts: note, marker, content, structure, unrecoverable"),
        )
        .arg(
            Arg::new("private-prefix")
                .long("private-prefix")
                .help("Unknown markers with this prefix are only reported as notes"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("TOML configuration file layered over the defaults"),
        )
}

fn main() {
    let matches = Command::new("sfm")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A tool for parsing and converting SFM and USFM files")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log more (repeat for debug and trace output)")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand(
            parser_args(Command::new("parse").about("Parse a file and print it in another format"))
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .help("Output format (sfm, tree, json, yaml)"),
                ),
        )
        .subcommand(parser_args(
            Command::new("check").about("Parse a file and report its diagnostics"),
        ))
        .subcommand(
            Command::new("stylesheet")
                .about("Load a .sty stylesheet and dump it as JSON")
                .arg(
                    Arg::new("path")
                        .help("Path to the stylesheet")
                        .required(true)
                        .index(1),
                ),
        )
        .get_matches();

    init_logging(matches.get_count("verbose"));

    match matches.subcommand() {
        Some(("parse", parse_matches)) => handle_parse_command(parse_matches),
        Some(("check", check_matches)) => handle_check_command(check_matches),
        Some(("stylesheet", sty_matches)) => {
            let path = required(sty_matches, "path");
            handle_stylesheet_command(path);
        }
        _ => unreachable!(),
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn required<'m>(matches: &'m ArgMatches, name: &str) -> &'m str {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .unwrap_or_else(|| fail(format!("missing argument <{}>", name)))
}

/// Defaults, then the --config file, then the command line flags
fn load_config(matches: &ArgMatches) -> SfmConfig {
    let mut loader = Loader::new();
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }

    let mut overrides: Vec<(&str, String)> = Vec::new();
    if matches.get_flag("usfm") {
        overrides.push(("parser.flavour", "usfm".to_string()));
    }
    if let Some(level) = matches.get_one::<String>("error-level") {
        overrides.push(("parser.error_level", level.to_lowercase()));
    }
    if let Some(prefix) = matches.get_one::<String>("private-prefix") {
        overrides.push(("parser.private_prefix", prefix.clone()));
    }
    if let Ok(Some(format)) = matches.try_get_one::<String>("format") {
        overrides.push(("output.format", format.clone()));
    }
    for (key, value) in overrides {
        loader = loader.set_override(key, value).unwrap_or_else(|e| fail(e));
    }

    loader
        .build()
        .unwrap_or_else(|e| fail(format!("invalid configuration: {}", e)))
}

fn load_stylesheet(matches: &ArgMatches, config: &ParserConfig) -> Stylesheet {
    let mut stylesheet = match config.flavour {
        Flavour::Usfm => usfm::stylesheet().clone(),
        Flavour::Sfm => Stylesheet::new(),
    };
    if let Some(path) = matches.get_one::<String>("stylesheet") {
        let loaded = style::from_path(path, config.error_level).unwrap_or_else(|e| fail(e));
        stylesheet.update(&loaded);
    }
    stylesheet
}

/// Parse `path`, returning the forest (or the fatal error) and the
/// non-fatal diagnostics reported on the way
fn parse_file(
    path: &str,
    config: &ParserConfig,
    stylesheet: &Stylesheet,
) -> (Result<Vec<Node>, ParseError>, Vec<Diagnostic>) {
    let source = std::fs::read_to_string(path)
        .unwrap_or_else(|e| fail(format!("reading {}: {}", path, e)));
    let options = config.options(path);
    let parser = match config.flavour {
        Flavour::Usfm => usfm::parser(lines(&source), stylesheet, options),
        Flavour::Sfm => Parser::new(lines(&source), stylesheet, options),
    };
    let mut parser = parser.unwrap_or_else(|e| fail(e));
    let result = parser.by_ref().collect::<Result<Vec<_>, _>>();
    let warnings = parser.take_warnings();
    (result, warnings)
}

/// Handle the parse command
fn handle_parse_command(matches: &ArgMatches) {
    let path = required(matches, "path");
    let config = load_config(matches);
    let stylesheet = load_stylesheet(matches, &config.parser);

    let (result, _warnings) = parse_file(path, &config.parser, &stylesheet);
    let nodes = result.unwrap_or_else(|e| fail(e));

    let output = FormatRegistry::with_defaults()
        .serialize(&nodes, &config.output.format)
        .unwrap_or_else(|e| fail(e));
    print!("{}", output);
}

/// Handle the check command
fn handle_check_command(matches: &ArgMatches) {
    let path = required(matches, "path");
    let config = load_config(matches);
    let stylesheet = load_stylesheet(matches, &config.parser);

    let (result, warnings) = parse_file(path, &config.parser, &stylesheet);
    for warning in &warnings {
        println!("{}: {}", warning.level, warning);
    }
    match result {
        Ok(nodes) => {
            let notes = warnings
                .iter()
                .filter(|w| w.level == ErrorLevel::Note)
                .count();
            println!(
                "{}: ok, {} top-level nodes, {} warnings, {} notes",
                path,
                nodes.len(),
                warnings.len() - notes,
                notes
            );
        }
        Err(err) => {
            println!("{}: {}", err.level(), err);
            process::exit(1);
        }
    }
}

/// Handle the stylesheet command
fn handle_stylesheet_command(path: &str) {
    let stylesheet = style::from_path(path, ErrorLevel::Content).unwrap_or_else(|e| fail(e));
    let json = serde_json::to_string_pretty(&stylesheet).unwrap_or_else(|e| fail(e));
    println!("{}", json);
}
