use clap::{Arg, ArgAction, Command, ValueHint};
use clap_complete::{generate_to, shells::*};
use std::env;
use std::io::Error;

// Mirror of the registry's built-in formats
// Build scripts can't access the crate's dependencies at build time
const FORMATS: &[&str] = &["usfm", "toolbox", "json", "tree"];

fn main() -> Result<(), Error> {
    let outdir = match env::var_os("OUT_DIR") {
        None => return Ok(()),
        Some(outdir) => outdir,
    };

    let format_arg = |name: &'static str, help: &'static str| {
        Arg::new(name)
            .long(name)
            .help(help)
            .value_parser(clap::builder::PossibleValuesParser::new(FORMATS))
            .value_hint(ValueHint::Other)
    };

    let mut cmd = Command::new("sfm")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert and inspect Standard Format Marker Scripture files")
        .arg(
            Arg::new("config")
                .long("config")
                .help("Path to an sfm.toml configuration file")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_parser(["pretty", "compact", "json"])
                .global(true),
        )
        .arg(
            Arg::new("list-formats")
                .long("list-formats")
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("convert")
                .arg(
                    Arg::new("input")
                        .required(true)
                        .num_args(1..)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(format_arg("from", "Source format"))
                .arg(format_arg("to", "Target format").required(true))
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("inspect")
                .arg(Arg::new("path").required(true).value_hint(ValueHint::FilePath))
                .arg(format_arg("from", "Source format"))
                .arg(Arg::new("report").long("report").action(ArgAction::SetTrue)),
        )
        .subcommand(
            Command::new("styles").arg(Arg::new("json").long("json").action(ArgAction::SetTrue)),
        );

    generate_to(Bash, &mut cmd, "sfm", &outdir)?;
    generate_to(Zsh, &mut cmd, "sfm", &outdir)?;
    generate_to(Fish, &mut cmd, "sfm", &outdir)?;

    println!("cargo:warning=Shell completions generated in {outdir:?}");

    Ok(())
}
