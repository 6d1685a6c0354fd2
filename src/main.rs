//! Punto de entrada ("driver").
//!
//! Este módulo expone una CLI sobre [`pinsc::artifact::build()`].

use anyhow::{self, Context};
use clap::{self, crate_version, value_parser, Arg, ArgAction, Command};
use log::{info, LevelFilter};
use pinsc::artifact::{self, Options};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    // Parsing de CLI
    let args = Command::new("pinsc")
        .version(crate_version!())
        .about("Converts JSON pin manifests to C source and header files")
        .arg(
            Arg::new("manifest")
                .value_name("MANIFEST")
                .takes_value(true)
                .multiple_values(true)
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Input pin manifests"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .takes_value(true)
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Output path; extension is replaced by .c and .h"),
        )
        .arg(
            Arg::new("signals")
                .short('s')
                .long("signals")
                .takes_value(true)
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Signal manifest for pin-to-signal references"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::Count)
                .help("More logging, may be repeated"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose")
                .help("Log warnings and errors only"),
        )
        .get_matches();

    let level = match (args.get_flag("quiet"), args.get_count("verbose")) {
        (true, _) => LevelFilter::Warn,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    };

    TermLogger::init(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto)
        .context("Failed to initialize logger")?;

    // Se extraen argumentos necesarios
    let options = Options {
        inputs: args
            .get_many::<PathBuf>("manifest")
            .into_iter()
            .flatten()
            .cloned()
            .collect(),

        signals: args.get_one::<PathBuf>("signals").cloned(),
        output: args.get_one::<PathBuf>("output").cloned(),
    };

    let report = artifact::build(&options).context("Compilation failed")?;
    info!(
        "Done with {} warnings: {}, {}",
        report.warnings.len(),
        report.paths.source.display(),
        report.paths.header.display()
    );

    Ok(())
}
