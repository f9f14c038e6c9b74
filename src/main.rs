use anyhow;
use clap::Parser;
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;

use dbnet::interfaces::cli::{log_heading, Cli};
use dbnet::interfaces::input::Input;
use dbnet::interfaces::InputHandle;
use dbnet::io::read_dbnet_yaml;

/// Routes the `dbnet-output` report to the terminal and, if requested, to a file. Diagnostics
/// go to standard error.
fn configure_logging(cli: &Cli) -> Result<(), anyhow::Error> {
    let report = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{m}{n}")))
        .build();
    let diagnostics = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("[{l:<5}] {t} - {m}{n}")))
        .build();
    let mut builder = Config::builder()
        .appender(Appender::builder().build("report", Box::new(report)))
        .appender(Appender::builder().build("diagnostics", Box::new(diagnostics)));
    let mut report_appenders = vec!["report"];
    if let Some(path) = cli.output.as_ref() {
        let file = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new("{m}{n}")))
            .append(false)
            .build(path)?;
        builder = builder.appender(Appender::builder().build("report_file", Box::new(file)));
        report_appenders.push("report_file");
    }
    let level = if cli.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let config = builder
        .logger(
            Logger::builder()
                .appenders(report_appenders)
                .additive(false)
                .build("dbnet-output", LevelFilter::Info),
        )
        .build(Root::builder().appender("diagnostics").build(level))?;
    log4rs::init_config(config)?;
    Ok(())
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    configure_logging(&cli)?;
    log_heading();
    let input = if let Some(path) = cli.config.as_ref() {
        read_dbnet_yaml::<Input, _>(path)?
    } else {
        log::warn!("No configuration file given. The default simple cubic system is used.");
        Input::default()
    };
    input.handle()
}
