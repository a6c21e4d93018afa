//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

mod config;
mod error;

use std::time::Duration;

use clap::{App, Arg, ArgMatches};
use config::{Config, LoggingFileRotation, LoggingFmt, LoggingFmtStyle};
use conv_telemetry::check::state_ok;
use conv_telemetry::{ExpectedState, JsonFileSource};
use conv_utils::error::with_source;
use conv_utils::poll::{PollError, PollPolicy, wait_for};
use error::Error;
use tracing::info;
use tracing_appender::rolling;
use tracing_subscriber::Layer;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

const EXIT_CONVERGED: i32 = 0;
const EXIT_TIMEOUT: i32 = 1;
const EXIT_READ_ERROR: i32 = 2;
const EXIT_INVALID_INPUT: i32 = 3;

fn init_tracing(config: &config::Logging) {
    // Enable logging to a file.
    let file = config.file.enabled.then(|| {
        let file_appender = match config.file.rotation {
            LoggingFileRotation::Never => {
                rolling::never(&config.file.dir, &config.file.name)
            }
            LoggingFileRotation::Hourly => {
                rolling::hourly(&config.file.dir, &config.file.name)
            }
            LoggingFileRotation::Daily => {
                rolling::daily(&config.file.dir, &config.file.name)
            }
        };
        fmt_layer(&config.file.fmt, file_appender)
    });

    // Enable logging to stdout.
    let stdout = config
        .stdout
        .enabled
        .then(|| fmt_layer(&config.stdout.fmt, std::io::stdout));

    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive("conv=debug".parse().unwrap())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(env_filter)
        .with(file)
        .with(stdout)
        .init();
}

fn fmt_layer<S, W>(
    fmt: &LoggingFmt,
    writer: W,
) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(false)
        .with_thread_ids(fmt.show_thread_id)
        .with_file(fmt.show_source)
        .with_line_number(fmt.show_source)
        .with_ansi(fmt.colors);
    match fmt.style {
        LoggingFmtStyle::Compact => layer.compact().boxed(),
        LoggingFmtStyle::Full => layer.boxed(),
        LoggingFmtStyle::Json => layer.json().boxed(),
        LoggingFmtStyle::Pretty => layer.pretty().boxed(),
    }
}

fn app() -> App<'static, 'static> {
    App::new("Telemetry convergence waiter")
        .version(clap::crate_version!())
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("file")
                .help("Specify an alternative configuration file."),
        )
        .arg(
            Arg::with_name("snapshot")
                .short("s")
                .long("snapshot")
                .value_name("file")
                .help("JSON telemetry snapshot, re-read on every attempt.")
                .required(true),
        )
        .arg(
            Arg::with_name("expected")
                .short("e")
                .long("expected")
                .value_name("file")
                .help("TOML file describing the expected state.")
                .required(true),
        )
        .arg(
            Arg::with_name("interval-ms")
                .long("interval-ms")
                .value_name("millis")
                .help("Time to sleep between two attempts."),
        )
        .arg(
            Arg::with_name("timeout-ms")
                .long("timeout-ms")
                .value_name("millis")
                .help("Maximum time to wait."),
        )
        .arg(
            Arg::with_name("condition")
                .long("condition")
                .value_name("label")
                .help("Label used in log messages."),
        )
}

// Command-line overrides take precedence over the configuration file.
fn poll_policy(
    matches: &ArgMatches<'_>,
    mut policy: PollPolicy,
) -> Result<PollPolicy, Error> {
    if let Some(interval) = duration_arg(matches, "interval-ms")? {
        policy = policy.with_interval(interval);
    }
    if let Some(timeout) = duration_arg(matches, "timeout-ms")? {
        policy = policy.with_timeout(timeout);
    }
    Ok(policy)
}

fn duration_arg(
    matches: &ArgMatches<'_>,
    name: &'static str,
) -> Result<Option<Duration>, Error> {
    let Some(value) = matches.value_of(name) else {
        return Ok(None);
    };
    value
        .parse::<u64>()
        .map(|millis| Some(Duration::from_millis(millis)))
        .map_err(|_| Error::InvalidArgument {
            name,
            value: value.to_owned(),
        })
}

fn load_expected(path: &str) -> Result<ExpectedState, Error> {
    let data =
        std::fs::read_to_string(path).map_err(|error| Error::ReadFile {
            path: path.to_owned(),
            error,
        })?;
    toml::from_str(&data).map_err(|error| Error::ParseToml {
        path: path.to_owned(),
        error,
    })
}

fn exit_code<E>(result: &Result<(), PollError<E>>) -> i32 {
    match result {
        Ok(()) => EXIT_CONVERGED,
        Err(PollError::Timeout { .. }) => EXIT_TIMEOUT,
        Err(PollError::Predicate { .. }) => EXIT_READ_ERROR,
    }
}

// Waits for the snapshot to converge, returning the process exit code.
fn run(matches: &ArgMatches<'_>, policy: PollPolicy) -> i32 {
    // Load poll policy and expected state.
    let input = poll_policy(matches, policy).and_then(|policy| {
        let expected = load_expected(matches.value_of("expected").unwrap())?;
        Ok((policy, expected))
    });
    let (policy, expected) = match input {
        Ok(input) => input,
        Err(error) => {
            eprintln!("{}", with_source(&error));
            return EXIT_INVALID_INPUT;
        }
    };
    if expected.is_empty() {
        info!("nothing to wait for");
        return EXIT_CONVERGED;
    }

    let source = JsonFileSource::new(matches.value_of("snapshot").unwrap());
    let condition = matches
        .value_of("condition")
        .unwrap_or("telemetry convergence");
    info!(
        %condition,
        interval = ?policy.interval,
        timeout = ?policy.timeout,
        "waiting"
    );

    let result =
        wait_for(condition, policy, || state_ok(&source, &expected));
    if let Err(error) = &result {
        error.log();
    }
    exit_code(&result)
}

// ===== main =====

fn main() {
    // Parse command-line parameters.
    let matches = app().get_matches();

    // Read configuration file.
    let config_file = matches.value_of("config");
    let config = match Config::load(config_file) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("{}", with_source(&error));
            std::process::exit(EXIT_INVALID_INPUT);
        }
    };

    // Initialize tracing.
    init_tracing(&config.logging);

    std::process::exit(run(&matches, config.poll));
}

// ===== unit tests =====
