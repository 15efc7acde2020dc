use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use valet_db::DayExtras;

use valet_cli::commands::util::DaySource;
use valet_cli::commands::{audit, init, note, publish, report, settings, tags, track};
use valet_cli::{Cli, Commands, Config};

fn run<W: Write>(out: &mut W, cli: &Cli, config: &Config) -> Result<()> {
    let source = DaySource::resolve(config, cli.date, cli.file.as_deref());
    tracing::debug!(path = %source.path.display(), "datafile");

    match &cli.command {
        Some(Commands::Init) => init::run(out, &source, config)?,
        Some(Commands::In { tag, time }) => track::check_in(out, &source, config, tag, time)?,
        Some(Commands::Out { tag, time }) => track::check_out(out, &source, config, tag, time)?,
        Some(Commands::Edit { tag, which, time }) => {
            track::edit(out, &source, config, tag, (*which).into(), time)?;
        }
        Some(Commands::Delete { tag, what }) => {
            track::delete(out, &source, config, tag, (*what).into())?;
        }
        Some(Commands::Query { tags: list, as_of }) => {
            tags::query(out, &source, config, list, as_of.as_deref())?;
        }
        Some(Commands::Lint { strict }) => note::lint(out, &source, *strict)?,
        Some(Commands::Retire { tag }) => tags::retire(out, &source, config, tag)?,
        Some(Commands::Unretire { tag }) => tags::unretire(out, &source, config, tag)?,
        Some(Commands::Registrations { change }) => {
            settings::registrations(out, &source, config, change.as_deref())?;
        }
        Some(Commands::Hours { open, closed }) => {
            settings::hours(out, &source, config, open.as_deref().zip(closed.as_deref()))?;
        }
        Some(Commands::Note { text }) => note::note(out, &source, config, text)?,
        Some(Commands::Audit {
            as_of,
            leftover,
            returns,
        }) => audit::run(out, &source, config, as_of.as_deref(), *leftover, *returns)?,
        Some(Commands::Report { as_of }) => report::report(out, &source, config, as_of.as_deref())?,
        Some(Commands::Blocks { as_of, json }) => {
            report::blocks(out, &source, config, as_of.as_deref(), *json)?;
        }
        Some(Commands::Moments { as_of, json }) => {
            report::moments(out, &source, config, as_of.as_deref(), *json)?;
        }
        Some(Commands::Publish {
            leftover,
            precipitation,
            temperature,
        }) => {
            let extras = DayExtras {
                precipitation: *precipitation,
                temperature: *temperature,
            };
            publish::publish(out, &source, config, *leftover, extras)?;
        }
        Some(Commands::History { json }) => publish::history(out, config, *json)?,
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(&mut out, &cli, &config)
}
