use anyhow::{Context, Result};
use clap::{App, AppSettings, Arg, ArgMatches};
use datalake_core::config::DatalakeConfigProperties;
use datalake_core::{Metadata, RecordFactory};
use std::io::{self, Write};
use tracing::Level;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    match main_processor().await {
        Ok(()) => info!("Exiting successfully."),
        Err(err) => {
            error!("Exiting with error: {:?}", err);
            std::process::exit(1);
        },
    }
}

async fn main_processor() -> Result<()> {
    let matches = App::new("datalake")
        .version("0.1")
        .author("Seb Ospina <kraige@gmail.com>")
        .about("Index datalake files by time bucket")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .takes_value(true)
                .help("Sets the .properties config file to use"),
        )
        .arg(
            Arg::new("verbosity_level")
                .short('v')
                .takes_value(true)
                .default_value("warn")
                .help("Sets the level of verbosity"),
        )
        .arg(
            Arg::new("override")
                .short('o')
                .takes_value(true)
                .multiple_occurrences(true)
                .help("Override properties defined in the config file, as key=value"),
        )
        .subcommand(
            App::new("buckets")
                .about("Prints the time buckets overlapped by an interval in epoch milliseconds")
                .arg(Arg::new("START").required(true).index(1))
                .arg(Arg::new("END").index(2)),
        )
        .subcommand(
            App::new("records")
                .about("Prints the index records of a datalake file as JSON lines")
                .arg(Arg::new("URL").required(true).index(1))
                .arg(
                    Arg::new("metadata")
                        .short('m')
                        .long("metadata")
                        .takes_value(true)
                        .help("JSON metadata of the file, fetched from storage when absent"),
                ),
        )
        .subcommand(
            App::new("config-names")
                .about("Prints the known configuration keys with their importance, value and doc"),
        )
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .get_matches();

    let verbosity = matches.value_of("verbosity_level").unwrap_or("warn");
    let subscriber = FmtSubscriber::builder()
        .with_max_level(verbosity.parse::<Level>().context("Invalid verbosity level")?)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let mut config_properties = match matches.value_of("config") {
        Some(config_file) => {
            debug!("Using input file: {}", config_file);
            DatalakeConfigProperties::read_config_file(config_file)
                .with_context(|| format!("Unable to use config file {}", config_file))?
        },
        None => DatalakeConfigProperties::default(),
    };
    if let Some(property_overrides) = matches.values_of("override") {
        for override_property in property_overrides {
            match override_property.split_once('=') {
                Some((property_name, property_value)) => {
                    config_properties.try_set_property(property_name, property_value)?
                },
                None => anyhow::bail!("Invalid override '{}', expected key=value", override_property),
            }
        }
    }
    let config = config_properties.build()?;
    let factory = RecordFactory::from_config(&config)?;
    debug!("Using {:?}", factory);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match matches.subcommand() {
        Some(("buckets", sub_matches)) => print_buckets(&factory, sub_matches, &mut out)?,
        Some(("records", sub_matches)) => print_records(&factory, sub_matches, &mut out).await?,
        Some(("config-names", _)) => {
            for line in config_properties.describe() {
                writeln!(out, "{}", line)?;
            }
        },
        _ => unreachable!("a subcommand is required"),
    }
    Ok(())
}

fn print_buckets(factory: &RecordFactory, matches: &ArgMatches, out: &mut impl Write) -> Result<()> {
    let start = matches.value_of_t::<u64>("START")?;
    let end = match matches.value_of("END") {
        Some(end) => Some(end.parse::<u64>().context("END must be epoch milliseconds")?),
        None => None,
    };
    for bucket in factory.indexer().compute_buckets(start, end)? {
        writeln!(out, "{}", bucket)?;
    }
    Ok(())
}

async fn print_records(
    factory: &RecordFactory,
    matches: &ArgMatches,
    out: &mut impl Write,
) -> Result<()> {
    let url = matches.value_of("URL").unwrap_or_default();
    let records = match matches.value_of("metadata") {
        Some(metadata) => {
            let metadata = Metadata::from_json_slice(metadata.as_bytes())
                .context("Invalid metadata document")?;
            factory.list_from_metadata(url, &metadata)?
        },
        None => factory.list_from_url(url).await?,
    };
    for record in records {
        writeln!(out, "{}", serde_json::to_string(&record)?)?;
    }
    Ok(())
}
