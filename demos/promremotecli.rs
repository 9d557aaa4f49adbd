// Example of converting a metric snapshot into a remote-write batch

use anyhow::Result;
use clap::{ArgAction, Parser};
use log::{error, info};
use promremote::cli::{DatapointFlag, HeaderFlag, LabelFlag, headers_map, manual_series};
use promremote::config::{AppConfig, ConfigBuilder, ENV_PREFIX};
use promremote::converter::Converter;
use promremote::report::WriteReport;
use promremote::snapshot::Snapshot;
use promremote::transport::{MemoryTransport, Transport, WriteOptions};
use promremote::util::logging;
use std::io::{self, Write};
use std::path::PathBuf;

/// Command line arguments for the promremotecli example
#[derive(Parser, Debug)]
#[command(
    name = "promremotecli",
    about = "Convert a metric snapshot and write it as remote-write time series",
    disable_help_flag = true
)]
struct Args {
    /// Remote write endpoint
    #[arg(short = 'u', long = "url")]
    url: Option<String>,

    /// Label pair to include in the datapoint, e.g. status_code:200
    #[arg(short = 't', long = "label")]
    labels: Vec<LabelFlag>,

    /// Header to set in the request, e.g. 'User-Agent: foo'
    #[arg(short = 'h', long = "header")]
    headers: Vec<HeaderFlag>,

    /// Datapoint to add as unixTimestamp,value e.g. 1556026059,14.23, or now,14.23
    #[arg(short = 'd', long = "datapoint")]
    datapoint: Option<DatapointFlag>,

    /// Path to a JSON metric snapshot
    #[arg(short = 's', long)]
    snapshot: Option<PathBuf>,

    /// Path to a configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = ConfigBuilder::<AppConfig>::new().use_defaults();
    if let Some(path) = &args.config {
        builder = builder.add_file(path);
    }
    let config = builder.add_env(ENV_PREFIX).build()?;

    logging::init(&config.log_level);

    let snapshot = match &args.snapshot {
        Some(path) => Snapshot::load(path)?,
        None => Snapshot::default(),
    };

    let converter = Converter::with_policy(config.expansion);
    let result = converter.convert_snapshot(&snapshot);

    for family in result.iter() {
        info!("metric name {}", family.name);
        for point in &family.points {
            let labels: Vec<String> = point.labels.iter().map(ToString::to_string).collect();
            info!("labels {{{}}}", labels.join(","));
            info!("datapoint {}", point.datapoint());
        }
    }

    let mut batch = result.into_flat();

    let labels: Vec<LabelFlag> = if args.labels.is_empty() {
        config.labels.iter().cloned().map(LabelFlag).collect()
    } else {
        args.labels
    };

    if let Some(datapoint) = args.datapoint {
        info!("writing datapoint {}", datapoint);
        let rendered: Vec<String> = labels.iter().map(ToString::to_string).collect();
        info!("labelled [{}]", rendered.join(" "));
        batch.push(manual_series(&labels, datapoint));
    }

    let mut headers = config.headers;
    if !args.headers.is_empty() {
        let rendered: Vec<String> = args.headers.iter().map(ToString::to_string).collect();
        info!("with headers [{}]", rendered.join(", "));
        headers.extend(headers_map(&args.headers));
    }

    let url = args.url.unwrap_or(config.write_url);
    info!("writing {} points to {}", batch.len(), url);

    // The library ships no network transport; batches are kept in memory.
    let transport = MemoryTransport::new(url);
    let outcome = transport
        .write(&batch, &WriteOptions::with_headers(headers))
        .await;

    let report = WriteReport::from_outcome(&outcome);
    println!("{}", report.to_json()?);
    io::stdout().flush()?;

    if let Err(err) = outcome {
        error!("write error: {}", err);
        std::process::exit(1);
    }

    info!("write success via {}", transport.name());
    Ok(())
}
