//! Probe CLI for WMS GetMap endpoints.
//!
//! Generates web-map-service requests with varying bounding boxes and
//! collects their response data; response times are measured in seconds.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use wms_common::{BboxParseError, BoundingBox, WmsEndpoint};
use wms_probe::{
    build_batch, capabilities, DispatchEngine, GeneratorTuning, HttpTransportFactory, LineSink,
    OutputFormat, ProbeConfig, SummaryReport, TestClass,
};

#[derive(Parser, Debug)]
#[command(name = "wms-probe")]
#[command(about = "Generates web-map-service (WMS) requests and collects their response data")]
#[command(after_help = "Example:\n  wms-probe --host maps.example.org --path /geoserver/wms \\\n    --width 768 --height 384 --tests random walking --count 16 --threads 4 \\\n    osm:roads osm:buildings")]
struct Args {
    /// Produce more debugging output (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Host name of the WMS server
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Port of the WMS server
    #[arg(long, default_value_t = 7600)]
    port: u16,

    /// Service path of the WMS
    #[arg(long, default_value = "/wms")]
    path: String,

    /// Format of the per-request output
    #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
    output_format: OutputFormat,

    /// Path to a file where the output is stored (suppresses console output)
    #[arg(long)]
    output_file: Option<PathBuf>,

    /// Separator for CSV output
    #[arg(long, default_value = ";")]
    csv_separator: String,

    /// Width of the requested maps in pixels
    #[arg(long)]
    width: u32,

    /// Height of the requested maps in pixels
    #[arg(long)]
    height: u32,

    /// Do not send requests, only output them
    #[arg(long)]
    dry_run: bool,

    /// Test classes to run
    #[arg(long = "tests", value_enum, num_args = 1.., default_values_t = vec![TestClass::Random])]
    tests: Vec<TestClass>,

    /// Number of test repetitions per class and layer
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    count: u32,

    /// Number of simultaneous tests
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    threads: u32,

    /// Spatial extent containing all generated boxes, as "minx,miny,maxx,maxy"
    #[arg(long, value_parser = parse_extent, default_value = "-180,-90,180,90")]
    extent: BoundingBox,

    /// Minimum width of a generated box
    #[arg(long, default_value_t = 1.0)]
    min_width: f64,

    /// Minimum height of a generated box
    #[arg(long, default_value_t = 1.0)]
    min_height: f64,

    /// Maximum number of fractional digits in generated coordinates
    #[arg(long, default_value_t = 3)]
    max_fractional_digits: u32,

    /// Minimum step width of the walking test
    #[arg(long, default_value_t = 1.0)]
    min_step: f64,

    /// Maximum step width of the walking test
    #[arg(long, default_value_t = 12.0)]
    max_step: f64,

    /// Minimum zoom step of the zooming test
    #[arg(long, default_value_t = 5.0)]
    min_box_width: f64,

    /// Maximum zoom step of the zooming test
    #[arg(long, default_value_t = 180.0)]
    max_box_width: f64,

    /// RNG seed for reproducible box sequences
    #[arg(long)]
    seed: Option<u64>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Verify the requested layers against GetCapabilities before testing
    #[arg(long)]
    check_layers: bool,

    /// Print the end-of-run summary as JSON instead of a table
    #[arg(long)]
    json_summary: bool,

    /// Layer names to be tested against each other
    #[arg(required = true)]
    layers: Vec<String>,
}

fn parse_extent(s: &str) -> Result<BoundingBox, BboxParseError> {
    BoundingBox::from_wms_string(s)
}

fn init_tracing(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose)?;

    let config = ProbeConfig {
        endpoint: WmsEndpoint::new(&args.host, args.port, &args.path),
        layers: args.layers.clone(),
        width: args.width,
        height: args.height,
        test_classes: args.tests.clone(),
        count: args.count,
        workers: args.threads,
        dry_run: args.dry_run,
        extent: args.extent,
        tuning: GeneratorTuning {
            min_width: args.min_width,
            min_height: args.min_height,
            max_fractional_digits: args.max_fractional_digits,
            min_step: args.min_step,
            max_step: args.max_step,
            min_box_width: args.min_box_width,
            max_box_width: args.max_box_width,
        },
        seed: args.seed,
        extra_params: Vec::new(),
    };
    config.validate()?;

    if args.check_layers && !config.dry_run {
        let advertised = capabilities::query_layer_names(&config.endpoint)
            .await
            .context("GetCapabilities query failed")?;
        for layer in &config.layers {
            if !advertised.iter().any(|name| name == layer) {
                bail!("layer '{}' is not advertised by {}", layer, config.endpoint);
            }
        }
        info!(layers = config.layers.len(), "all requested layers advertised");
    }

    info!("initializing tests");
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let tests = build_batch(&config, &mut rng);
    info!(tests = tests.len(), "batch built");

    let mut sink = match &args.output_file {
        Some(path) => LineSink::to_file(path, args.output_format, &args.csv_separator)
            .with_context(|| format!("cannot open output file {}", path.display()))?,
        None => LineSink::to_stdout(args.output_format, &args.csv_separator),
    };
    if args.verbose > 0 && !config.dry_run {
        sink = sink.with_progress(tests.len() as u64);
    }

    let factory = Arc::new(HttpTransportFactory::new(Duration::from_secs(args.timeout)));
    let engine = DispatchEngine::new(factory, config.workers as usize, config.dry_run);
    engine.run(tests, &mut sink).await?;

    let summary = sink.finish(config.layers.clone(), config.workers);
    if !config.dry_run {
        if args.json_summary {
            println!("{}", SummaryReport::format_json(&summary)?);
        } else if args.verbose > 0 {
            println!("{}", SummaryReport::format_table(&summary));
        }
    }

    Ok(())
}
