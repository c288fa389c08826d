//! Tracelab client driver
//!
//! Fans out concurrent traced requests against the server. Any transport or
//! decode failure aborts the run; there is no retry and no isolation between
//! workers (deliberate, to keep the demo's failure behavior obvious).

use clap::Parser;
use tracelab::client::{Driver, RequestMethod};
use tracelab::config::{ClientConfig, TracerConfig};
use tracelab::trace::init_telemetry;
use tracing::{info, warn};

/// Tracelab client - concurrent traced request driver
#[derive(Parser, Debug)]
#[command(name = "tracelab-client")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of requests to make to each selected method
    #[arg(short, long, default_value_t = 0)]
    iterations: usize,

    /// Comma-separated methods to call: makeRequest, makeRequestWithContext.
    /// Unrecognized names are ignored.
    #[arg(short, long, default_value = "")]
    methods: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let tracer_config = TracerConfig::from_env("tracelab-client")?;
    let _telemetry = init_telemetry(&tracer_config)?;

    let methods = RequestMethod::parse_list(&args.methods);
    if methods.is_empty() {
        warn!(methods = %args.methods, "no recognized methods selected, nothing to do");
    }

    let config = ClientConfig::from_env()?;
    let driver = Driver::new(config)?;
    driver.run(args.iterations, &methods).await?;

    info!("Done!");
    Ok(())
}
