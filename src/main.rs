/*!
# rctclient

Command line interface for RCT Power inverters.

## Usage

### Read a value
```bash
rctclient read-value --host 192.168.0.10 --name battery.soc
rctclient read-value --host 192.168.0.10 --id 0x959930BF --verbose
```

### Run the simulator
```bash
rctclient simulator --host 0.0.0.0 --port 8899
```

### Shell completion of object names
```bash
rctclient complete battery.
```

Values go to stdout, logs to stderr.
*/

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rctclient::{Client, Reading, Registry, Simulator, Target, DEFAULT_PORT};

#[derive(Parser)]
#[command(name = "rctclient")]
#[command(about = "Read values from RCT Power inverters")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a read request and print the value
    #[command(group(ArgGroup::new("target").required(true).args(["id", "name"])))]
    ReadValue {
        /// Host to connect to (IP or hostname)
        #[arg(long)]
        host: String,

        /// Port to connect to
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Object ID to query, of the form "0xXXXX"
        #[arg(short, long, value_name = "ID")]
        id: Option<String>,

        /// Object name to query
        #[arg(short, long, value_name = "NAME")]
        name: Option<String>,

        /// Seconds to wait for response data
        #[arg(short, long, default_value_t = 2.0)]
        timeout: f64,

        /// JSON object table to use instead of the built-in one
        #[arg(short, long)]
        registry: Option<PathBuf>,

        /// Print index, ID, name, description and unit along with the value
        #[arg(short, long, conflicts_with = "json")]
        verbose: bool,

        /// Print the reading as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a simulator answering read requests
    Simulator {
        /// Address to bind to
        #[arg(long, default_value = "localhost")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// JSON object table to use instead of the built-in one
        #[arg(short, long)]
        registry: Option<PathBuf>,
    },

    /// Print object names starting with a prefix
    Complete {
        /// Start of the name, empty for all
        #[arg(default_value = "")]
        partial: String,

        /// JSON object table to use instead of the built-in one
        #[arg(short, long)]
        registry: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logging to stderr keeps stdout clean for values
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    if let Err(e) = run(cli.command).await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::ReadValue {
            host,
            port,
            id,
            name,
            timeout,
            registry,
            verbose,
            json,
        } => {
            let target = Target::from_options(id.as_deref(), name.as_deref())?;
            let timeout = Duration::try_from_secs_f64(timeout)
                .with_context(|| format!("Invalid timeout: {}", timeout))?;

            let client = Client::builder()
                .host(host)
                .port(port)
                .timeout(timeout)
                .registry(load_registry(registry.as_ref())?)
                .build();

            let reading = client.read(&target).await?;
            if json {
                println!("{}", serde_json::to_string(&reading)?);
            } else if verbose {
                println!("{}", format_verbose(&reading, client.registry().max_name_width()));
            } else {
                println!("{}", reading.value);
            }
            Ok(())
        }

        Commands::Simulator {
            host,
            port,
            registry,
        } => {
            let simulator = Simulator::bind(&host, port, load_registry(registry.as_ref())?).await?;
            tracing::info!("Press Ctrl+C to stop");

            simulator
                .run_until(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!("Failed to listen for Ctrl+C: {}", e);
                    }
                })
                .await?;
            Ok(())
        }

        Commands::Complete { partial, registry } => {
            let registry = load_registry(registry.as_ref())?;
            for name in registry.prefix_complete(&partial) {
                println!("{}", name);
            }
            Ok(())
        }
    }
}

fn load_registry(path: Option<&PathBuf>) -> Result<Arc<Registry>> {
    let registry = match path {
        Some(path) => Registry::from_json_file(path)
            .with_context(|| format!("Failed to load registry from {}", path.display()))?,
        None => Registry::builtin(),
    };
    Ok(Arc::new(registry))
}

fn format_verbose(reading: &Reading, name_width: usize) -> String {
    let descriptor = &reading.descriptor;
    format!(
        "#{:3} 0x{:8X} {:name_width$} {:75} {} {}",
        descriptor.index,
        descriptor.object_id,
        descriptor.name,
        descriptor.description.as_deref().unwrap_or(""),
        reading.value,
        descriptor.unit.as_deref().unwrap_or(""),
        name_width = name_width,
    )
}
