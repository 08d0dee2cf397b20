//! Query demo - reads a few objects from a local simulator.
//!
//! This example demonstrates:
//! - Starting the simulator on an ephemeral port
//! - Building a client with the builder pattern
//! - Querying by name and by ID
//!
//! ```bash
//! cargo run --example query
//! ```

use std::sync::Arc;
use std::time::Duration;

use rctclient::{Client, Registry, Simulator, Target};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let registry = Arc::new(Registry::builtin());

    // Start the simulator in the background
    let simulator = Simulator::bind("127.0.0.1", 0, registry.clone()).await?;
    let address = simulator.local_addr()?;
    tokio::spawn(simulator.run());

    let client = Client::builder()
        .host("127.0.0.1")
        .port(address.port())
        .timeout(Duration::from_secs(1))
        .registry(registry)
        .build();

    for target in [
        Target::Name("battery.soc".to_string()),
        Target::Name("inverter_sn".to_string()),
        Target::Id(0x1C4A665F),
    ] {
        let reading = client.read(&target).await?;
        println!(
            "{:40} {} {}",
            reading.descriptor.name,
            reading.value,
            reading.descriptor.unit.as_deref().unwrap_or("")
        );
    }

    Ok(())
}
