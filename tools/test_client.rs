//! Test Ride Client
//!
//! Generates random rides and posts them to a running prediction service.
//!
//! Usage: test-client [url] [count] [long_trip_rate] [delay_ms]
//!
//! Built only with `--features tools`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Ride structure matching the service's expected format
#[derive(Debug, Clone, Serialize)]
struct Ride {
    #[serde(rename = "PULocationID")]
    pu_location_id: u32,
    #[serde(rename = "DOLocationID")]
    do_location_id: u32,
    trip_distance: f64,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    duration: f64,
}

/// Ride generator for testing
struct RideGenerator {
    rng: rand::rngs::ThreadRng,
}

impl RideGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    /// Short hop within or between neighbouring zones
    fn generate_short(&mut self) -> Ride {
        let pickup = self.rng.gen_range(1..=263);
        Ride {
            pu_location_id: pickup,
            do_location_id: (pickup + self.rng.gen_range(0..5)).min(263),
            trip_distance: (self.rng.gen_range(0.3..4.0_f64) * 100.0).round() / 100.0,
        }
    }

    /// Cross-borough or airport trip
    fn generate_long(&mut self) -> Ride {
        let airports = [1, 132, 138];
        Ride {
            pu_location_id: self.rng.gen_range(1..=263),
            do_location_id: airports[self.rng.gen_range(0..airports.len())],
            trip_distance: (self.rng.gen_range(8.0..30.0_f64) * 100.0).round() / 100.0,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_client=info".parse()?),
        )
        .init();

    info!("Starting Test Ride Client");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let base_url = args
        .get(1)
        .map(|s| s.trim_end_matches('/'))
        .unwrap_or("http://localhost:9696");
    let count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(100);
    let long_trip_rate: f64 = args
        .get(3)
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.2)
        .clamp(0.0, 1.0);
    let delay_ms: u64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        url = %base_url,
        count = count,
        long_trip_rate = long_trip_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;
    let predict_url = format!("{}/predict", base_url);

    let mut generator = RideGenerator::new();
    let mut rng = rand::thread_rng();

    let mut succeeded = 0u64;
    let mut failed = 0u64;
    let mut total_duration = 0.0;

    for i in 0..count {
        let ride = if rng.gen_bool(long_trip_rate) {
            generator.generate_long()
        } else {
            generator.generate_short()
        };

        match client.post(&predict_url).json(&ride).send().await {
            Ok(response) if response.status().is_success() => {
                let prediction: Prediction = response.json().await?;
                succeeded += 1;
                total_duration += prediction.duration;
            }
            Ok(response) => {
                failed += 1;
                warn!(status = %response.status(), ride = ?ride, "Prediction rejected");
            }
            Err(e) => {
                failed += 1;
                warn!(error = %e, "Request failed");
            }
        }

        if (i + 1) % 10 == 0 {
            info!(
                "Sent {}/{} rides ({} succeeded, {} failed)",
                i + 1,
                count,
                succeeded,
                failed
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    let mean_duration = if succeeded > 0 {
        total_duration / succeeded as f64
    } else {
        0.0
    };
    info!(
        "Completed! Sent {} rides ({} succeeded, {} failed), mean predicted duration {:.1} min",
        count, succeeded, failed, mean_duration
    );

    Ok(())
}
