use anyhow::{Context, Result};
use clap::Parser;
use ride_sim_core::route::TripIdentifier;
use ride_sim_core::{Money, PlaybackConfig, PlaybackStatus, Player, PositionSink};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod journal;
mod route_file;
mod script;

use journal::JsonLinesJournal;
use route_file::read_route;
use script::PauseScript;

#[derive(Parser, Debug)]
#[command(
    name = "trip-replay",
    author,
    version,
    about = "Replay a GeoJSON route through the playback engine",
    long_about = "Walks a vehicle along the first line of a GeoJSON file, one waypoint per \
                  simulated second, and prints every trip update as a JSON line on stdout.\n\n\
                  An optional scripted pause exercises the waiting surcharge. Logs go to \
                  stderr so stdout stays machine readable."
)]
struct Args {
    /// Route GeoJSON file (LineString, Feature or FeatureCollection)
    #[arg(short, long)]
    route: PathBuf,

    /// Base fare in major currency units (defaults to a quote from the fare schedule)
    #[arg(long)]
    base_fare: Option<f64>,

    /// Wall-clock milliseconds per simulated second (overrides the config file)
    #[arg(long)]
    period_ms: Option<u64>,

    /// Pause once the vehicle reaches this waypoint index
    #[arg(long)]
    pause_at: Option<usize>,

    /// How many simulated seconds to stay paused
    #[arg(long, default_value = "45")]
    pause_for: u32,

    /// Playback config JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Trip identifier written into every update
    #[arg(long, default_value = "replay")]
    trip_id: String,

    /// Verbose output (show debug messages)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => PlaybackConfig::default(),
    };
    if let Some(period_ms) = args.period_ms {
        config.tick_period_ms = period_ms;
    }

    // Phase 1: Load route
    let route = Arc::new(read_route(&args.route)?);
    info!(
        waypoints = route.waypoint_count(),
        path_length_m = route.path_length_m(),
        "loaded route from {}",
        args.route.display()
    );

    // One tick per segment, so the simulated duration equals the route length
    let base_fare = match args.base_fare {
        Some(amount) => Money::from_major(amount),
        None => config.fare.quote(route.path_length_m(), route.length() as f64),
    };
    info!(%base_fare, "base fare");

    // Phase 2: Wire up the player
    let (sink, delivery) = PositionSink::spawn(
        TripIdentifier::new(&args.trip_id),
        Arc::new(JsonLinesJournal::stdout()),
        config.persist_timeout(),
    );

    let player = Player::from_config(&config, base_fare);
    player.set_route(route);

    let (update_tx, mut updates) = mpsc::unbounded_channel();
    player.with_controller(|controller| {
        sink.attach(controller);
        controller.on_update(move |update| {
            let _ = update_tx.send(*update);
        });
    });

    // Phase 3: Play
    player.start().context("Failed to start playback")?;

    let mut script = PauseScript::new(args.pause_at, args.pause_for);
    let mut resume_task = None;
    let final_status = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                warn!("interrupted, stopping playback");
                player.stop();
                break PlaybackStatus::Stopped;
            }
            update = updates.recv() => {
                let Some(update) = update else {
                    break player.state().status;
                };
                debug!(cursor = update.cursor, status = %update.status, fare = %update.fare, "update");

                if matches!(update.status, PlaybackStatus::Completed | PlaybackStatus::Stopped) {
                    break update.status;
                }

                if player.with_controller(|controller| script.apply(controller)) {
                    info!(cursor = player.state().cursor, seconds = script.seconds(), "pausing");

                    let hold = player.period() * script.seconds();
                    let resumer = player.clone();
                    resume_task = Some(tokio::spawn(async move {
                        tokio::time::sleep(hold).await;
                        resumer.resume();
                    }));
                }
            }
        }
    };

    if let Some(task) = resume_task {
        task.abort();
    }

    let fare = player.fare();
    let cursor = player.state().cursor;

    // Dropping the last player handle releases the sink so delivery can drain
    drop(player);
    let stats = delivery.await.context("Persistence task failed")?;

    info!(
        status = %final_status,
        delivered = stats.delivered,
        failed = stats.failed,
        "playback finished"
    );

    let summary = serde_json::json!({
        "summary": {
            "status": final_status,
            "cursor": cursor,
            "base_fare": fare.base_fare,
            "accrued_surcharge": fare.accrued_surcharge,
            "fare": fare.base_fare + fare.accrued_surcharge,
            "delivered": stats.delivered,
            "failed": stats.failed,
        }
    });
    println!("{summary}");

    Ok(())
}

fn read_config(path: &Path) -> Result<PlaybackConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_json::from_str(&content).with_context(|| format!("Invalid playback config: {}", path.display()))
}
