//! # Baryscore CLI
//!
//! Command-line interface for the baryscore library.
//! Ranks meeting places for a group of participants.

use std::path::PathBuf;

use anyhow::{bail, Context};
use baryscore::{
    GeocoderConfig, MeetingPlanner, NominatimGeocoder, OverpassConfig, PlannerConfig, SearchConfig, Session,
    SourceConfig, TravelMode,
};
use clap::Parser;
use log::error;

mod cli;

/// Command-line interface for baryscore
#[derive(Parser)]
#[command(name = "baryscore")]
#[command(about = "Fair meeting-point finder for groups travelling by car, bike or foot")]
#[command(long_about = "Finds bars and pubs that are fair to reach for everyone:
  baryscore -p Alice=48.853,2.369 -p Bob=48.882,2.337,bike
  baryscore -a 'Alice=Place de la Bastille, Paris' -a 'Bob=Montmartre, Paris, walking'
  baryscore --session group.json --amenity cafe --limit 10

Travel times come from precomputed speed grids (routing-grid-{car,bike,foot}.json.gz)
and venues from a regional dataset (bars-france.geojson.gz), both read from --data.
Outside the dataset region venues are looked up live on Overpass.")]
#[command(version)]
struct Cli {
    /// Participant with known coordinates: NAME=LAT,LON[,MODE]
    #[arg(short, long = "participant", value_name = "NAME=LAT,LON[,MODE]")]
    participants: Vec<String>,

    /// Participant located by address: NAME=ADDRESS[,MODE]
    #[arg(short, long = "address", value_name = "NAME=ADDRESS[,MODE]")]
    addresses: Vec<String>,

    /// Load participants, mode and amenity types from a session file
    #[arg(short, long)]
    session: Option<PathBuf>,

    /// Write the resulting session back to a file
    #[arg(long)]
    save_session: Option<PathBuf>,

    /// Travel mode for participants given without one (driving, cycling, walking)
    #[arg(short, long)]
    mode: Option<String>,

    /// Amenity type to search for, repeatable (default: bar and pub)
    #[arg(long = "amenity")]
    amenities: Vec<String>,

    /// Number of venues to display
    #[arg(short = 'n', long, default_value_t = 5)]
    limit: usize,

    /// Directory or http(s) base URL holding the grids and the venue dataset
    #[arg(long, default_value = "data")]
    data: String,

    /// Overpass API interpreter endpoint
    #[arg(long, default_value = baryscore::DEFAULT_OVERPASS_URL)]
    overpass_url: String,

    /// Nominatim endpoint used for --address
    #[arg(long, default_value = baryscore::DEFAULT_NOMINATIM_URL)]
    nominatim_url: String,

    /// Print the ranking as JSON
    #[arg(long)]
    json: bool,

    /// Show what would be searched without any network or data access
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("❌ Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging to stderr
    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Stderr)
        .init();

    if cli.verbose {
        eprintln!("📍 Baryscore v{} starting...", env!("CARGO_PKG_VERSION"));
    }

    let mut session = match &cli.session {
        Some(path) => Session::load(path)
            .await
            .with_context(|| format!("cannot read session file {}", path.display()))?,
        None => Session::default(),
    };
    if let Some(mode) = &cli.mode {
        session.mode = mode.parse::<TravelMode>()?;
    }
    if !cli.amenities.is_empty() {
        session.amenity_types = cli.amenities.clone();
    }

    for spec in &cli.participants {
        let arg = cli::parse_located(spec)?;
        session.add_located(&arg.name, &arg.location.to_string(), arg.location, arg.mode)?;
    }

    let addresses = cli
        .addresses
        .iter()
        .map(String::as_str)
        .map(cli::parse_address)
        .collect::<baryscore::Result<Vec<_>>>()?;

    if cli.dry_run {
        print_dry_run(&cli, &session, &addresses);
        return Ok(());
    }

    if !addresses.is_empty() {
        let geocoder = NominatimGeocoder::new(GeocoderConfig {
            endpoint: cli.nominatim_url.clone(),
            ..Default::default()
        });
        let progress = cli::ProgressManager::new("Locating participants");
        for arg in &addresses {
            progress.set_message(&format!("Locating {}", arg.name));
            if let Err(e) = session.add_participant(&arg.name, &arg.address, arg.mode, &geocoder).await {
                progress.abandon();
                return Err(e).with_context(|| format!("cannot locate {}", arg.name));
            }
        }
        progress.abandon();
    }

    if let Some(path) = &cli.save_session {
        session
            .save(path)
            .await
            .with_context(|| format!("cannot write session file {}", path.display()))?;
    }

    if session.participants.len() < 2 {
        bail!(
            "at least 2 participants are required (got {}), use --participant, --address or --session",
            session.participants.len()
        );
    }

    let config = PlannerConfig {
        sources: SourceConfig::with_base(cli.data.clone()),
        search: SearchConfig {
            overpass: OverpassConfig {
                endpoint: cli.overpass_url.clone(),
                ..Default::default()
            },
            ..Default::default()
        },
        ..Default::default()
    };
    let planner = MeetingPlanner::new(config);

    let base_message = "Searching venues and scoring travel times";
    let progress = cli::ProgressManager::new(base_message);
    let on_retry = progress.retry_callback(base_message);
    let plan = match planner.find(&session, Some(&on_retry)).await {
        Ok(plan) => plan,
        Err(e) => {
            progress.abandon();
            return Err(e).context("meeting point search failed");
        }
    };
    progress.finish(&format!("✅ {} venues ranked", plan.venues.len()));

    if cli.json {
        let mut shown = plan.clone();
        shown.venues.truncate(cli.limit);
        println!("{}", serde_json::to_string_pretty(&shown)?);
    } else {
        print!("{}", cli::render_plan(&plan, &session.participants, cli.limit));
    }

    Ok(())
}

/// Describe the search without touching the network or the data directory
fn print_dry_run(args: &Cli, session: &Session, addresses: &[cli::AddressArg]) {
    eprintln!("🔍 [DRY RUN] Would search for {}", session.amenity_types.join(", "));
    for participant in &session.participants {
        eprintln!("   {} at {} ({})", participant.name, participant.location, participant.mode);
    }
    for arg in addresses {
        let mode = arg.mode.unwrap_or(session.mode);
        eprintln!("   {} at '{}' ({}, to be geocoded)", arg.name, arg.address, mode);
    }
    if addresses.is_empty() {
        if let Some(center) = session.search_center() {
            eprintln!("   center {center}, radius {:.0} m", session.search_radius_m());
        }
    }
    eprintln!("   data from '{}', live fallback {}", args.data, args.overpass_url);
}
