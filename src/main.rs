use clap::Parser;
use festival_organiser::app::render::{describe_state, write_movies};
use festival_organiser::config::Settings;
use festival_organiser::utils::{logger, validation::Validate};
use festival_organiser::{
    build_default_filters, CliConfig, FetchConfig, FetchOrchestrator, FetchOutcome, FilterDefaults,
    FilterSet, HttpMovieSearch, OrganiserError,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting festival-organiser");
    tracing::debug!("CLI config: {:?}", cli);

    let settings = match cli.resolve().and_then(|s| s.validate().map(|_| s)) {
        Ok(settings) => settings,
        Err(e) => exit_with_config_error(e),
    };

    if settings.wishlist_id.is_empty() {
        tracing::warn!("No wishlist id given; sending an empty one");
    }

    // Taken once; "end of today" is not re-evaluated for the rest of the run.
    let defaults = FilterDefaults::snapshot();
    let search = match HttpMovieSearch::from_config(&settings) {
        Ok(search) => search,
        Err(e) => exit_with_config_error(e),
    };
    let orchestrator =
        FetchOrchestrator::new(search, defaults, FetchConfig::from_provider(&settings));

    orchestrator.set_wishlist_id(settings.wishlist_id.clone());
    orchestrator.set_filters(effective_filters(&settings, &defaults));

    let mut updates = orchestrator.subscribe();
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let line = describe_state(&updates.borrow_and_update());
            tracing::info!("{}", line);
        }
    });

    let outcome = orchestrator.trigger_fetch().await;
    let state = orchestrator.state();
    tracing::debug!("Fetch outcome: {:?}", outcome);

    if let Some(error) = &state.error {
        eprintln!("❌ {}", error);
        std::process::exit(2);
    }
    if outcome == FetchOutcome::Skipped {
        tracing::warn!("Fetch was skipped; showing the current state");
    }

    let stdout = std::io::stdout();
    write_movies(&mut stdout.lock(), &state.movies, cli.format)?;
    Ok(())
}

fn effective_filters(settings: &Settings, defaults: &FilterDefaults) -> FilterSet {
    let mut filters = build_default_filters(defaults);
    settings.apply_overrides(&mut filters);
    filters
}

fn exit_with_config_error(e: OrganiserError) -> ! {
    tracing::error!("❌ Configuration failed: {}", e);
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(1);
}
