//! sonar-calendar CLI entry point.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::NaiveTime;
use clap::Parser;
use sonar_calendar_core::{TracingConfig, init_tracing};
use sonar_calendar_providers::{ElementContent, StaticDocument};

use sonar_calendar::cli::{Cli, DATA_SELECTOR};
use sonar_calendar::config::CalendarConfig;
use sonar_calendar::controller::{CalendarController, CalendarOptions};
use sonar_calendar::error::{WidgetError, WidgetResult};
use sonar_calendar::navigation::{InMemoryHistory, NavigationBridge, event_fragment};
use sonar_calendar::render::{Renderer, TerminalRenderer};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::default()
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {}", e);
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> WidgetResult<ExitCode> {
    let mut config = match cli.config {
        Some(ref path) => CalendarConfig::load_from(path)?,
        None => CalendarConfig::load()?,
    };

    if let Some(ref url) = cli.api_url {
        config.api_url = Some(url.clone());
    }
    if let Some(theme) = cli.theme {
        config.theme = theme;
    }
    if let Some(minutes) = cli.utc_offset {
        config.utc_offset_minutes = Some(minutes);
    }

    let offset = config.utc_offset()?;
    let renderer: Arc<dyn Renderer> = if cli.json {
        Arc::new(TerminalRenderer::new(io::sink(), offset))
    } else {
        Arc::new(TerminalRenderer::new(io::stdout(), offset))
    };

    let history = InMemoryHistory::with_fragment(cli.event.as_deref().map(event_fragment).as_deref());
    let mut options = CalendarOptions::new(renderer)
        .with_config(config)
        .with_bridge(Arc::new(NavigationBridge::new(Arc::new(history))))
        .with_view(cli.view);

    if let Some(ref path) = cli.data {
        let data = std::fs::read_to_string(path)?;
        let document = StaticDocument::new().with_element(DATA_SELECTOR, ElementContent::text(data));
        // An explicit file wins over an endpoint from the config file.
        options.config.api_url = None;
        options = options.with_embedded(Arc::new(document), DATA_SELECTOR);
    }

    if let Some(date) = cli.date {
        let local = date
            .and_time(NaiveTime::MIN)
            .and_local_timezone(offset)
            .single()
            .ok_or_else(|| WidgetError::config(format!("invalid date: {}", date)))?;
        options = options.with_current_date(local);
    }

    let controller = CalendarController::new(options)?;
    controller.load_events(cli.fetch_filters()).await;

    let state = controller.state();
    if let Some(message) = state.load_status.error() {
        // The text renderer already showed the error.
        if cli.json {
            eprintln!("error: {}", message);
        }
        return Ok(ExitCode::FAILURE);
    }

    if cli.json {
        let events = controller.visible_events();
        let output = serde_json::to_string_pretty(&events).map_err(io::Error::from)?;
        println!("{}", output);
    }

    controller.destroy();
    Ok(ExitCode::SUCCESS)
}
