#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Interactive terminal client for reporting and browsing hotspots.
//!
//! Wires the live PositionStack geocoder and the in-memory store through
//! the full report/retract/browse flow. The `POSITIONSTACK_API_KEY`
//! environment variable must hold a valid access key; log verbosity is
//! controlled with `RUST_LOG`.

use std::sync::Arc;

use dialoguer::{Confirm, Input, Select};
use hotspot_map_geocoder::positionstack::PositionStack;
use hotspot_map_hotspots::aggregator::HotspotAggregator;
use hotspot_map_hotspots::resolver::LocationResolver;
use hotspot_map_models::{Hotspot, Location};
use hotspot_map_store::HotspotStore;
use hotspot_map_store::memory::MemoryStore;

/// Top-level actions in the hotspot menu.
enum Action {
    Report,
    Retract,
    BrowseAll,
    BrowseStreet,
    BrowseRegion,
    BrowseNeighbourhood,
    BrowseLocations,
    Quit,
}

impl Action {
    const ALL: &[Self] = &[
        Self::Report,
        Self::Retract,
        Self::BrowseAll,
        Self::BrowseStreet,
        Self::BrowseRegion,
        Self::BrowseNeighbourhood,
        Self::BrowseLocations,
        Self::Quit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Report => "Report a hotspot",
            Self::Retract => "Retract a report",
            Self::BrowseAll => "Browse all hotspots",
            Self::BrowseStreet => "Browse hotspots by street name",
            Self::BrowseRegion => "Browse hotspots by region",
            Self::BrowseNeighbourhood => "Browse hotspots by neighbourhood",
            Self::BrowseLocations => "Browse resolved locations",
            Self::Quit => "Quit",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();

    let geocoder = Arc::new(PositionStack::from_env()?);
    let store = Arc::new(MemoryStore::new());
    let resolver = LocationResolver::new(geocoder, store.clone());
    let aggregator = HotspotAggregator::new(resolver.clone(), store.clone(), store.clone());

    println!("Hotspot Map");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    loop {
        let idx = Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;

        match Action::ALL[idx] {
            Action::Report => handle_report(&aggregator, &store).await?,
            Action::Retract => handle_retract(&aggregator, &resolver).await?,
            Action::BrowseAll => handle_browse_all(&aggregator).await,
            Action::BrowseStreet => handle_browse_street(&aggregator).await?,
            Action::BrowseRegion => handle_browse_region(&aggregator).await?,
            Action::BrowseNeighbourhood => handle_browse_neighbourhood(&aggregator).await?,
            Action::BrowseLocations => handle_browse_locations(&resolver).await,
            Action::Quit => break,
        }

        println!();
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Prompts for an address and category, then records one report.
async fn handle_report(
    aggregator: &HotspotAggregator,
    store: &Arc<MemoryStore>,
) -> Result<(), Box<dyn std::error::Error>> {
    let street_address: String = Input::new().with_prompt("Street address").interact_text()?;
    let area_name: String = Input::new()
        .with_prompt("Area / neighbourhood")
        .interact_text()?;
    let city_name: String = Input::new().with_prompt("City").interact_text()?;
    let postal_code: u32 = Input::new().with_prompt("Postal code").interact_text()?;
    let category_name: String = Input::new().with_prompt("Category").interact_text()?;

    let draft = match aggregator
        .create(
            &street_address,
            &area_name,
            &city_name,
            postal_code,
            &category_name,
        )
        .await
    {
        Ok(draft) => draft,
        Err(err) => {
            println!("{err}");
            return Ok(());
        }
    };

    let Some(key) = draft.key() else {
        let confidence = draft.location.confidence.unwrap_or(0.0);
        println!(
            "The geocoder matched ({}, {}) with confidence {confidence:.2}, too low to \
             record a report.",
            draft.location.latitude, draft.location.longitude
        );
        return Ok(());
    };

    if let Err(err) = aggregator.report(draft).await {
        println!("{err}");
        return Ok(());
    }

    log::info!("recorded report for hotspot {key}");

    if let Some(hotspot) = store.find_by_key(key).await? {
        println!(
            "Recorded. {} report(s) for {} at location {}.",
            hotspot.num_reports, hotspot.category.name, key.location_id
        );
    }

    Ok(())
}

/// Prompts for an aggregate key and retracts one report from it.
async fn handle_retract(
    aggregator: &HotspotAggregator,
    resolver: &LocationResolver,
) -> Result<(), Box<dyn std::error::Error>> {
    let location_id: i64 = Input::new().with_prompt("Location id").interact_text()?;
    let category_id: i64 = Input::new().with_prompt("Category id").interact_text()?;

    match resolver.location_by_id(location_id).await {
        Ok(Some(location)) => println!("Location {location_id}: {}", format_address(&location)),
        Ok(None) => println!("Location {location_id} is not known."),
        Err(err) => println!("{err}"),
    }

    let confirmed = Confirm::new()
        .with_prompt(format!(
            "Retract one report for location {location_id}, category {category_id}?"
        ))
        .default(false)
        .interact()?;

    if !confirmed {
        println!("Cancelled.");
        return Ok(());
    }

    match aggregator.retract(location_id, category_id).await {
        Ok(snapshot) if snapshot.num_reports > 1 => {
            println!("Retracted. {} report(s) remain.", snapshot.num_reports - 1);
        }
        Ok(_) => println!("Retracted the last report; hotspot deleted."),
        Err(err) => println!("{err}"),
    }

    Ok(())
}

/// Lists every aggregate.
async fn handle_browse_all(aggregator: &HotspotAggregator) {
    match aggregator.all().await {
        Ok(hotspots) => print_hotspots(&hotspots),
        Err(err) => println!("{err}"),
    }
}

/// Prompts for a street name and lists the aggregates on matching streets.
async fn handle_browse_street(
    aggregator: &HotspotAggregator,
) -> Result<(), Box<dyn std::error::Error>> {
    let street_name: String = Input::new().with_prompt("Street name").interact_text()?;

    match aggregator.by_street_name(&street_name).await {
        Ok(hotspots) => print_hotspots(&hotspots),
        Err(err) => println!("{err}"),
    }

    Ok(())
}

/// Prompts for a region and lists the aggregates in it.
async fn handle_browse_region(
    aggregator: &HotspotAggregator,
) -> Result<(), Box<dyn std::error::Error>> {
    let region: String = Input::new().with_prompt("Region").interact_text()?;

    match aggregator.by_region(&region).await {
        Ok(hotspots) => print_hotspots(&hotspots),
        Err(err) => println!("{err}"),
    }

    Ok(())
}

/// Prompts for a neighbourhood and lists the aggregates in it.
async fn handle_browse_neighbourhood(
    aggregator: &HotspotAggregator,
) -> Result<(), Box<dyn std::error::Error>> {
    let neighbourhood: String = Input::new().with_prompt("Neighbourhood").interact_text()?;

    match aggregator.by_neighbourhood(&neighbourhood).await {
        Ok(hotspots) => print_hotspots(&hotspots),
        Err(err) => println!("{err}"),
    }

    Ok(())
}

/// Lists every canonical location the resolver has persisted.
async fn handle_browse_locations(resolver: &LocationResolver) {
    match resolver.locations().await {
        Ok(locations) => print_locations(&locations),
        Err(err) => println!("{err}"),
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Prints a table of hotspot aggregates.
fn print_hotspots(hotspots: &[Hotspot]) {
    if hotspots.is_empty() {
        println!("No hotspots attached to the matching locations.");
        return;
    }

    println!();
    println!(
        "{:<6} {:<6} {:<8} {:<18} ADDRESS",
        "LOC", "CAT", "REPORTS", "CATEGORY"
    );
    println!("{}", "-".repeat(80));

    for hotspot in hotspots {
        let location_id = hotspot
            .location
            .id
            .map_or_else(|| "-".to_string(), |id| id.to_string());
        println!(
            "{:<6} {:<6} {:<8} {:<18} {}",
            location_id,
            hotspot.category.id,
            hotspot.num_reports,
            hotspot.category.name,
            format_address(&hotspot.location)
        );
    }

    println!("\n{} hotspot(s)", hotspots.len());
}

/// Prints a table of canonical locations.
fn print_locations(locations: &[Location]) {
    if locations.is_empty() {
        println!("No locations resolved yet.");
        return;
    }

    println!();
    println!(
        "{:<6} {:<12} {:<12} {:<6} ADDRESS",
        "ID", "LAT", "LON", "CONF"
    );
    println!("{}", "-".repeat(80));

    for location in locations {
        let id = location
            .id
            .map_or_else(|| "-".to_string(), |id| id.to_string());
        let confidence = location
            .confidence
            .map_or_else(|| "-".to_string(), |c| format!("{c:.2}"));
        println!(
            "{:<6} {:<12.5} {:<12.5} {:<6} {}",
            id,
            location.latitude,
            location.longitude,
            confidence,
            format_address(location)
        );
    }

    println!("\n{} location(s)", locations.len());
}

/// Joins the descriptive fields of a location for display, falling back to
/// the coordinates when nothing descriptive was stored.
fn format_address(location: &Location) -> String {
    let parts: Vec<&str> = [
        location.street_address.as_deref(),
        location.neighbourhood.as_deref(),
        location.city.as_deref(),
        location.region.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect();

    if parts.is_empty() {
        format!("({:.5}, {:.5})", location.latitude, location.longitude)
    } else {
        parts.join(", ")
    }
}
