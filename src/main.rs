use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use finn_scout::scrapers::locations::{looks_like_location_code, resolve_location};
use finn_scout::{
    ClientConfig, FilterSet, FinnClient, ListingBasic, SearchType, SortOption,
};
use futures::{pin_mut, StreamExt};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "FINN.no real estate scraper")]
struct Args {
    /// Listing category: lettings, homes, leisure, newbuildings, plots, commercial
    #[arg(long = "type", default_value = "lettings", value_parser = parse_search_type)]
    search_type: SearchType,

    /// Place name (oslo, bergen, ...) or a raw location code
    #[arg(long)]
    location: Option<String>,

    /// Location code, used when --location is not given
    #[arg(long)]
    location_code: Option<String>,

    #[arg(long)]
    price_from: Option<u64>,

    #[arg(long)]
    price_to: Option<u64>,

    /// Minimum number of bedrooms
    #[arg(long)]
    bedrooms: Option<u32>,

    /// Minimum area in square meters
    #[arg(long)]
    area_from: Option<u64>,

    #[arg(long)]
    area_to: Option<u64>,

    /// Property type code, may be repeated
    #[arg(long)]
    property_type: Vec<String>,

    /// PUBLISHED_DESC, PUBLISHED_ASC, PRICE_DESC or PRICE_ASC
    #[arg(long, value_parser = parse_sort)]
    sort: Option<SortOption>,

    /// Keyword search
    #[arg(long)]
    query: Option<String>,

    #[arg(long, default_value_t = 1)]
    page: u32,

    /// Walk result pages from the first, up to this many
    #[arg(long)]
    max_pages: Option<u32>,

    /// Fetch details for a listing id instead of searching
    #[arg(long)]
    details: Option<String>,

    /// Print location suggestions for a place name
    #[arg(long)]
    suggest: Option<String>,

    /// Write results to this JSON file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Minimum delay between requests
    #[arg(long, default_value_t = 1000)]
    rate_limit_ms: u64,

    #[arg(short, long)]
    verbose: bool,
}

/// Output file contents, stamped with the time of the scrape
#[derive(Serialize)]
struct Envelope<T: Serialize> {
    scraped_at: DateTime<Utc>,
    #[serde(flatten)]
    payload: T,
}

#[derive(Serialize)]
struct Traversal<'a> {
    search_type: SearchType,
    filters_applied: &'a FilterSet,
    items: &'a [ListingBasic],
}

fn parse_search_type(s: &str) -> Result<SearchType, String> {
    SearchType::from_tag(s).ok_or_else(|| format!("unknown listing type '{}'", s))
}

fn parse_sort(s: &str) -> Result<SortOption, String> {
    match s.to_ascii_uppercase().as_str() {
        "" | "RELEVANCE" => Ok(SortOption::Relevance),
        "PUBLISHED_DESC" => Ok(SortOption::PublishedDesc),
        "PUBLISHED_ASC" => Ok(SortOption::PublishedAsc),
        "PRICE_DESC" => Ok(SortOption::PriceDesc),
        "PRICE_ASC" => Ok(SortOption::PriceAsc),
        other => Err(format!("unknown sort option '{}'", other)),
    }
}

impl Args {
    fn filters(&self) -> FilterSet {
        let mut filters = FilterSet::new()
            .price(self.price_from, self.price_to)
            .area(self.area_from, self.area_to)
            .bedrooms(self.bedrooms, None);

        if let Some(name) = &self.location {
            let code = resolve_location(name);
            if code == *name && !looks_like_location_code(name) {
                info!("Unknown location '{}', using as-is", name);
            }
            filters = filters.location(code);
        } else if let Some(code) = &self.location_code {
            filters = filters.location(code.clone());
        }

        for code in &self.property_type {
            filters = filters.property_type_code(code.clone());
        }
        if let Some(sort) = self.sort {
            filters = filters.sort(sort);
        }
        if let Some(q) = &self.query {
            filters = filters.query(q.clone());
        }
        filters
    }
}

async fn write_json<T: Serialize>(path: &Path, payload: T) -> Result<()> {
    let envelope = Envelope {
        scraped_at: Utc::now(),
        payload,
    };
    let json = serde_json::to_string_pretty(&envelope)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("💾 Saved results to {}", path.display());
    Ok(())
}

fn print_listing(index: usize, listing: &ListingBasic) {
    println!("{}. {} ({})", index + 1, listing.heading, listing.id);
    println!("   Location: {}", listing.location);
    if let Some(price) = &listing.price {
        println!("   Price: {}", price);
    }
    if let Some(area) = &listing.area {
        println!("   Area: {}", area);
    }
    if !listing.flags.is_empty() {
        println!("   Flags: {}", listing.flags.join(", "));
    }
    println!("   URL: {}", listing.url);
    println!();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🏠 FINN Scout");

    let config = ClientConfig::default().with_rate_limit(Duration::from_millis(args.rate_limit_ms));
    let client = FinnClient::with_config(config).context("Failed to create HTTP client")?;

    if let Some(query) = &args.suggest {
        let suggestions = client.get_location_suggestions(query).await;
        println!("{}", serde_json::to_string_pretty(&suggestions)?);
        return Ok(());
    }

    if let Some(id) = &args.details {
        info!("Fetching details for listing {}...", id);
        let Some(details) = client.get_listing_details(id).await else {
            println!("Listing {} not found", id);
            return Ok(());
        };

        println!("Title: {}", details.basic.heading);
        println!("Location: {}", details.basic.location);
        if let Some(price) = details.basic.price_total {
            println!("Price: {} kr", price);
        }
        println!("URL: {}", details.basic.url);
        if let Some(description) = &details.description {
            let preview: String = description.chars().take(500).collect();
            println!("\nDescription:\n{}...", preview);
        }

        if let Some(path) = &args.output {
            write_json(path, &details).await?;
        }
        return Ok(());
    }

    let filters = args.filters();

    if let Some(max_pages) = args.max_pages {
        info!("Walking up to {} pages of {}...", max_pages, args.search_type);

        let stream = client.search_all(args.search_type, filters.clone(), Some(max_pages));
        pin_mut!(stream);

        let mut items = Vec::new();
        while let Some(listing) = stream.next().await {
            items.push(listing.context("Search failed")?);
        }

        info!("✅ Collected {} listings", items.len());
        for (i, listing) in items.iter().take(10).enumerate() {
            print_listing(i, listing);
        }

        if let Some(path) = &args.output {
            let traversal = Traversal {
                search_type: args.search_type,
                filters_applied: &filters,
                items: &items,
            };
            write_json(path, traversal).await?;
        }
        return Ok(());
    }

    info!("Searching {}...", args.search_type);
    let results = client
        .search(args.search_type, args.page, &filters)
        .await
        .context("Search failed")?;

    println!(
        "\nFound {} listings (page {} of {})",
        results.total_count,
        results.page,
        results.total_pages()
    );
    println!("{}", "-".repeat(80));

    if results.items.is_empty() {
        println!("No listings on this page");
    }
    for (i, listing) in results.items.iter().take(10).enumerate() {
        print_listing(i, listing);
    }

    if let Some(path) = &args.output {
        write_json(path, &results).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters(args: &[&str]) -> FilterSet {
        let args = Args::try_parse_from(std::iter::once("finn-scout").chain(args.iter().copied()))
            .unwrap();
        args.filters()
    }

    #[test]
    fn location_names_and_codes_both_reach_the_filters() {
        assert_eq!(filters(&["--location", "bergen"]).location, vec!["0.20003"]);
        assert_eq!(filters(&["--location", "0.22042"]).location, vec!["0.22042"]);
        assert_eq!(filters(&["--location-code", "0.20061"]).location, vec!["0.20061"]);
        assert!(filters(&[]).location.is_empty());
    }
}
