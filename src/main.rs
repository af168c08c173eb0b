use anyhow::{Context, Result};
use chrono::Utc;
use listing_watch::models::{Features, Location, PropertyRecord, PropertyStatus, UserRole, UserSummary};
use listing_watch::search::{available_cities, search, SearchCriteria};
use listing_watch::sources::{HttpBackend, LogToaster, MemorySource, PropertySource, UserSource};
use listing_watch::{AppConfig, Notifier};
use reqwest::Url;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🏠 Listing Watch");
    info!("================");

    let mut demo = false;
    let mut query = None;
    for arg in std::env::args().skip(1) {
        if arg == "--demo" {
            demo = true;
        } else {
            query = Some(arg);
        }
    }

    let config = AppConfig::load()?;
    info!("Backend: {}", if demo { "in-memory demo" } else { config.api_base_url.as_str() });

    let (properties, users): (Arc<dyn PropertySource>, Arc<dyn UserSource>) = if demo {
        let source = MemorySource::new(demo_listings(), demo_users());
        tokio::spawn(list_demo_properties(source.clone()));
        (Arc::new(source.clone()), Arc::new(source))
    } else {
        let backend = Arc::new(HttpBackend::with_options(
            &config.api_base_url,
            config.api_token.clone(),
            config.request_timeout(),
        )?);
        (backend.clone(), backend)
    };

    let mut criteria = match &query {
        Some(q) => parse_criteria(q)?,
        None => SearchCriteria::default(),
    };
    criteria.page_size = config.page_size;

    match properties.fetch_all_properties().await {
        Ok(listings) => print_results(&listings, &criteria),
        Err(e) => warn!("Could not load listings for search: {}", e),
    }

    let handle = Notifier::new(properties, users, Arc::new(LogToaster), config.notifier_settings()).spawn();

    info!("Watching for new users and listings, Ctrl-C to quit");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    let snapshot = handle.snapshot().await;
    info!(
        "{} notifications in feed, {} unread",
        snapshot.notifications.len(),
        snapshot.unread
    );
    handle.stop().await?;

    Ok(())
}

/// Accepts either a full dashboard URL or a bare query string
fn parse_criteria(input: &str) -> Result<SearchCriteria> {
    let url = if input.starts_with("http://") || input.starts_with("https://") {
        Url::parse(input)
    } else {
        Url::parse(&format!("http://localhost/properties?{}", input.trim_start_matches('?')))
    }
    .with_context(|| format!("Invalid search query: {}", input))?;

    Ok(SearchCriteria::from_query_pairs(url.query_pairs()))
}

fn print_results(listings: &[PropertyRecord], criteria: &SearchCriteria) {
    let page = search(listings, criteria);

    info!(
        "✅ {} matching listings, page {} of {}",
        page.total,
        page.page,
        page.total_pages.max(1)
    );
    info!("Cities: {}", available_cities(listings).join(", "));

    let offset = (page.page - 1).saturating_mul(page.page_size);
    for (i, property) in page.items.iter().enumerate() {
        println!("{}. {} ({})", offset.saturating_add(i + 1), property.title, format_price(property.price));
        println!(
            "   {} bd, {} ba, {} sq ft, {}",
            property.features.bedrooms,
            property.features.bathrooms,
            property.features.area,
            property.features.status
        );
        println!("   {}, {}", property.location.city, property.location.state);
        println!("   ID: {}", property.id);
        println!("   Image: {}", property.cover_image());
        println!();
    }
}

/// Rupee amount with thousands separators
fn format_price(price: f64) -> String {
    let rounded = price.round().max(0.0) as u64;
    let digits = rounded.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    format!("₹{}", out)
}

/// Appends a new listing now and then so the demo feed has something to announce
async fn list_demo_properties(source: MemorySource) {
    let mut interval = tokio::time::interval(Duration::from_secs(15));
    interval.tick().await;

    for n in 1.. {
        interval.tick().await;
        let mut listing = demo_listing(
            &format!("demo_new_{}", n),
            "Fresh listing in Bandra",
            "Mumbai",
            "MH",
            45_000.0 + n as f64 * 500.0,
            PropertyStatus::ForRent,
            2,
        );
        listing.created_at = Some(Utc::now());
        source.push_property(listing).await;
    }
}

fn demo_listing(
    id: &str,
    title: &str,
    city: &str,
    state: &str,
    price: f64,
    status: PropertyStatus,
    bedrooms: u32,
) -> PropertyRecord {
    PropertyRecord {
        id: id.to_string(),
        title: title.to_string(),
        description: format!("{} bedroom home in {}", bedrooms, city),
        price,
        location: Location {
            city: city.to_string(),
            state: state.to_string(),
            country: "India".to_string(),
            ..Location::default()
        },
        features: Features {
            bedrooms,
            bathrooms: bedrooms.max(1),
            area: 450.0 * bedrooms as f64,
            property_type: "apartment".to_string(),
            status,
            year_built: Some(2018),
        },
        amenities: BTreeSet::from(["parking".to_string(), "security".to_string()]),
        images: vec![],
        featured: false,
        created_at: None,
        updated_at: None,
        views: 0,
    }
}

fn demo_listings() -> Vec<PropertyRecord> {
    info!("📋 Generating demo listings");

    vec![
        demo_listing("demo_1", "Sea-facing flat in Worli", "Mumbai", "MH", 32_000.0, PropertyStatus::ForRent, 2),
        demo_listing("demo_2", "Studio near Andheri station", "Mumbai", "MH", 18_500.0, PropertyStatus::ForRent, 1),
        demo_listing("demo_3", "Family home in Powai", "Mumbai", "MH", 21_000_000.0, PropertyStatus::ForSale, 3),
        demo_listing("demo_4", "Villa in Koregaon Park", "Pune", "MH", 38_500_000.0, PropertyStatus::ForSale, 5),
        demo_listing("demo_5", "Garden flat in Indiranagar", "Bangalore", "KA", 42_000.0, PropertyStatus::ForRent, 3),
        demo_listing("demo_6", "Penthouse in Juhu", "Mumbai", "MH", 95_000_000.0, PropertyStatus::Pending, 4),
    ]
}

fn demo_users() -> Vec<UserSummary> {
    vec![
        UserSummary {
            id: "demo_user_1".to_string(),
            name: "Asha Kulkarni".to_string(),
            email: Some("asha@example.com".to_string()),
            role: Some(UserRole::Agent),
            created_at: None,
        },
        UserSummary {
            id: "demo_user_2".to_string(),
            name: "Ravi Menon".to_string(),
            email: None,
            role: Some(UserRole::Buyer),
            created_at: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_rupees_with_separators() {
        assert_eq!(format_price(0.0), "₹0");
        assert_eq!(format_price(950.0), "₹950");
        assert_eq!(format_price(25_000.0), "₹25,000");
        assert_eq!(format_price(21_000_000.4), "₹21,000,000");
    }

    #[test]
    fn parses_url_or_bare_query() {
        let from_url = parse_criteria("https://homes.example/properties?city=Mumbai&status=for-rent&page=2").unwrap();
        let bare = parse_criteria("?city=Mumbai&status=for-rent&page=2").unwrap();
        assert_eq!(from_url, bare);
        assert_eq!(bare.status, Some(PropertyStatus::ForRent));
        assert_eq!(bare.page, 2);
    }

    #[test]
    fn huge_page_number_prints_an_empty_page() {
        let listings = demo_listings();
        let criteria = parse_criteria("page=18446744073709551615").unwrap();
        assert_eq!(criteria.page, usize::MAX);
        print_results(&listings, &criteria);
        assert!(search(&listings, &criteria).items.is_empty());
    }

    #[test]
    fn demo_search_finds_mumbai_rentals() {
        let listings = demo_listings();
        let criteria = parse_criteria("city=mumbai&status=for-rent").unwrap();
        assert_eq!(search(&listings, &criteria).total, 2);
    }
}
