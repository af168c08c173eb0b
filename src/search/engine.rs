use crate::models::PropertyRecord;
use crate::search::types::SearchCriteria;
use serde::Serialize;
use tracing::debug;

/// One page of search results plus the information a pager needs
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchPage<'a> {
    pub items: Vec<&'a PropertyRecord>,
    /// Number of matching listings before pagination
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

impl SearchPage<'_> {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1 && self.total_pages > 0
    }
}

/// Filter `listings` by `criteria` and cut out the requested page.
///
/// Matches keep the relative order they have in `listings`.
pub fn search<'a>(listings: &'a [PropertyRecord], criteria: &SearchCriteria) -> SearchPage<'a> {
    let filter = Filter::new(criteria);
    let matches: Vec<&PropertyRecord> = listings.iter().filter(|p| filter.matches(p)).collect();

    let total = matches.len();
    let page = criteria.page.max(1);
    let page_size = criteria.effective_page_size();
    let total_pages = total.div_ceil(page_size);

    let offset = (page - 1).saturating_mul(page_size);
    let items: Vec<&PropertyRecord> = matches.into_iter().skip(offset).take(page_size).collect();

    debug!(
        "Search matched {} of {} listings, page {}/{} holds {}",
        total,
        listings.len(),
        page,
        total_pages,
        items.len()
    );

    SearchPage {
        items,
        total,
        page,
        page_size,
        total_pages,
    }
}

/// Distinct cities in first-seen order
pub fn available_cities(listings: &[PropertyRecord]) -> Vec<String> {
    distinct(listings.iter().map(|p| p.location.city.as_str()))
}

/// Distinct property types in first-seen order
pub fn available_property_types(listings: &[PropertyRecord]) -> Vec<String> {
    distinct(listings.iter().map(|p| p.features.property_type.as_str()))
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values.map(str::trim).filter(|v| !v.is_empty()) {
        if !out.iter().any(|seen| seen == value) {
            out.push(value.to_string());
        }
    }
    out
}

/// Criteria normalized once per search
struct Filter<'c> {
    query: Option<String>,
    city: Option<String>,
    criteria: &'c SearchCriteria,
}

impl<'c> Filter<'c> {
    fn new(criteria: &'c SearchCriteria) -> Self {
        let lowered = |s: &str| {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_lowercase())
        };

        Self {
            query: lowered(&criteria.query),
            city: criteria.city.as_deref().and_then(lowered),
            criteria,
        }
    }

    fn matches(&self, listing: &PropertyRecord) -> bool {
        self.matches_query(listing)
            && self.matches_city(listing)
            && self.matches_type(listing)
            && self.matches_status(listing)
            && self.matches_price(listing)
            && self.matches_bedrooms(listing)
    }

    fn matches_query(&self, listing: &PropertyRecord) -> bool {
        let Some(query) = &self.query else {
            return true;
        };
        [
            listing.title.as_str(),
            listing.description.as_str(),
            listing.location.city.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(query.as_str()))
    }

    fn matches_city(&self, listing: &PropertyRecord) -> bool {
        match &self.city {
            Some(city) => listing.location.city.trim().to_lowercase() == *city,
            None => true,
        }
    }

    fn matches_type(&self, listing: &PropertyRecord) -> bool {
        match self.criteria.property_type.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => listing.features.property_type == t,
            _ => true,
        }
    }

    fn matches_status(&self, listing: &PropertyRecord) -> bool {
        self.criteria
            .status
            .map_or(true, |status| listing.features.status == status)
    }

    fn matches_price(&self, listing: &PropertyRecord) -> bool {
        let above_min = self.criteria.min_price.map_or(true, |min| listing.price >= min);
        let below_max = self.criteria.max_price.map_or(true, |max| listing.price <= max);
        above_min && below_max
    }

    fn matches_bedrooms(&self, listing: &PropertyRecord) -> bool {
        match self.criteria.bedrooms {
            Some(min) if min > 0 => listing.features.bedrooms >= min,
            _ => true,
        }
    }
}
