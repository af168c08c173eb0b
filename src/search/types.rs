use crate::models::PropertyStatus;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Listings shown per results page
pub const DEFAULT_PAGE_SIZE: usize = 9;

/// Search parameters for one listing search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchCriteria {
    /// Free text matched against title, description and city
    pub query: String,
    /// City name, compared case-insensitively
    pub city: Option<String>,
    /// Property type, exact match (`apartment`, `villa`, ...)
    pub property_type: Option<String>,
    pub status: Option<PropertyStatus>,
    /// Minimum price, inclusive
    pub min_price: Option<f64>,
    /// Maximum price, inclusive
    pub max_price: Option<f64>,
    /// Minimum number of bedrooms
    pub bedrooms: Option<u32>,
    /// 1-based page number
    pub page: usize,
    pub page_size: usize,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            query: String::new(),
            city: None,
            property_type: None,
            status: None,
            min_price: None,
            max_price: None,
            bedrooms: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SearchCriteria {
    /// Build criteria from URL query parameters.
    ///
    /// Unknown keys are ignored. Empty values, unparseable numbers and
    /// unknown statuses count as "not specified".
    pub fn from_query_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut criteria = Self::default();

        for (key, value) in pairs {
            let key = key.as_ref();
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }

            match key {
                "q" | "query" => criteria.query = value.to_string(),
                "city" => criteria.city = Some(value.to_string()),
                "type" | "propertyType" => criteria.property_type = Some(value.to_string()),
                "status" => {
                    criteria.status = PropertyStatus::parse(value);
                    if criteria.status.is_none() {
                        debug!("Ignoring unknown status filter: {}", value);
                    }
                }
                "minPrice" => criteria.min_price = parse_price(key, value),
                "maxPrice" => criteria.max_price = parse_price(key, value),
                "bedrooms" => criteria.bedrooms = parse_number(key, value),
                "page" => criteria.page = parse_number::<usize>(key, value).unwrap_or(1).max(1),
                _ => debug!("Ignoring unknown search parameter: {}", key),
            }
        }

        criteria
    }

    /// Same criteria, different page
    pub fn with_page(&self, page: usize) -> Self {
        Self {
            page: page.max(1),
            ..self.clone()
        }
    }

    pub(crate) fn effective_page_size(&self) -> usize {
        if self.page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            self.page_size
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Option<T> {
    // "5+" from the bedrooms dropdown
    let cleaned = value.trim_end_matches('+');
    match cleaned.parse() {
        Ok(n) => Some(n),
        Err(_) => {
            debug!("Ignoring unparseable {}: {}", key, value);
            None
        }
    }
}

/// Like `parse_number`, but `NaN` and infinities count as unparseable
fn parse_price(key: &str, value: &str) -> Option<f64> {
    parse_number::<f64>(key, value).filter(|price| {
        let finite = price.is_finite();
        if !finite {
            debug!("Ignoring non-finite {}: {}", key, value);
        }
        finite
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_dashboard_query() {
        let criteria = SearchCriteria::from_query_pairs([
            ("q", "sea view"),
            ("city", "Mumbai"),
            ("type", "apartment"),
            ("status", "for-rent"),
            ("minPrice", "10000"),
            ("maxPrice", "50000"),
            ("bedrooms", "5+"),
            ("page", "2"),
        ]);

        assert_eq!(
            criteria,
            SearchCriteria {
                query: "sea view".to_string(),
                city: Some("Mumbai".to_string()),
                property_type: Some("apartment".to_string()),
                status: Some(PropertyStatus::ForRent),
                min_price: Some(10000.0),
                max_price: Some(50000.0),
                bedrooms: Some(5),
                page: 2,
                page_size: DEFAULT_PAGE_SIZE,
            }
        );
    }

    #[test]
    fn bad_values_are_treated_as_absent() {
        let criteria = SearchCriteria::from_query_pairs([
            ("city", "  "),
            ("status", "demolished"),
            ("minPrice", "cheap"),
            ("page", "0"),
            ("sort", "price"),
        ]);

        assert_eq!(criteria, SearchCriteria::default());
    }

    #[test]
    fn non_finite_prices_are_ignored() {
        for bad in ["NaN", "inf", "-inf", "infinity"] {
            let criteria =
                SearchCriteria::from_query_pairs([("minPrice", bad), ("maxPrice", bad)]);
            assert_eq!(criteria.min_price, None, "minPrice={}", bad);
            assert_eq!(criteria.max_price, None, "maxPrice={}", bad);
        }
        let criteria = SearchCriteria::from_query_pairs([("minPrice", "1e4")]);
        assert_eq!(criteria.min_price, Some(10_000.0));
    }

    #[test]
    fn with_page_keeps_filters() {
        let criteria = SearchCriteria {
            city: Some("Pune".to_string()),
            ..SearchCriteria::default()
        };
        let next = criteria.with_page(3);
        assert_eq!(next.page, 3);
        assert_eq!(next.city.as_deref(), Some("Pune"));
        assert_eq!(criteria.with_page(0).page, 1);
    }
}
