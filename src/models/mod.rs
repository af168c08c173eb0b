use crate::error::ListingError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

/// Listing lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum PropertyStatus {
    ForSale,
    ForRent,
    Sold,
    Pending,
}

impl PropertyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ForSale => "for-sale",
            Self::ForRent => "for-rent",
            Self::Sold => "sold",
            Self::Pending => "pending",
        }
    }

    /// Parse the wire form (`for-sale`, `for-rent`, `sold`, `pending`)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "for-sale" => Some(Self::ForSale),
            "for-rent" => Some(Self::ForRent),
            "sold" => Some(Self::Sold),
            "pending" => Some(Self::Pending),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location information for a listing
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Location {
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Physical features of a listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Features {
    #[serde(default)]
    pub bedrooms: u32,
    #[serde(default)]
    pub bathrooms: u32,
    #[serde(default)]
    pub area: f64,
    #[serde(default)]
    pub property_type: String,
    pub status: PropertyStatus,
    #[serde(default)]
    pub year_built: Option<i32>,
}

/// Core listing data model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecord {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub location: Location,
    pub features: Features,
    #[serde(default)]
    pub amenities: BTreeSet<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub views: u64,
}

impl PropertyRecord {
    /// First image, or the placeholder shown for listings without photos
    pub fn cover_image(&self) -> &str {
        self.images
            .first()
            .map(String::as_str)
            .unwrap_or(PLACEHOLDER_IMAGE)
    }

    /// Check the numeric invariants the backend is supposed to uphold
    pub fn validate(&self) -> Result<(), ListingError> {
        for (field, value) in [("price", self.price), ("area", self.features.area)] {
            if value.is_nan() || value < 0.0 {
                return Err(ListingError::InvalidField {
                    id: self.id.clone(),
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Buyer,
    Agent,
    Owner,
    Admin,
}

/// Registered marketplace user, as returned by the users listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    User,
    Property,
}

/// One entry of the dashboard notification feed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn for_user(user: &UserSummary, fallback: DateTime<Utc>) -> Self {
        Self {
            id: format!("user:{}", user.id),
            kind: NotificationKind::User,
            message: format!("New user registered: {}", user.name),
            timestamp: user.created_at.unwrap_or(fallback),
        }
    }

    pub fn for_property(property: &PropertyRecord, fallback: DateTime<Utc>) -> Self {
        Self {
            id: format!("property:{}", property.id),
            kind: NotificationKind::Property,
            message: format!("New property listed: {}", property.title),
            timestamp: property.created_at.unwrap_or(fallback),
        }
    }

    /// Toast payload announcing this notification
    pub fn toast(&self) -> Toast {
        let title = match self.kind {
            NotificationKind::User => "New user",
            NotificationKind::Property => "New listing",
        };
        Toast {
            title: title.to_string(),
            description: self.message.clone(),
        }
    }
}

/// Fire-and-forget UI alert
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub description: String,
}


#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn decodes_backend_document() {
        let doc = json!({
            "_id": "65f1c0",
            "title": "Sea view flat",
            "description": "Two rooms near the beach",
            "price": 25000,
            "location": { "city": "Mumbai", "state": "MH", "zip": "400050", "country": "India" },
            "features": {
                "bedrooms": 2,
                "bathrooms": 2,
                "area": 850,
                "propertyType": "apartment",
                "status": "for-rent",
                "yearBuilt": 2012
            },
            "amenities": ["gym", "parking", "gym"],
            "featured": true,
            "createdAt": "2024-03-01T10:00:00Z",
            "views": 42
        });

        let record: PropertyRecord = serde_json::from_value(doc).unwrap();
        assert_eq!(record.id, "65f1c0");
        assert_eq!(record.features.status, PropertyStatus::ForRent);
        assert_eq!(record.features.property_type, "apartment");
        assert_eq!(record.amenities.len(), 2);
        assert!(record.images.is_empty());
        assert_eq!(record.cover_image(), PLACEHOLDER_IMAGE);
        assert_eq!(record.views, 42);
        assert!(record.created_at.is_some());
    }

    #[test]
    fn rejects_unknown_status() {
        let doc = json!({
            "id": "1",
            "title": "x",
            "price": 1,
            "features": { "status": "demolished" }
        });
        assert!(serde_json::from_value::<PropertyRecord>(doc).is_err());
    }

    #[test]
    fn status_wire_names() {
        for status in [
            PropertyStatus::ForSale,
            PropertyStatus::ForRent,
            PropertyStatus::Sold,
            PropertyStatus::Pending,
        ] {
            assert_eq!(PropertyStatus::parse(status.as_str()), Some(status));
            assert_eq!(
                serde_json::to_value(status).unwrap(),
                json!(status.as_str())
            );
        }
        assert_eq!(PropertyStatus::parse("For Sale"), None);
    }

    #[test]
    fn validate_flags_negative_price() {
        let mut record = fixtures::property("1", "Pune", PropertyStatus::ForSale, 100.0, 2);
        assert!(record.validate().is_ok());
        record.price = -5.0;
        assert_eq!(
            record.validate(),
            Err(ListingError::InvalidField {
                id: "1".to_string(),
                field: "price",
                value: -5.0,
            })
        );
        record.price = f64::NAN;
        assert!(record.validate().is_err());

        record.price = 100.0;
        record.features.area = -1.0;
        let err = record.validate().unwrap_err();
        assert_eq!(err.to_string(), "listing 1 has invalid area -1");
    }

    #[test]
    fn notification_falls_back_to_given_time() {
        let now = Utc::now();
        let user = fixtures::user("u1", "Asha");
        let n = Notification::for_user(&user, now);
        assert_eq!(n.id, "user:u1");
        assert_eq!(n.timestamp, now);
        assert_eq!(n.toast().title, "New user");
        assert_eq!(n.toast().description, "New user registered: Asha");
    }
}
