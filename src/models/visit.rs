use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::models::lenient;

pub const UNKNOWN_PLACE: &str = "Unknown";
pub const ANONYMOUS_IP: &str = "Anonymous";
pub const DIRECT_REFERRER: &str = "Direct/None";

/// Where the location fields of a visit came from
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocationMethod {
    #[serde(rename = "IP")]
    Ip,
    #[serde(rename = "GPS")]
    Gps,
    #[default]
    #[serde(other)]
    Unknown,
}

impl LocationMethod {
    fn from_label(label: &str) -> Self {
        match label {
            "IP" => LocationMethod::Ip,
            "GPS" => LocationMethod::Gps,
            _ => LocationMethod::Unknown,
        }
    }
}

/// Result of an IP geolocation lookup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IpLocation {
    pub city: Option<String>,
    pub country: Option<String>,
    pub ip: Option<String>,
}

/// Result of a reverse geocode
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoPlace {
    pub city: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// One logged page-visit session.
///
/// Every field falls back to its default when absent, null or of the wrong
/// type, so documents written by older clients still load.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", from = "StoredVisit")]
pub struct VisitRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>, // Assigned by the store at write time (ms)
    pub city: String,
    pub country: String,
    pub ip: String,
    pub method: LocationMethod,
    pub gps_allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    pub user_agent: String,
    pub path: String,
    pub referrer: String,
    pub language: String,
    pub screen_size: String,
    pub duration: i64, // Seconds, only ever incremented by the heartbeat
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_ping: Option<i64>,
}

impl Default for VisitRecord {
    fn default() -> Self {
        Self {
            id: None,
            timestamp: None,
            city: UNKNOWN_PLACE.to_string(),
            country: UNKNOWN_PLACE.to_string(),
            ip: ANONYMOUS_IP.to_string(),
            method: LocationMethod::Unknown,
            gps_allowed: false,
            lat: None,
            lng: None,
            user_agent: String::new(),
            path: "/".to_string(),
            referrer: DIRECT_REFERRER.to_string(),
            language: String::new(),
            screen_size: String::new(),
            duration: 0,
            last_ping: None,
        }
    }
}

/// A visit document as read back from the store
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredVisit {
    #[serde(rename = "_id", default)]
    id: Option<ObjectId>,
    #[serde(default, deserialize_with = "lenient::integer")]
    timestamp: Option<i64>,
    #[serde(default, deserialize_with = "lenient::text")]
    city: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    country: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    ip: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    method: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    gps_allowed: Option<bool>,
    #[serde(default, deserialize_with = "lenient::float")]
    lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient::float")]
    lng: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    user_agent: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    path: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    referrer: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    language: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    screen_size: Option<String>,
    #[serde(default, deserialize_with = "lenient::integer")]
    duration: Option<i64>,
    #[serde(default, deserialize_with = "lenient::integer")]
    last_ping: Option<i64>,
}

impl From<StoredVisit> for VisitRecord {
    fn from(stored: StoredVisit) -> Self {
        let defaults = VisitRecord::default();
        Self {
            id: stored.id,
            timestamp: stored.timestamp,
            city: stored.city.unwrap_or(defaults.city),
            country: stored.country.unwrap_or(defaults.country),
            ip: stored.ip.unwrap_or(defaults.ip),
            method: stored
                .method
                .as_deref()
                .map(LocationMethod::from_label)
                .unwrap_or_default(),
            gps_allowed: stored.gps_allowed.unwrap_or(defaults.gps_allowed),
            lat: stored.lat,
            lng: stored.lng,
            user_agent: stored.user_agent.unwrap_or(defaults.user_agent),
            path: stored.path.unwrap_or(defaults.path),
            referrer: stored.referrer.unwrap_or(defaults.referrer),
            language: stored.language.unwrap_or(defaults.language),
            screen_size: stored.screen_size.unwrap_or(defaults.screen_size),
            duration: stored.duration.unwrap_or(defaults.duration),
            last_ping: stored.last_ping,
        }
    }
}

impl VisitRecord {
    pub fn new(
        user_agent: String,
        path: String,
        referrer: Option<String>,
        language: String,
        screen_size: String,
    ) -> Self {
        Self {
            user_agent,
            path,
            referrer: referrer
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| DIRECT_REFERRER.to_string()),
            language,
            screen_size,
            ..Self::default()
        }
    }

    /// Overwrite location fields from an IP lookup
    pub fn apply_ip_location(&mut self, location: IpLocation) {
        self.city = non_empty(location.city).unwrap_or_else(|| UNKNOWN_PLACE.to_string());
        self.country = non_empty(location.country).unwrap_or_else(|| UNKNOWN_PLACE.to_string());
        self.ip = non_empty(location.ip).unwrap_or_else(|| ANONYMOUS_IP.to_string());
        self.method = LocationMethod::Ip;
    }

    /// Upgrade to a device fix. Missing place fields keep the previous values.
    pub fn apply_gps_location(&mut self, coordinates: Coordinates, place: GeoPlace) {
        if let Some(city) = non_empty(place.city) {
            self.city = city;
        }
        if let Some(country) = non_empty(place.country) {
            self.country = country;
        }
        self.method = LocationMethod::Gps;
        self.gps_allowed = true;
        self.lat = Some(coordinates.lat);
        self.lng = Some(coordinates.lng);
    }

    pub fn id_hex(&self) -> Option<String> {
        self.id.map(|oid| oid.to_hex())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
