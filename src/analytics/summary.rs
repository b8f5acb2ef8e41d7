use chrono::NaiveDate;
use serde::Serialize;

use crate::analytics::classify::{
    classify_browser, classify_device_type, classify_os, classify_source,
};
use crate::analytics::rollups::{
    SeriesPoint, VisitField, average_duration, count_on_date, daily_series, monthly_series,
    top_by, top_by_field, total_count, yearly_series,
};
use crate::models::lead::{LeadDraft, LeadStatus};
use crate::models::visit::{LocationMethod, VisitRecord};

const RECENT_VISITS: usize = 50;

#[derive(Debug, Serialize)]
pub struct RecentVisit {
    pub id: Option<String>,
    pub timestamp: Option<i64>,
    pub city: String,
    pub country: String,
    pub method: LocationMethod,
    pub browser: &'static str,
    pub os: &'static str,
    pub device: &'static str,
    pub source: String,
    pub path: String,
    pub duration: i64,
}

impl From<&VisitRecord> for RecentVisit {
    fn from(visit: &VisitRecord) -> Self {
        Self {
            id: visit.id_hex(),
            timestamp: visit.timestamp,
            city: visit.city.clone(),
            country: visit.country.clone(),
            method: visit.method,
            browser: classify_browser(&visit.user_agent),
            os: classify_os(&visit.user_agent),
            device: classify_device_type(&visit.user_agent),
            source: classify_source(&visit.referrer),
            path: visit.path.clone(),
            duration: visit.duration,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LeadView {
    pub id: Option<String>,
    pub message: String,
    pub timestamp: Option<i64>,
    pub visit_id: String,
    pub status: LeadStatus,
    pub source: String,
}

impl From<LeadDraft> for LeadView {
    fn from(lead: LeadDraft) -> Self {
        Self {
            id: lead.id.map(|oid| oid.to_hex()),
            message: lead.message,
            timestamp: lead.timestamp,
            visit_id: lead.visit_id,
            status: lead.status,
            source: lead.source,
        }
    }
}

/// Everything the admin dashboard renders
#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub total_visits: usize,
    pub today_visits: usize,
    pub top_location: Option<String>,
    pub average_duration_secs: i64,
    pub gps_visits: usize,
    pub top_cities: Vec<SeriesPoint>,
    pub top_countries: Vec<SeriesPoint>,
    pub top_paths: Vec<SeriesPoint>,
    pub top_referrers: Vec<SeriesPoint>,
    pub languages: Vec<SeriesPoint>,
    pub screen_sizes: Vec<SeriesPoint>,
    pub daily: Vec<SeriesPoint>,
    pub monthly: Vec<SeriesPoint>,
    pub yearly: Vec<SeriesPoint>,
    pub browsers: Vec<SeriesPoint>,
    pub operating_systems: Vec<SeriesPoint>,
    pub devices: Vec<SeriesPoint>,
    pub sources: Vec<SeriesPoint>,
    pub recent_visits: Vec<RecentVisit>,
    pub total_leads: usize,
    pub sent_leads: usize,
    pub leads: Vec<LeadView>,
}

impl DashboardSummary {
    /// `visits` and `leads` are expected newest first, as the store returns them
    pub fn build(
        visits: &[VisitRecord],
        leads: Vec<LeadDraft>,
        today: NaiveDate,
        days: usize,
        limit: usize,
    ) -> Self {
        let top_cities = top_by_field(visits, VisitField::City, limit);
        let sent_leads = leads.iter().filter(|l| l.status == LeadStatus::Sent).count();

        Self {
            total_visits: total_count(visits),
            today_visits: count_on_date(visits, today),
            top_location: top_cities.first().map(|p| p.label.clone()),
            average_duration_secs: average_duration(visits),
            gps_visits: visits.iter().filter(|v| v.gps_allowed).count(),
            top_countries: top_by_field(visits, VisitField::Country, limit),
            top_cities,
            top_paths: top_by_field(visits, VisitField::Path, limit),
            top_referrers: top_by_field(visits, VisitField::Referrer, limit),
            languages: top_by_field(visits, VisitField::Language, limit),
            screen_sizes: top_by_field(visits, VisitField::ScreenSize, limit),
            daily: daily_series(visits, days, today),
            monthly: monthly_series(visits),
            yearly: yearly_series(visits),
            browsers: top_by(visits, |v| classify_browser(&v.user_agent).to_string(), limit),
            operating_systems: top_by(visits, |v| classify_os(&v.user_agent).to_string(), limit),
            devices: top_by(visits, |v| classify_device_type(&v.user_agent).to_string(), limit),
            sources: top_by(visits, |v| classify_source(&v.referrer), limit),
            recent_visits: visits.iter().take(RECENT_VISITS).map(RecentVisit::from).collect(),
            total_leads: leads.len(),
            sent_leads,
            leads: leads.into_iter().map(LeadView::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    #[test]
    fn builds_from_mixed_records() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let noon = Local
            .from_local_datetime(&today.and_hms_opt(12, 0, 0).unwrap())
            .earliest()
            .unwrap()
            .timestamp_millis();

        let visits = vec![
            VisitRecord {
                timestamp: Some(noon),
                city: "Trichy".to_string(),
                user_agent: "Mozilla/5.0 (Linux; Android 14) Chrome/120.0 Mobile Safari/537.36"
                    .to_string(),
                referrer: "https://www.linkedin.com/".to_string(),
                gps_allowed: true,
                method: LocationMethod::Gps,
                duration: 120,
                ..VisitRecord::default()
            },
            VisitRecord {
                timestamp: Some(noon - 86_400_000 * 3),
                city: "Trichy".to_string(),
                user_agent: "Mozilla/5.0 (Windows NT 10.0) Firefox/121.0".to_string(),
                ..VisitRecord::default()
            },
            VisitRecord {
                timestamp: Some(noon - 86_400_000 * 400),
                ..VisitRecord::default()
            },
        ];
        let leads = vec![
            LeadDraft::new("hi".to_string(), None, LeadStatus::Sent, "ServiceModal".to_string()),
            LeadDraft::new("h".to_string(), None, LeadStatus::Draft, "ServiceModal".to_string()),
        ];

        let summary = DashboardSummary::build(&visits, leads, today, 7, 5);

        assert_eq!(summary.total_visits, 3);
        assert_eq!(summary.today_visits, 1);
        assert_eq!(summary.top_location.as_deref(), Some("Trichy"));
        assert_eq!(summary.average_duration_secs, 40);
        assert_eq!(summary.gps_visits, 1);
        assert_eq!(summary.daily.len(), 7);
        assert_eq!(summary.sources[0], SeriesPoint::new("Direct", 2));
        assert!(summary.devices.contains(&SeriesPoint::new("Mobile", 1)));
        assert!(summary.browsers.contains(&SeriesPoint::new("Firefox", 1)));
        assert_eq!(summary.recent_visits.len(), 3);
        assert_eq!(summary.total_leads, 2);
        assert_eq!(summary.sent_leads, 1);
    }

    #[test]
    fn empty_dataset_yields_zeroes() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let summary = DashboardSummary::build(&[], Vec::new(), today, 7, 5);

        assert_eq!(summary.total_visits, 0);
        assert_eq!(summary.top_location, None);
        assert_eq!(summary.average_duration_secs, 0);
        assert_eq!(summary.daily.len(), 7);
        assert!(summary.daily.iter().all(|p| p.count == 0));
        assert!(summary.yearly.is_empty());
    }
}
