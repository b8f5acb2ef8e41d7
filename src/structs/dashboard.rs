use serde::Deserialize;

const DEFAULT_DAYS: usize = 7;
const MAX_DAYS: usize = 366;
const DEFAULT_LIMIT: usize = 5;
const MAX_LIMIT: usize = 100;

#[derive(Deserialize, Default)]
pub struct DashboardParams {
    pub days: Option<usize>,
    pub limit: Option<usize>,
}

impl DashboardParams {
    pub fn days(&self) -> usize {
        self.days.unwrap_or(DEFAULT_DAYS).clamp(1, MAX_DAYS)
    }

    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}
