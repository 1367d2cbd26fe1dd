//! City search over restaurant listings: filtering, ordering and paging.

use serde::{Deserialize, Serialize};

use crate::models::Restaurant;

pub const PAGE_SIZE: usize = 10;

/// Query string of `GET /api/restaurant/search/{city}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchParams {
    pub search_query: Option<String>,
    /// Comma separated; every listed cuisine must be served.
    pub selected_cuisines: Option<String>,
    pub sort_option: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOption {
    LastUpdated,
    DeliveryPrice,
    EstimatedDeliveryTime,
}

impl SortOption {
    /// Unknown or missing values fall back to `LastUpdated`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("deliveryPrice") => SortOption::DeliveryPrice,
            Some("estimatedDeliveryTime") => SortOption::EstimatedDeliveryTime,
            _ => SortOption::LastUpdated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total: usize,
    pub page: usize,
    pub pages: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub data: Vec<Restaurant>,
    pub pagination: Pagination,
}

impl SearchParams {
    pub fn page_number(&self) -> usize {
        self.page.as_deref().and_then(|p| p.trim().parse::<usize>().ok()).filter(|p| *p >= 1).unwrap_or(1)
    }

    fn cuisines(&self) -> Vec<String> {
        self.selected_cuisines
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect()
    }

    fn query(&self) -> Option<String> {
        self.search_query.as_deref().map(|q| q.trim().to_lowercase()).filter(|q| !q.is_empty())
    }
}

fn matches_query(r: &Restaurant, needle: &str) -> bool {
    r.restaurant_name.to_lowercase().contains(needle) || r.cuisines.iter().any(|c| c.to_lowercase().contains(needle))
}

/// Filter, sort and page the restaurants of one city.
pub fn search(city_restaurants: Vec<Restaurant>, params: &SearchParams) -> SearchPage {
    let cuisines = params.cuisines();
    let query = params.query();
    let mut hits: Vec<Restaurant> = city_restaurants
        .into_iter()
        .filter(|r| cuisines.iter().all(|c| r.has_cuisine(c)))
        .filter(|r| query.as_deref().map_or(true, |q| matches_query(r, q)))
        .collect();

    match SortOption::parse(params.sort_option.as_deref()) {
        SortOption::LastUpdated => hits.sort_by(|a, b| b.last_updated.cmp(&a.last_updated)),
        SortOption::DeliveryPrice => hits.sort_by_key(|r| r.delivery_price),
        SortOption::EstimatedDeliveryTime => hits.sort_by_key(|r| r.estimated_delivery_time),
    }

    let total = hits.len();
    let page = params.page_number();
    let pages = total.div_ceil(PAGE_SIZE).max(1);
    let data = hits.into_iter().skip((page - 1).saturating_mul(PAGE_SIZE)).take(PAGE_SIZE).collect();
    SearchPage { data, pagination: Pagination { total, page, pages } }
}
