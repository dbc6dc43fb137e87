//! Pagination types shared by the listing endpoints

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::config::PaginationConfig;

/// Paging query parameters (`?page=2&perPage=20`)
///
/// Both values arrive as raw strings so a malformed value falls back to the
/// default instead of rejecting the request.
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    #[param(example = "1")]
    pub page: Option<String>,

    #[param(example = "50")]
    pub per_page: Option<String>,
}

impl PaginationParams {
    /// Page number, 1-based (defaults to 1)
    pub fn page(&self) -> u64 {
        parse_positive(self.page.as_deref()).unwrap_or(1)
    }

    /// Page size (defaults to the configured default, clamped to the configured maximum)
    pub fn per_page(&self, config: &PaginationConfig) -> u64 {
        parse_positive(self.per_page.as_deref())
            .unwrap_or(config.default_per_page)
            .clamp(1, config.max_per_page.max(1))
    }

    /// Build the paging metadata for a listing
    pub fn page_meta(&self, config: &PaginationConfig, total: u64) -> PageMeta {
        let page = self.page();
        let per_page = self.per_page(config);
        PageMeta {
            has_more: total > page.saturating_mul(per_page),
            page,
            per_page,
            total,
        }
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
}

/// Paging metadata flattened into every listing response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub has_more: bool,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}
