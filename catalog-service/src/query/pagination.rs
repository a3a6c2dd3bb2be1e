//! Page windows and pagination metadata
//!
//! Pages are 1-based. A window of `limit` documents starting at
//! `skip = (page - 1) * limit` is taken from the filtered, sorted set.
//!
//! ```rust
//! use catalog_service::query::{PageWindow, PaginationPolicy};
//!
//! let window = PageWindow::from_params(Some("2"), Some("5"), &PaginationPolicy::default());
//! assert_eq!(window.skip(), 5);
//!
//! let meta = window.metadata(12, &PaginationPolicy::default());
//! assert_eq!(meta.total_pages, 3);
//! assert_eq!(meta.next_page, Some(3));
//! assert_eq!(meta.previous_page, Some(1));
//! ```

use serde::{Deserialize, Serialize};

/// Documents per page when the request does not say
pub const DEFAULT_LIMIT: u64 = 5;

/// Knobs for pagination behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationPolicy {
    /// Page size used when `limit` is absent or invalid
    pub default_limit: u64,
    /// Only report `previousPage` when it is a real page (`page > 1`)
    pub strict_previous_page: bool,
}

impl Default for PaginationPolicy {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            strict_previous_page: false,
        }
    }
}

/// Pagination metadata returned alongside list results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResult {
    /// The requested page
    pub current_page: u64,
    /// Page size
    pub results_per_page: u64,
    /// `ceil(total / limit)`
    pub total_pages: u64,
    /// Present when more documents follow this page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page: Option<u64>,
    /// Present when a page precedes this one (see [`PaginationPolicy`])
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_page: Option<u64>,
}

/// The page and page size of one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// 1-based page number
    pub page: u64,
    /// Page size, always at least 1
    pub limit: u64,
}

impl PageWindow {
    /// Read `page` and `limit`; absent, non-numeric or non-positive values
    /// fall back to page 1 and the policy's default limit
    #[must_use]
    pub fn from_params(page: Option<&str>, limit: Option<&str>, policy: &PaginationPolicy) -> Self {
        Self {
            page: positive(page).unwrap_or(1),
            limit: positive(limit).unwrap_or(policy.default_limit.max(1)),
        }
    }

    /// Documents to skip
    #[must_use]
    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Metadata for this window over `total` matching documents
    #[must_use]
    pub fn metadata(&self, total: u64, policy: &PaginationPolicy) -> PaginationResult {
        let has_previous = if policy.strict_previous_page {
            self.page > 1
        } else {
            self.page > 0
        };

        PaginationResult {
            current_page: self.page,
            results_per_page: self.limit,
            total_pages: total.div_ceil(self.limit),
            next_page: (self.page.saturating_mul(self.limit) < total).then(|| self.page + 1),
            previous_page: has_previous.then(|| self.page - 1),
        }
    }
}

fn positive(raw: Option<&str>) -> Option<u64> {
    raw?.trim().parse::<u64>().ok().filter(|n| *n > 0)
}
