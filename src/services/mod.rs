pub mod export;
pub mod items;
pub mod notifications;
pub mod users;

pub use export::{ExportFile, ExportFormat};
pub use items::{CreateItemInput, ItemFilter, ItemService, UpdateItemInput};
pub use notifications::NotificationService;
pub use users::{RegisterUser, UserService};

/// Offset/limit window applied to list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub skip: u64,
    pub limit: u64,
}

/// Page size policy shared by every list endpoint
#[derive(Debug, Clone, Copy)]
pub struct PageLimits {
    pub default_size: u64,
    pub max_size: u64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_size: 100,
            max_size: 1000,
        }
    }
}

impl PageLimits {
    pub fn new(default_size: u64, max_size: u64) -> Self {
        Self {
            default_size,
            max_size,
        }
    }

    /// Fills in defaults and clamps `limit` to the configured maximum.
    pub fn resolve(&self, skip: Option<u64>, limit: Option<u64>) -> Pagination {
        Pagination {
            skip: skip.unwrap_or(0),
            limit: limit.unwrap_or(self.default_size).min(self.max_size),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, None, 0, 100)]
    #[case(Some(20), Some(5), 20, 5)]
    #[case(None, Some(5000), 0, 1000)]
    #[case(None, Some(0), 0, 0)]
    fn pagination_defaults_and_clamp(
        #[case] skip: Option<u64>,
        #[case] limit: Option<u64>,
        #[case] expected_skip: u64,
        #[case] expected_limit: u64,
    ) {
        let page = PageLimits::default().resolve(skip, limit);
        assert_eq!(
            page,
            Pagination {
                skip: expected_skip,
                limit: expected_limit
            }
        );
    }
}
