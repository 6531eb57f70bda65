use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Offset pagination for list operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, IntoParams)]
pub struct Page {
    #[serde(default)]
    pub offset: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Page {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self { offset, limit }.clamped()
    }

    /// Negative offsets become 0 and the limit is kept within `1..=MAX_PAGE_SIZE`.
    pub fn clamped(self) -> Self {
        Self {
            offset: self.offset.max(0),
            limit: self.limit.clamp(1, MAX_PAGE_SIZE),
        }
    }
}

/// What a delete actually did to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeleteOutcome {
    /// Cancelable entity: flagged canceled and re-saved.
    Canceled,
    /// Row removed from the repository.
    Removed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_clamp() {
        let page = Page::new(-4, 10_000);
        assert_eq!(page.offset, 0);
        assert_eq!(page.limit, MAX_PAGE_SIZE);
        assert_eq!(Page::new(3, 0).limit, 1);
    }
}
