// Re-export all model types
pub use self::dto::*;
pub use self::entities::*;
pub use self::enums::*;
pub use self::errors::*;

mod dto;
mod entities;
mod enums;
mod errors;

/// Soft-delete predicate applied by repository queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletedFilter {
    #[default]
    ActiveOnly,
    DeletedOnly,
    Any,
}

impl DeletedFilter {
    /// Whether a row with the given `deleted` flag passes the filter
    pub fn admits(self, deleted: bool) -> bool {
        match self {
            DeletedFilter::ActiveOnly => !deleted,
            DeletedFilter::DeletedOnly => deleted,
            DeletedFilter::Any => true,
        }
    }

    /// The value bound to a `deleted = $n` predicate, `None` meaning unfiltered
    pub fn as_sql_param(self) -> Option<bool> {
        match self {
            DeletedFilter::ActiveOnly => Some(false),
            DeletedFilter::DeletedOnly => Some(true),
            DeletedFilter::Any => None,
        }
    }
}
