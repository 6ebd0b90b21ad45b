//! Domain service for read state, ratings and the per-viewer collection views.

use thiserror::Error;

use crate::models::ReadingEntry;
use crate::services::collection::MangaView;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 10;

#[derive(Debug, Error)]
pub enum ReadingError {
    #[error("Tome not found")]
    TomeNotFound,

    #[error("Rating must be between {MIN_RATING} and {MAX_RATING}")]
    InvalidRating,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for ReadingError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// Normalizes a submitted rating: absent or zero clears it, 1 to 10 is kept.
pub fn normalize_rating(rating: Option<i32>) -> Result<Option<i32>, ReadingError> {
    match rating {
        None | Some(0) => Ok(None),
        Some(r) if (MIN_RATING..=MAX_RATING).contains(&r) => Ok(Some(r)),
        Some(_) => Err(ReadingError::InvalidRating),
    }
}

#[async_trait::async_trait]
pub trait ReadingService: Send + Sync {
    /// Marks the volume read, or forgets the reading (and its rating).
    async fn set_read(&self, user_id: i32, tome_id: i32, is_read: bool) -> Result<(), ReadingError>;

    /// Stores or clears the viewer's rating. Rating a volume marks it read.
    async fn rate(&self, user_id: i32, tome_id: i32, rating: Option<i32>) -> Result<(), ReadingError>;

    async fn list(&self, user_id: i32) -> Result<Vec<ReadingEntry>, ReadingError>;

    /// The whole catalog annotated for `user_id`.
    async fn collection(&self, user_id: i32) -> Result<Vec<MangaView>, ReadingError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_rating() {
        assert_eq!(normalize_rating(None).unwrap(), None);
        assert_eq!(normalize_rating(Some(0)).unwrap(), None);
        assert_eq!(normalize_rating(Some(1)).unwrap(), Some(1));
        assert_eq!(normalize_rating(Some(10)).unwrap(), Some(10));
        assert!(matches!(
            normalize_rating(Some(11)),
            Err(ReadingError::InvalidRating)
        ));
        assert!(matches!(
            normalize_rating(Some(-3)),
            Err(ReadingError::InvalidRating)
        ));
    }
}
