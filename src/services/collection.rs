//! Per-viewer read state and ratings, derived from a catalog snapshot.
//!
//! Nothing here touches the database: callers fetch the catalog and the
//! relevant readings, then build [`MangaView`]s and query them.

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::catalog::{STATUS_COMPLETE, STATUS_INCOMPLETE};
use crate::models::{Manga, Price, Reading, Tome};

/// Average rating at or above which a series counts as highly rated.
pub const HIGH_RATING_THRESHOLD: f64 = 7.0;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TomeView {
    #[serde(flatten)]
    pub tome: Tome,
    pub is_read: bool,
    pub rating: Option<i32>,
    pub global_rating: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReadStatus {
    Unread,
    Partial,
    Read,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RatingStatus {
    Unrated,
    High,
    Low,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusCategory {
    Complete,
    Incomplete,
    Other,
}

impl StatusCategory {
    #[must_use]
    pub fn of(status: &str) -> Self {
        match status {
            STATUS_COMPLETE => Self::Complete,
            STATUS_INCOMPLETE => Self::Incomplete,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MangaView {
    pub id: i32,
    pub title: String,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub status: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub tomes: Vec<TomeView>,
    pub total_price: Price,
    pub average_rating: Option<f64>,
    pub global_average_rating: Option<f64>,
    pub read_status: ReadStatus,
    pub rating_status: RatingStatus,
}

fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0_u32), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / f64::from(count))
}

impl MangaView {
    fn from_parts(manga: Manga, tomes: Vec<TomeView>) -> Self {
        let total_price = tomes.iter().map(|t| t.tome.prix).sum();

        let average_rating = mean(
            tomes
                .iter()
                .filter_map(|t| t.rating)
                .filter(|r| *r > 0)
                .map(f64::from),
        );

        let global_average_rating = mean(
            tomes
                .iter()
                .filter_map(|t| t.global_rating)
                .filter(|r| *r > 0.0),
        );

        let read_count = tomes.iter().filter(|t| t.is_read).count();
        let read_status = if read_count == 0 {
            ReadStatus::Unread
        } else if read_count == tomes.len() {
            ReadStatus::Read
        } else {
            ReadStatus::Partial
        };

        let rating_status = match average_rating {
            None => RatingStatus::Unrated,
            Some(avg) if avg >= HIGH_RATING_THRESHOLD => RatingStatus::High,
            Some(_) => RatingStatus::Low,
        };

        Self {
            id: manga.id,
            title: manga.title,
            author: manga.author,
            genre: manga.genre,
            status: manga.status,
            description: manga.description,
            cover_image: manga.cover_image,
            tomes,
            total_price,
            average_rating,
            global_average_rating,
            read_status,
            rating_status,
        }
    }

    #[must_use]
    pub fn status_category(&self) -> StatusCategory {
        StatusCategory::of(&self.status)
    }

    fn matches_search(&self, needle: &str) -> bool {
        let contains = |field: &str| field.to_lowercase().contains(needle);
        contains(&self.title)
            || self.author.as_deref().is_some_and(contains)
            || self.genre.as_deref().is_some_and(contains)
    }
}

/// Annotates every volume with the viewer's reading and the global mean rating.
///
/// `viewer_readings` are the viewer's own rows; `all_ratings` holds rated rows
/// from every user. Ratings that are absent or not positive never count.
#[must_use]
pub fn build_views(
    mangas: Vec<Manga>,
    viewer_readings: &[Reading],
    all_ratings: &[Reading],
) -> Vec<MangaView> {
    let viewer: HashMap<i32, Option<i32>> = viewer_readings
        .iter()
        .map(|r| (r.tome_id, r.rating))
        .collect();

    let mut sums: HashMap<i32, (i64, u32)> = HashMap::new();
    for reading in all_ratings {
        if let Some(rating) = reading.rating.filter(|r| *r > 0) {
            let entry = sums.entry(reading.tome_id).or_default();
            entry.0 += i64::from(rating);
            entry.1 += 1;
        }
    }

    mangas
        .into_iter()
        .map(|mut manga| {
            let tomes = std::mem::take(&mut manga.tomes)
                .into_iter()
                .map(|tome| {
                    let own = viewer.get(&tome.id);
                    #[allow(clippy::cast_precision_loss)]
                    let global_rating = sums
                        .get(&tome.id)
                        .map(|(sum, count)| *sum as f64 / f64::from(*count));
                    TomeView {
                        is_read: own.is_some(),
                        rating: own.copied().flatten(),
                        global_rating,
                        tome,
                    }
                })
                .collect();
            MangaView::from_parts(manga, tomes)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RatingFilter {
    Rated,
    Unrated,
    High,
    Low,
}

impl RatingFilter {
    const fn accepts(self, status: RatingStatus) -> bool {
        match self {
            Self::Rated => !matches!(status, RatingStatus::Unrated),
            Self::Unrated => matches!(status, RatingStatus::Unrated),
            Self::High => matches!(status, RatingStatus::High),
            Self::Low => matches!(status, RatingStatus::Low),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    #[serde(rename = "title")]
    Title,
    #[serde(rename = "rating")]
    Rating,
    #[serde(rename = "tomesCount")]
    TomeCount,
    #[serde(rename = "price")]
    Price,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Filter criteria, AND-combined. `None` means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionFilter {
    pub search: Option<String>,
    pub status: Option<StatusCategory>,
    pub read: Option<ReadStatus>,
    pub rating: Option<RatingFilter>,
    pub sort: SortKey,
    pub order: SortOrder,
}

impl CollectionFilter {
    #[must_use]
    pub fn matches(&self, view: &MangaView) -> bool {
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            if !view.matches_search(&search.to_lowercase()) {
                return false;
            }
        }

        if self.status.is_some_and(|s| s != view.status_category()) {
            return false;
        }

        if self.read.is_some_and(|r| r != view.read_status) {
            return false;
        }

        if self.rating.is_some_and(|r| !r.accepts(view.rating_status)) {
            return false;
        }

        true
    }

    /// Natural order of the sort key: titles alphabetically, numbers largest first.
    fn compare(&self, a: &MangaView, b: &MangaView) -> Ordering {
        match self.sort {
            SortKey::Title => a
                .title
                .to_lowercase()
                .cmp(&b.title.to_lowercase())
                .then_with(|| a.title.cmp(&b.title)),
            SortKey::Rating => {
                let ra = a.average_rating.unwrap_or(0.0);
                let rb = b.average_rating.unwrap_or(0.0);
                rb.total_cmp(&ra)
            }
            SortKey::TomeCount => b.tomes.len().cmp(&a.tomes.len()),
            SortKey::Price => b.total_price.cmp(&a.total_price),
        }
    }

    /// Keeps the matching views and sorts them; `Desc` inverts the natural order.
    #[must_use]
    pub fn apply(&self, views: &[MangaView]) -> Vec<MangaView> {
        let mut matching: Vec<MangaView> =
            views.iter().filter(|v| self.matches(v)).cloned().collect();

        matching.sort_by(|a, b| {
            let ordering = self.compare(a, b);
            match self.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        matching
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStats {
    pub manga_count: usize,
    pub total_tomes: usize,
    pub read_tomes: usize,
    pub total_price: Price,
    pub read_price: Price,
}

#[must_use]
pub fn collection_stats(views: &[MangaView]) -> CollectionStats {
    views.iter().fold(
        CollectionStats {
            manga_count: views.len(),
            ..CollectionStats::default()
        },
        |mut stats, view| {
            stats.total_tomes += view.tomes.len();
            stats.total_price = stats.total_price + view.total_price;
            for tome in view.tomes.iter().filter(|t| t.is_read) {
                stats.read_tomes += 1;
                stats.read_price = stats.read_price + tome.tome.prix;
            }
            stats
        },
    )
}

#[derive(Debug, Clone, PartialEq)]
pub enum Suggestion<'a> {
    Pick(&'a MangaView),
    FullyRead,
}

/// Picks uniformly among series that are not fully read.
pub fn suggest_random<'a, R: Rng + ?Sized>(
    views: &'a [MangaView],
    rng: &mut R,
) -> Suggestion<'a> {
    let candidates: Vec<&MangaView> = views
        .iter()
        .filter(|v| v.read_status != ReadStatus::Read)
        .collect();

    candidates
        .choose(rng)
        .map_or(Suggestion::FullyRead, |view| Suggestion::Pick(*view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn tome(id: i32, manga_id: i32, numero: i32, cents: i64) -> Tome {
        Tome {
            id,
            manga_id,
            numero,
            prix: Price::from_cents(cents).unwrap(),
            editeur: "Glénat".to_string(),
            cover_image: None,
        }
    }

    fn manga(id: i32, title: &str, status: &str, tomes: Vec<Tome>) -> Manga {
        Manga {
            id,
            title: title.to_string(),
            author: Some(format!("Author {id}")),
            genre: Some("Shonen".to_string()),
            status: status.to_string(),
            description: None,
            cover_image: None,
            tomes,
        }
    }

    fn reading(user_id: i32, tome_id: i32, rating: Option<i32>) -> Reading {
        Reading {
            user_id,
            tome_id,
            rating,
        }
    }

    /// Three series:
    /// - One Piece (complete, 3 tomes): viewer read 1 and 2, rated 8 and 9
    /// - Akira (incomplete, 2 tomes): viewer read both, rated 4
    /// - Berserk (other status, no tomes)
    fn fixture() -> Vec<MangaView> {
        let catalog = vec![
            manga(
                1,
                "One Piece",
                STATUS_COMPLETE,
                vec![tome(10, 1, 1, 690), tome(11, 1, 2, 690), tome(12, 1, 3, 720)],
            ),
            manga(
                2,
                "akira",
                STATUS_INCOMPLETE,
                vec![tome(20, 2, 1, 1500), tome(21, 2, 2, 1500)],
            ),
            manga(3, "Berserk", "En cours", vec![]),
        ];
        let viewer = vec![
            reading(1, 10, Some(8)),
            reading(1, 11, Some(9)),
            reading(1, 20, Some(4)),
            reading(1, 21, None),
        ];
        let all = vec![
            reading(1, 10, Some(8)),
            reading(1, 11, Some(9)),
            reading(1, 20, Some(4)),
            reading(2, 10, Some(6)),
            reading(2, 12, Some(0)),
        ];
        build_views(catalog, &viewer, &all)
    }

    fn titles(views: &[MangaView]) -> Vec<&str> {
        views.iter().map(|v| v.title.as_str()).collect()
    }

    #[test]
    fn test_volume_annotations() {
        let views = fixture();
        let one_piece = &views[0];

        assert!(one_piece.tomes[0].is_read);
        assert_eq!(one_piece.tomes[0].rating, Some(8));
        assert_eq!(one_piece.tomes[0].global_rating, Some(7.0));

        assert!(!one_piece.tomes[2].is_read);
        assert_eq!(one_piece.tomes[2].rating, None);
        assert_eq!(one_piece.tomes[2].global_rating, None);

        let akira = &views[1];
        assert!(akira.tomes[1].is_read);
        assert_eq!(akira.tomes[1].rating, None);
    }

    #[test]
    fn test_manga_aggregates() {
        let views = fixture();
        let one_piece = &views[0];

        assert_eq!(one_piece.total_price, Price::from_cents(2100).unwrap());
        assert_eq!(one_piece.average_rating, Some(8.5));
        assert_eq!(one_piece.global_average_rating, Some(8.0));
        assert_eq!(one_piece.read_status, ReadStatus::Partial);
        assert_eq!(one_piece.rating_status, RatingStatus::High);

        let akira = &views[1];
        assert_eq!(akira.average_rating, Some(4.0));
        assert_eq!(akira.read_status, ReadStatus::Read);
        assert_eq!(akira.rating_status, RatingStatus::Low);

        let berserk = &views[2];
        assert_eq!(berserk.total_price, Price::ZERO);
        assert_eq!(berserk.average_rating, None);
        assert_eq!(berserk.global_average_rating, None);
        assert_eq!(berserk.read_status, ReadStatus::Unread);
        assert_eq!(berserk.rating_status, RatingStatus::Unrated);
        assert_eq!(berserk.status_category(), StatusCategory::Other);
    }

    #[test]
    fn test_high_threshold_is_inclusive() {
        let catalog = vec![manga(1, "X", STATUS_COMPLETE, vec![tome(1, 1, 1, 100)])];
        let views = build_views(catalog, &[reading(1, 1, Some(7))], &[]);
        assert_eq!(views[0].rating_status, RatingStatus::High);
    }

    #[test]
    fn test_filters_combine() {
        let views = fixture();

        let search = CollectionFilter {
            search: Some("SHONEN".to_string()),
            ..Default::default()
        };
        assert_eq!(search.apply(&views).len(), 3);

        let search = CollectionFilter {
            search: Some("kir".to_string()),
            ..Default::default()
        };
        assert_eq!(titles(&search.apply(&views)), vec!["akira"]);

        let complete_partial = CollectionFilter {
            status: Some(StatusCategory::Complete),
            read: Some(ReadStatus::Partial),
            ..Default::default()
        };
        assert_eq!(titles(&complete_partial.apply(&views)), vec!["One Piece"]);

        let conflicting = CollectionFilter {
            status: Some(StatusCategory::Complete),
            read: Some(ReadStatus::Read),
            ..Default::default()
        };
        assert!(conflicting.apply(&views).is_empty());

        let rated = CollectionFilter {
            rating: Some(RatingFilter::Rated),
            ..Default::default()
        };
        assert_eq!(rated.apply(&views).len(), 2);

        let unrated = CollectionFilter {
            rating: Some(RatingFilter::Unrated),
            ..Default::default()
        };
        assert_eq!(titles(&unrated.apply(&views)), vec!["Berserk"]);

        let low = CollectionFilter {
            rating: Some(RatingFilter::Low),
            ..Default::default()
        };
        assert_eq!(titles(&low.apply(&views)), vec!["akira"]);
    }

    #[test]
    fn test_sorting() {
        let views = fixture();

        let by_title = CollectionFilter::default();
        assert_eq!(
            titles(&by_title.apply(&views)),
            vec!["akira", "Berserk", "One Piece"]
        );

        let by_title_desc = CollectionFilter {
            order: SortOrder::Desc,
            ..Default::default()
        };
        assert_eq!(
            titles(&by_title_desc.apply(&views)),
            vec!["One Piece", "Berserk", "akira"]
        );

        let by_rating = CollectionFilter {
            sort: SortKey::Rating,
            ..Default::default()
        };
        assert_eq!(
            titles(&by_rating.apply(&views)),
            vec!["One Piece", "akira", "Berserk"]
        );

        let by_count_desc = CollectionFilter {
            sort: SortKey::TomeCount,
            order: SortOrder::Desc,
            ..Default::default()
        };
        assert_eq!(
            titles(&by_count_desc.apply(&views)),
            vec!["Berserk", "akira", "One Piece"]
        );

        let by_price = CollectionFilter {
            sort: SortKey::Price,
            ..Default::default()
        };
        assert_eq!(
            titles(&by_price.apply(&views)),
            vec!["akira", "One Piece", "Berserk"]
        );
    }

    #[test]
    fn test_stats() {
        let stats = collection_stats(&fixture());
        assert_eq!(stats.manga_count, 3);
        assert_eq!(stats.total_tomes, 5);
        assert_eq!(stats.read_tomes, 4);
        assert_eq!(stats.total_price, Price::from_cents(5100).unwrap());
        assert_eq!(stats.read_price, Price::from_cents(4380).unwrap());
    }

    #[test]
    fn test_random_suggestion_skips_fully_read() {
        let views = fixture();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            match suggest_random(&views, &mut rng) {
                Suggestion::Pick(view) => assert_ne!(view.title, "akira"),
                Suggestion::FullyRead => panic!("collection is not fully read"),
            }
        }
    }

    #[test]
    fn test_random_suggestion_when_everything_read() {
        let catalog = vec![manga(1, "X", STATUS_COMPLETE, vec![tome(1, 1, 1, 100)])];
        let views = build_views(catalog, &[reading(1, 1, None)], &[]);
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(suggest_random(&views, &mut rng), Suggestion::FullyRead);
        assert_eq!(suggest_random(&[], &mut rng), Suggestion::FullyRead);
    }
}
