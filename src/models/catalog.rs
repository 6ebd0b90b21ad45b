use serde::{Deserialize, Serialize};

use super::Price;

pub const STATUS_COMPLETE: &str = "Collection complète";
pub const STATUS_INCOMPLETE: &str = "Collection incomplète";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Manga {
    pub id: i32,
    pub title: String,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub status: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    /// Ordered by `numero`
    #[serde(default)]
    pub tomes: Vec<Tome>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tome {
    pub id: i32,
    pub manga_id: i32,
    pub numero: i32,
    pub prix: Price,
    pub editeur: String,
    pub cover_image: Option<String>,
}

/// Account data safe to hand to clients (no password hash).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub isadmin: bool,
    pub userlogo: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub user_id: i32,
    pub tome_id: i32,
    pub rating: Option<i32>,
}

/// Validated fields for creating or replacing a manga.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MangaInput {
    pub title: String,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub status: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
}

/// Validated fields for creating or replacing a volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TomeInput {
    pub numero: i32,
    pub prix: Price,
    pub editeur: String,
    pub cover_image: Option<String>,
}

/// A volume row with the title of its series, for admin listings.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TomeWithManga {
    #[serde(flatten)]
    pub tome: Tome,
    pub manga_title: String,
}

/// One of the viewer's readings with the volume and series it belongs to.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReadingEntry {
    pub tome_id: i32,
    pub rating: Option<i32>,
    pub tome: Tome,
    pub manga_title: String,
}
