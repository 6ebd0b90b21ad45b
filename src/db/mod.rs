use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::models::{Manga, MangaInput, Reading, ReadingEntry, Tome, TomeInput, TomeWithManga, User};

pub mod migrator;
pub mod repositories;

pub use repositories::user::UserChanges;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
    security: SecurityConfig,
}

impl Store {
    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
        security: SecurityConfig,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with(":memory:") && !db_url.contains("mode=memory") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn, security })
    }

    fn manga_repo(&self) -> repositories::manga::MangaRepository {
        repositories::manga::MangaRepository::new(self.conn.clone())
    }

    fn tome_repo(&self) -> repositories::tome::TomeRepository {
        repositories::tome::TomeRepository::new(self.conn.clone())
    }

    fn reading_repo(&self) -> repositories::reading::ReadingRepository {
        repositories::reading::ReadingRepository::new(self.conn.clone())
    }

    // ========== Catalog ==========

    pub async fn list_mangas(&self) -> Result<Vec<Manga>> {
        self.manga_repo().list_with_tomes().await
    }

    pub async fn get_manga(&self, id: i32) -> Result<Option<Manga>> {
        self.manga_repo().get(id).await
    }

    pub async fn manga_exists(&self, id: i32) -> Result<bool> {
        self.manga_repo().exists(id).await
    }

    pub async fn manga_title_taken(&self, title: &str, excluding: Option<i32>) -> Result<bool> {
        self.manga_repo().title_taken(title, excluding).await
    }

    pub async fn add_manga(&self, input: MangaInput) -> Result<Manga> {
        self.manga_repo().create(input).await
    }

    pub async fn update_manga(&self, id: i32, input: MangaInput) -> Result<Option<Manga>> {
        self.manga_repo().update(id, input).await
    }

    pub async fn remove_manga(&self, id: i32) -> Result<bool> {
        self.manga_repo().delete(id).await
    }

    pub async fn get_tome(&self, id: i32) -> Result<Option<Tome>> {
        self.tome_repo().get(id).await
    }

    pub async fn tome_numero_taken(
        &self,
        manga_id: i32,
        numero: i32,
        excluding: Option<i32>,
    ) -> Result<bool> {
        self.tome_repo()
            .numero_taken(manga_id, numero, excluding)
            .await
    }

    pub async fn list_tomes_paged(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<TomeWithManga>, u64)> {
        self.tome_repo().list_paged(page, limit).await
    }

    pub async fn add_tome(&self, manga_id: i32, input: TomeInput) -> Result<Tome> {
        self.tome_repo().create(manga_id, input).await
    }

    pub async fn update_tome(&self, id: i32, input: TomeInput) -> Result<Option<Tome>> {
        self.tome_repo().update(id, input).await
    }

    pub async fn remove_tome(&self, id: i32) -> Result<bool> {
        self.tome_repo().delete(id).await
    }

    // ========== Readings ==========

    pub async fn mark_read(&self, user_id: i32, tome_id: i32) -> Result<()> {
        self.reading_repo().mark_read(user_id, tome_id).await
    }

    pub async fn unmark_read(&self, user_id: i32, tome_id: i32) -> Result<()> {
        self.reading_repo().unmark(user_id, tome_id).await
    }

    pub async fn set_rating(&self, user_id: i32, tome_id: i32, rating: Option<i32>) -> Result<()> {
        self.reading_repo()
            .set_rating(user_id, tome_id, rating)
            .await
    }

    pub async fn readings_for_user(&self, user_id: i32) -> Result<Vec<Reading>> {
        self.reading_repo().for_user(user_id).await
    }

    pub async fn all_ratings(&self) -> Result<Vec<Reading>> {
        self.reading_repo().all_rated().await
    }

    pub async fn reading_entries_for_user(&self, user_id: i32) -> Result<Vec<ReadingEntry>> {
        self.reading_repo().for_user_detailed(user_id).await
    }

    // ========== User Repository Methods ==========

    #[must_use]
    pub fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone(), self.security.clone())
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn username_taken(&self, username: &str, excluding: Option<i32>) -> Result<bool> {
        self.user_repo().username_taken(username, excluding).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repo().list().await
    }

    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_credentials(username, password).await
    }

    pub async fn add_user(&self, changes: UserChanges) -> Result<User> {
        self.user_repo().create(changes).await
    }

    pub async fn update_user(&self, id: i32, changes: UserChanges) -> Result<Option<User>> {
        self.user_repo().update(id, changes).await
    }

    pub async fn update_user_profile(
        &self,
        id: i32,
        username: &str,
        user_logo: Option<String>,
    ) -> Result<Option<User>> {
        self.user_repo()
            .update_profile(id, username, user_logo)
            .await
    }

    pub async fn remove_user(&self, id: i32) -> Result<bool> {
        self.user_repo().delete(id).await
    }
}
