pub mod catalog;
pub mod price;

pub use catalog::{
    Manga, MangaInput, Reading, ReadingEntry, Tome, TomeInput, TomeWithManga, User,
};
pub use price::Price;
