pub use super::mangas::Entity as Mangas;
pub use super::readings::Entity as Readings;
pub use super::tomes::Entity as Tomes;
pub use super::users::Entity as Users;
