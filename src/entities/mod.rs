pub mod prelude;

pub mod mangas;
pub mod readings;
pub mod tomes;
pub mod users;
