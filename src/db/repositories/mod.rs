pub mod manga;
pub mod reading;
pub mod tome;
pub mod user;
