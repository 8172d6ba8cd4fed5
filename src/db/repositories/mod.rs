pub mod child;
pub mod entry;
pub mod user;
