pub mod prelude;

pub mod children;
pub mod time_entries;
pub mod users;
