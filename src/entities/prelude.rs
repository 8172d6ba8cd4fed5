pub use super::children::Entity as Children;
pub use super::time_entries::Entity as TimeEntries;
pub use super::users::Entity as Users;
