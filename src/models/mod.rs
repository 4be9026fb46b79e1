pub mod listing;
pub mod page;
