pub mod conversion;
pub mod input;
pub mod pagination;
pub mod reminders;
pub mod visibility;
