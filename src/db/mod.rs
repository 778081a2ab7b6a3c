pub mod lead_options;
pub mod leads;
pub mod profiles;
pub mod refresh_tokens;
pub mod users;
