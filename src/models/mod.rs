pub mod lead;
pub mod lead_option;
pub mod profile;
pub mod refresh_token;
pub mod user;

pub use lead::*;
pub use lead_option::*;
pub use profile::*;
pub use refresh_token::*;
pub use user::*;
