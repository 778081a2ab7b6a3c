pub mod extractor;
pub mod jwt;
pub mod password;
pub mod requester;
pub mod reset_token;
