//! Credential handling

mod token;

pub use token::{mask_token, validate_token, TokenError};
