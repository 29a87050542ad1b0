//! # Castellan Tokens
//!
//! Long-lived API and transfer tokens: the second actor type next to
//! interactive admin users. Tokens never trust their stored data; custom
//! permission lists are re-validated against the live action set on every
//! create and update, and lifespans come from a fixed allowed set.

pub mod token;

pub use token::{
    permissions_for_token, validate_custom_permissions, validate_lifespan, ApiToken,
    TokenType, TransferToken, TransferTokenPermission, ALLOWED_LIFESPANS, DAYS_7, DAYS_30,
    DAYS_90,
};
