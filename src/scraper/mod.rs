//! Client side of the third-party product-details API: credential pool,
//! HTTP client and the text parsing applied to its payloads.

pub mod client;
pub mod credentials;
pub mod parse;

pub use client::{ApiEnvelope, ProductData, ProductDetailsApi, RapidApiClient};
pub use credentials::{CredentialPool, CredentialPoolError};
pub use parse::{parse_decimal_value, parse_star_rating, read_asin_list};
