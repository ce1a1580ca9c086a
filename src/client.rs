mod commerce;
mod marketing;

pub use commerce::{CommerceClient, CommerceCredentials, CommerceError, FieldError};
pub use marketing::MarketingClient;
