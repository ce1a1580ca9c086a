mod customer;
mod entry;

pub use customer::{
    Customer, CustomerEmail, CustomerPayload, CustomerPhone, EmailMarketingStatus, TagRef,
};
pub use entry::{provenance_metadata, ContestEntry, Metadata, CONTEST_PRIZE, CONTEST_SOURCE};
