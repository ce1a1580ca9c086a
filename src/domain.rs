mod email_address;
mod person_name;
mod phone_number;

pub use email_address::EmailAddress;
pub use person_name::PersonName;
pub use phone_number::PhoneNumber;
