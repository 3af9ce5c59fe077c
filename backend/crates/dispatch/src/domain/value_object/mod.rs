//! Value Object Module

pub mod command_type;
pub mod email_address;
pub mod search_scope;
pub mod search_term;
pub mod travel_mode;

pub use command_type::CommandType;
pub use email_address::EmailAddress;
pub use search_scope::SearchScope;
pub use search_term::SearchTerm;
pub use travel_mode::TravelMode;
