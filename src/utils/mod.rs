pub mod address_validator;
pub mod coin_normalizer;

pub use address_validator::AddressValidator;
pub use coin_normalizer::normalize_coin_identifier;
