pub mod credits_extractor;
pub mod identifier;
pub mod lookup;

pub use credits_extractor::{CreditsExtractor, PayloadShape, TITLE_URL_BASE};
pub use identifier::IdentifierExtractor;
