//! Extractors shared by the HTTP modules

pub mod validated_json;

pub use validated_json::{ValidatedJson, ValidatedJsonRejection};
