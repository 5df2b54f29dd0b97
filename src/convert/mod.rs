pub mod from_json;
pub mod from_model;
pub mod to_json;
