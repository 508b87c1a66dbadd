pub mod json;
pub mod sync_code;
