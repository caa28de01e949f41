pub mod client;
pub mod traits;
pub mod types;
