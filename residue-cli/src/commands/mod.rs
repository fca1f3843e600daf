pub mod add;
pub mod config;
pub mod flush;
pub mod list;
pub mod status;
