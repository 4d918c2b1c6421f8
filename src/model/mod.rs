pub mod config_store;
pub mod locale_store;
pub mod lookup;
