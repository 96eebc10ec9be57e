pub mod config_def;
pub mod time;
