pub mod config_cmd;
pub mod list;

pub use config_cmd::execute_config;
pub use list::execute_list;
