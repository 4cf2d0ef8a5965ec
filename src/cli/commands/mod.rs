mod check;
mod init_config;

pub use check::cmd_check;
pub use init_config::cmd_init_config;
