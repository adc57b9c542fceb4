pub mod archive;
pub mod commands;
pub mod config;
pub mod constants;
pub mod lane;
pub mod logging;
pub mod process;
pub mod shutdown;
pub mod stage;
pub mod utils;

mod http;

#[cfg(test)]
pub(crate) mod testing;
