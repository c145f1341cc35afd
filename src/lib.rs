pub mod backup;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod install;
pub mod logging;
pub mod logtail;
pub mod paths;
pub mod scheduler;
