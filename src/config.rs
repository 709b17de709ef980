use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// everything in process, gone on exit.
    Memory,
    /// a MongoDB replica set; live queries ride on change streams.
    Mongo,
}

/// feedlink: a social feed, messaging and notification core.
#[derive(Debug, Clone, Parser)]
#[command(name = "feedlink", author, version, about)]
pub struct Config {
    #[arg(long, env = "FEEDLINK_BACKEND", value_enum, default_value_t = Backend::Memory)]
    pub backend: Backend,

    #[arg(long, env = "FEEDLINK_MONGO_URI", default_value = "mongodb://localhost:27017")]
    pub mongo_uri: String,

    #[arg(long, env = "FEEDLINK_MONGO_DB", default_value = "feedlink")]
    pub mongo_db: String,

    /// where uploaded images go; kept in memory when omitted.
    #[arg(long, env = "FEEDLINK_STORAGE_DIR")]
    pub storage_dir: Option<PathBuf>,

    /// send every page except the landing page and static assets to `/`.
    #[arg(long, env = "FEEDLINK_MAINTENANCE")]
    pub maintenance: bool,

    /// console commands to run instead of reading stdin.
    #[arg(value_name = "SCRIPT")]
    pub script: Option<PathBuf>,
}
