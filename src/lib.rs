pub mod auth;
pub mod cmds;
pub mod config;
mod constructors;
pub mod controllers;
pub mod entities;
pub mod errors;
pub mod interactors;
pub mod presenters;
pub mod repositories;
pub mod storage;
pub mod sync;
pub mod usecases;
pub(crate) mod utils;

pub use constructors::*;
