//! Ponzu - project tool and server bootstrapper
//!
//! The binary parses one invocation and hands it to [`dispatch::Dispatcher`].
//! `ponzu serve` runs in-process through [`serve::Bootstrapper`].

pub mod analytics;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod generate;
pub mod launcher;
pub mod lifecycle;
pub mod logging;
pub mod scaffold;
pub mod serve;
pub mod services;
pub mod store;
pub mod tls;
pub mod usage;
