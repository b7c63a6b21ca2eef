#![forbid(unsafe_code)]

pub mod card;
pub mod cli;
pub mod error;
pub mod events;
pub mod fetch;
pub mod fight_stats;
pub mod fighter;
pub mod formats;
pub mod html;
pub mod logging;
pub mod store;
pub mod update;
