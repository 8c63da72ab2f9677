//! Watches the screen for known prompt buttons and clicks them once the
//! pointer has been left alone for a while.

pub mod config;
pub mod desktop;
pub mod dispatch;
pub mod geometry;
pub mod idle;
pub mod run_loop;
pub mod scanner;

pub use crate::{
    config::{Config, ConfigError},
    dispatch::{ClickDispatcher, ClickEvent, Input},
    geometry::{Point, Rect},
    idle::IdleTracker,
    run_loop::{Autoclicker, CycleOutcome},
    scanner::{find_first_match, Locator, Match},
};
