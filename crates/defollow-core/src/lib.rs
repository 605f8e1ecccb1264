pub mod actuator;
pub mod config;
pub mod driver;
pub mod error;
pub mod import;
pub mod io;
pub mod ledger;
pub mod paths;
pub mod runner;
pub mod select;
pub mod session;
pub mod types;
pub mod webdriver;

pub use error::{DefollowError, Result};
