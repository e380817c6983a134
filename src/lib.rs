pub mod config;
pub mod diff;
pub mod notify;
pub mod output;
pub mod run;
pub mod severity;
pub mod snapshot;
pub mod source;
