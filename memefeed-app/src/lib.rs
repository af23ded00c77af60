pub mod clock;
pub mod config;
pub mod feed;
pub mod interact;
pub mod notify;
pub mod refresh;
pub mod seed;
pub mod session;
pub mod submission;
