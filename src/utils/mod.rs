//! Small support utilities.

pub mod time;

pub use time::Timer;
