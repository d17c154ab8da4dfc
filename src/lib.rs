pub mod android_jni;
pub mod bridge;
pub mod config;
pub mod error;
pub mod nav;
pub mod position;
pub mod route;
pub mod session;
pub mod steps;
pub mod tracker;
pub mod voice;

pub use config::TrackerConfig;
pub use error::NavError;
pub use route::{Point, Route};
pub use session::NavigationSession;
pub use tracker::{DisplayState, NavigationTracker};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
