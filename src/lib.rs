pub mod clock;
pub mod context;
pub mod driver;
pub mod error;
pub mod mesh;
pub mod metrics;
pub mod noise;
pub mod params;
pub mod scene;
pub mod schedule;
pub mod viewport;

#[cfg(feature = "viz")]
pub mod viz;

pub use error::{Error, Result};
