pub mod config;
pub mod logging;
pub mod error;
pub mod validation;
pub mod normalize;

pub use self::config::*;
pub use self::logging::*;
pub use self::error::*;
pub use self::validation::*;
pub use self::normalize::*;
