pub mod device;
pub mod dyad;
pub mod dyad_config;
pub mod error;
pub mod link;
pub mod role;
pub mod session;
pub mod settings;

/// A cursor position in workspace units
pub type Position = nalgebra::Vector2<f64>;

/// A force command; only X/Y are ever populated
pub type Force = nalgebra::Vector3<f64>;
