pub mod body;
pub mod controls;
pub mod error;
pub mod experiment;
pub mod sensitivity;
pub mod settings;
pub mod simulation;

pub use body::PhysicsBody;
pub use error::PhysicsError;
pub use settings::PhysicsSettings;
pub use simulation::{FrameClock, Launch, Simulation};
