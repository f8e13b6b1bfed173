mod arena;
mod simulation;
mod state;
mod systems;
mod template;

pub use arena::{PlayerArena, PlayerHandle};
pub use simulation::Simulation;
pub use state::{Appearance, Articulation, Player, PlayerMode, Posture, Side, VehicleClass};
pub use systems::{Emitter, Radio, Store, WeaponState, WeaponStation};
pub use template::TemplateRegistry;
