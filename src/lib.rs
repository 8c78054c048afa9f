//! Neuroevolution of snake-playing policies.
//!
//! A [`Session`] owns a [`Population`] of [`Agent`]s, each driven by its own
//! [`Policy`]. Training steps every live agent until all are dead, then
//! [`evolve`] ranks them, keeps the elites and breeds mutated offspring.

pub mod agent;
pub mod config;
pub mod evolution;
pub mod persistence;
pub mod policy;
pub mod population;
pub mod pos;
pub mod session;

pub use agent::{Agent, Arena, Death};
pub use config::{AgentRules, ConfigError, EvolutionParams, GridConfig, TrainerConfig};
pub use evolution::{evolve, rank};
pub use persistence::{ModelRecord, PersistError, SavedModel};
pub use policy::{Observation, Policy, Scores};
pub use population::{GenerationSummary, Population};
pub use pos::{Action, Heading, Pos};
pub use session::{BestPolicy, Mode, Session, Speed};
