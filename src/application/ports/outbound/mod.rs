//! Outbound ports - Interfaces that the application requires from external
//! systems

mod clock_port;
mod generator_port;
mod outcome_port;

pub use clock_port::Clock;
pub use generator_port::{CharacterGeneratorPort, EnemyIdentity};
pub use outcome_port::{OutcomeProviderPort, TurnOutcome};
