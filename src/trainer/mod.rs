pub mod session;
pub mod state;

pub use session::{Control, SessionSettings, TrainingSession};
pub use state::{SessionReport, SessionSnapshot, SessionState};
