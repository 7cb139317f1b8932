//! Domain model (messages, settings, variables, lifecycle state, ids).

pub mod ids;
pub mod message;
pub mod settings;
pub mod state;
pub mod variables;

pub use ids::RunId;
pub use message::{
    DispatchPayload, HostMessage, LogLevel, LogMessage, StatusMessage, WorkerMessage,
};
pub use settings::Settings;
pub use state::WorkerState;
pub use variables::VariableStore;
