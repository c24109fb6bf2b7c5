pub mod config;
pub mod lifecycle;
pub mod types;

#[cfg(test)]
pub mod test_utils;

pub use config::GateConfig;
pub use lifecycle::{
    Continuation, CoordinatorState, Handler, HandlerToken, RunOutcome, ShutdownCoordinator,
};
pub use types::error::{GateError, Result};
