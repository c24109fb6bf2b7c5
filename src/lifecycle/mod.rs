mod chain;
mod exit;
mod handler;
mod registry;
pub mod signals;
mod shutdown;

pub use chain::{run_chain, ChainOutcome, RejectReason};
pub use exit::{ExitProcess, ProcessExit};
pub use handler::{named, spawned, AsyncHandler, Continuation, Handler, Named, Spawned};
pub use registry::{HandlerRegistry, HandlerToken, Phase};
pub use shutdown::{CoordinatorState, RunOutcome, ShutdownCoordinator};
pub use signals::{listen, TerminationSignal};
