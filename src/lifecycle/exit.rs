/// Terminates the process once both phases have succeeded.
pub trait ProcessExit: Send + Sync {
    fn exit(&self, code: i32);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ExitProcess;

impl ProcessExit for ExitProcess {
    fn exit(&self, code: i32) {
        tracing::info!(code, "Shutdown approved and cleaned up, exiting");
        std::process::exit(code);
    }
}
