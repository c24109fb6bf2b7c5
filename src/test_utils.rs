use std::sync::{Arc, Mutex};

use crate::lifecycle::{named, Continuation, Handler, ProcessExit};

/// Shared record of handler invocations, in call order.
#[derive(Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn record(&self, name: &str) {
        self.calls.lock().unwrap().push(name.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

/// Handler that logs its name and resolves inline with `approved`.
pub fn deciding(log: &CallLog, name: &str, approved: bool) -> Arc<dyn Handler> {
    let log = log.clone();
    let label = name.to_string();
    named(name, move |done: Continuation| {
        log.record(&label);
        done.resolve(approved);
    })
}

/// Exit hook that records requested exit codes instead of exiting.
#[derive(Default)]
pub struct RecordingExit {
    codes: Mutex<Vec<i32>>,
}

impl RecordingExit {
    pub fn codes(&self) -> Vec<i32> {
        self.codes.lock().unwrap().clone()
    }
}

impl ProcessExit for RecordingExit {
    fn exit(&self, code: i32) {
        self.codes.lock().unwrap().push(code);
    }
}
