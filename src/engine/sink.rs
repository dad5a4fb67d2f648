use crate::engine::events::RunEvent;

pub trait EventSink: Send {
    fn emit(&mut self, event: RunEvent);
}

/// Logs every state transition through `tracing`.
#[derive(Debug, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&mut self, event: RunEvent) {
        tracing::debug!(
            run_id = %event.run_id,
            executable = %event.executable,
            state = %event.state,
            "state entered"
        );
    }
}
