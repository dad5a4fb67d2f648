use crate::engine::events::{RunEvent, RunState};
use crate::engine::sink::EventSink;

/// Keeps every run event in memory, in emission order.
///
/// Tests use it to assert on the state machine a run walked through.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: Vec<RunEvent>,
}

impl CollectingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[RunEvent] {
        &self.events
    }

    /// States in the order they were entered.
    pub fn states(&self) -> Vec<RunState> {
        self.events.iter().map(|e| e.state).collect()
    }
}

impl EventSink for CollectingEventSink {
    fn emit(&mut self, event: RunEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::events::state_entered;
    use crate::run_id::RunId;

    #[test]
    fn events_keep_emission_order() {
        let run_id = RunId::new();
        let mut sink = CollectingEventSink::new();

        sink.emit(state_entered(&run_id, "login", RunState::Init));
        sink.emit(state_entered(&run_id, "login", RunState::Aborted));

        assert_eq!(sink.states(), vec![RunState::Init, RunState::Aborted]);
        assert!(sink.events().iter().all(|e| e.run_id == run_id));
        assert!(sink.events()[0].timestamp <= sink.events()[1].timestamp);
    }
}
