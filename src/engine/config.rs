// 9.0.1: engine housekeeping knobs. economic parameters live in params.rs;
// this is only about how the engine itself behaves.

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Print events as they are emitted.
    pub verbose: bool,
    /// Cap on the in-memory audit log; oldest events are dropped past this.
    pub max_events: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            max_events: 10_000,
        }
    }
}
