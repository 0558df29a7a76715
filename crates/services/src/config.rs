use std::time::Duration;

/// Runtime knobs for a session runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Wall-clock time per countdown tick. One tick removes one second.
    pub tick_period: Duration,
    /// Buffer size of the intent and tick channels.
    pub channel_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_secs(1),
            channel_capacity: 32,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn with_tick_period(mut self, tick_period: Duration) -> Self {
        // a zero period would make tokio's interval panic
        self.tick_period = tick_period.max(Duration::from_millis(1));
        self
    }

    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }
}
