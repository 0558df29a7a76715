use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use exam_core::model::{Phase, SubmissionKind};

use super::countdown::{Countdown, CountdownHandle, Tick};
use super::intent::SessionIntent;
use super::service::ExamSession;
use super::view::SessionSnapshot;
use crate::config::SessionConfig;
use crate::error::SessionError;

#[derive(Debug)]
enum Command {
    Intent(SessionIntent),
    Shutdown,
}

enum Event {
    Command(Option<Command>),
    Tick(Tick),
}

/// Presentation-side handle to a running session.
///
/// Dropping every handle unmounts the session: the runner stops its
/// countdown and exits.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Queue an intent. Intents are applied in dispatch order.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Closed` if the runner has stopped.
    pub async fn dispatch(&self, intent: SessionIntent) -> Result<(), SessionError> {
        self.commands
            .send(Command::Intent(intent))
            .await
            .map_err(|_| SessionError::Closed)
    }

    /// Latest published state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that is notified after every processed event.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Wait until a published snapshot satisfies `predicate`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Closed` if the runner stops first.
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&SessionSnapshot) -> bool,
    ) -> Result<SessionSnapshot, SessionError> {
        self.snapshots
            .wait_for(predicate)
            .await
            .map(|snapshot| (*snapshot).clone())
            .map_err(|_| SessionError::Closed)
    }

    /// Ask the runner to stop after the intents already queued.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Closed` if the runner has already stopped.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.commands
            .send(Command::Shutdown)
            .await
            .map_err(|_| SessionError::Closed)
    }
}

/// Single-task event loop that owns an `ExamSession` and its countdown.
///
/// Intents and countdown ticks are processed one at a time, each to
/// completion. Every entry into the active phase gets a new generation; ticks
/// from an older generation are discarded.
pub struct SessionRunner {
    session: ExamSession,
    config: SessionConfig,
    commands: mpsc::Receiver<Command>,
    ticks_tx: mpsc::Sender<Tick>,
    ticks_rx: mpsc::Receiver<Tick>,
    countdown: Option<CountdownHandle>,
    generation: u64,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl SessionRunner {
    /// Move `session` onto a new task.
    ///
    /// The join handle yields the session back once the runner stops.
    pub fn spawn(
        session: ExamSession,
        config: SessionConfig,
    ) -> (SessionHandle, JoinHandle<ExamSession>) {
        let (commands_tx, commands_rx) = mpsc::channel(config.channel_capacity);
        let (ticks_tx, ticks_rx) = mpsc::channel(config.channel_capacity);
        let (snapshots_tx, snapshots_rx) = watch::channel(session.snapshot());

        let mut runner = Self {
            session,
            config,
            commands: commands_rx,
            ticks_tx,
            ticks_rx,
            countdown: None,
            generation: 0,
            snapshots: snapshots_tx,
        };
        if runner.session.phase() == Phase::Active {
            runner.start_countdown();
        }

        let task = tokio::spawn(runner.run());
        let handle = SessionHandle {
            commands: commands_tx,
            snapshots: snapshots_rx,
        };
        (handle, task)
    }

    async fn run(mut self) -> ExamSession {
        loop {
            let event = tokio::select! {
                command = self.commands.recv() => Event::Command(command),
                Some(tick) = self.ticks_rx.recv() => Event::Tick(tick),
            };
            match event {
                Event::Command(Some(Command::Intent(intent))) => self.handle_intent(&intent),
                Event::Command(Some(Command::Shutdown) | None) => break,
                Event::Tick(tick) => self.handle_tick(tick),
            }
            self.publish();
        }

        self.stop_countdown();
        tracing::debug!(test = %self.session.test().slug(), "session runner stopped");
        self.session
    }

    fn handle_intent(&mut self, intent: &SessionIntent) {
        let before = self.session.phase();
        if before != Phase::Active {
            // a countdown can only belong to an attempt that already ended
            self.stop_countdown();
        }

        if !self.session.apply(intent) {
            tracing::debug!(?intent, phase = ?before, "intent had no effect");
        }

        match (before, self.session.phase()) {
            (Phase::Active, Phase::Active) => {}
            (_, Phase::Active) => self.start_countdown(),
            (_, _) => self.stop_countdown(),
        }
    }

    fn handle_tick(&mut self, tick: Tick) {
        if self.countdown.is_none() || tick.generation != self.generation {
            tracing::debug!(
                tick = tick.generation,
                current = self.generation,
                "discarded stale tick"
            );
            return;
        }

        self.session.tick();
        if self.session.is_expired() {
            tracing::info!(test = %self.session.test().slug(), "time is up, submitting");
            self.stop_countdown();
            let outcome = self
                .session
                .submit(SubmissionKind::Timeout)
                .map(|card| (card.score(), card.attempted()));
            match outcome {
                Some((score, attempted)) => {
                    tracing::info!(score, attempted, "auto submitted on timeout");
                }
                None => tracing::warn!(phase = ?self.session.phase(), "timeout submit had no effect"),
            }
        }
    }

    fn start_countdown(&mut self) {
        self.stop_countdown();
        self.generation += 1;
        self.countdown = Some(Countdown::spawn(
            self.ticks_tx.clone(),
            self.generation,
            self.config.tick_period,
        ));
    }

    fn stop_countdown(&mut self) {
        if let Some(countdown) = self.countdown.take() {
            countdown.cancel();
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.session.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::time::fixed_clock;
    use std::sync::Arc;
    use std::time::Duration;

    fn session() -> ExamSession {
        let tests = storage::sample::sample_tests().unwrap();
        ExamSession::new(Arc::new(tests[1].clone()), fixed_clock())
    }

    fn active_runner() -> SessionRunner {
        let (ticks_tx, ticks_rx) = mpsc::channel(4);
        let (_commands_tx, commands_rx) = mpsc::channel(4);
        let mut s = session();
        s.start();
        let (snapshots, _rx) = watch::channel(s.snapshot());
        let mut runner = SessionRunner {
            session: s,
            config: SessionConfig::default(),
            commands: commands_rx,
            ticks_tx,
            ticks_rx,
            countdown: None,
            generation: 0,
            snapshots,
        };
        runner.start_countdown();
        runner
    }

    #[tokio::test(start_paused = true)]
    async fn stale_ticks_are_discarded() {
        let mut runner = active_runner();
        let full = runner.session.time_remaining_secs();

        runner.handle_tick(Tick { generation: 0 });
        assert_eq!(runner.session.time_remaining_secs(), full);

        runner.handle_tick(Tick { generation: 1 });
        assert_eq!(runner.session.time_remaining_secs(), full - 1);
    }

    #[tokio::test(start_paused = true)]
    async fn last_tick_submits_once_and_stops_the_countdown() {
        let mut runner = active_runner();
        let total = runner.session.time_remaining_secs();
        for _ in 0..total {
            runner.handle_tick(Tick { generation: 1 });
        }

        assert_eq!(runner.session.phase(), Phase::Review);
        assert!(runner.countdown.is_none());
        let card = runner.session.scorecard().cloned().unwrap();
        assert!(card.is_forced());
        assert_eq!(card.time_taken_secs(), total);

        runner.handle_tick(Tick { generation: 1 });
        assert_eq!(runner.session.scorecard(), Some(&card));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handles_stops_the_runner() {
        let (handle, task) = SessionRunner::spawn(session(), SessionConfig::default());
        handle.dispatch(SessionIntent::Start).await.unwrap();
        drop(handle);

        let session = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.phase(), Phase::Active);
    }
}
