//! The decision loop: oracle action → shell primitive → event log.

use std::future::Future;
use std::pin::pin;

use shell_pilot_core::{
    CloseShellOutcome, CommandKind, CommandOutcome, ConnectOutcome, DisconnectOutcome, EventKind,
    EventLog, HistoryWindow, InterruptOutcome, NextAction, Oracle, OracleError, ShellCreateOutcome,
    ShellDriver, StepEvent,
    history::{render_bounded, render_events},
};
use tokio::time::Instant;

use crate::config::RunConfig;
use crate::persist;

/// What a finished run produced.
#[derive(Debug)]
pub struct RunReport {
    /// Events recorded over the whole session.
    pub events_recorded: usize,
    /// Whether the final summary came from the oracle (`true`) or the
    /// fallback report (`false`).
    pub summarized: bool,
}

/// Drives one shell session from oracle decisions for a fixed wall-clock
/// budget.
///
/// The controller exclusively owns the driver and the event log. Whatever
/// ends the loop - budget exhaustion, a shutdown signal - the shell is
/// closed, the transport released, and the history and summary written.
pub struct SessionController<D, O> {
    driver: D,
    oracle: O,
    config: RunConfig,
    log: EventLog,
}

impl<D, O> SessionController<D, O>
where
    D: ShellDriver,
    O: Oracle,
{
    /// Create a controller around a driver and an oracle.
    #[must_use]
    pub fn new(driver: D, oracle: O, config: RunConfig) -> Self {
        Self {
            driver,
            oracle,
            config,
            log: EventLog::new(),
        }
    }

    /// Run until the time budget expires or the process is interrupted.
    pub async fn run(self) -> RunReport {
        self.run_until(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {}
                Err(e) => {
                    tracing::warn!("cannot listen for interrupt signal: {e}");
                    std::future::pending::<()>().await;
                }
            }
        })
        .await
    }

    /// Run until the time budget expires or `shutdown` completes.
    ///
    /// Cleanup and final summarization happen on every exit path.
    pub async fn run_until<F>(mut self, shutdown: F) -> RunReport
    where
        F: Future<Output = ()>,
    {
        let started = Instant::now();
        let mut shutdown = pin!(shutdown);

        loop {
            if started.elapsed() >= self.config.time_budget {
                tracing::info!("time budget exhausted, ending session");
                break;
            }

            tokio::select! {
                biased;
                () = &mut shutdown => {
                    tracing::info!("shutdown requested, ending session");
                    break;
                }
                step = self.step() => {
                    let elapsed = started.elapsed().as_secs_f64();
                    match step {
                        Ok(()) => {
                            tracing::debug!(elapsed_secs = elapsed, "iteration complete");
                            tokio::time::sleep(self.config.pacing.step_pause).await;
                        }
                        Err(e) => {
                            // One bad iteration never ends the session.
                            tracing::warn!(elapsed_secs = elapsed, "iteration failed: {e}");
                            tokio::time::sleep(self.config.pacing.error_backoff).await;
                        }
                    }
                }
            }
        }

        self.finalize().await
    }

    /// One iteration: bounded history → oracle → dispatch → append.
    async fn step(&mut self) -> Result<(), OracleError> {
        let history_text = self.bounded_history().await?;

        match self.oracle.next_action(&history_text).await {
            Ok(action) => {
                let event = self.dispatch(action).await;
                self.append(event);
                Ok(())
            }
            // Schema violations are a no-op: skip, log, keep looping.
            Err(OracleError::InvalidResponse(msg)) => {
                tracing::warn!("discarding invalid oracle response: {msg}");
                Ok(())
            }
            Err(OracleError::Empty) => {
                tracing::warn!("discarding empty oracle response");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Serialize the log for the oracle: verbatim while small, summary +
    /// recent window once it outgrows the window.
    async fn bounded_history(&self) -> Result<String, OracleError> {
        match self.log.window() {
            HistoryWindow::Verbatim(events) => Ok(render_events(events)),
            HistoryWindow::Split { older, recent } => {
                let summary = self.oracle.summarize(older).await?;
                Ok(render_bounded(&summary, recent))
            }
        }
    }

    /// Invoke the session primitive an action names; exhaustive per kind.
    async fn dispatch(&mut self, action: NextAction) -> StepEvent {
        let NextAction {
            event: kind,
            description,
            error: _,
            command,
        } = action;

        let event = match kind {
            EventKind::Connect => self.connect_event(EventKind::Connect).await,
            EventKind::Reconnect => {
                self.driver.disconnect().await;
                self.connect_event(EventKind::Reconnect).await
            }
            EventKind::Disconnect => match self.driver.disconnect().await {
                DisconnectOutcome::Disconnected => StepEvent::record(EventKind::Disconnect, ""),
                DisconnectOutcome::NotConnected => StepEvent::record(
                    EventKind::Disconnect,
                    "No active connection to disconnect",
                ),
            },
            EventKind::ShellCreate => match self.driver.create_shell().await {
                Ok(ShellCreateOutcome::Created | ShellCreateOutcome::AlreadyOpen) => {
                    StepEvent::record(EventKind::ShellCreate, "")
                }
                Err(e) => StepEvent::record(EventKind::ShellCreate, e.to_string()),
            },
            EventKind::ShellClose => match self.driver.close_shell().await {
                CloseShellOutcome::Closed => StepEvent::record(EventKind::ShellClose, ""),
                CloseShellOutcome::NothingToClose => {
                    StepEvent::record(EventKind::ShellClose, "No shell to close")
                }
            },
            EventKind::ShellCommand => match command {
                Some(spec) => {
                    match self
                        .driver
                        .send_command(&spec.content, spec.timeout_duration())
                        .await
                    {
                        Ok(outcome @ CommandOutcome::Completed { .. }) => StepEvent::command_record(
                            CommandKind::ShellCommand,
                            spec.content,
                            outcome.output(),
                            "",
                        ),
                        Ok(outcome @ CommandOutcome::TimedOut { .. }) => StepEvent::command_record(
                            CommandKind::TimeoutInterrupt,
                            spec.content,
                            outcome.output(),
                            outcome.error_message(),
                        ),
                        Err(e) => StepEvent::command_record(
                            CommandKind::ShellCommand,
                            spec.content,
                            "",
                            e.to_string(),
                        ),
                    }
                }
                None => StepEvent::command_record(
                    CommandKind::ShellCommand,
                    "",
                    "",
                    "shell_command action without a command",
                ),
            },
            EventKind::Interrupt => self.interrupt_event(EventKind::Interrupt).await,
            EventKind::TimeoutInterrupt => {
                // Oracle-initiated interrupt tagged as timeout-originated.
                let error = match self.driver.interrupt().await {
                    Ok(InterruptOutcome::Sent) => String::new(),
                    Ok(InterruptOutcome::NoShell) => "No active shell to interrupt".to_string(),
                    Err(e) => e.to_string(),
                };
                StepEvent::command_record(
                    CommandKind::TimeoutInterrupt,
                    "",
                    "Timeout interrupt triggered by oracle",
                    error,
                )
            }
        };

        if description.is_empty() {
            event
        } else {
            event.with_description(description)
        }
    }

    async fn connect_event(&mut self, kind: EventKind) -> StepEvent {
        match self.driver.connect().await {
            Ok(ConnectOutcome::Connected | ConnectOutcome::AlreadyConnected) => {
                StepEvent::record(kind, "")
            }
            Err(e) => StepEvent::record(kind, e.to_string()),
        }
    }

    async fn interrupt_event(&mut self, kind: EventKind) -> StepEvent {
        match self.driver.interrupt().await {
            Ok(InterruptOutcome::Sent) => StepEvent::record(kind, ""),
            Ok(InterruptOutcome::NoShell) => {
                StepEvent::record(kind, "No active shell to interrupt")
            }
            Err(e) => StepEvent::record(kind, e.to_string()),
        }
    }

    fn append(&mut self, event: StepEvent) {
        tracing::info!(
            kind = ?event.kind,
            command = event.command.as_deref().unwrap_or(""),
            description = event.description.as_deref().unwrap_or(""),
            error = %event.error,
            output_preview = %preview(event.output.as_deref().unwrap_or("")),
            "step recorded"
        );
        self.log.push(event);
    }

    /// Unconditional cleanup and artifact persistence.
    async fn finalize(mut self) -> RunReport {
        self.driver.close_shell().await;
        self.driver.disconnect().await;

        if let Err(e) = persist::write_history(&self.config.history_path, self.log.events()).await {
            tracing::error!("failed to write history file: {e}");
        }

        let (summary, summarized) = match self.oracle.summarize(self.log.events()).await {
            Ok(summary) => (summary, true),
            Err(e) => {
                tracing::warn!("summarization failed, writing fallback report: {e}");
                (persist::fallback_report(self.log.len(), &e.to_string()), false)
            }
        };
        if let Err(e) = persist::write_summary(&self.config.summary_path, &summary).await {
            tracing::error!("failed to write summary file: {e}");
        }

        RunReport {
            events_recorded: self.log.len(),
            summarized,
        }
    }
}

fn preview(output: &str) -> String {
    if output.chars().count() > 100 {
        let head: String = output.chars().take(100).collect();
        format!("{head}...")
    } else {
        output.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use shell_pilot_core::{CommandSpec, SessionError};

    use super::*;
    use crate::config::Pacing;

    #[derive(Clone, Copy, Default)]
    enum CommandMode {
        #[default]
        Complete,
        Timeout,
        Unavailable,
    }

    #[derive(Default)]
    struct ScriptedDriver {
        calls: Arc<Mutex<Vec<&'static str>>>,
        connected: bool,
        shell_open: bool,
        fail_connect: bool,
        command_mode: CommandMode,
    }

    impl ScriptedDriver {
        fn call_log(&self) -> Arc<Mutex<Vec<&'static str>>> {
            Arc::clone(&self.calls)
        }

        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl ShellDriver for ScriptedDriver {
        async fn connect(&mut self) -> Result<ConnectOutcome, SessionError> {
            self.record("connect");
            if self.fail_connect {
                return Err(SessionError::Auth("server rejected password".to_string()));
            }
            if self.connected {
                return Ok(ConnectOutcome::AlreadyConnected);
            }
            self.connected = true;
            self.shell_open = true;
            Ok(ConnectOutcome::Connected)
        }

        async fn disconnect(&mut self) -> DisconnectOutcome {
            self.record("disconnect");
            self.shell_open = false;
            if self.connected {
                self.connected = false;
                DisconnectOutcome::Disconnected
            } else {
                DisconnectOutcome::NotConnected
            }
        }

        async fn create_shell(&mut self) -> Result<ShellCreateOutcome, SessionError> {
            self.record("create_shell");
            if !self.connected {
                return Err(SessionError::ShellUnavailable("not connected".to_string()));
            }
            if self.shell_open {
                Ok(ShellCreateOutcome::AlreadyOpen)
            } else {
                self.shell_open = true;
                Ok(ShellCreateOutcome::Created)
            }
        }

        async fn close_shell(&mut self) -> CloseShellOutcome {
            self.record("close_shell");
            if self.shell_open {
                self.shell_open = false;
                CloseShellOutcome::Closed
            } else {
                CloseShellOutcome::NothingToClose
            }
        }

        async fn send_command(
            &mut self,
            command: &str,
            timeout: Duration,
        ) -> Result<CommandOutcome, SessionError> {
            self.record("send_command");
            match self.command_mode {
                CommandMode::Complete => Ok(CommandOutcome::Completed {
                    output: format!("ran {command}"),
                }),
                CommandMode::Timeout => Ok(CommandOutcome::TimedOut {
                    output: "partial".to_string(),
                    timeout,
                }),
                CommandMode::Unavailable => {
                    Err(SessionError::ShellUnavailable("no shell".to_string()))
                }
            }
        }

        async fn interrupt(&mut self) -> Result<InterruptOutcome, SessionError> {
            self.record("interrupt");
            if self.shell_open {
                Ok(InterruptOutcome::Sent)
            } else {
                Ok(InterruptOutcome::NoShell)
            }
        }
    }

    struct ScriptedOracle {
        queue: Mutex<VecDeque<Result<NextAction, OracleError>>>,
        repeat: Option<NextAction>,
        summary: Option<String>,
        next_calls: Arc<AtomicUsize>,
    }

    impl ScriptedOracle {
        fn repeating(action: NextAction, summary: Option<&str>) -> Self {
            Self {
                queue: Mutex::new(VecDeque::new()),
                repeat: Some(action),
                summary: summary.map(str::to_string),
                next_calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn queued(
            items: Vec<Result<NextAction, OracleError>>,
            summary: Option<&str>,
        ) -> Self {
            Self {
                queue: Mutex::new(items.into()),
                repeat: None,
                summary: summary.map(str::to_string),
                next_calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn call_counter(&self) -> Arc<AtomicUsize> {
            Arc::clone(&self.next_calls)
        }
    }

    #[async_trait]
    impl Oracle for ScriptedOracle {
        async fn next_action(&self, _bounded_history: &str) -> Result<NextAction, OracleError> {
            self.next_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(item) = self.queue.lock().unwrap().pop_front() {
                return item;
            }
            self.repeat.clone().ok_or_else(|| {
                OracleError::Transport("oracle script exhausted".to_string())
            })
        }

        async fn summarize(&self, _events: &[StepEvent]) -> Result<String, OracleError> {
            self.summary
                .clone()
                .ok_or_else(|| OracleError::Transport("summarizer offline".to_string()))
        }
    }

    fn action(kind: EventKind) -> NextAction {
        NextAction {
            event: kind,
            description: "scripted".to_string(),
            error: String::new(),
            command: None,
        }
    }

    fn command_action(content: &str, timeout: u64) -> NextAction {
        NextAction {
            event: EventKind::ShellCommand,
            description: "scripted".to_string(),
            error: String::new(),
            command: Some(CommandSpec {
                content: content.to_string(),
                timeout,
            }),
        }
    }

    fn config(dir: &std::path::Path, budget: Duration) -> RunConfig {
        RunConfig {
            time_budget: budget,
            history_path: dir.join("out").join("history.jsonl"),
            summary_path: dir.join("out").join("summary.txt"),
            pacing: Pacing::default(),
        }
    }

    fn controller_with(
        driver: ScriptedDriver,
        oracle: ScriptedOracle,
        config: RunConfig,
    ) -> SessionController<ScriptedDriver, ScriptedOracle> {
        SessionController::new(driver, oracle, config)
    }

    #[tokio::test]
    async fn dispatch_records_command_output_and_description() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = controller_with(
            ScriptedDriver {
                connected: true,
                shell_open: true,
                ..ScriptedDriver::default()
            },
            ScriptedOracle::queued(vec![], None),
            config(dir.path(), Duration::from_secs(1)),
        );

        let event = controller.dispatch(command_action("uptime", 10)).await;

        assert_eq!(event.kind, EventKind::ShellCommand);
        assert_eq!(event.command.as_deref(), Some("uptime"));
        assert_eq!(event.output.as_deref(), Some("ran uptime"));
        assert_eq!(event.description.as_deref(), Some("scripted"));
        assert!(event.is_success());
    }

    #[tokio::test]
    async fn dispatch_tags_timed_out_commands_as_timeout_interrupt() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = controller_with(
            ScriptedDriver {
                connected: true,
                shell_open: true,
                command_mode: CommandMode::Timeout,
                ..ScriptedDriver::default()
            },
            ScriptedOracle::queued(vec![], None),
            config(dir.path(), Duration::from_secs(1)),
        );

        let event = controller.dispatch(command_action("sleep 100", 5)).await;

        assert_eq!(event.kind, EventKind::TimeoutInterrupt);
        assert_eq!(event.output.as_deref(), Some("partial"));
        assert_eq!(event.error, "Command timed out after 5 seconds");
    }

    #[tokio::test]
    async fn dispatch_surfaces_connect_failure_as_event_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = controller_with(
            ScriptedDriver {
                fail_connect: true,
                ..ScriptedDriver::default()
            },
            ScriptedOracle::queued(vec![], None),
            config(dir.path(), Duration::from_secs(1)),
        );

        let event = controller.dispatch(action(EventKind::Connect)).await;

        assert_eq!(event.kind, EventKind::Connect);
        assert!(event.error.contains("authentication failed"));
        assert!(event.command.is_none());
    }

    #[tokio::test]
    async fn dispatch_reports_second_shell_close_as_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = controller_with(
            ScriptedDriver {
                connected: true,
                shell_open: true,
                ..ScriptedDriver::default()
            },
            ScriptedOracle::queued(vec![], None),
            config(dir.path(), Duration::from_secs(1)),
        );

        let first = controller.dispatch(action(EventKind::ShellClose)).await;
        let second = controller.dispatch(action(EventKind::ShellClose)).await;

        assert!(first.is_success());
        assert_eq!(second.error, "No shell to close");
    }

    #[tokio::test]
    async fn dispatch_reconnect_closes_then_connects() {
        let dir = tempfile::tempdir().unwrap();
        let driver = ScriptedDriver {
            connected: true,
            shell_open: true,
            ..ScriptedDriver::default()
        };
        let calls = driver.call_log();
        let mut controller = controller_with(
            driver,
            ScriptedOracle::queued(vec![], None),
            config(dir.path(), Duration::from_secs(1)),
        );

        let event = controller.dispatch(action(EventKind::Reconnect)).await;

        assert_eq!(event.kind, EventKind::Reconnect);
        assert!(event.is_success());
        assert_eq!(&*calls.lock().unwrap(), &["disconnect", "connect"]);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_oracle_responses_are_absorbed_and_the_loop_continues() {
        let dir = tempfile::tempdir().unwrap();
        let oracle = ScriptedOracle::queued(
            vec![
                Err(OracleError::InvalidResponse("not json".to_string())),
                Ok(action(EventKind::Connect)),
            ],
            Some("summary"),
        );
        let controller = controller_with(
            ScriptedDriver::default(),
            oracle,
            config(dir.path(), Duration::from_millis(2500)),
        );

        let report = controller.run_until(std::future::pending()).await;

        // The invalid response cost an iteration but recorded nothing; the
        // connect that followed did. The exhausted script then errored and
        // the loop backed off until the budget ran out.
        assert_eq!(report.events_recorded, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn run_exhausts_budget_and_persists_despite_summarizer_failure() {
        let dir = tempfile::tempdir().unwrap();
        let driver = ScriptedDriver {
            connected: true,
            shell_open: true,
            ..ScriptedDriver::default()
        };
        let calls = driver.call_log();
        let oracle = ScriptedOracle::repeating(command_action("echo hi", 5), None);
        let controller = controller_with(driver, oracle, config(dir.path(), Duration::from_secs(3)));

        let report = controller.run_until(std::future::pending()).await;

        assert_eq!(report.events_recorded, 3);
        assert!(!report.summarized);

        let history = std::fs::read_to_string(dir.path().join("out").join("history.jsonl")).unwrap();
        let lines: Vec<&str> = history.lines().collect();
        assert_eq!(lines.len(), 3);
        for line in lines {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(value["event"], "shell_command");
        }

        let summary = std::fs::read_to_string(dir.path().join("out").join("summary.txt")).unwrap();
        assert!(summary.starts_with("Generated at "));
        assert!(summary.contains("Summarization failed"));
        assert!(summary.contains("3 events"));

        // Cleanup ran unconditionally at the end.
        let calls = calls.lock().unwrap();
        assert_eq!(&calls[calls.len() - 2..], &["close_shell", "disconnect"]);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_signal_still_triggers_cleanup_and_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let driver = ScriptedDriver {
            connected: true,
            shell_open: true,
            ..ScriptedDriver::default()
        };
        let calls = driver.call_log();
        let oracle = ScriptedOracle::repeating(command_action("echo hi", 5), Some("interrupted run"));
        let controller =
            controller_with(driver, oracle, config(dir.path(), Duration::from_secs(600)));

        let report = controller.run_until(std::future::ready(())).await;

        assert_eq!(report.events_recorded, 0);
        assert!(report.summarized);
        assert!(dir.path().join("out").join("history.jsonl").exists());
        let summary = std::fs::read_to_string(dir.path().join("out").join("summary.txt")).unwrap();
        assert!(summary.contains("interrupted run"));
        assert_eq!(&*calls.lock().unwrap(), &["close_shell", "disconnect"]);
    }

    #[tokio::test]
    async fn bounded_history_summarizes_older_events_past_the_window() {
        let dir = tempfile::tempdir().unwrap();
        let oracle = ScriptedOracle::queued(vec![], Some("SUMMARY OF OLDER EVENTS"));
        let mut controller = controller_with(
            ScriptedDriver::default(),
            oracle,
            config(dir.path(), Duration::from_secs(1)),
        );
        for _ in 0..15 {
            controller.append(StepEvent::record(EventKind::ShellCreate, ""));
        }

        let text = controller.bounded_history().await.unwrap();

        assert!(text.contains("SUMMARY OF OLDER EVENTS"));
        assert!(text.contains("Recent 10 events"));
        assert_eq!(text.matches("shell_create").count(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn oracle_transport_errors_back_off_without_ending_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let oracle = ScriptedOracle::queued(vec![], Some("summary"));
        let controller = controller_with(
            ScriptedDriver::default(),
            oracle,
            // Two error backoffs (5 s each) fit; a third call starts at 10 s.
            config(dir.path(), Duration::from_millis(10_500)),
        );
        let oracle_calls = controller.oracle.call_counter();

        let report = controller.run_until(std::future::pending()).await;

        assert_eq!(report.events_recorded, 0);
        assert_eq!(oracle_calls.load(Ordering::SeqCst), 3);
    }
}
