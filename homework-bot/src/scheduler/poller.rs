//! Status poller
//!
//! Polls the status API on a fixed period and notifies about every new
//! homework state exactly once. Failures of an iteration are reported through
//! the same de-duplicated path under the error subject, and the loop always
//! continues.

use homework_client::ClientError;
use homework_core::{
    ChangeTracker, ParseError, ShapeError, StatusSnapshot, Subject, check_response, parse_status,
};
use serde_json::Value as JsonValue;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::repository::StatusRepository;
use crate::service::{Notifier, deliver};

/// Prefix of every failure report sent to the chat
pub const FAILURE_PREFIX: &str = "Сбой в работе программы";

/// How the `from_date` of the next poll is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorPolicy {
    /// Use the `current_date` returned by the last successful poll
    #[default]
    ServerProvided,

    /// Use the wall-clock time at the start of each poll
    WallClock,
}

impl FromStr for CursorPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "server" => Ok(Self::ServerProvided),
            "wall-clock" => Ok(Self::WallClock),
            other => anyhow::bail!("unknown cursor mode {:?}, expected server or wall-clock", other),
        }
    }
}

/// What a malformed homework entry does to the rest of its snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordFailurePolicy {
    /// Stop processing the snapshot and report the entry as a failure
    #[default]
    AbortSnapshot,

    /// Log the entry and continue with the next one
    SkipRecord,
}

impl FromStr for RecordFailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "abort" => Ok(Self::AbortSnapshot),
            "skip" => Ok(Self::SkipRecord),
            other => anyhow::bail!("unknown record failure mode {:?}, expected abort or skip", other),
        }
    }
}

/// Failure of a single poll iteration
#[derive(Debug, Error)]
pub enum PollError {
    #[error(transparent)]
    Fetch(#[from] ClientError),

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error(transparent)]
    Record(#[from] ParseError),
}

fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Poller that turns status snapshots into notifications
pub struct StatusPoller {
    repository: Arc<dyn StatusRepository>,
    notifier: Arc<dyn Notifier>,
    tracker: ChangeTracker,
    retry_period: Duration,
    cursor_policy: CursorPolicy,
    record_failures: RecordFailurePolicy,
    cursor: i64,
    clock: fn() -> i64,
}

impl StatusPoller {
    /// Creates a new poller starting from the current time
    pub fn new(
        config: &Config,
        repository: Arc<dyn StatusRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            repository,
            notifier,
            tracker: ChangeTracker::new(),
            retry_period: config.retry_period,
            cursor_policy: config.cursor_policy,
            record_failures: config.record_failures,
            cursor: unix_now(),
            clock: unix_now,
        }
    }

    /// Replaces the wall clock used for cursors
    #[cfg(test)]
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self.cursor = clock();
        self
    }

    /// The `from_date` used by the most recent poll, or the next one
    #[cfg(test)]
    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    /// Last-sent state
    #[cfg(test)]
    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    /// Runs the polling loop until `shutdown` flips to `true` or its sender is dropped
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Starting status poller (interval: {:?}, cursor: {:?}, record failures: {:?})",
            self.retry_period, self.cursor_policy, self.record_failures
        );

        let mut interval = time::interval(self.retry_period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                _ = interval.tick() => {}
            }

            self.poll_once().await;
        }

        info!("Status poller stopped");
    }

    /// Performs a single poll iteration
    ///
    /// Never fails: errors are logged and reported to the chat at most once
    /// per distinct message.
    pub async fn poll_once(&mut self) {
        let from_date = match self.cursor_policy {
            CursorPolicy::ServerProvided => self.cursor,
            CursorPolicy::WallClock => (self.clock)(),
        };
        self.cursor = from_date;

        match self.check_statuses(from_date).await {
            Ok(snapshot) => {
                self.tracker.clear(&Subject::Error);
                if self.cursor_policy == CursorPolicy::ServerProvided {
                    self.cursor = snapshot.current_date;
                }
            }
            Err(e) => {
                if matches!(&e, PollError::Fetch(err) if err.is_timeout()) {
                    warn!(
                        "Status API did not answer in time, retrying in {:?}",
                        self.retry_period
                    );
                } else {
                    error!("Poll cycle failed: {}", e);
                }
                self.report_failure(&e).await;
            }
        }
    }

    async fn check_statuses(&mut self, from_date: i64) -> Result<StatusSnapshot, PollError> {
        let response = self.repository.fetch_statuses(from_date).await?;
        let snapshot = check_response(&response)?;

        if snapshot.homeworks.is_empty() {
            debug!("No homework updates since {}", from_date);
        } else {
            let sent = self.process_homeworks(&snapshot.homeworks).await?;
            debug!(
                "Processed {} homework(s), {} notification(s) sent",
                snapshot.homeworks.len(),
                sent
            );
        }

        Ok(snapshot)
    }

    /// Notifies about each homework entry in API order
    ///
    /// This is the only place that decides what a malformed entry does to
    /// the rest of the snapshot.
    async fn process_homeworks(&mut self, homeworks: &[JsonValue]) -> Result<usize, PollError> {
        let mut sent = 0;

        for homework in homeworks {
            let update = match parse_status(homework) {
                Ok(update) => update,
                Err(e) => match self.record_failures {
                    RecordFailurePolicy::AbortSnapshot => return Err(e.into()),
                    RecordFailurePolicy::SkipRecord => {
                        warn!("Skipping malformed homework entry: {}", e);
                        continue;
                    }
                },
            };

            let subject = Subject::Homework(update.record.name);
            if self.notify_if_changed(subject, update.message).await {
                sent += 1;
            }
        }

        Ok(sent)
    }

    async fn report_failure(&mut self, error: &PollError) {
        let message = format!("{}: {}", FAILURE_PREFIX, error);
        self.notify_if_changed(Subject::Error, message).await;
    }

    /// Sends `message` unless it was the last one sent for `subject`
    ///
    /// The message is recorded whether or not delivery succeeded.
    async fn notify_if_changed(&mut self, subject: Subject, message: String) -> bool {
        if !self.tracker.should_notify(&subject, &message) {
            debug!("No change for {}, notification suppressed", subject);
            return false;
        }

        deliver(self.notifier.as_ref(), &message).await;
        self.tracker.record(subject, message);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use secrecy::SecretString;
    use serde_json::json;
    use crate::repository::HttpStatusRepository;
    use homework_client::StatusClient;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicI64, Ordering};

    const START: i64 = 500;

    #[derive(Default)]
    struct ScriptedRepository {
        responses: Mutex<VecDeque<Result<JsonValue, ClientError>>>,
        requested: Mutex<Vec<i64>>,
    }

    impl ScriptedRepository {
        fn push(&self, response: Result<JsonValue, ClientError>) {
            self.responses.lock().unwrap().push_back(response);
        }

        fn requested(&self) -> Vec<i64> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StatusRepository for ScriptedRepository {
        async fn fetch_statuses(&self, from_date: i64) -> Result<JsonValue, ClientError> {
            self.requested.lock().unwrap().push(from_date);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(json!({"homeworks": [], "current_date": from_date})))
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        fail: bool,
        sent: Mutex<Vec<String>>,
    }

    impl RecordingNotifier {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, text: &str) -> Result<(), ClientError> {
            self.sent.lock().unwrap().push(text.to_string());
            if self.fail {
                return Err(ClientError::api_error(502, "bad gateway"));
            }
            Ok(())
        }
    }

    fn config() -> Config {
        Config::new(
            SecretString::from("practicum".to_string()),
            SecretString::from("telegram".to_string()),
            "42".to_string(),
        )
    }

    fn poller_with(
        config: Config,
        repository: &Arc<ScriptedRepository>,
        notifier: &Arc<RecordingNotifier>,
    ) -> StatusPoller {
        let repository: Arc<dyn StatusRepository> = repository.clone();
        let notifier: Arc<dyn Notifier> = notifier.clone();
        StatusPoller::new(&config, repository, notifier).with_clock(|| START)
    }

    fn setup() -> (Arc<ScriptedRepository>, Arc<RecordingNotifier>, StatusPoller) {
        let repository = Arc::new(ScriptedRepository::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let poller = poller_with(config(), &repository, &notifier);
        (repository, notifier, poller)
    }

    fn snapshot(homeworks: JsonValue, current_date: i64) -> Result<JsonValue, ClientError> {
        Ok(json!({"homeworks": homeworks, "current_date": current_date}))
    }

    /// A status client pointed at a port nothing listens on
    async fn unreachable_client() -> StatusClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        StatusClient::new(
            format!("http://{}/statuses/", addr),
            SecretString::from("practicum".to_string()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    async fn transport_error(from_date: i64) -> ClientError {
        unreachable_client().await.fetch(from_date).await.unwrap_err()
    }

    #[tokio::test]
    async fn test_new_status_is_notified_once() {
        let (repository, notifier, mut poller) = setup();
        let homeworks = json!([{"homework_name": "hw1", "status": "reviewing"}]);
        repository.push(snapshot(homeworks.clone(), 1000));
        repository.push(snapshot(homeworks, 1000));

        poller.poll_once().await;
        poller.poll_once().await;

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("Работа взята на проверку ревьюером."));
        assert!(sent[0].contains("\"hw1\""));
    }

    #[tokio::test]
    async fn test_verdict_change_is_notified() {
        let (repository, notifier, mut poller) = setup();
        repository.push(snapshot(
            json!([{"homework_name": "hw1", "status": "reviewing"}]),
            1000,
        ));
        repository.push(snapshot(
            json!([{"homework_name": "hw1", "status": "approved"}]),
            2000,
        ));

        poller.poll_once().await;
        poller.poll_once().await;

        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[1].ends_with("Работа проверена: ревьюеру всё понравилось. Ура!"));
    }

    #[tokio::test]
    async fn test_records_are_processed_in_api_order() {
        let (repository, notifier, mut poller) = setup();
        repository.push(snapshot(
            json!([
                {"homework_name": "hw2", "status": "rejected"},
                {"homework_name": "hw1", "status": "approved"}
            ]),
            1000,
        ));

        poller.poll_once().await;

        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].contains("\"hw2\""));
        assert!(sent[1].contains("\"hw1\""));
    }

    #[tokio::test]
    async fn test_repeated_failure_is_reported_once() {
        let (repository, notifier, mut poller) = setup();
        repository.push(Err(transport_error(1600).await));
        repository.push(Err(transport_error(2200).await));

        poller.poll_once().await;
        poller.poll_once().await;

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with("Сбой в работе программы: ошибка запроса к API"));
    }

    static ADVANCING_NOW: AtomicI64 = AtomicI64::new(1000);

    fn advancing_clock() -> i64 {
        ADVANCING_NOW.fetch_add(600, Ordering::SeqCst)
    }

    #[tokio::test]
    async fn test_outage_in_wall_clock_mode_is_reported_once() {
        let repository: Arc<dyn StatusRepository> =
            Arc::new(HttpStatusRepository::new(unreachable_client().await));
        let notifier = Arc::new(RecordingNotifier::default());
        let mut config = config();
        config.cursor_policy = CursorPolicy::WallClock;
        let mut poller = StatusPoller::new(&config, repository, notifier.clone())
            .with_clock(advancing_clock);

        for _ in 0..3 {
            poller.poll_once().await;
        }

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(!sent[0].contains("from_date"));
    }

    #[tokio::test]
    async fn test_success_clears_error_state() {
        let (repository, notifier, mut poller) = setup();
        repository.push(Err(ClientError::UnexpectedStatus { status: 503 }));
        repository.push(Err(ClientError::UnexpectedStatus { status: 503 }));
        repository.push(snapshot(json!([]), 1000));
        repository.push(Err(ClientError::UnexpectedStatus { status: 503 }));
        repository.push(Err(ClientError::UnexpectedStatus { status: 500 }));

        poller.poll_once().await;
        poller.poll_once().await;
        assert_eq!(notifier.sent().len(), 1);

        poller.poll_once().await;
        assert_eq!(poller.tracker().last_sent(&Subject::Error), None);

        poller.poll_once().await;
        poller.poll_once().await;

        let sent = notifier.sent();
        assert_eq!(
            sent,
            vec![
                "Сбой в работе программы: неверный код ответа API: 503".to_string(),
                "Сбой в работе программы: неверный код ответа API: 503".to_string(),
                "Сбой в работе программы: неверный код ответа API: 500".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_homework_list_sends_nothing() {
        let (repository, notifier, mut poller) = setup();
        repository.push(snapshot(json!([]), 1000));

        poller.poll_once().await;

        assert!(notifier.sent().is_empty());
        assert_eq!(poller.cursor(), 1000);
    }

    #[tokio::test]
    async fn test_shape_error_is_reported() {
        let (repository, notifier, mut poller) = setup();
        repository.push(Ok(json!({"current_date": 1000})));
        repository.push(Ok(json!({"homeworks": {"hw1": "approved"}, "current_date": 1000})));

        poller.poll_once().await;
        poller.poll_once().await;

        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].contains("homeworks"));
        assert!(sent[1].contains("не список"));
    }

    #[tokio::test]
    async fn test_malformed_record_aborts_snapshot_by_default() {
        let (repository, notifier, mut poller) = setup();
        repository.push(snapshot(
            json!([
                {"homework_name": "hw1", "status": "approved"},
                {"homework_name": "hw2", "status": "on_hold"},
                {"homework_name": "hw3", "status": "rejected"}
            ]),
            1000,
        ));

        poller.poll_once().await;

        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].contains("\"hw1\""));
        assert_eq!(
            sent[1],
            "Сбой в работе программы: недокументированный статус домашней работы: on_hold"
        );
        assert_eq!(poller.cursor(), START);
    }

    #[tokio::test]
    async fn test_malformed_record_can_be_skipped() {
        let repository = Arc::new(ScriptedRepository::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let mut config = config();
        config.record_failures = RecordFailurePolicy::SkipRecord;
        let mut poller = poller_with(config, &repository, &notifier);

        repository.push(snapshot(
            json!([
                {"homework_name": "hw1", "status": "approved"},
                {"status": "approved"},
                {"homework_name": "hw3", "status": "rejected"}
            ]),
            1000,
        ));

        poller.poll_once().await;

        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[1].contains("\"hw3\""));
        assert_eq!(poller.cursor(), 1000);
    }

    #[tokio::test]
    async fn test_server_cursor_advances_only_on_success() {
        let (repository, _notifier, mut poller) = setup();
        repository.push(snapshot(json!([]), 1000));
        repository.push(Err(ClientError::UnexpectedStatus { status: 500 }));
        repository.push(snapshot(json!([]), 2000));

        for _ in 0..4 {
            poller.poll_once().await;
        }

        assert_eq!(repository.requested(), vec![START, 1000, 1000, 2000]);
    }

    #[tokio::test]
    async fn test_wall_clock_cursor_ignores_server_date() {
        let repository = Arc::new(ScriptedRepository::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let mut config = config();
        config.cursor_policy = CursorPolicy::WallClock;
        let mut poller = poller_with(config, &repository, &notifier).with_clock(|| 777);

        repository.push(snapshot(json!([]), 1000));
        repository.push(snapshot(json!([]), 2000));

        poller.poll_once().await;
        poller.poll_once().await;

        assert_eq!(repository.requested(), vec![777, 777]);
        assert_eq!(poller.cursor(), 777);
    }

    #[tokio::test]
    async fn test_notifier_failure_does_not_escalate() {
        let repository = Arc::new(ScriptedRepository::default());
        let notifier = Arc::new(RecordingNotifier::failing());
        let mut poller = poller_with(config(), &repository, &notifier);

        let homeworks = json!([{"homework_name": "hw1", "status": "approved"}]);
        repository.push(snapshot(homeworks.clone(), 1000));
        repository.push(snapshot(homeworks, 1000));

        poller.poll_once().await;
        poller.poll_once().await;

        // One attempt for the status, no error report for the failed delivery.
        assert_eq!(notifier.sent().len(), 1);
        assert_eq!(poller.tracker().last_sent(&Subject::Error), None);
        assert!(
            poller
                .tracker()
                .last_sent(&Subject::homework("hw1"))
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let repository = Arc::new(ScriptedRepository::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let mut config = config();
        config.retry_period = Duration::from_secs(3600);
        let mut poller = poller_with(config, &repository, &notifier);

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            poller.run(rx).await;
        });

        time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();

        time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("poller did not stop")
            .unwrap();
        assert_eq!(repository.requested(), vec![START]);
    }

    #[tokio::test]
    async fn test_run_exits_immediately_when_already_stopped() {
        let (repository, _notifier, mut poller) = setup();
        let (_tx, rx) = watch::channel(true);

        poller.run(rx).await;

        assert!(repository.requested().is_empty());
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("server".parse::<CursorPolicy>().unwrap(), CursorPolicy::ServerProvided);
        assert_eq!("wall-clock".parse::<CursorPolicy>().unwrap(), CursorPolicy::WallClock);
        assert!("now".parse::<CursorPolicy>().is_err());

        assert_eq!(
            "skip".parse::<RecordFailurePolicy>().unwrap(),
            RecordFailurePolicy::SkipRecord
        );
        assert!("ignore".parse::<RecordFailurePolicy>().is_err());
    }
}
