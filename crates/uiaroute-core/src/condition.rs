//! Waiting for device-side conditions.
//!
//! Some UI state changes asynchronously: views animate, the network activity
//! indicator spins. The engine can evaluate a named condition on demand;
//! [`ConditionPoller`] asks it repeatedly until the condition holds or the
//! deadline passes.
//!
//! The deadline is the caller's timeout plus a client-side margin
//! ([`UiaConfig::client_timeout_margin`]) that absorbs transport latency.
//! When it passes, the wait fails with [`UiaError::Timeout`] carrying the
//! caller's message and timeout.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use uiaroute_core::condition::ConditionPoller;
//! use uiaroute_core::config::UiaConfig;
//! use uiaroute_core::router::UiaRouter;
//! use uiaroute_core::session::AutomationSession;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = UiaConfig::load();
//! let router = Arc::new(UiaRouter::from_config(&config)?);
//! let poller = ConditionPoller::from_config(router, &config);
//!
//! let session = AutomationSession::new("preferences");
//! poller.wait_for_none_animating(Some(&session), None).await?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, debug_span, trace, Instrument};

use crate::config::UiaConfig;
use crate::error::{Result, UiaError};
use crate::router::UiaRouter;
use crate::session::AutomationSession;
use crate::wait::with_timeout;

/// UIA function that evaluates a condition.
pub const CONDITION_COMMAND: &str = "condition";

/// Default budget for animation waits.
pub const DEFAULT_ANIMATION_TIMEOUT: Duration = Duration::from_secs(2);

/// Default budget for the network indicator wait.
pub const DEFAULT_NETWORK_INDICATOR_TIMEOUT: Duration = Duration::from_secs(15);

/// Query matching every view.
const ALL_VIEWS: &str = "*";

/// Conditions the engine knows how to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionName {
    /// No matching view is animating.
    NoneAnimating,
    /// The status-bar network activity indicator is not spinning.
    NoNetworkIndicator,
}

impl ConditionName {
    /// The name the engine uses for this condition.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionName::NoneAnimating => "NONE_ANIMATING",
            ConditionName::NoNetworkIndicator => "NO_NETWORK_INDICATOR",
        }
    }
}

impl fmt::Display for ConditionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One wait request.
#[derive(Debug, Clone, PartialEq)]
pub struct WaitCondition {
    /// Condition to evaluate.
    pub condition: ConditionName,
    /// Views the condition applies to. Ignored by some conditions.
    pub query: Option<String>,
    /// How long the caller is willing to wait.
    pub timeout: Duration,
    /// Message reported if the wait times out.
    pub timeout_message: String,
}

impl WaitCondition {
    /// Creates a wait request without a query.
    pub fn new(condition: ConditionName, timeout: Duration, timeout_message: impl Into<String>) -> Self {
        Self {
            condition,
            query: None,
            timeout,
            timeout_message: timeout_message.into(),
        }
    }

    /// Restricts the condition to views matching `query`.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// The single map argument of the condition-check command.
    pub fn to_argument(&self) -> Value {
        let mut map = Map::new();
        map.insert("condition".into(), Value::String(self.condition.as_str().into()));
        if let Some(query) = &self.query {
            map.insert("query".into(), Value::String(query.clone()));
        }
        Value::Object(map)
    }
}

/// Asks the device whether a condition currently holds.
#[async_trait]
pub trait ConditionQuery: Send + Sync {
    /// Returns `Ok(true)` once the condition is satisfied.
    async fn condition_satisfied(
        &self,
        session: Option<&AutomationSession>,
        condition: &WaitCondition,
    ) -> Result<bool>;
}

/// Reads a condition-check result.
///
/// The HTTP bridges yield the engine's boolean directly; the host bridge
/// yields its `{status, value}` map, so a map is judged by its `value`.
fn is_satisfied(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Object(map) => map.get("value").is_some_and(is_satisfied),
        _ => false,
    }
}

#[async_trait]
impl ConditionQuery for UiaRouter {
    async fn condition_satisfied(
        &self,
        session: Option<&AutomationSession>,
        condition: &WaitCondition,
    ) -> Result<bool> {
        let value = self
            .serialize_and_call(session, CONDITION_COMMAND, &[condition.to_argument()])
            .await?;
        Ok(is_satisfied(&value))
    }
}

fn format_secs(duration: Duration) -> String {
    duration.as_secs_f64().to_string()
}

/// Polls a [`ConditionQuery`] until a condition holds.
#[derive(Clone)]
pub struct ConditionPoller {
    query: Arc<dyn ConditionQuery>,
    poll_interval: Duration,
    margin: Duration,
    cancel_token: Option<CancellationToken>,
}

impl ConditionPoller {
    /// Creates a poller using the default interval and margin.
    pub fn new(query: Arc<dyn ConditionQuery>) -> Self {
        Self::from_config(query, &UiaConfig::default())
    }

    /// Creates a poller with the interval and margin from `config`.
    pub fn from_config(query: Arc<dyn ConditionQuery>, config: &UiaConfig) -> Self {
        Self {
            query,
            poll_interval: config.poll_interval(),
            margin: config.client_timeout_margin(),
            cancel_token: None,
        }
    }

    /// Sets the delay between checks.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the margin added to every timeout.
    pub fn with_margin(mut self, margin: Duration) -> Self {
        self.margin = margin;
        self
    }

    /// Makes every wait abort with [`UiaError::Cancelled`] once `token` fires.
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    /// The margin added to every timeout.
    pub fn margin(&self) -> Duration {
        self.margin
    }

    /// Waits until `condition` holds.
    ///
    /// Checks immediately, then every poll interval, for at most
    /// `condition.timeout + margin`. Errors from the query other than "not
    /// yet" end the wait at once.
    pub async fn wait_for_condition(
        &self,
        session: Option<&AutomationSession>,
        condition: &WaitCondition,
    ) -> Result<()> {
        let deadline = condition.timeout.saturating_add(self.margin);
        let span = debug_span!(
            "wait_for_condition",
            condition = %condition.condition,
            deadline_ms = deadline.as_millis() as u64
        );

        let poll = async {
            let mut attempts: u32 = 0;
            loop {
                attempts += 1;
                if self.query.condition_satisfied(session, condition).await? {
                    debug!(attempts, "condition satisfied");
                    return Ok::<(), UiaError>(());
                }
                trace!(attempts, "condition not satisfied yet");
                tokio::time::sleep(self.poll_interval).await;
            }
        };

        let timed = with_timeout(
            deadline,
            || UiaError::Timeout {
                message: condition.timeout_message.clone(),
                timeout: condition.timeout,
            },
            poll,
        );

        async {
            match &self.cancel_token {
                Some(token) => tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(UiaError::Cancelled),
                    result = timed => result,
                },
                None => timed.await,
            }
        }
        .instrument(span)
        .await
    }

    /// Waits for every view on screen to stop animating.
    ///
    /// `timeout` defaults to [`DEFAULT_ANIMATION_TIMEOUT`].
    pub async fn wait_for_none_animating(
        &self,
        session: Option<&AutomationSession>,
        timeout: Option<Duration>,
    ) -> Result<()> {
        let timeout = timeout.unwrap_or(DEFAULT_ANIMATION_TIMEOUT);
        let message = format!(
            "Timed out after {} seconds waiting for all views to stop animating.",
            format_secs(timeout)
        );
        let condition =
            WaitCondition::new(ConditionName::NoneAnimating, timeout, message).with_query(ALL_VIEWS);
        self.wait_for_condition(session, &condition).await
    }

    /// Waits for views matching `query` to stop animating.
    ///
    /// `timeout` defaults to [`DEFAULT_ANIMATION_TIMEOUT`].
    pub async fn wait_for_animations(
        &self,
        session: Option<&AutomationSession>,
        query: &str,
        timeout: Option<Duration>,
    ) -> Result<()> {
        let timeout = timeout.unwrap_or(DEFAULT_ANIMATION_TIMEOUT);
        let message = format!(
            "Timed out after {} seconds waiting for views matching '{}' to stop animating.",
            format_secs(timeout),
            query
        );
        let condition =
            WaitCondition::new(ConditionName::NoneAnimating, timeout, message).with_query(query);
        self.wait_for_condition(session, &condition).await
    }

    /// Waits for the network activity indicator to stop spinning.
    ///
    /// `timeout` defaults to [`DEFAULT_NETWORK_INDICATOR_TIMEOUT`].
    pub async fn wait_for_no_network_indicator(
        &self,
        session: Option<&AutomationSession>,
        timeout: Option<Duration>,
    ) -> Result<()> {
        let timeout = timeout.unwrap_or(DEFAULT_NETWORK_INDICATOR_TIMEOUT);
        let message = format!(
            "Timed out after {} seconds waiting for the network indicator to stop animating.",
            format_secs(timeout)
        );
        let condition = WaitCondition::new(ConditionName::NoNetworkIndicator, timeout, message);
        self.wait_for_condition(session, &condition).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RouteError;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Query that becomes satisfied on the `satisfied_on`-th check.
    struct CountingQuery {
        satisfied_on: Option<u32>,
        calls: AtomicU32,
        seen: Mutex<Vec<WaitCondition>>,
    }

    impl CountingQuery {
        fn after(n: u32) -> Arc<Self> {
            Arc::new(Self {
                satisfied_on: Some(n),
                calls: AtomicU32::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn never() -> Arc<Self> {
            Arc::new(Self {
                satisfied_on: None,
                calls: AtomicU32::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ConditionQuery for CountingQuery {
        async fn condition_satisfied(
            &self,
            _session: Option<&AutomationSession>,
            condition: &WaitCondition,
        ) -> Result<bool> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.seen.lock().unwrap().push(condition.clone());
            Ok(self.satisfied_on.is_some_and(|n| call >= n))
        }
    }

    /// Query that always fails.
    struct FailingQuery;

    #[async_trait]
    impl ConditionQuery for FailingQuery {
        async fn condition_satisfied(
            &self,
            _session: Option<&AutomationSession>,
            _condition: &WaitCondition,
        ) -> Result<bool> {
            Err(RouteError::NoActiveSession.into())
        }
    }

    fn session() -> AutomationSession {
        AutomationSession::new("preferences")
    }

    #[test]
    fn condition_names() {
        assert_eq!(ConditionName::NoneAnimating.as_str(), "NONE_ANIMATING");
        assert_eq!(ConditionName::NoNetworkIndicator.to_string(), "NO_NETWORK_INDICATOR");
    }

    #[test]
    fn argument_includes_query_when_present() {
        let condition = WaitCondition::new(ConditionName::NoneAnimating, DEFAULT_ANIMATION_TIMEOUT, "m")
            .with_query("button");
        assert_eq!(
            condition.to_argument(),
            json!({"condition": "NONE_ANIMATING", "query": "button"})
        );
        let condition =
            WaitCondition::new(ConditionName::NoNetworkIndicator, DEFAULT_ANIMATION_TIMEOUT, "m");
        assert_eq!(condition.to_argument(), json!({"condition": "NO_NETWORK_INDICATOR"}));
    }

    #[test]
    fn satisfaction_reading() {
        assert!(is_satisfied(&json!(true)));
        assert!(!is_satisfied(&json!(false)));
        assert!(!is_satisfied(&Value::Null));
        assert!(!is_satisfied(&json!("true")));
        assert!(is_satisfied(&json!({"status": "success", "value": true})));
        assert!(!is_satisfied(&json!({"status": "success", "value": false})));
    }

    #[tokio::test(start_paused = true)]
    async fn returns_once_condition_holds() {
        let query = CountingQuery::after(4);
        let poller = ConditionPoller::new(query.clone()).with_poll_interval(Duration::from_millis(100));
        let session = session();

        let start = Instant::now();
        poller.wait_for_none_animating(Some(&session), None).await.unwrap();

        assert_eq!(query.calls.load(Ordering::SeqCst), 4);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(300), "waited only {elapsed:?}");
        assert!(elapsed < Duration::from_millis(400), "waited {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn satisfied_immediately_does_not_sleep() {
        let query = CountingQuery::after(1);
        let poller = ConditionPoller::new(query.clone());
        let start = Instant::now();
        poller
            .wait_for_no_network_indicator(Some(&session()), None)
            .await
            .unwrap();
        assert_eq!(query.calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_after_timeout_plus_margin() {
        let poller = ConditionPoller::new(CountingQuery::never())
            .with_poll_interval(Duration::from_millis(250))
            .with_margin(Duration::from_secs(1));

        let start = Instant::now();
        let err = poller
            .wait_for_none_animating(Some(&session()), Some(Duration::from_secs(2)))
            .await
            .unwrap_err();

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3), "waited only {elapsed:?}");
        assert!(elapsed < Duration::from_millis(3250), "waited {elapsed:?}");

        match &err {
            UiaError::Timeout { message, timeout } => {
                assert_eq!(*timeout, Duration::from_secs(2));
                assert!(message.contains("all views to stop animating"));
            }
            other => panic!("expected timeout, got: {other:?}"),
        }
        let text = err.to_string();
        assert_eq!(text.matches("2 seconds").count(), 1, "{text}");
        assert!(text.starts_with("Timed out after 2 seconds"));
    }

    #[tokio::test(start_paused = true)]
    async fn default_margin_comes_from_config() {
        let poller = ConditionPoller::new(CountingQuery::never());
        assert_eq!(poller.margin(), Duration::from_secs(5));

        let start = Instant::now();
        let err = poller
            .wait_for_no_network_indicator(Some(&session()), Some(Duration::from_secs(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, UiaError::Timeout { .. }));
        assert!(start.elapsed() >= Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn query_errors_end_the_wait() {
        let poller = ConditionPoller::new(Arc::new(FailingQuery));
        let err = poller
            .wait_for_none_animating(Some(&session()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, UiaError::Route(RouteError::NoActiveSession)));
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_timeout_does_not_overflow_deadline() {
        let query = CountingQuery::after(1);
        let poller = ConditionPoller::new(query.clone());

        poller
            .wait_for_none_animating(Some(&session()), Some(Duration::MAX))
            .await
            .unwrap();
        assert_eq!(query.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn named_waits_build_expected_conditions() {
        let query = CountingQuery::after(1);
        let poller = ConditionPoller::new(query.clone());
        let session = session();

        poller.wait_for_none_animating(Some(&session), None).await.unwrap();
        poller.wait_for_animations(Some(&session), "view marked:'spinner'", None).await.unwrap();
        poller.wait_for_no_network_indicator(Some(&session), None).await.unwrap();

        let seen = query.seen.lock().unwrap();
        assert_eq!(seen.len(), 3);

        assert_eq!(seen[0].condition, ConditionName::NoneAnimating);
        assert_eq!(seen[0].query.as_deref(), Some("*"));
        assert_eq!(seen[0].timeout, DEFAULT_ANIMATION_TIMEOUT);

        assert_eq!(seen[1].condition, ConditionName::NoneAnimating);
        assert_eq!(seen[1].query.as_deref(), Some("view marked:'spinner'"));
        assert!(seen[1].timeout_message.contains("view marked:'spinner'"));

        assert_eq!(seen[2].condition, ConditionName::NoNetworkIndicator);
        assert_eq!(seen[2].query, None);
        assert_eq!(seen[2].timeout, DEFAULT_NETWORK_INDICATOR_TIMEOUT);
        assert!(seen[2].timeout_message.contains("15 seconds"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_token_aborts_wait() {
        let token = CancellationToken::new();
        let poller = ConditionPoller::new(CountingQuery::never()).with_cancel_token(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            token.cancel();
        });

        let start = Instant::now();
        let err = poller
            .wait_for_none_animating(Some(&session()), Some(Duration::from_secs(30)))
            .await
            .unwrap_err();
        canceller.await.unwrap();

        assert!(matches!(err, UiaError::Cancelled));
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
