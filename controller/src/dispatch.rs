use std::{sync::Arc, time::Duration};

use tracing::{info, warn};

use greenhouse_common::{EventNames, FanCommand, SECRET_IFTTT_KEY};

use crate::{error::DispatchError, ifttt::ActuatorSink, secrets::SecretProvider};

/// Proof that the sink accepted the event for `command`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub command: FanCommand,
    pub event: String,
}

pub struct ActuatorDispatcher {
    secrets: Arc<dyn SecretProvider>,
    sink: Arc<dyn ActuatorSink>,
    events: EventNames,
    timeout: Duration,
}

impl ActuatorDispatcher {
    pub fn new(
        secrets: Arc<dyn SecretProvider>,
        sink: Arc<dyn ActuatorSink>,
        events: EventNames,
        timeout: Duration,
    ) -> Self {
        Self {
            secrets,
            sink,
            events,
            timeout,
        }
    }

    pub fn event_name(&self, command: FanCommand) -> &str {
        match command {
            FanCommand::TurnOn => &self.events.fans_on,
            FanCommand::TurnOff => &self.events.fans_off,
        }
    }

    /// Makes exactly one sink call. The caller commits fan state only on `Ok`.
    pub async fn dispatch(&self, command: FanCommand) -> Result<Ack, DispatchError> {
        let key = self
            .secrets
            .get_secret(SECRET_IFTTT_KEY)
            .await
            .map_err(DispatchError::MissingCredential)?;
        let event = self.event_name(command).to_string();

        let reason = match tokio::time::timeout(self.timeout, self.sink.trigger(&key, &event)).await
        {
            Ok(Ok(())) => {
                info!(command = command.as_str(), event = %event, "fan event dispatched");
                return Ok(Ack { command, event });
            }
            Ok(Err(err)) => err.to_string(),
            Err(_) => format!("timed out after {:?}", self.timeout),
        };

        warn!(command = command.as_str(), event = %event, %reason, "fan event rejected");
        Err(DispatchError::SinkRejected { event, reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::CheckError,
        ifttt::IftttWebhook,
        testing::{FakeSecrets, RecordingSink},
    };

    fn dispatcher(secrets: FakeSecrets, sink: Arc<RecordingSink>) -> ActuatorDispatcher {
        ActuatorDispatcher::new(
            Arc::new(secrets),
            sink,
            EventNames::default(),
            Duration::from_millis(200),
        )
    }

    #[tokio::test]
    async fn directions_use_distinct_events() {
        let sink = Arc::new(RecordingSink::accepting());
        let dispatcher = dispatcher(FakeSecrets::complete(), sink.clone());

        let on = dispatcher.dispatch(FanCommand::TurnOn).await.unwrap();
        let off = dispatcher.dispatch(FanCommand::TurnOff).await.unwrap();

        assert_eq!(on.event, "greenhouse_temp_over_limit");
        assert_eq!(off.event, "greenhouse_temp_under_limit");
        assert_eq!(
            sink.calls(),
            vec![
                ("hook-key".to_string(), "greenhouse_temp_over_limit".to_string()),
                ("hook-key".to_string(), "greenhouse_temp_under_limit".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn missing_key_never_reaches_sink() {
        let sink = Arc::new(RecordingSink::accepting());
        let dispatcher = dispatcher(FakeSecrets::empty(), sink.clone());

        let err = dispatcher.dispatch(FanCommand::TurnOn).await.unwrap_err();

        assert!(matches!(err, DispatchError::MissingCredential(_)));
        assert!(sink.calls().is_empty());
    }

    #[tokio::test]
    async fn rejection_is_reported_after_a_single_call() {
        let sink = Arc::new(RecordingSink::rejecting(503));
        let dispatcher = dispatcher(FakeSecrets::complete(), sink.clone());

        let err = dispatcher.dispatch(FanCommand::TurnOff).await.unwrap_err();

        match err {
            DispatchError::SinkRejected { event, reason } => {
                assert_eq!(event, "greenhouse_temp_under_limit");
                assert_eq!(reason, "webhook returned HTTP 503");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(sink.calls().len(), 1);
    }

    #[tokio::test]
    async fn slow_sink_is_a_rejection() {
        let sink = Arc::new(RecordingSink::stalling(Duration::from_secs(5)));
        let dispatcher = dispatcher(FakeSecrets::complete(), sink);

        let err = dispatcher.dispatch(FanCommand::TurnOn).await.unwrap_err();

        assert!(matches!(err, DispatchError::SinkRejected { .. }));
    }

    #[tokio::test]
    async fn unreachable_webhook_does_not_leak_key() {
        let webhook = IftttWebhook::with_client(
            reqwest::Client::new(),
            "http://127.0.0.1:1".to_string(),
        );
        let dispatcher = ActuatorDispatcher::new(
            Arc::new(FakeSecrets::complete()),
            Arc::new(webhook),
            EventNames::default(),
            Duration::from_secs(5),
        );

        let err = dispatcher.dispatch(FanCommand::TurnOn).await.unwrap_err();
        let message = CheckError::from(err).to_string();

        assert!(message.starts_with("webhook rejected greenhouse_temp_over_limit"));
        assert!(!message.contains("hook-key"), "{message}");
        assert!(!message.contains("/with/key/"), "{message}");
    }
}
