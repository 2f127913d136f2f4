/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

use log::*;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    helpers, CallbackServer, ConfigurationError, ConfirmationAgent, HandshakeState, ServerHandle,
    SnsTopicService, SubscribeInput, SubscriptionRequest, TopicService, TopicServiceError,
};

#[derive(Debug)]
pub enum HandshakeError {
    Configuration(ConfigurationError),
    Bind { port: u16, source: std::io::Error },
    Subscribe(TopicServiceError),
    Timeout(Duration),
    Listener,
}

impl std::fmt::Display for HandshakeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(e) => std::fmt::Display::fmt(e, f),
            Self::Bind { port, source } => f.write_fmt(format_args!(
                "Error binding callback listener to port {}: {}",
                port, source
            )),
            Self::Subscribe(e) => std::fmt::Display::fmt(e, f),
            Self::Timeout(t) => f.write_fmt(format_args!(
                "No subscription confirmation received within {}s",
                t.as_secs_f32()
            )),
            Self::Listener => {
                f.write_str("Callback listener stopped before the subscription was confirmed")
            }
        }
    }
}

impl std::error::Error for HandshakeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Configuration(e) => Some(e),
            Self::Bind { source, .. } => Some(source),
            Self::Subscribe(e) => Some(e),
            Self::Timeout(_) | Self::Listener => None,
        }
    }
}

impl From<ConfigurationError> for HandshakeError {
    fn from(e: ConfigurationError) -> Self {
        Self::Configuration(e)
    }
}

impl From<TopicServiceError> for HandshakeError {
    fn from(e: TopicServiceError) -> Self {
        Self::Subscribe(e)
    }
}

/// Result of a completed handshake
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionOutcome {
    pub topic: String,
    pub endpoint: String,
    /// Subscription handle as reported by the topic service when the subscription was requested
    pub subscription: String,
}

/// Drives one subscription handshake from start to finish:
///
/// 1. bind the callback listener (the socket is bound before anything is sent to the topic service, so an immediate
///    confirmation callback is queued rather than refused)
/// 2. request the subscription from the topic service
/// 3. wait until the confirmation callback has been received and acknowledged
pub struct HandshakeCoordinator;

impl HandshakeCoordinator {
    /// Run a complete subscription handshake.
    ///
    /// # Arguments
    ///
    /// * `request` - validated parameters of this subscription
    /// * `topic_service` - the remote service to request the subscription from
    ///
    /// # Errors
    ///
    /// * `HandshakeError::Bind` if the callback listener cannot be bound
    /// * `HandshakeError::Subscribe` if the topic service rejects the request; the listener is torn down and no
    ///   confirmation is attempted
    /// * `HandshakeError::Timeout` if `request.timeout` is set and elapses before confirmation
    /// * `HandshakeError::Listener` if the listener dies before confirmation
    pub async fn run(
        request: Arc<SubscriptionRequest>,
        topic_service: Arc<dyn TopicService>,
    ) -> Result<SubscriptionOutcome, HandshakeError> {
        helpers::init_once();

        let state = Arc::new(HandshakeState::new());
        let agent = Arc::new(ConfirmationAgent::new(state.clone()));

        let server = CallbackServer::bind(request.port, &request.path, agent)
            .await
            .map_err(|source| HandshakeError::Bind {
                port: request.port,
                source,
            })?;
        let mut listener = server.serve();

        info!(
            "Requesting {} subscription of {} to {}",
            request.protocol, request.endpoint, request.topic
        );
        // on error, dropping `listener` tears the server down
        let subscription = topic_service
            .subscribe(SubscribeInput {
                topic: request.topic.clone(),
                endpoint: request.endpoint.clone(),
                protocol: request.protocol.clone(),
            })
            .await?;
        info!("Subscription requested ({subscription}), waiting for confirmation callback");

        Self::await_confirmation(&state, &mut listener, request.timeout).await?;
        listener.shutdown();

        Ok(SubscriptionOutcome {
            topic: request.topic.clone(),
            endpoint: request.endpoint.clone(),
            subscription,
        })
    }

    async fn await_confirmation(
        state: &HandshakeState,
        listener: &mut ServerHandle,
        timeout: Option<Duration>,
    ) -> Result<(), HandshakeError> {
        let wait = async {
            tokio::select! {
                _ = state.completed() => Ok(()),
                _ = listener.stopped() => {
                    if state.is_completed() {
                        Ok(())
                    } else {
                        Err(HandshakeError::Listener)
                    }
                }
            }
        };

        match timeout {
            None => wait.await,
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| HandshakeError::Timeout(limit))?,
        }
    }
}

/// Subscribe `endpoint` to the SNS `topic` in `region` and complete the confirmation handshake.
///
/// Parameters are validated before any network activity; the SNS client uses the default AWS credential chain.
pub async fn subscribe(
    region: String,
    topic: String,
    endpoint: String,
    port: u16,
    timeout: Option<Duration>,
) -> Result<SubscriptionOutcome, HandshakeError> {
    let request = SubscriptionRequest::create(region, topic, endpoint, port, timeout)?;
    let topic_service = Arc::new(SnsTopicService::for_region(request.region.clone()).await);
    HandshakeCoordinator::run(request, topic_service).await
}
