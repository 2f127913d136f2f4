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

use async_trait::async_trait;
use log::*;
use std::sync::Arc;
use std::time::Duration;

use crate::HandshakeState;

/// Upper bound for a single confirmation request
pub(crate) const CONFIRMATION_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug)]
pub struct ConfirmationError {
    pub(crate) url: String,
    pub(crate) source: reqwest::Error,
}

impl std::fmt::Display for ConfirmationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "Error confirming subscription via {}: {}",
            self.url, self.source
        ))
    }
}

impl std::error::Error for ConfirmationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// This trait is the hook-point between the callback route and the side-effecting confirmation step, so that the
/// route can be exercised against a mock that records which URLs it was asked to confirm.
#[async_trait]
pub trait Confirmer: Send + Sync {
    /// Confirm a subscription by visiting its one-time URL.
    ///
    /// Returns `Ok(true)` if this call completed the handshake, `Ok(false)` if it had been completed before (e.g. the
    /// provider redelivered the confirmation message).
    async fn confirm(&self, subscribe_url: String) -> Result<bool, ConfirmationError>;
}

/// Performs the outbound GET to the provider-issued confirmation URL and signals the shared [`HandshakeState`] once that succeeded.
#[derive(Clone)]
pub struct ConfirmationAgent {
    http_client: reqwest::Client,
    state: Arc<HandshakeState>,
}

impl ConfirmationAgent {
    pub fn new(state: Arc<HandshakeState>) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(CONFIRMATION_REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!("Error building confirmation HTTP client, using defaults: {e}");
                reqwest::Client::new()
            });
        Self::with_client(http_client, state)
    }

    pub fn with_client(http_client: reqwest::Client, state: Arc<HandshakeState>) -> Self {
        ConfirmationAgent { http_client, state }
    }
}

#[async_trait]
impl Confirmer for ConfirmationAgent {
    async fn confirm(&self, subscribe_url: String) -> Result<bool, ConfirmationError> {
        debug!("Confirming subscription via {subscribe_url}");

        // Any response counts; the URL is single-use on the provider side, so a repeated visit may well be answered
        // with an error status without that being our failure.
        let response = self
            .http_client
            .get(&subscribe_url)
            .send()
            .await
            .map_err(|source| ConfirmationError {
                url: subscribe_url.clone(),
                source,
            })?;
        debug!(
            "Confirmation request to {subscribe_url} answered with {}",
            response.status()
        );

        let completed = self.state.complete();
        if completed {
            info!("Subscription confirmed");
        } else {
            debug!("Handshake already completed, ignoring repeated confirmation");
        }
        Ok(completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{helpers, test_lib};

    #[tokio::test]
    async fn test_confirm_success() {
        helpers::init_once();
        let fake = test_lib::helpers::FakeConfirmEndpoint::start().await;
        let state = Arc::new(HandshakeState::new());
        let agent = ConfirmationAgent::new(state.clone());

        let completed = agent
            .confirm(fake.confirm_url())
            .await
            .expect("Expected confirmation to succeed");

        assert!(completed);
        assert!(state.is_completed());
        assert_eq!(fake.hits(), 1);
    }

    #[tokio::test]
    async fn test_confirm_twice_completes_once() {
        helpers::init_once();
        let fake = test_lib::helpers::FakeConfirmEndpoint::start().await;
        let state = Arc::new(HandshakeState::new());
        let agent = ConfirmationAgent::new(state.clone());

        assert!(agent.confirm(fake.confirm_url()).await.unwrap());
        assert!(!agent.confirm(fake.confirm_url()).await.unwrap());

        assert!(state.is_completed());
        assert_eq!(fake.hits(), 2);
    }

    #[tokio::test]
    async fn test_error_status_still_counts_as_confirmed() {
        helpers::init_once();
        let fake = test_lib::helpers::FakeConfirmEndpoint::start().await;
        let state = Arc::new(HandshakeState::new());
        let agent = ConfirmationAgent::new(state.clone());

        let completed = agent
            .confirm(fake.url_for("/no-such-path"))
            .await
            .expect("Expected an HTTP error status not to be a transport error");

        assert!(completed);
        assert!(state.is_completed());
    }

    #[tokio::test]
    async fn test_transport_failure_leaves_state_pending() {
        helpers::init_once();
        let state = Arc::new(HandshakeState::new());
        let agent = ConfirmationAgent::new(state.clone());

        let result = agent
            .confirm(test_lib::helpers::unreachable_url())
            .await;

        assert!(result.is_err());
        assert!(!state.is_completed());
    }
}
