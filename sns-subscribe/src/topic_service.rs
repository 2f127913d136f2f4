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
use aws_config::BehaviorVersion;
use aws_sdk_sns::{config::Region, error::DisplayErrorContext};
use log::*;

/// Handle SNS reports for a subscription that still awaits confirmation
pub const PENDING_CONFIRMATION: &str = "pending confirmation";

/// Parameters of a single `Subscribe` call against the remote topic service
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscribeInput {
    pub topic: String,
    pub endpoint: String,
    pub protocol: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicServiceError(String);

impl TopicServiceError {
    pub fn new<T>(message: T) -> TopicServiceError
    where
        T: Into<String>,
    {
        TopicServiceError(message.into())
    }
}

impl std::fmt::Display for TopicServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("Topic service error: {}", self.0))
    }
}

impl std::error::Error for TopicServiceError {}

/// The remote publish/subscribe service, reduced to the one call the handshake needs. Exists as a trait so that
/// the handshake can be driven against a mock service that simulates callback delivery.
#[async_trait]
pub trait TopicService: Send + Sync {
    /// Ask the service to subscribe `input.endpoint` to `input.topic`; returns the subscription handle reported by the service.
    async fn subscribe(&self, input: SubscribeInput) -> Result<String, TopicServiceError>;
}

/// AWS SNS backed [`TopicService`]
#[derive(Clone, Debug)]
pub struct SnsTopicService {
    client: aws_sdk_sns::Client,
}

impl SnsTopicService {
    /// Build an SNS client scoped to `region`, with credentials from the default AWS provider chain.
    pub async fn for_region<T>(region: T) -> Self
    where
        T: Into<String>,
    {
        let region = region.into();
        debug!("Setting up SNS client for region {region}");
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region))
            .load()
            .await;
        SnsTopicService {
            client: aws_sdk_sns::Client::new(&sdk_config),
        }
    }
}

#[async_trait]
impl TopicService for SnsTopicService {
    async fn subscribe(&self, input: SubscribeInput) -> Result<String, TopicServiceError> {
        let SubscribeInput {
            topic,
            endpoint,
            protocol,
        } = input;

        debug!("Subscribing {endpoint} ({protocol}) to topic {topic}");
        let output = self
            .client
            .subscribe()
            .topic_arn(topic)
            .protocol(protocol)
            .endpoint(endpoint)
            .return_subscription_arn(false)
            .send()
            .await
            .map_err(|e| TopicServiceError::new(DisplayErrorContext(e).to_string()))?;

        Ok(output
            .subscription_arn()
            .unwrap_or(PENDING_CONFIRMATION)
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_service_error_display() {
        let e = TopicServiceError::new("AuthorizationError: not allowed");
        assert_eq!(
            e.to_string(),
            "Topic service error: AuthorizationError: not allowed"
        );
    }
}
