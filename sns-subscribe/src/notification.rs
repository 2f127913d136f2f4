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

use serde::Deserialize;

// SNS posts JSON documents to HTTP(S) subscribers; only the fields needed to complete a subscription handshake
// are modeled here, everything else in the body is ignored.

/// Message kind, taken from the `Type` field of an inbound SNS message
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub enum NotificationType {
    SubscriptionConfirmation,
    Notification,
    UnsubscribeConfirmation,
    /// Any type this crate does not know about; accepted and ignored
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct InboundNotification {
    #[serde(rename = "Type")]
    pub kind: NotificationType,
    #[serde(rename = "SubscribeURL", default)]
    pub subscribe_url: Option<String>,
    #[serde(rename = "MessageId", default)]
    pub message_id: Option<String>,
    #[serde(rename = "TopicArn", default)]
    pub topic_arn: Option<String>,
}

/// What an inbound message asks this endpoint to do
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallbackAction {
    /// GET the contained one-time URL to confirm the subscription
    Confirm(String),
    /// Nothing to do beyond acknowledging receipt
    Ignore(NotificationType),
}

#[derive(Debug)]
pub enum NotificationError {
    MalformedBody(serde_json::Error),
    MissingSubscribeUrl,
}

impl std::fmt::Display for NotificationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedBody(e) => f.write_fmt(format_args!("Malformed notification body: {}", e)),
            Self::MissingSubscribeUrl => {
                f.write_str("SubscriptionConfirmation message without SubscribeURL")
            }
        }
    }
}

impl std::error::Error for NotificationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MalformedBody(e) => Some(e),
            Self::MissingSubscribeUrl => None,
        }
    }
}

impl InboundNotification {
    pub fn from_slice(body: &[u8]) -> Result<Self, NotificationError> {
        serde_json::from_slice(body).map_err(NotificationError::MalformedBody)
    }

    /// Decide what to do with this message; a confirmation request has to carry a non-empty `SubscribeURL`.
    pub fn action(self) -> Result<CallbackAction, NotificationError> {
        match self.kind {
            NotificationType::SubscriptionConfirmation => match self.subscribe_url {
                Some(url) if !url.trim().is_empty() => Ok(CallbackAction::Confirm(url)),
                _ => Err(NotificationError::MissingSubscribeUrl),
            },
            other => Ok(CallbackAction::Ignore(other)),
        }
    }
}
