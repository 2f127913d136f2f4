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

/*!
sns-subscribe subscribes an HTTP(S) endpoint to an [AWS SNS](https://docs.aws.amazon.com/sns/latest/dg/sns-http-https-endpoint-as-subscriber.html) topic
and completes the subscription confirmation handshake on behalf of that endpoint.

SNS does not deliver to a freshly subscribed HTTP(S) endpoint until the endpoint has proven it is reachable: after the
`Subscribe` call, SNS POSTs a `SubscriptionConfirmation` message containing a one-time `SubscribeURL` to the endpoint,
and the subscription becomes active once that URL has been visited. This crate runs a short-lived listener that
receives this message, visits the URL, and then returns.

## Library contents

* `HandshakeCoordinator`, binding the callback listener, requesting the subscription and waiting for confirmation
* `CallbackServer`, the single-route listener the confirmation message is delivered to
* `ConfirmationAgent`, visiting the one-time confirmation URL and completing the `HandshakeState`
* `TopicService`, the seam towards the remote topic service, with the AWS SNS implementation `SnsTopicService`

## Note

The `sns-subscribe-cli` crate provides a command line frontend (`sns-subscribe subscribe ...`) around the `subscribe()` entry point.
*/

mod common {
    pub(crate) mod helpers;
}
pub use common::helpers::init_once;
pub(crate) use common::*;

mod callback_server;
mod configuration;
mod confirmation_agent;
mod handshake;
mod handshake_state;
pub mod notification;
mod topic_service;

pub use callback_server::{callback_routes, CallbackServer, ServerHandle};
pub use configuration::{ConfigurationError, SubscriptionRequest, DEFAULT_PORT};
pub use confirmation_agent::{ConfirmationAgent, ConfirmationError, Confirmer};
pub use handshake::{subscribe, HandshakeCoordinator, HandshakeError, SubscriptionOutcome};
pub use handshake_state::HandshakeState;
pub use topic_service::{
    SnsTopicService, SubscribeInput, TopicService, TopicServiceError, PENDING_CONFIRMATION,
};

#[cfg(test)]
mod tests;
#[cfg(test)]
pub(crate) use tests::*;
