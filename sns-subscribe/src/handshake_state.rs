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

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

/// One-shot completion signal for a subscription handshake.
///
/// Starts out pending and moves to completed exactly once. Any number of tasks may call [`HandshakeState::complete`]
/// concurrently (e.g. while the provider redelivers a confirmation callback); only the first call has an effect.
/// [`HandshakeState::completed`] resolves as soon as the state is completed, including when that happened before
/// the wait began.
#[derive(Debug, Default)]
pub struct HandshakeState {
    done: AtomicBool,
    notify: Notify,
}

impl HandshakeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the handshake as completed. Returns `true` for the call that performed the transition, `false` for every later one.
    pub fn complete(&self) -> bool {
        if self
            .done
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.notify.notify_waiters();
        true
    }

    pub fn is_completed(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    /// Waits until the handshake has been completed.
    pub async fn completed(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // register as waiter before checking the flag, so a concurrent complete() cannot slip in between
            notified.as_mut().enable();
            if self.is_completed() {
                return;
            }
            notified.await;
        }
    }
}
