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

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use log::*;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::notification::{CallbackAction, InboundNotification, NotificationError};
use crate::{helpers, Confirmer};

/// Header SNS sets on every delivery, carrying the same value as the body's `Type` field
const SNS_MESSAGE_TYPE_HEADER: &str = "x-amz-sns-message-type";

/// Build the callback router: a single route at `path` that only accepts POST.
///
/// Other methods on that route get `405 Method Not Allowed`, other paths `404 Not Found`; neither touches the body.
pub fn callback_routes(path: &str, confirmer: Arc<dyn Confirmer>) -> Router {
    Router::new()
        .route(path, post(handle_callback))
        .with_state(confirmer)
}

/// HTTP listener for the subscription confirmation callback.
///
/// Binding and serving are separate steps: [`CallbackServer::bind`] returns once the socket is bound, so connections
/// are queued by the OS from that point on, and [`CallbackServer::serve`] starts the accept loop on its own task.
pub struct CallbackServer {
    listener: TcpListener,
    router: Router,
}

impl CallbackServer {
    /// Bind to `port` on all interfaces.
    pub async fn bind(port: u16, path: &str, confirmer: Arc<dyn Confirmer>) -> io::Result<Self> {
        Self::bind_addr(SocketAddr::from(([0, 0, 0, 0], port)), path, confirmer).await
    }

    pub async fn bind_addr(
        addr: SocketAddr,
        path: &str,
        confirmer: Arc<dyn Confirmer>,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(
            "Callback listener bound to {}, route {path}",
            listener.local_addr()?
        );
        Ok(CallbackServer {
            listener,
            router: callback_routes(path, confirmer),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Start accepting connections; every connection is handled on its own task.
    pub fn serve(self) -> ServerHandle {
        let CallbackServer { listener, router } = self;
        let task = helpers::spawn_and_log_error("Callback listener", async move {
            axum::serve(listener, router).await?;
            Ok(())
        });
        ServerHandle { task }
    }
}

/// Running accept loop of a [`CallbackServer`]; the loop is aborted when the handle is shut down or dropped.
pub struct ServerHandle {
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Resolves when the accept loop has ended on its own (it only does so on a fatal listener error).
    pub async fn stopped(&mut self) {
        let _ = (&mut self.task).await;
    }

    pub fn shutdown(self) {
        self.task.abort();
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn reject(e: NotificationError) -> (StatusCode, String) {
    warn!("Rejecting callback: {e}");
    (StatusCode::BAD_REQUEST, e.to_string())
}

// Body is read as raw bytes: SNS posts its JSON documents with `Content-Type: text/plain`.
async fn handle_callback(
    State(confirmer): State<Arc<dyn Confirmer>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, (StatusCode, String)> {
    if let Some(message_type) = headers
        .get(SNS_MESSAGE_TYPE_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        debug!("Received callback, {SNS_MESSAGE_TYPE_HEADER}: {message_type}");
    }

    let notification = InboundNotification::from_slice(&body).map_err(reject)?;
    debug!(
        "Callback message {} from topic {}",
        notification.message_id.as_deref().unwrap_or("<none>"),
        notification.topic_arn.as_deref().unwrap_or("<none>")
    );

    match notification.action().map_err(reject)? {
        CallbackAction::Confirm(subscribe_url) => match confirmer.confirm(subscribe_url).await {
            Ok(_) => Ok(StatusCode::OK),
            Err(e) => {
                // leave the handshake pending; a non-2xx answer makes SNS redeliver
                error!("{e}");
                Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
            }
        },
        CallbackAction::Ignore(kind) => {
            debug!("Ignoring {kind:?} message");
            Ok(StatusCode::OK)
        }
    }
}
