// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Network glue: the UDP transport for the query handler, and the HTTP
//! endpoints for metrics, liveness and readiness.

use crate::constants::{
    DEFAULT_UDP_PAYLOAD, HEALTH_PATH, MAX_UDP_PAYLOAD, METRICS_SERVER_PATH, READY_PATH,
};
use crate::controller::ClusterState;
use crate::errors::HandlerError;
use crate::handler::{KubernetesHandler, ResponseWriter};
use crate::metadata::RequestContext;
use crate::metrics::gather_metrics;
use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use hickory_proto::op::Message;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

/// Writer that encodes the reply for a single UDP datagram.
#[derive(Debug)]
pub struct UdpResponse {
    peer: SocketAddr,
    max_payload: usize,
    encoded: Option<Vec<u8>>,
}

impl UdpResponse {
    /// A writer for `peer` whose replies are truncated above `max_payload` bytes.
    #[must_use]
    pub fn new(peer: SocketAddr, max_payload: usize) -> Self {
        Self {
            peer,
            max_payload,
            encoded: None,
        }
    }

    /// The encoded reply, if one was written.
    #[must_use]
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        self.encoded
    }
}

impl ResponseWriter for UdpResponse {
    fn remote_ip(&self) -> IpAddr {
        self.peer.ip()
    }

    fn write_msg(&mut self, mut msg: Message) -> Result<(), HandlerError> {
        let mut bytes = msg.to_vec()?;
        if bytes.len() > self.max_payload {
            msg.take_answers();
            msg.take_name_servers();
            msg.take_additionals();
            msg.set_truncated(true);
            bytes = msg.to_vec()?;
        }
        self.encoded = Some(bytes);
        Ok(())
    }
}

/// Reply size limit for `request`: 512 bytes, or its EDNS buffer size capped
/// at [`MAX_UDP_PAYLOAD`].
#[must_use]
pub fn max_payload(request: &Message) -> usize {
    request.extensions().as_ref().map_or(DEFAULT_UDP_PAYLOAD, |edns| {
        usize::from(edns.max_payload()).clamp(DEFAULT_UDP_PAYLOAD, MAX_UDP_PAYLOAD)
    })
}

/// Answer one datagram. Returns the encoded reply, or `None` if nothing should be sent.
#[must_use]
pub fn handle_datagram(handler: &KubernetesHandler, packet: &[u8], peer: SocketAddr) -> Option<Vec<u8>> {
    let request = match Message::from_vec(packet) {
        Ok(request) => request,
        Err(e) => {
            debug!(peer = %peer, "Dropping malformed query: {e}");
            return None;
        }
    };

    let mut ctx = RequestContext::new();
    let mut writer = UdpResponse::new(peer, max_payload(&request));
    if let Err(e) = handler.serve_dns(&mut ctx, &mut writer, &request) {
        warn!(peer = %peer, "Query failed: {e}");
        return None;
    }
    writer.into_bytes()
}

/// Serve queries on `socket` until the task is cancelled.
///
/// # Errors
///
/// Returns an error if the socket fails to receive.
pub async fn serve_udp(socket: UdpSocket, handler: Arc<KubernetesHandler>) -> Result<()> {
    let socket = Arc::new(socket);
    info!(address = %socket.local_addr()?, "DNS server listening");

    let mut buf = vec![0u8; MAX_UDP_PAYLOAD];
    loop {
        let (len, peer) = socket.recv_from(&mut buf).await?;
        let packet = buf[..len].to_vec();
        let socket = socket.clone();
        let handler = handler.clone();

        tokio::spawn(async move {
            if let Some(reply) = handle_datagram(&handler, &packet, peer) {
                if let Err(e) = socket.send_to(&reply, peer).await {
                    warn!(peer = %peer, "DNS send error: {e}");
                }
            }
        });
    }
}

/// Routes for `/metrics`, `/healthz` and `/ready`.
pub fn health_router(state: Arc<dyn ClusterState>) -> Router {
    Router::new()
        .route(METRICS_SERVER_PATH, get(metrics))
        .route(HEALTH_PATH, get(healthz))
        .route(READY_PATH, get(ready))
        .with_state(state)
}

/// Serve [`health_router`] on `addr`.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn serve_health(addr: SocketAddr, state: Arc<dyn ClusterState>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "Health server listening");
    axum::serve(listener, health_router(state)).await?;
    Ok(())
}

async fn metrics() -> (StatusCode, String) {
    match gather_metrics() {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

pub async fn healthz() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// `200` once every watched kind completed its initial list, `503` before.
pub async fn ready(State(state): State<Arc<dyn ClusterState>>) -> (StatusCode, &'static str) {
    if state.has_synced() {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not synced")
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod server_tests;
