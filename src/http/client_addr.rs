//! Caller address resolution.
//!
//! Uses the socket peer address recorded by axum's
//! `into_make_service_with_connect_info`. Forwarding headers are not
//! trusted here: they are client-controlled and the record should say who
//! actually connected.

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::Request;

/// Peer address of the connection that carried `req`, if the host
/// recorded one.
pub fn remote_address<T>(req: &Request<T>) -> Option<SocketAddr> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0)
}
