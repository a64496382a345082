//! Geo Gate Middleware
//!
//! axum adapter for [`GeoGateService`]: reads request metadata, runs the
//! decision, then either forwards the request or answers it. Never both.

use crate::application::GeoGateService;
use crate::domain::entities::Decision;
use crate::domain::services::{HeaderValue, RequestMetadata};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

/// JSON body written for denied and failed requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateResponseBody {
    pub status_code: u16,
    pub message: String,
}

/// Request metadata view over axum's request parts.
pub struct AxumRequestMeta<'a> {
    headers: &'a HeaderMap,
    peer: Option<IpAddr>,
}

impl<'a> AxumRequestMeta<'a> {
    pub fn new(headers: &'a HeaderMap, peer: Option<IpAddr>) -> Self {
        Self { headers, peer }
    }
}

impl RequestMetadata for AxumRequestMeta<'_> {
    fn header(&self, name: &str) -> Option<HeaderValue<'_>> {
        let value = self.headers.get(name)?;
        Some(match value.to_str() {
            Ok(text) => HeaderValue::Text(text),
            Err(_) => HeaderValue::Opaque,
        })
    }

    fn peer_addr(&self) -> Option<IpAddr> {
        self.peer
    }
}

/// Middleware function, for use with `middleware::from_fn_with_state`.
///
/// The peer address is only available when the server is run with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
///
/// If the client goes away while the lookup is pending, axum drops this
/// future: the lookup is abandoned and nothing is written.
pub async fn geo_gate(
    State(service): State<Arc<GeoGateService>>,
    mut req: Request,
    next: Next,
) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let decision = {
        let meta = AxumRequestMeta::new(req.headers(), peer);
        service.decide(&meta).await
    };

    let status = decision.status();
    match decision {
        Decision::Allow(ctx) => {
            req.extensions_mut().insert(ctx);
            next.run(req).await
        }
        Decision::Deny { message, .. } | Decision::Error { message, .. } => {
            gate_response(status, message)
        }
    }
}

/// Build the short-circuit response for a terminal decision.
pub fn gate_response(status: u16, message: String) -> Response {
    let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = GateResponseBody {
        status_code: code.as_u16(),
        message,
    };
    (code, Json(body)).into_response()
}

/// Put every route currently in `router` behind the gate.
///
/// Routes merged in afterwards are not gated, neither are unmatched paths.
pub fn protect<S>(router: Router<S>, service: Arc<GeoGateService>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn_with_state(service, geo_gate))
}
