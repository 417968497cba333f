//! Server-Sent Events feed of appointment changes.
//!
//! `GET /api/realtime?practiceId=` streams `appointments.updated` events for
//! the practice channel, with a keep-alive ping every 15 seconds.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Extension;
use futures_util::stream::{self, Stream};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::booking::Actor;
use crate::models::Permission;

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeQuery {
    pub practice_id: Option<String>,
}

/// `GET /api/realtime`
pub async fn subscribe(
    State(ctx): State<ApiContext>,
    Extension(actor): Extension<Actor>,
    query: Result<Query<RealtimeQuery>, QueryRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let Query(query) = query?;
    actor
        .require(Permission::ViewDashboard)
        .map_err(|denied| ApiError::Forbidden(denied.to_string()))?;

    let practice_id = query
        .practice_id
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| ctx.core.settings().practice_id.clone());
    let feed = ctx.core.feed_for(&practice_id);
    let rx = feed.subscribe();

    tracing::debug!(channel = feed.channel().as_str(), actor = %actor.user_id, "Realtime subscriber connected");

    let events = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let data = match serde_json::to_string(&event.change) {
                        Ok(data) => data,
                        Err(e) => {
                            tracing::error!("Failed to encode realtime event: {e}");
                            continue;
                        }
                    };
                    let sse = Event::default().event(event.event).data(data);
                    return Some((Ok(sse), rx));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Realtime subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL).text("ping")))
}
