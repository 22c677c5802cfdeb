use axum::{
    extract::{ws::WebSocket, State, WebSocketUpgrade},
    response::Response,
};
use futures::stream::StreamExt;
use tracing::info;

use crate::shared::AppState;

/// WebSocket endpoint for signaling clients
/// GET /ws/signaling
pub async fn signaling_handler(ws: WebSocketUpgrade, State(app_state): State<AppState>) -> Response {
    info!("Signaling connection requested");
    ws.on_upgrade(move |socket| handle_signaling_connection(socket, app_state))
}

/// Hand the upgraded connection to the router
async fn handle_signaling_connection(socket: WebSocket, app_state: AppState) {
    let (sink, stream) = socket.split();
    app_state
        .signaling
        .serve(Box::new(sink), Box::new(stream))
        .await;
}
