//! Per-connection handler: join, then serve requests and push notifications.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, info, warn};

use parlor_common::ConnectionId;
use parlor_core::{ClientRequest, Coordinator, ServerMessage, SharedHandle};

use crate::handle::ChannelHandle;
use crate::server::ServerContext;

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;
type WsStream = SplitStream<WebSocketStream<TcpStream>>;

/// What to do after handling one request.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    Reply(ServerMessage),
    Quiet,
    Leave,
}

/// Handle a single WebSocket connection.
pub async fn handle_connection(ws: WebSocketStream<TcpStream>, addr: SocketAddr, ctx: ServerContext) {
    let conn = ConnectionId::new();
    let (mut sink, mut stream) = ws.split();

    // The directory ends up holding the only strong reference to the handle,
    // so evicting the user closes `rx` and ends this loop.
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(ctx.queue_capacity);
    let handle: SharedHandle = Arc::new(ChannelHandle::new(tx));

    // 1. Join.
    let Some(name) = register(&mut sink, &mut stream, &ctx, &handle, &conn, addr).await else {
        return;
    };
    let weak = Arc::downgrade(&handle);
    drop(handle);

    info!(conn = %conn, peer = %addr, name = %name, "Client joined");

    // 2. Request/notification loop.
    loop {
        tokio::select! {
            pushed = rx.recv() => match pushed {
                Some(msg) => {
                    if send_message(&mut sink, &msg).await.is_err() {
                        break;
                    }
                }
                None => {
                    info!(conn = %conn, name = %name, "Session evicted");
                    break;
                }
            },

            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        let (earlier, step) =
                            handle_text(&ctx.coordinator, &name, &conn, &text, &mut rx).await;
                        let mut outbound = earlier;
                        let leave = match step {
                            Step::Reply(msg) => {
                                outbound.push(msg);
                                false
                            }
                            Step::Quiet => false,
                            Step::Leave => true,
                        };
                        if send_all(&mut sink, &outbound).await.is_err() || leave {
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!(conn = %conn, peer = %addr, error = %e, "WS error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    // 3. Cleanup.
    if let Some(handle) = weak.upgrade() {
        ctx.coordinator.leave(&name, &handle).await;
    }
    let _ = sink.close().await;
    info!(conn = %conn, peer = %addr, name = %name, "Client disconnected");
}

/// Read `join` requests until one succeeds, the client gives up, or the
/// join timeout elapses. Returns the joined name.
async fn register(
    sink: &mut WsSink,
    stream: &mut WsStream,
    ctx: &ServerContext,
    handle: &SharedHandle,
    conn: &ConnectionId,
    addr: SocketAddr,
) -> Option<String> {
    let deadline = Instant::now() + ctx.join_timeout;

    loop {
        let frame = match tokio::time::timeout_at(deadline, stream.next()).await {
            Ok(frame) => frame,
            Err(_) => {
                warn!(conn = %conn, peer = %addr, timeout = ?ctx.join_timeout, "Join timeout");
                return None;
            }
        };

        let text = match frame {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Ping(data))) => {
                let _ = sink.send(Message::Pong(data)).await;
                continue;
            }
            Some(Ok(Message::Close(_))) | None => {
                debug!(conn = %conn, peer = %addr, "Connection closed before join");
                return None;
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                warn!(conn = %conn, peer = %addr, error = %e, "WS error during join");
                return None;
            }
        };

        let reply = match serde_json::from_str::<ClientRequest>(&text) {
            Ok(ClientRequest::Join { name }) => {
                let name = name.trim().to_string();
                match ctx.coordinator.join(&name, handle.clone()).await {
                    Ok(()) => {
                        let joined = ServerMessage::JoinResult {
                            joined: true,
                            reason: None,
                        };
                        if send_message(sink, &joined).await.is_err() {
                            ctx.coordinator.leave(&name, handle).await;
                            return None;
                        }
                        return Some(name);
                    }
                    Err(rejection) => {
                        debug!(conn = %conn, name = %name, reason = %rejection, "Join rejected");
                        ServerMessage::JoinResult {
                            joined: false,
                            reason: Some(rejection.to_string()),
                        }
                    }
                }
            }
            Ok(ClientRequest::Ping) => ServerMessage::Pong,
            Ok(ClientRequest::Disconnect) => return None,
            Ok(_) => ServerMessage::Error {
                message: "join first".into(),
            },
            Err(e) => ServerMessage::Error {
                message: format!("malformed request: {e}"),
            },
        };

        if send_message(sink, &reply).await.is_err() {
            return None;
        }
    }
}

/// Handle one text frame from the joined user `name`.
///
/// Pushes already queued when the frame arrives are handed back ahead of the
/// outcome and must be written first. Pushes queued while the request runs
/// stay in `rx` and follow the reply, so the client never sees a reply that
/// predates events it was already shown.
async fn handle_text(
    coordinator: &Coordinator,
    name: &str,
    conn: &ConnectionId,
    text: &str,
    rx: &mut mpsc::Receiver<ServerMessage>,
) -> (Vec<ServerMessage>, Step) {
    let earlier = drain(rx);
    let step = match serde_json::from_str::<ClientRequest>(text) {
        Ok(request) => {
            debug!(conn = %conn, name = %name, request = ?request, "Request");
            dispatch(coordinator, name, request).await
        }
        Err(e) => {
            debug!(conn = %conn, error = %e, "Malformed request");
            Step::Reply(ServerMessage::Error {
                message: format!("malformed request: {e}"),
            })
        }
    };
    (earlier, step)
}

/// Take everything currently waiting in the queue without blocking.
fn drain(rx: &mut mpsc::Receiver<ServerMessage>) -> Vec<ServerMessage> {
    let mut queued = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        queued.push(msg);
    }
    queued
}

/// Apply one request from the joined user `name`.
async fn dispatch(coordinator: &Coordinator, name: &str, request: ClientRequest) -> Step {
    match request {
        ClientRequest::Join { .. } => Step::Reply(ServerMessage::Error {
            message: "already joined".into(),
        }),
        ClientRequest::Pair { to } => {
            let to = to.trim().to_string();
            match coordinator.pair(name, &to).await {
                Ok(edge) => Step::Reply(ServerMessage::PairResult {
                    to: edge.partner,
                    paired: true,
                    reason: None,
                }),
                Err(rejection) => Step::Reply(ServerMessage::PairResult {
                    to,
                    paired: false,
                    reason: Some(rejection.to_string()),
                }),
            }
        }
        ClientRequest::Send { text } => match coordinator.send_message(name, &text).await {
            Ok(()) => Step::Quiet,
            Err(_) => {
                debug!(name = %name, "Dropped message sent outside a conversation");
                Step::Reply(ServerMessage::NotPaired)
            }
        },
        ClientRequest::ReturnToLobby => match coordinator.return_to_lobby(name).await {
            Ok(()) => Step::Quiet,
            Err(_) => {
                debug!(name = %name, "Return requested while not paired");
                Step::Reply(ServerMessage::NotPaired)
            }
        },
        ClientRequest::Lobby => Step::Reply(coordinator.lobby_view(name).await.into()),
        ClientRequest::Disconnect => Step::Leave,
        ClientRequest::Ping => Step::Reply(ServerMessage::Pong),
    }
}

async fn send_all(sink: &mut WsSink, msgs: &[ServerMessage]) -> Result<(), tungstenite::Error> {
    for msg in msgs {
        send_message(sink, msg).await?;
    }
    Ok(())
}

/// Send a ServerMessage as a JSON text frame.
async fn send_message(sink: &mut WsSink, msg: &ServerMessage) -> Result<(), tungstenite::Error> {
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "Failed to encode server message");
            return Ok(());
        }
    };
    sink.send(Message::Text(json.into())).await
}
