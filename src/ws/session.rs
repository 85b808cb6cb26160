//! Per-connection WebSocket actor.
//!
//! The session owns the transport only. Room-level requests are parsed
//! here and forwarded to the bound `RoomActor`; connection-scoped
//! requests (create, join, rejoin, room listing) are resolved against
//! the registry directly.

use std::sync::Arc;
use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{ConnId, PlayerId};
use crate::errors::domain::RejectKind;
use crate::registry::RoomRegistry;
use crate::room::{self, RoomActor};
use crate::ws::protocol::{ClientMsg, ServerMsg};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(40);

/// A serialized-ready server event for this connection.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Outbound(pub ServerMsg);

/// Sent by a room once the connection is attached to a player seat.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Bound {
    pub room: Addr<RoomActor>,
    pub player_id: PlayerId,
}

pub async fn upgrade(
    req: HttpRequest,
    stream: web::Payload,
    registry: web::Data<Arc<RoomRegistry>>,
) -> Result<HttpResponse, Error> {
    let session = WsSession::new(registry.get_ref().clone());
    ws::start(session, &req, stream)
}

pub struct WsSession {
    conn_id: ConnId,
    registry: Arc<RoomRegistry>,
    /// Set once a create/join/rejoin succeeds.
    room: Option<Addr<RoomActor>>,
    player_id: Option<PlayerId>,
    last_heartbeat: Instant,
}

impl WsSession {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self {
            conn_id: Uuid::new_v4(),
            registry,
            room: None,
            player_id: None,
            last_heartbeat: Instant::now(),
        }
    }

    fn send_json(ctx: &mut ws::WebsocketContext<Self>, msg: &ServerMsg) {
        match serde_json::to_string(msg) {
            Ok(payload) => ctx.text(payload),
            Err(err) => warn!(error = %err, "[WS SESSION] failed to serialize outbound message"),
        }
    }

    fn send_reject(
        ctx: &mut ws::WebsocketContext<Self>,
        kind: RejectKind,
        message: impl Into<String>,
    ) {
        Self::send_json(
            ctx,
            &ServerMsg::Rejected {
                kind,
                message: message.into(),
            },
        );
    }

    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |actor, ctx| {
            if Instant::now().duration_since(actor.last_heartbeat) > CLIENT_TIMEOUT {
                warn!(conn_id = %actor.conn_id, "[WS SESSION] heartbeat timed out");
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Normal)));
                ctx.stop();
                return;
            }
            ctx.ping(b"keepalive");
        });
    }

    fn dispatch(&mut self, cmd: ClientMsg, ctx: &mut ws::WebsocketContext<Self>) {
        // A session holds at most one seat; rebinding without dropping the
        // old room would leave it a stale connection entry.
        if self.room.is_some() && binds_to_room(&cmd) {
            Self::send_reject(ctx, RejectKind::BadRequest, "already in a room");
            return;
        }

        match cmd {
            ClientMsg::CreateRoom {
                room_name,
                player_name,
            } => {
                let code = self.registry.allocate_code();
                let room = RoomActor::new(code.clone(), room_name.clone(), self.registry.clone())
                    .start();
                self.registry.insert(code, room_name, room.clone());
                room.do_send(room::Join {
                    conn_id: self.conn_id,
                    player_name,
                    session: ctx.address(),
                    created: true,
                });
            }
            ClientMsg::JoinRoom {
                room_id,
                player_name,
            } => {
                let Some(room) = self.registry.get(&room_id) else {
                    Self::send_reject(ctx, RejectKind::RoomNotFound, "no such room");
                    return;
                };
                room.do_send(room::Join {
                    conn_id: self.conn_id,
                    player_name,
                    session: ctx.address(),
                    created: false,
                });
            }
            ClientMsg::RejoinRoom { room_id, player_id } => {
                let Some(room) = self.registry.get(&room_id) else {
                    Self::send_reject(ctx, RejectKind::RoomNotFound, "no such room");
                    return;
                };
                room.do_send(room::Rejoin {
                    conn_id: self.conn_id,
                    player_id,
                    session: ctx.address(),
                });
            }
            ClientMsg::GetRooms => {
                Self::send_json(
                    ctx,
                    &ServerMsg::RoomsList {
                        rooms: self.registry.lobby_listing(),
                    },
                );
            }
            // Everything else requires a seat in a room.
            other => {
                let Some(room) = &self.room else {
                    Self::send_reject(ctx, RejectKind::BadRequest, "not in a room");
                    return;
                };
                room.do_send(room::Command {
                    conn_id: self.conn_id,
                    msg: other,
                });
            }
        }
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(conn_id = %self.conn_id, "[WS SESSION] started");
        self.start_heartbeat(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        if let Some(room) = &self.room {
            room.do_send(room::Disconnect {
                conn_id: self.conn_id,
            });
        }
        info!(conn_id = %self.conn_id, player_id = ?self.player_id, "[WS SESSION] stopped");
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(payload)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&payload);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.last_heartbeat = Instant::now();
                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(cmd) => self.dispatch(cmd, ctx),
                    Err(err) => {
                        Self::send_reject(
                            ctx,
                            RejectKind::BadRequest,
                            format!("malformed message: {err}"),
                        );
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                self.last_heartbeat = Instant::now();
                Self::send_reject(ctx, RejectKind::BadRequest, "binary frames not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {
                self.last_heartbeat = Instant::now();
            }
            Err(err) => {
                warn!(conn_id = %self.conn_id, error = %err, "[WS SESSION] protocol error");
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
                ctx.stop();
            }
        }
    }
}

impl Handler<Bound> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: Bound, _ctx: &mut Self::Context) {
        self.room = Some(msg.room);
        self.player_id = Some(msg.player_id);
    }
}

impl Handler<Outbound> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: Outbound, ctx: &mut Self::Context) {
        Self::send_json(ctx, &msg.0);
    }
}

/// True for requests that would attach this connection to a room.
fn binds_to_room(cmd: &ClientMsg) -> bool {
    matches!(
        cmd,
        ClientMsg::CreateRoom { .. } | ClientMsg::JoinRoom { .. } | ClientMsg::RejoinRoom { .. }
    )
}
