//! Process-wide room directory.
//!
//! Maps short room codes to running room actors. The registry is handed
//! to the web layer as shared data; rooms keep their own listing entry
//! fresh so the lobby browser never has to ask each actor.

use actix::Addr;
use dashmap::DashMap;
use rand::Rng;

use crate::domain::roles::MAX_PLAYERS;
use crate::room::RoomActor;
use crate::ws::protocol::LobbyRoom;

const CODE_LEN: usize = 6;
const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

struct RoomEntry {
    addr: Addr<RoomActor>,
    room_name: String,
    player_count: usize,
    started: bool,
}

#[derive(Default)]
pub struct RoomRegistry {
    rooms: DashMap<String, RoomEntry>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a room code not currently in use.
    pub fn allocate_code(&self) -> String {
        let mut rng = rand::rng();
        loop {
            let code: String = (0..CODE_LEN)
                .map(|_| CODE_CHARSET[rng.random_range(0..CODE_CHARSET.len())] as char)
                .collect();
            if !self.rooms.contains_key(&code) {
                return code;
            }
        }
    }

    pub fn insert(&self, code: String, room_name: String, addr: Addr<RoomActor>) {
        self.rooms.insert(
            code,
            RoomEntry {
                addr,
                room_name,
                player_count: 0,
                started: false,
            },
        );
    }

    pub fn get(&self, code: &str) -> Option<Addr<RoomActor>> {
        self.rooms.get(code).map(|e| e.addr.clone())
    }

    pub fn remove(&self, code: &str) {
        self.rooms.remove(code);
    }

    /// Called by room actors whenever membership or lifecycle changes.
    pub fn update_listing(&self, code: &str, player_count: usize, started: bool) {
        if let Some(mut entry) = self.rooms.get_mut(code) {
            entry.player_count = player_count;
            entry.started = started;
        }
    }

    /// Joinable rooms only; started games are hidden from the browser.
    pub fn lobby_listing(&self) -> Vec<LobbyRoom> {
        self.rooms
            .iter()
            .filter(|e| !e.started)
            .map(|e| LobbyRoom {
                room_id: e.key().clone(),
                room_name: e.room_name.clone(),
                player_count: e.player_count,
                max_players: MAX_PLAYERS,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
