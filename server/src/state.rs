use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use inkroom_shared::{MemberInfo, ServerMessage, StrokeEvent};
use tokio::sync::{mpsc, RwLock};

use crate::rooms::RoomRegistry;

pub const DEFAULT_HISTORY_LIMIT: usize = 1000;
pub const DEFAULT_MAX_CAPACITY: usize = 50;
pub const DEFAULT_CAPACITY: usize = 5;
pub const OUTBOUND_QUEUE: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoomLimits {
    pub history_limit: usize,
    pub max_capacity: usize,
    pub default_capacity: usize,
}

impl Default for RoomLimits {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            max_capacity: DEFAULT_MAX_CAPACITY,
            default_capacity: DEFAULT_CAPACITY,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub rooms: RoomRegistry,
    pub limits: RoomLimits,
}

impl AppState {
    pub fn new(limits: RoomLimits) -> Self {
        Self {
            rooms: RoomRegistry::new(),
            limits,
        }
    }
}

pub type SharedRoom = Arc<RwLock<Room>>;
pub type PeerSender = mpsc::Sender<ServerMessage>;

pub struct Member {
    pub info: MemberInfo,
    /// Join order inside the room, used only for display ordering.
    pub seq: u64,
}

/// Events removed by one undo, restored as a unit by one redo.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeGroup {
    pub events: Vec<StrokeEvent>,
}

pub struct Room {
    pub id: String,
    pub name: String,
    pub capacity: usize,
    pub created_at: u64,
    pub members: HashMap<String, Member>,
    pub peers: HashMap<String, PeerSender>,
    pub history: VecDeque<StrokeEvent>,
    pub history_limit: usize,
    pub redo_stacks: HashMap<String, Vec<StrokeGroup>>,
    pub next_seq: u64,
    /// Set once the registry has dropped this room; joins must not land here.
    pub closed: bool,
}

impl Room {
    pub fn new(id: String, name: String, capacity: usize, history_limit: usize) -> Self {
        Self {
            id,
            name,
            capacity: capacity.max(1),
            created_at: now_millis(),
            members: HashMap::new(),
            peers: HashMap::new(),
            history: VecDeque::new(),
            history_limit: history_limit.max(1),
            redo_stacks: HashMap::new(),
            next_seq: 0,
            closed: false,
        }
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.capacity
    }

    pub fn member_list(&self) -> Vec<MemberInfo> {
        let mut members = self.members.values().collect::<Vec<_>>();
        members.sort_by_key(|member| member.seq);
        members
            .into_iter()
            .map(|member| member.info.clone())
            .collect()
    }
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
