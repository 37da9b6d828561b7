use crate::room::Room;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use huddle_core::{ConnectionId, RoomId};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Result of [`RoomManager::join`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    /// Members that were already present, excluding the joiner.
    pub existing: Vec<ConnectionId>,
    /// `false` when the joiner was already a member.
    pub newly_joined: bool,
}

/// Room membership table.
///
/// Every mutation runs under the room's entry guard, and the recipients it
/// returns are computed under that same guard. The per-connection index is
/// updated while the room guard is held; lock order is always room, then
/// index.
#[derive(Clone, Default)]
pub struct RoomManager {
    rooms: Arc<DashMap<RoomId, Room>>,
    memberships: Arc<DashMap<ConnectionId, HashSet<RoomId>>>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&self, connection: ConnectionId, room_id: &RoomId) -> JoinOutcome {
        let mut room = self.rooms.entry(room_id.clone()).or_insert_with(|| {
            info!("Creating new room: {}", room_id);
            Room::default()
        });

        let newly_joined = room.insert(connection);
        let existing = room.others(&connection);

        if newly_joined {
            self.memberships
                .entry(connection)
                .or_default()
                .insert(room_id.clone());
        }

        JoinOutcome {
            existing,
            newly_joined,
        }
    }

    /// Removes `connection` from `room_id`. Returns the members still present,
    /// or `None` if it was not a member.
    pub fn leave(&self, connection: ConnectionId, room_id: &RoomId) -> Option<Vec<ConnectionId>> {
        self.remove_member(connection, room_id, true)
    }

    /// Removes `connection` from every room it is in. Returns the remaining
    /// members of each affected room.
    ///
    /// The index entry is taken first, so a `join` racing with this call for
    /// the same connection can survive it. Only a second socket claiming the
    /// same id can race here, and its stale close is filtered out by the
    /// registry generation before this is reached.
    pub fn remove_everywhere(&self, connection: ConnectionId) -> Vec<(RoomId, Vec<ConnectionId>)> {
        let Some((_, rooms)) = self.memberships.remove(&connection) else {
            return Vec::new();
        };

        let mut rooms: Vec<RoomId> = rooms.into_iter().collect();
        rooms.sort();

        rooms
            .into_iter()
            .filter_map(|room_id| {
                let remaining = self.remove_member(connection, &room_id, false)?;
                Some((room_id, remaining))
            })
            .collect()
    }

    pub fn members(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        self.rooms
            .get(room_id)
            .map(|room| room.members())
            .unwrap_or_default()
    }

    pub fn rooms_of(&self, connection: &ConnectionId) -> Vec<RoomId> {
        let mut rooms: Vec<RoomId> = self
            .memberships
            .get(connection)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default();
        rooms.sort();
        rooms
    }

    pub fn contains_room(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// With `unindex`, also drops `room_id` from the connection's index entry
    /// before the room guard is released.
    fn remove_member(
        &self,
        connection: ConnectionId,
        room_id: &RoomId,
        unindex: bool,
    ) -> Option<Vec<ConnectionId>> {
        let Entry::Occupied(mut room) = self.rooms.entry(room_id.clone()) else {
            return None;
        };

        if !room.get_mut().remove(&connection) {
            return None;
        }

        if unindex {
            if let Entry::Occupied(mut rooms) = self.memberships.entry(connection) {
                rooms.get_mut().remove(room_id);
                if rooms.get().is_empty() {
                    rooms.remove();
                }
            }
        }

        let remaining = room.get().members();
        if remaining.is_empty() {
            room.remove();
            info!("Room {} is empty, removing it", room_id);
        } else {
            debug!("{} left room {} ({} remain)", connection, room_id, remaining.len());
        }

        Some(remaining)
    }
}
