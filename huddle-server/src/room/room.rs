use huddle_core::ConnectionId;
use std::collections::HashSet;

/// Member set of one room. Owned by [`RoomManager`](crate::RoomManager), which
/// deletes the room as soon as the set becomes empty.
#[derive(Debug, Default)]
pub struct Room {
    members: HashSet<ConnectionId>,
}

impl Room {
    /// Returns `false` if the connection was already a member.
    pub fn insert(&mut self, connection: ConnectionId) -> bool {
        self.members.insert(connection)
    }

    pub fn remove(&mut self, connection: &ConnectionId) -> bool {
        self.members.remove(connection)
    }

    /// All members, sorted so repeated calls agree on order.
    pub fn members(&self) -> Vec<ConnectionId> {
        let mut members: Vec<_> = self.members.iter().copied().collect();
        members.sort();
        members
    }

    pub fn others(&self, connection: &ConnectionId) -> Vec<ConnectionId> {
        let mut others = self.members();
        others.retain(|member| member != connection);
        others
    }
}
