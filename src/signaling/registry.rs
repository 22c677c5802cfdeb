use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

use super::room::Room;
use crate::config::SignalingConfig;

/// Process-wide map of room id to live room.
///
/// Lock order is registry before room. A room is only removed after it has
/// marked itself closed, so a joiner that raced the removal sees
/// `RoomClosed` and comes back here for a fresh instance.
pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, Arc<Room>>>,
    config: SignalingConfig,
}

impl RoomRegistry {
    pub fn new(config: SignalingConfig) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Room>>> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the live room for `room_id`, creating it on first use.
    /// Concurrent callers always get the same instance.
    pub fn get_or_create(&self, room_id: &str) -> Arc<Room> {
        let mut rooms = self.lock();
        if let Some(room) = rooms.get(room_id) {
            if !room.is_closed() {
                return Arc::clone(room);
            }
        }

        let room = Arc::new(Room::new(
            room_id.to_string(),
            self.config.max_room_members,
            self.config.slow_consumer_policy,
        ));
        rooms.insert(room_id.to_string(), Arc::clone(&room));
        info!(room_id, room_count = rooms.len(), "Room created");
        room
    }

    /// Drops `room` from the registry if it is closed and still the
    /// registered instance for its id.
    pub fn evict_if_empty(&self, room: &Arc<Room>) -> bool {
        let mut rooms = self.lock();
        let registered = rooms
            .get(room.id())
            .is_some_and(|current| Arc::ptr_eq(current, room));

        if !registered || !room.is_closed() {
            debug!(room_id = %room.id(), "Room not evicted");
            return false;
        }

        rooms.remove(room.id());
        info!(room_id = %room.id(), room_count = rooms.len(), "Room evicted");
        true
    }

    pub fn get(&self, room_id: &str) -> Option<Arc<Room>> {
        self.lock().get(room_id).cloned()
    }

    pub fn room_count(&self) -> usize {
        self.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signaling::session::Outbound;

    fn registry() -> RoomRegistry {
        RoomRegistry::new(SignalingConfig::default())
    }

    #[test]
    fn test_get_or_create_returns_same_instance() {
        let registry = registry();
        let first = registry.get_or_create("r1");
        let second = registry.get_or_create("r1");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.room_count(), 1);
    }

    #[test]
    fn test_rooms_are_isolated_by_id() {
        let registry = registry();
        let a = registry.get_or_create("a");
        let b = registry.get_or_create("b");

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.room_count(), 2);
    }

    #[test]
    fn test_empty_room_is_evicted_and_recreated() {
        let registry = registry();
        let room = registry.get_or_create("r1");
        let (outbound, _receiver, _evict) = Outbound::channel(4);
        room.join(1, "Alice".to_string(), outbound).unwrap();

        room.leave(1);
        assert!(registry.evict_if_empty(&room));
        assert!(registry.get("r1").is_none());

        let fresh = registry.get_or_create("r1");
        assert!(!Arc::ptr_eq(&room, &fresh));
        let (outbound, _receiver, _evict) = Outbound::channel(4);
        assert_eq!(fresh.join(2, "Bob".to_string(), outbound).unwrap().peer_id, "p1");
    }

    #[test]
    fn test_occupied_room_is_not_evicted() {
        let registry = registry();
        let room = registry.get_or_create("r1");
        let (outbound, _receiver, _evict) = Outbound::channel(4);
        room.join(1, "Alice".to_string(), outbound).unwrap();

        assert!(!registry.evict_if_empty(&room));
        assert_eq!(registry.room_count(), 1);
    }

    #[test]
    fn test_stale_instance_does_not_evict_replacement() {
        let registry = registry();
        let stale = registry.get_or_create("r1");
        let (outbound, _receiver, _evict) = Outbound::channel(4);
        stale.join(1, "Alice".to_string(), outbound).unwrap();
        stale.leave(1);

        // a joiner replaced the closed room before the leaver got here
        let fresh = registry.get_or_create("r1");
        assert!(!registry.evict_if_empty(&stale));
        assert!(Arc::ptr_eq(&registry.get("r1").unwrap(), &fresh));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_get_or_create_yields_one_room() {
        let registry = Arc::new(registry());

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.get_or_create("shared") })
            })
            .collect();

        let mut rooms = Vec::new();
        for handle in handles {
            rooms.push(handle.await.unwrap());
        }

        assert!(rooms.iter().all(|room| Arc::ptr_eq(room, &rooms[0])));
        assert_eq!(registry.room_count(), 1);
    }
}
