//! Fixed-capacity collections ported from the reference implementation's
//! macro-generated containers: a ring buffer, an open-addressing map keyed
//! by `PlayerId`, and a tagged free-list used for the per-tick event lists.

use crate::ids::PlayerId;

/// Fixed-capacity FIFO. Pushing past capacity aborts rather than growing or
/// silently dropping, matching the reference implementation's hard-assert
/// discipline for its circular buffers.
#[derive(Debug, Clone)]
pub struct CircularBuffer<T> {
    slots: Vec<Option<T>>,
    head: usize,
    len: usize,
}

impl<T> CircularBuffer<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        CircularBuffer {
            slots,
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    pub fn push_back(&mut self, value: T) {
        assert!(!self.is_full(), "CircularBuffer overflow");
        let idx = (self.head + self.len) % self.capacity();
        self.slots[idx] = Some(value);
        self.len += 1;
    }

    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let value = self.slots[self.head].take();
        self.head = (self.head + 1) % self.capacity();
        self.len -= 1;
        value
    }

    pub fn front(&self) -> Option<&T> {
        if self.is_empty() {
            None
        } else {
            self.slots[self.head].as_ref()
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        (0..self.len).map(move |i| {
            self.slots[(self.head + i) % self.capacity()]
                .as_ref()
                .expect("occupied slot within len")
        })
    }
}

/// Open-addressing map from `PlayerId` to `V`, linear-probed, with slot zero
/// reserved as the empty sentinel (`PlayerId` is `NonZeroU64`, so a raw `0`
/// key can never collide with a real entry).
#[derive(Debug, Clone)]
pub struct PlayerMap<V> {
    keys: Vec<u64>,
    values: Vec<Option<V>>,
    len: usize,
}

impl<V> PlayerMap<V> {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        PlayerMap {
            keys: vec![0; capacity],
            values: (0..capacity).map(|_| None).collect(),
            len: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.keys.len()
    }

    fn slot_for(&self, id: PlayerId) -> usize {
        let cap = self.capacity() as u64;
        let mut idx = (id.get() % cap) as usize;
        loop {
            if self.keys[idx] == 0 || self.keys[idx] == id.get() {
                return idx;
            }
            idx = (idx + 1) % self.capacity();
        }
    }

    pub fn insert(&mut self, id: PlayerId, value: V) -> Option<V> {
        assert!(self.len < self.capacity(), "PlayerMap overflow");
        let idx = self.slot_for(id);
        let prev = self.values[idx].take();
        if self.keys[idx] == 0 {
            self.len += 1;
        }
        self.keys[idx] = id.get();
        self.values[idx] = Some(value);
        prev
    }

    pub fn get(&self, id: PlayerId) -> Option<&V> {
        let idx = self.slot_for(id);
        if self.keys[idx] == id.get() {
            self.values[idx].as_ref()
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut V> {
        let idx = self.slot_for(id);
        if self.keys[idx] == id.get() {
            self.values[idx].as_mut()
        } else {
            None
        }
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.get(id).is_some()
    }

    /// Remove by rehashing the probe chain after the hole, so future lookups
    /// for other keys that probed past this slot still terminate correctly.
    pub fn remove(&mut self, id: PlayerId) -> Option<V> {
        let idx = self.slot_for(id);
        if self.keys[idx] != id.get() {
            return None;
        }
        let removed = self.values[idx].take();
        self.keys[idx] = 0;
        self.len -= 1;

        let cap = self.capacity();
        let mut probe = (idx + 1) % cap;
        while self.keys[probe] != 0 {
            let displaced_key = self.keys[probe];
            let displaced_value = self.values[probe].take();
            self.keys[probe] = 0;
            self.len -= 1;
            let displaced_id = PlayerId::new(displaced_key).expect("stored keys are nonzero");
            self.insert(displaced_id, displaced_value.expect("slot was occupied"));
            probe = (probe + 1) % cap;
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &V)> {
        self.keys
            .iter()
            .zip(self.values.iter())
            .filter_map(|(&k, v)| {
                if k == 0 {
                    None
                } else {
                    Some((PlayerId::new(k).expect("stored keys are nonzero"), v.as_ref().expect("occupied")))
                }
            })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (PlayerId, &mut V)> {
        self.keys
            .iter()
            .zip(self.values.iter_mut())
            .filter_map(|(&k, v)| {
                if k == 0 {
                    None
                } else {
                    Some((PlayerId::new(k).expect("stored keys are nonzero"), v.as_mut().expect("occupied")))
                }
            })
    }
}

/// Tagged free-list: a fixed-capacity `Vec<Option<T>>` with lazy removal via
/// a "remove" tag, compacted in one pass by `drain_tagged`. Mirrors the
/// reference implementation's `List`/`ListTagRemoveIndex`/`ListRemoveTaggedItems`
/// pattern used for the per-tick hitscan/nade/explosion/sound/step lists.
#[derive(Debug, Clone)]
pub struct TaggedList<T> {
    items: Vec<Option<T>>,
    removed: Vec<bool>,
}

impl<T> TaggedList<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        TaggedList {
            items: Vec::with_capacity(capacity),
            removed: Vec::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, value: T) -> usize {
        assert!(self.items.len() < self.items.capacity(), "TaggedList overflow");
        self.items.push(Some(value));
        self.removed.push(false);
        self.items.len() - 1
    }

    pub fn tag_remove(&mut self, index: usize) {
        self.removed[index] = true;
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items[index].as_ref()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items[index].as_mut()
    }

    pub fn is_tagged(&self, index: usize) -> bool {
        self.removed[index]
    }

    /// Drop all entries tagged for removal, compacting storage.
    pub fn compact(&mut self) {
        let mut keep_items = Vec::with_capacity(self.items.len());
        let mut keep_removed = Vec::with_capacity(self.items.len());
        for (item, tagged) in self.items.drain(..).zip(self.removed.drain(..)) {
            if !tagged {
                keep_items.push(item);
                keep_removed.push(false);
            }
        }
        self.items = keep_items;
        self.removed = keep_removed;
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items
            .iter()
            .zip(self.removed.iter())
            .filter_map(|(item, &tagged)| if tagged { None } else { item.as_ref() })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items
            .iter_mut()
            .zip(self.removed.iter())
            .filter_map(|(item, &tagged)| if tagged { None } else { item.as_mut() })
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.removed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(n: u64) -> PlayerId {
        PlayerId::new(n).unwrap()
    }

    #[test]
    fn circular_buffer_fifo_order() {
        let mut buf = CircularBuffer::with_capacity(3);
        buf.push_back(1);
        buf.push_back(2);
        assert_eq!(buf.pop_front(), Some(1));
        buf.push_back(3);
        buf.push_back(4);
        assert_eq!(buf.pop_front(), Some(2));
        assert_eq!(buf.pop_front(), Some(3));
        assert_eq!(buf.pop_front(), Some(4));
        assert_eq!(buf.pop_front(), None);
    }

    #[test]
    #[should_panic(expected = "overflow")]
    fn circular_buffer_aborts_on_overflow() {
        let mut buf = CircularBuffer::with_capacity(1);
        buf.push_back(1);
        buf.push_back(2);
    }

    #[test]
    fn player_map_insert_get_remove() {
        let mut map: PlayerMap<&str> = PlayerMap::with_capacity(8);
        map.insert(pid(1), "a");
        map.insert(pid(9), "b"); // collides with pid(1) mod 8
        assert_eq!(map.get(pid(1)), Some(&"a"));
        assert_eq!(map.get(pid(9)), Some(&"b"));
        assert_eq!(map.remove(pid(1)), Some("a"));
        assert_eq!(map.get(pid(1)), None);
        assert_eq!(map.get(pid(9)), Some(&"b"));
    }

    #[test]
    fn player_map_len_tracks_occupancy() {
        let mut map: PlayerMap<i32> = PlayerMap::with_capacity(4);
        map.insert(pid(1), 10);
        map.insert(pid(2), 20);
        assert_eq!(map.len(), 2);
        map.remove(pid(1));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn tagged_list_compacts_away_removed_entries() {
        let mut list: TaggedList<i32> = TaggedList::with_capacity(4);
        list.push(1);
        list.push(2);
        list.push(3);
        list.tag_remove(1);
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![1, 3]);
        list.compact();
        assert_eq!(list.len(), 2);
    }
}
