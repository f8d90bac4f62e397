/*! The [`Arena`], [`Handle`] and [`HandleVec`] types.

Every node of a program tree lives in an [`Arena`] and is referred to by a
[`Handle`], which is just a wrapper around an integer index. Two nodes that
are structurally identical but were appended separately get distinct handles,
so handles are what the resolver uses to key its per-node side tables.
*/

use std::{cmp::Ordering, convert::TryFrom, fmt, hash, marker::PhantomData, num::NonZeroU32, ops};

/// One past the position of a node in its arena, so that
/// `Option<Handle<T>>` costs nothing extra.
type Index = NonZeroU32;

/// A strongly typed reference to a tree node.
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "deserialize", derive(serde::Deserialize))]
#[cfg_attr(
    any(feature = "serialize", feature = "deserialize"),
    serde(transparent)
)]
pub struct Handle<T> {
    index: Index,
    #[cfg_attr(any(feature = "serialize", feature = "deserialize"), serde(skip))]
    marker: PhantomData<T>,
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Handle<T> {}
impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}
impl<T> Eq for Handle<T> {}
impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index.cmp(&other.index)
    }
}
impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "[{}]", self.index())
    }
}
impl<T> hash::Hash for Handle<T> {
    fn hash<H: hash::Hasher>(&self, hasher: &mut H) {
        self.index.hash(hasher)
    }
}

impl<T> Handle<T> {
    const fn new(index: Index) -> Self {
        Handle {
            index,
            marker: PhantomData,
        }
    }

    /// Position of the node in its arena, counting from zero.
    pub const fn index(self) -> usize {
        (self.index.get() - 1) as usize
    }

    fn from_usize(index: usize) -> Self {
        let position = u32::try_from(index + 1)
            .ok()
            .and_then(Index::new)
            .expect("Failed to insert into arena. Handle overflows");
        Handle::new(position)
    }
}

/// Storage for one kind of tree node.
///
/// Nodes are only ever appended; the returned [`Handle`] stays valid for the
/// life of the arena and indexes it directly.
#[derive(Clone)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "serialize", serde(transparent))]
pub struct Arena<T> {
    data: Vec<T>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<T> Arena<T> {
    pub const fn new() -> Self {
        Arena { data: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Nodes in the order they were appended, with their handles.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (Handle<T>, &T)> {
        self.data
            .iter()
            .enumerate()
            .map(|(i, v)| (Handle::from_usize(i), v))
    }

    pub fn append(&mut self, value: T) -> Handle<T> {
        let index = self.data.len();
        self.data.push(value);
        Handle::from_usize(index)
    }
}

impl<T> ops::Index<Handle<T>> for Arena<T> {
    type Output = T;
    fn index(&self, handle: Handle<T>) -> &T {
        &self.data[handle.index()]
    }
}

/// A sparse side table indexed by [`Handle`]s.
///
/// A `HandleVec<T, U>` associates at most one `U` with each `Handle<T>`.
/// Unlike an [`Arena`], entries may be filled in any order, which is what
/// a post-order walk over a tree needs: children are appended to their arena
/// before their parents, but finish resolving in whatever order the walk
/// reaches them.
#[derive(Clone, Debug)]
pub struct HandleVec<T, U> {
    inner: Vec<Option<U>>,
    as_keys: PhantomData<T>,
}

impl<T, U> Default for HandleVec<T, U> {
    fn default() -> Self {
        Self {
            inner: Vec::new(),
            as_keys: PhantomData,
        }
    }
}

impl<T, U> HandleVec<T, U> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Vec::with_capacity(capacity),
            as_keys: PhantomData,
        }
    }

    /// Insert a mapping from `handle` to `value`.
    ///
    /// Returns the previous value, if `handle` already had one.
    pub fn insert(&mut self, handle: Handle<T>, value: U) -> Option<U> {
        let index = handle.index();
        if index >= self.inner.len() {
            self.inner.resize_with(index + 1, || None);
        }
        self.inner[index].replace(value)
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&U> {
        self.inner.get(handle.index()).and_then(Option::as_ref)
    }

    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.get(handle).is_some()
    }

    /// Number of handles that have a value.
    pub fn count(&self) -> usize {
        self.inner.iter().filter(|slot| slot.is_some()).count()
    }

    /// Iterate over the filled entries in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &U)> {
        self.inner
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|value| (Handle::from_usize(i), value)))
    }
}

impl<T, U> ops::Index<Handle<T>> for HandleVec<T, U> {
    type Output = U;

    fn index(&self, handle: Handle<T>) -> &Self::Output {
        self.get(handle).expect("no entry recorded for handle")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_nodes_get_distinct_handles() {
        let mut literals: Arena<i64> = Arena::new();
        let first = literals.append(1);
        let second = literals.append(1);
        assert_ne!(first, second);
        assert_eq!(literals[first], literals[second]);
        assert_eq!((first.index(), second.index()), (0, 1));
        assert_eq!(format!("{:?}", second), "[1]");
    }

    #[test]
    fn iteration_follows_appends() {
        let mut names: Arena<&str> = Arena::new();
        assert!(names.is_empty());
        let a = names.append("a");
        let b = names.append("b");
        let seen: Vec<_> = names.iter().collect();
        assert_eq!(seen, vec![(a, &"a"), (b, &"b")]);
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn handle_vec_out_of_order() {
        let mut arena: Arena<u8> = Arena::new();
        let a = arena.append(0);
        let b = arena.append(1);
        let c = arena.append(2);

        let mut side: HandleVec<u8, &str> = HandleVec::default();
        assert_eq!(side.insert(c, "c"), None);
        assert_eq!(side.insert(a, "a"), None);
        assert!(!side.contains(b));
        assert_eq!(side.count(), 2);
        assert_eq!(side[c], "c");
        assert_eq!(side.insert(a, "again"), Some("a"));
        let keys: Vec<_> = side.iter().map(|(h, _)| h).collect();
        assert_eq!(keys, vec![a, c]);
    }
}
