//! Typed indices and the arena vectors they point into.
//!
//! Every pool (vertices, normals, colors, bones...) gets its own index type
//! so a normal index can never be used against the vertex pool.

use std::fmt;
use std::marker::PhantomData;

use crate::error::{DataError, Result};

/// Newtype index into one kind of pool
pub trait ArenaIndex: Copy + Eq + std::hash::Hash + fmt::Debug {
    /// Human readable pool name for error messages
    const KIND: &'static str;

    fn from_usize(index: usize) -> Self;
    fn index(self) -> usize;
}

macro_rules! define_index {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub u32);

        impl $name {
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            pub const fn value(self) -> u32 {
                self.0
            }
        }

        impl ArenaIndex for $name {
            const KIND: &'static str = $kind;

            fn from_usize(index: usize) -> Self {
                Self(index as u32)
            }

            fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $kind, self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }
    };
}

// Host scene
define_index!(
    /// Vertex of a host mesh
    VertexId,
    "vertex"
);
define_index!(MaterialId, "material");
define_index!(BoneId, "bone");

// File pools
define_index!(
    /// Entry of a position pool (`v` records, BMS points)
    PointIndex,
    "point"
);
define_index!(NormalIndex, "normal");
define_index!(ColorIndex, "color");
define_index!(UvIndex, "uv");
define_index!(
    /// Adjunct inside a packet or a flat adjunct list
    AdjunctIndex,
    "adjunct"
);
define_index!(
    /// Position inside a packet's matrix list
    MatrixSlot,
    "matrix slot"
);

/// Arena vector addressed by a typed index
#[derive(Clone, PartialEq)]
pub struct Pool<I, T> {
    items: Vec<T>,
    _index: PhantomData<I>,
}

impl<I, T> Default for Pool<I, T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            _index: PhantomData,
        }
    }
}

impl<I: ArenaIndex, T: fmt::Debug> fmt::Debug for Pool<I, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        age_utils::debug::trimmed_collection_fmt(&self.items, f)
    }
}

impl<I: ArenaIndex, T> Pool<I, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: T) -> I {
        let index = I::from_usize(self.items.len());
        self.items.push(item);
        index
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: I) -> Option<&T> {
        self.items.get(index.index())
    }

    pub fn get_mut(&mut self, index: I) -> Option<&mut T> {
        self.items.get_mut(index.index())
    }

    /// Like [`Pool::get`] but with an error naming the pool
    pub fn try_get(&self, index: I) -> Result<&T> {
        self.items.get(index.index()).ok_or(DataError::InvalidIndex {
            kind: I::KIND,
            index: index.index(),
            len: self.items.len(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (I::from_usize(i), item))
    }

    pub fn values(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = I> + use<I, T> {
        (0..self.items.len()).map(I::from_usize)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<I: ArenaIndex, T> From<Vec<T>> for Pool<I, T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            items,
            _index: PhantomData,
        }
    }
}

impl<I: ArenaIndex, T> FromIterator<T> for Pool<I, T> {
    fn from_iter<It: IntoIterator<Item = T>>(iter: It) -> Self {
        Vec::from_iter(iter).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_returns_sequential_ids() {
        let mut pool: Pool<VertexId, &str> = Pool::new();
        assert_eq!(pool.push("a"), VertexId(0));
        assert_eq!(pool.push("b"), VertexId(1));
        assert_eq!(pool.get(VertexId(1)), Some(&"b"));
        assert_eq!(pool.ids().collect::<Vec<_>>(), vec![VertexId(0), VertexId(1)]);
    }

    #[test]
    fn try_get_names_the_pool() {
        let pool: Pool<NormalIndex, f32> = vec![1.0].into();
        let err = pool.try_get(NormalIndex(4)).unwrap_err();
        assert_eq!(err.to_string(), "Invalid normal index 4 (pool holds 1)");
    }
}
