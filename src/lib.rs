/*! Scope, type and memory layout resolution for WGSL program trees.

The input is a [`TranslationUnit`](ast::TranslationUnit): a WGSL program
already parsed into a tree whose nodes live in [`Arena`]s and refer to each
other by [`Handle`]. Nothing here parses text.

[`resolve`] walks that tree and produces a frozen
[`ResolvedEnvironment`]: the type of every expression and assignable
expression, and the [`Scope`] visible before every statement and at the end
of every block. Module-scope declarations may appear in any order; they are
resolved in dependency order.

The [`buffer`] module converts between raw uniform buffer bytes and literal
expression trees of a given host-shareable [`Type`](types::Type), following
the memory layout computed by [`proc::align_of`] and friends.

Errors are reported as values: the first malformed construct aborts the
resolution with an [`Error`] naming it.
!*/

#![allow(
    renamed_and_removed_lints,
    unknown_lints,
    clippy::new_without_default,
    clippy::match_like_matches_macro,
    clippy::unknown_clippy_lints
)]
#![warn(
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_qualifications
)]
#![deny(clippy::panic)]

mod arena;
pub mod ast;
pub mod buffer;
pub mod proc;
pub mod resolve;
mod to_wgsl;
pub mod types;

pub use crate::arena::{Arena, Handle, HandleVec};
pub use crate::resolve::{
    resolve, Capabilities, Error, Options, ResolvedEnvironment, Resolver, Scope, ScopeEntry,
};

use std::{
    collections::HashMap,
    hash::BuildHasherDefault,
};

#[cfg(feature = "deserialize")]
use serde::Deserialize;
#[cfg(feature = "serialize")]
use serde::Serialize;

/// Hash map that is faster but not resilient to DoS attacks.
pub type FastHashMap<K, T> = HashMap<K, T, BuildHasherDefault<fxhash::FxHasher>>;
/// Insertion-order-preserving hash map, with the same hasher as [`FastHashMap`].
pub type FastIndexMap<K, V> = indexmap::IndexMap<K, V, BuildHasherDefault<fxhash::FxHasher>>;
/// Insertion-order-preserving hash set, with the same hasher as [`FastHashMap`].
pub type FastIndexSet<K> = indexmap::IndexSet<K, BuildHasherDefault<fxhash::FxHasher>>;

/// Pipeline binding information for module-scope resources.
#[derive(Clone, Copy, Debug, Hash, Eq, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub struct ResourceBinding {
    /// The bind group index.
    pub group: u32,
    /// Binding number within the group.
    pub binding: u32,
}
