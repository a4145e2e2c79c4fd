//! Dependency ordering.
//!
//! [`topological_sort`] orders items so each one comes after every item it links
//! to. The walk is an iterative depth-first search over an explicit
//! `(node, next_link)` stack, so deep inheritance chains cannot overflow the call
//! stack.
//!
//! # Example
//!
//! ```
//! use interop_generator::sort::{CyclePolicy, topological_sort};
//!
//! // (name, parent)
//! let items = vec![("Derived", Some("Base")), ("Base", None)];
//! let sorted = topological_sort(
//!     items,
//!     |item| item.0,
//!     |item| item.1.is_some() as usize,
//!     |item, _| item.1,
//!     |_| CyclePolicy::Abort,
//! )
//! .unwrap();
//! assert_eq!(sorted[0].0, "Base");
//! ```

use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::FxHashMap;
use thiserror::Error;

/// What to do when a cycle is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePolicy {
    /// Ignore the closing edge and keep going.
    Continue,
    /// Stop and report the cycle.
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SortError<K: Debug> {
    #[error("cycle between {participants:?}")]
    Cycle { participants: Vec<K> },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    Unvisited,
    OnStack,
    Done,
}

/// Order `items` so that each item follows the items it links to.
///
/// - `key` identifies an item; links name keys.
/// - `link_count` and `link_at` enumerate an item's links. A link may be `None`
///   or name a key outside `items`; both are ignored.
/// - `on_cycle` is called once per closing edge with the participants, from the
///   linked item to the one that closed the cycle.
///
/// Items with no ordering constraint between them keep their input order.
pub fn topological_sort<T, K, FK, FC, FL, FY>(
    items: Vec<T>,
    key: FK,
    link_count: FC,
    link_at: FL,
    mut on_cycle: FY,
) -> Result<Vec<T>, SortError<K>>
where
    K: Eq + Hash + Clone + Debug,
    FK: Fn(&T) -> K,
    FC: Fn(&T) -> usize,
    FL: Fn(&T, usize) -> Option<K>,
    FY: FnMut(&[K]) -> CyclePolicy,
{
    let index: FxHashMap<K, usize> = items
        .iter()
        .enumerate()
        .map(|(i, item)| (key(item), i))
        .collect();

    let mut color = vec![Color::Unvisited; items.len()];
    let mut order = Vec::with_capacity(items.len());
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..items.len() {
        if color[root] != Color::Unvisited {
            continue;
        }
        color[root] = Color::OnStack;
        stack.push((root, 0));

        while let Some(top) = stack.last_mut() {
            let (node, next) = *top;
            let item = &items[node];

            if next >= link_count(item) {
                color[node] = Color::Done;
                order.push(node);
                stack.pop();
                continue;
            }
            top.1 += 1;

            let Some(child) = link_at(item, next).and_then(|k| index.get(&k).copied()) else {
                continue;
            };

            match color[child] {
                Color::Unvisited => {
                    color[child] = Color::OnStack;
                    stack.push((child, 0));
                }
                Color::OnStack => {
                    let start = stack.iter().position(|(n, _)| *n == child).unwrap_or(0);
                    let participants: Vec<K> =
                        stack[start..].iter().map(|(n, _)| key(&items[*n])).collect();
                    if on_cycle(&participants) == CyclePolicy::Abort {
                        return Err(SortError::Cycle { participants });
                    }
                }
                Color::Done => {}
            }
        }
    }

    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    Ok(order.into_iter().filter_map(|i| slots[i].take()).collect())
}
