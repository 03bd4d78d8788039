//! Weighted round-robin feed interleaver
//!
//! Combines three ranked sources with a fixed 10-slot pattern
//! (7 personal : 2 global : 1 wildcard). An exhausted source yields its slot
//! to the next non-empty source in priority order personal > global > wildcard.
//! An id already emitted is never emitted again.

use std::collections::{HashSet, VecDeque};
use uuid::Uuid;

use crate::models::EnrichedPost;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSource {
    Personal,
    Global,
    Wildcard,
}

use FeedSource::{Global as G, Personal as P, Wildcard as W};

pub const INTERLEAVE_PATTERN: [FeedSource; 10] = [P, P, P, G, P, P, P, G, P, W];

const FALLBACK_ORDER: [FeedSource; 3] = [P, G, W];

/// Anything the interleaver can deduplicate.
pub trait FeedItem {
    fn item_id(&self) -> Uuid;
}

impl FeedItem for EnrichedPost {
    fn item_id(&self) -> Uuid {
        self.id
    }
}

/// Merge pre-sorted personal, global and wildcard lists into one deduplicated feed.
pub fn interleave<T: FeedItem>(personal: Vec<T>, global: Vec<T>, wildcard: Vec<T>) -> Vec<T> {
    let mut queues = [
        VecDeque::from(personal),
        VecDeque::from(global),
        VecDeque::from(wildcard),
    ];

    let mut seen: HashSet<Uuid> = HashSet::new();
    let mut merged = Vec::with_capacity(queues.iter().map(VecDeque::len).sum());

    for slot in INTERLEAVE_PATTERN.iter().cycle() {
        let Some(source) = pick_source(*slot, &queues) else {
            break;
        };

        if let Some(item) = queues[queue_index(source)].pop_front() {
            if seen.insert(item.item_id()) {
                merged.push(item);
            }
        }
    }

    merged
}

fn pick_source<T>(preferred: FeedSource, queues: &[VecDeque<T>; 3]) -> Option<FeedSource> {
    if !queues[queue_index(preferred)].is_empty() {
        return Some(preferred);
    }
    FALLBACK_ORDER
        .into_iter()
        .find(|source| !queues[queue_index(*source)].is_empty())
}

fn queue_index(source: FeedSource) -> usize {
    match source {
        FeedSource::Personal => 0,
        FeedSource::Global => 1,
        FeedSource::Wildcard => 2,
    }
}
