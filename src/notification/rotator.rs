//! Shuffle-bag rotation of interchangeable templates.
//!
//! Each category keeps a shuffled working copy of its source list and hands
//! out one entry at a time. When the copy runs dry it is refilled and
//! reshuffled, so every template shows up once per cycle. A refill never puts
//! the previously drawn template first, so for two or more templates the
//! same text is never returned twice in a row. Single-template categories
//! repeat by necessity.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct Pool {
    /// Indices into the source list; drawn from the back.
    queue: Vec<usize>,
    last: Option<usize>,
}

impl Pool {
    fn refill(&mut self, len: usize, rng: &mut impl Rng) {
        self.queue = (0..len).collect();
        self.queue.shuffle(rng);

        if len > 1 && self.last == self.queue.last().copied() {
            let end = len - 1;
            let other = rng.gen_range(0..end);
            self.queue.swap(other, end);
        }
    }
}

/// Per-category non-repeating template source.
#[derive(Debug)]
pub struct TemplateRotator<K> {
    sources: HashMap<K, Vec<String>>,
    pools: Mutex<HashMap<K, Pool>>,
}

impl<K> TemplateRotator<K>
where
    K: Copy + Eq + Hash + Debug,
{
    /// Creates a rotator; categories with no templates are dropped.
    pub fn new(sources: impl IntoIterator<Item = (K, Vec<String>)>) -> Self {
        let sources = sources
            .into_iter()
            .filter(|(category, templates)| {
                if templates.is_empty() {
                    warn!("Template category {:?} has no templates", category);
                }
                !templates.is_empty()
            })
            .collect();

        Self {
            sources,
            pools: Mutex::new(HashMap::new()),
        }
    }

    /// Takes the next template of `category`, refilling its pool when empty.
    ///
    /// Returns `None` for a category without templates.
    pub fn draw(&self, category: K) -> Option<&str> {
        let source = self.sources.get(&category)?;

        let index = {
            let mut pools = self.pools.lock().unwrap_or_else(PoisonError::into_inner);
            let pool = pools.entry(category).or_default();
            if pool.queue.is_empty() {
                debug!("Refilling template pool {:?} ({} entries)", category, source.len());
                pool.refill(source.len(), &mut rand::thread_rng());
            }
            let index = pool.queue.pop()?;
            pool.last = Some(index);
            index
        };

        source.get(index).map(String::as_str)
    }

    /// Number of templates configured for `category`.
    pub fn category_len(&self, category: K) -> usize {
        self.sources.get(&category).map_or(0, Vec::len)
    }
}
