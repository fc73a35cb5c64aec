// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! A growable free list of inactive emitters.
//!
//! Acquiring never blocks and never fails: a drained pool grows by a fixed batch. Emitters move
//! out of the pool on acquire and back in on release, so an emitter can never be both free and
//! lent out.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::emitter::{Emitter, EmitterTemplate};

/// Default number of emitters created at startup.
pub const DEFAULT_INITIAL_SIZE: usize = 10;

/// Default number of emitters added each time the pool drains.
pub const DEFAULT_GROWTH_BATCH: usize = 5;

pub struct EmitterPool {
    template: EmitterTemplate,
    growth_batch: usize,
    free: VecDeque<Emitter>,
    /// Total emitters ever created. Only increases.
    created: usize,
}

impl EmitterPool {
    /// Creates a pool with `initial_size` emitters built from the template. A zero growth batch
    /// is treated as one.
    pub fn new(template: EmitterTemplate, initial_size: usize, growth_batch: usize) -> Self {
        let mut pool = Self {
            template,
            growth_batch: growth_batch.max(1),
            free: VecDeque::with_capacity(initial_size),
            created: 0,
        };
        pool.grow(initial_size);
        pool
    }

    /// Takes an inactive emitter out of the pool and marks it active.
    pub fn acquire(&mut self) -> Emitter {
        if self.free.is_empty() {
            self.grow(self.growth_batch);
            debug!(
                created = self.created,
                batch = self.growth_batch,
                "Emitter pool drained, grew"
            );
        }

        // grow() always adds at least one emitter.
        let mut emitter = match self.free.pop_front() {
            Some(emitter) => emitter,
            None => {
                self.created += 1;
                Emitter::from_template(&self.template)
            }
        };
        emitter.activate();
        emitter
    }

    /// Resets the emitter and returns it to the free list.
    pub fn release(&mut self, mut emitter: Emitter) {
        if !emitter.is_active() {
            warn!(emitter = emitter.id(), "Releasing an emitter that was not active");
        }
        emitter.reset();
        self.free.push_back(emitter);
    }

    fn grow(&mut self, count: usize) {
        self.free.reserve(count);
        for _ in 0..count {
            self.free.push_back(Emitter::from_template(&self.template));
        }
        self.created += count;
    }

    /// Number of emitters waiting in the free list.
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Number of emitters currently lent out.
    pub fn active_count(&self) -> usize {
        self.created.saturating_sub(self.free.len())
    }

    /// Total emitters ever created.
    pub fn created(&self) -> usize {
        self.created
    }
}

impl std::fmt::Debug for EmitterPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmitterPool")
            .field("created", &self.created)
            .field("free", &self.free.len())
            .field("growth_batch", &self.growth_batch)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::Duration;

    use super::*;
    use crate::emitter::{Clip, Spatial};

    #[test]
    fn test_initial_population() {
        let pool = EmitterPool::new(EmitterTemplate::default(), DEFAULT_INITIAL_SIZE, 5);
        assert_eq!(pool.created(), 10);
        assert_eq!(pool.free_count(), 10);
        assert_eq!(pool.active_count(), 0);
    }

    #[test]
    fn test_grows_by_batch_when_drained() {
        let mut pool = EmitterPool::new(EmitterTemplate::default(), 2, DEFAULT_GROWTH_BATCH);
        let a = pool.acquire();
        let b = pool.acquire();
        assert_eq!(pool.created(), 2);
        assert_eq!(pool.free_count(), 0);

        let c = pool.acquire();
        assert!(c.is_active());
        assert_eq!(pool.created(), 7);
        assert_eq!(pool.free_count(), 4);
        assert_eq!(pool.active_count(), 3);

        let ids: HashSet<u64> = [a.id(), b.id(), c.id()].into_iter().collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_empty_pool_with_zero_batch_still_acquires() {
        let mut pool = EmitterPool::new(EmitterTemplate::default(), 0, 0);
        let emitter = pool.acquire();
        assert!(emitter.is_active());
        assert_eq!(pool.created(), 1);
    }

    #[test]
    fn test_release_resets_and_reuses() {
        let mut pool = EmitterPool::new(EmitterTemplate::default(), 1, 5);
        let mut emitter = pool.acquire();
        let id = emitter.id();
        emitter.configure(
            Clip::new("step", Duration::from_millis(200)),
            0.3,
            2.0,
            Spatial::FLAT,
        );
        pool.release(emitter);
        assert_eq!(pool.free_count(), 1);
        assert_eq!(pool.active_count(), 0);

        let emitter = pool.acquire();
        assert_eq!(emitter.id(), id);
        assert!(emitter.clip().is_none());
        assert_eq!(emitter.volume(), 1.0);
        assert_eq!(emitter.pitch(), 1.0);
        assert_eq!(pool.created(), 1);
    }

    #[test]
    fn test_conservation_over_mixed_sequence() {
        let mut pool = EmitterPool::new(EmitterTemplate::default(), 3, 2);
        let mut lent: Vec<Emitter> = Vec::new();
        let mut last_created = pool.created();

        // Acquire heavily, release every third, then drain everything back.
        for i in 0..40 {
            lent.push(pool.acquire());
            if i % 3 == 0 {
                if let Some(emitter) = lent.pop() {
                    pool.release(emitter);
                }
            }
            assert!(pool.created() >= last_created);
            last_created = pool.created();
            assert_eq!(pool.free_count() + lent.len(), pool.created());
            assert_eq!(pool.active_count(), lent.len());
        }

        let lent_ids: HashSet<u64> = lent.iter().map(|e| e.id()).collect();
        assert_eq!(lent_ids.len(), lent.len());

        for emitter in lent.drain(..) {
            pool.release(emitter);
        }
        assert_eq!(pool.free_count(), pool.created());
        assert_eq!(pool.active_count(), 0);
    }
}
