use glam::Vec2;
use rand::Rng;

use crate::particle::{self, Particle};

/// Unordered collection of live particles.
///
/// Retirement is two-phase: [`ParticleStore::tick`] records which slots
/// retired and [`ParticleStore::compact`] removes them, so drawing in
/// between still sees every particle of this frame.
pub struct ParticleStore {
    particles: Vec<Particle>,
    retired: Vec<usize>,
    max_particles: Option<usize>,
}

impl ParticleStore {
    pub fn new(max_particles: Option<usize>) -> Self {
        Self {
            particles: Vec::new(),
            retired: Vec::new(),
            max_particles,
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.max_particles
            .is_some_and(|max| self.particles.len() >= max)
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.retired.clear();
    }

    /// Returns `false` when the ceiling dropped the spawn.
    pub fn spawn<R: Rng + ?Sized>(&mut self, position: Vec2, rng: &mut R) -> bool {
        if self.is_full() {
            return false;
        }
        self.particles.push(Particle::sample(position, rng));
        true
    }

    #[cfg(test)]
    pub(crate) fn insert(&mut self, particle: Particle) {
        self.particles.push(particle);
    }

    /// Advances every particle and records the ones that retired.
    pub fn tick(&mut self) {
        self.retired.clear();
        for (index, particle) in self.particles.iter_mut().enumerate() {
            particle::advance(particle);
            if particle::is_retired(particle) {
                self.retired.push(index);
            }
        }
    }

    pub fn for_each_visible<F: FnMut(&Particle)>(&self, mut draw: F) {
        for particle in &self.particles {
            draw(particle);
        }
    }

    /// Removes everything the last tick retired, back to front so each
    /// `swap_remove` only pulls in a survivor.
    pub fn compact(&mut self) -> usize {
        let removed = self.retired.len();
        while let Some(index) = self.retired.pop() {
            self.particles.swap_remove(index);
        }
        removed
    }
}
