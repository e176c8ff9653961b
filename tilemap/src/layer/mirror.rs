//! Mirror host selection.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Picks one of a layer's interchangeable hosts for each request.
///
/// Selection is uniform with no stickiness or health tracking. The random
/// source is owned by the selector so tests can seed it and get a
/// reproducible host sequence.
#[derive(Debug)]
pub struct MirrorSelector {
    rng: Mutex<StdRng>,
}

impl MirrorSelector {
    /// Creates a selector seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Creates a selector with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Picks a host, or `None` if `hosts` is empty.
    ///
    /// A single host is returned without consuming randomness.
    pub fn choose<'a>(&self, hosts: &'a [String]) -> Option<&'a str> {
        match hosts.len() {
            0 => None,
            1 => Some(hosts[0].as_str()),
            n => {
                let i = self.rng.lock().random_range(0..n);
                Some(hosts[i].as_str())
            }
        }
    }
}

impl Default for MirrorSelector {
    fn default() -> Self {
        Self::from_entropy()
    }
}
