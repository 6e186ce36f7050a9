// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// The generator a scheduling session samples and shuffles with.
pub type SessionRng = StdRng;

/// A generator seeded from the operating system.
pub fn session_rng() -> SessionRng {
    StdRng::from_os_rng()
}

/// A reproducible generator, for tests and replays.
pub fn seeded(seed: u64) -> SessionRng {
    StdRng::seed_from_u64(seed)
}

/// A uniform sampling key in `[0, 1)`.
pub fn random_key<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.random::<f64>()
}

pub fn shuffle<T, R: Rng + ?Sized>(v: Vec<T>, rng: &mut R) -> Vec<T> {
    let mut v = v;
    v.shuffle(rng);
    v
}
