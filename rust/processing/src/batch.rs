// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fork-join runner shared by the batch entry points.

use crate::config::BatchConfig;
use crate::error::Result;

/// Map `f` over `items`, preserving order
///
/// On native targets the work runs on a dedicated pool of
/// `config.worker_threads` threads. On WASM it runs sequentially (no threads
/// available, par_iter adds overhead).
#[cfg(not(target_arch = "wasm32"))]
pub fn run<T, R, F>(items: &[T], config: &BatchConfig, f: F) -> Result<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    use rayon::prelude::*;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_threads)
        .build()?;
    Ok(pool.install(|| items.par_iter().map(&f).collect()))
}

#[cfg(target_arch = "wasm32")]
pub fn run<T, R, F>(items: &[T], _config: &BatchConfig, f: F) -> Result<Vec<R>>
where
    F: Fn(&T) -> R,
{
    Ok(items.iter().map(f).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_preserves_order() {
        let config = BatchConfig {
            worker_threads: 4,
            ..BatchConfig::default()
        };
        let items: Vec<u32> = (0..100).collect();
        let doubled = run(&items, &config, |x| x * 2).unwrap();
        assert_eq!(doubled, items.iter().map(|x| x * 2).collect::<Vec<_>>());
    }
}
