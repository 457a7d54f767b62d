//! Deterministic request source

use crate::error::{LoadError, LoadResult};
use crate::rng::Mt19937;
use salvo_config::LoadConfig;
use std::fmt;

/// One endpoint of the catalog, `host:port/path`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target(String);

impl Target {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self(endpoint.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The endpoint as an absolute URL, defaulting to plain HTTP
    pub fn url(&self) -> String {
        if self.0.contains("://") {
            self.0.clone()
        } else {
            format!("http://{}", self.0)
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fixed, non-empty, ordered set of targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    targets: Vec<Target>,
}

impl Catalog {
    pub fn new(targets: Vec<Target>) -> LoadResult<Self> {
        if targets.is_empty() {
            return Err(LoadError::InvalidStream("catalog is empty".to_string()));
        }
        Ok(Self { targets })
    }

    pub fn from_config(config: &LoadConfig) -> LoadResult<Self> {
        Self::new(config.targets().into_iter().map(Target::new).collect())
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Target> {
        self.targets.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter()
    }
}

/// Seeded, infinite stream of catalog targets.
///
/// Each draw takes a uniform integer in `[0, limit)` and reduces it modulo
/// the catalog size. The reduction is slightly biased unless the catalog
/// size divides `limit`; the bias is kept so sequences stay identical to
/// historical runs. The stream cannot be rewound, only restarted.
#[derive(Debug, Clone)]
pub struct RequestStream {
    catalog: Catalog,
    seed: u64,
    limit: u32,
    rng: Mt19937,
    draws: u64,
}

impl RequestStream {
    pub fn new(catalog: Catalog, seed: u64, limit: u64) -> LoadResult<Self> {
        if limit <= catalog.len() as u64 {
            return Err(LoadError::InvalidStream(format!(
                "limit {} must be larger than the catalog size {}",
                limit,
                catalog.len()
            )));
        }
        let limit = u32::try_from(limit)
            .map_err(|_| LoadError::InvalidStream(format!("limit {} does not fit in 32 bits", limit)))?;

        Ok(Self {
            catalog,
            seed,
            limit,
            rng: Mt19937::from_python_seed(seed),
            draws: 0,
        })
    }

    pub fn from_config(config: &LoadConfig) -> LoadResult<Self> {
        Self::new(Catalog::from_config(config)?, config.seed, config.random_limit)
    }

    /// Catalog index of the next draw
    pub fn next_index(&mut self) -> usize {
        let raw = self.rng.below(self.limit);
        self.draws += 1;
        raw as usize % self.catalog.len()
    }

    /// Start over from the seed
    pub fn restart(&mut self) {
        self.rng = Mt19937::from_python_seed(self.seed);
        self.draws = 0;
    }

    pub fn draws(&self) -> u64 {
        self.draws
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

impl Iterator for RequestStream {
    type Item = Target;

    fn next(&mut self) -> Option<Target> {
        let index = self.next_index();
        self.catalog.get(index).cloned()
    }
}
