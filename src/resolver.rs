// src/resolver.rs
//
// The cache-first loop shared by every provider. Sequential on purpose:
// provider usage policies allow one request at a time.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Serialize;

use crate::config::options::ResolveOptions;
use crate::error::{Failure, Result};
use crate::progress::Progress;
use crate::provider::Provider;
use crate::store::DiskCache;

/// Outcome for one query.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution<V> {
    Found(V),
    /// The provider answered and had nothing (cached as `null`).
    Absent,
    /// The lookup failed; nothing was cached.
    Failed(Failure),
}

impl<V> Resolution<V> {
    pub fn value(&self) -> Option<&V> {
        match self {
            Resolution::Found(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<V> {
        match self {
            Resolution::Found(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Resolution::Failed(_))
    }

    pub fn status(&self) -> &'static str {
        match self {
            Resolution::Found(_) => "found",
            Resolution::Absent => "absent",
            Resolution::Failed(_) => "failed",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResolveStats {
    pub cache_hits: usize,
    pub provider_calls: usize,
    pub found: usize,
    pub absent: usize,
    pub failed: usize,
}

pub struct Resolver<'a, P: Provider> {
    provider: &'a mut P,
    cache: &'a mut DiskCache<P::Output>,
    options: ResolveOptions,
    stats: ResolveStats,
    // queries sent this run; with `requery_absent` a fresh null must not be re-sent
    asked: HashSet<String>,
    failed: HashMap<String, Failure>,
}

impl<'a, P: Provider> Resolver<'a, P> {
    pub fn new(provider: &'a mut P, cache: &'a mut DiskCache<P::Output>, options: ResolveOptions) -> Self {
        Self {
            provider,
            cache,
            options,
            stats: ResolveStats::default(),
            asked: HashSet::new(),
            failed: HashMap::new(),
        }
    }

    pub fn resolve(&mut self, query: &str) -> Resolution<P::Output> {
        if let Some(failure) = self.failed.get(query) {
            self.stats.failed += 1;
            return Resolution::Failed(failure.clone());
        }

        let reuse_null = !self.options.requery_absent || self.asked.contains(query);
        match self.cache.get(query) {
            Some(Some(v)) => {
                self.stats.cache_hits += 1;
                self.stats.found += 1;
                logd!("{}: cache hit for {query:?}", self.provider.name());
                return Resolution::Found(v.clone());
            }
            Some(None) if reuse_null => {
                self.stats.cache_hits += 1;
                self.stats.absent += 1;
                logd!("{}: cached null for {query:?}", self.provider.name());
                return Resolution::Absent;
            }
            _ => {}
        }

        self.stats.provider_calls += 1;
        self.asked.insert(s!(query));
        match self.provider.search(query) {
            Ok(Some(v)) => {
                self.cache.insert(query, Some(v.clone()));
                self.stats.found += 1;
                Resolution::Found(v)
            }
            Ok(None) => {
                self.cache.insert(query, None);
                self.stats.absent += 1;
                Resolution::Absent
            }
            Err(e) => {
                logw!("{}: lookup of {query:?} failed: {e}", self.provider.name());
                let failure = Failure::from(&e);
                self.failed.insert(s!(query), failure.clone());
                self.stats.failed += 1;
                Resolution::Failed(failure)
            }
        }
    }

    /// Resolve every entity in order; one resolution per input, same order.
    pub fn resolve_all<S: AsRef<str>>(
        &mut self,
        entities: &[S],
        progress: &mut dyn Progress,
    ) -> Vec<Resolution<P::Output>> {
        progress.begin(entities.len());
        let out = entities
            .iter()
            .map(|entity| {
                let query = entity.as_ref();
                let res = self.resolve(query);
                match &res {
                    Resolution::Failed(f) => progress.item_failed(query, &f.message),
                    Resolution::Found(_) => progress.item_done(query),
                    Resolution::Absent => progress.item_done(&format!("{query} (no match)")),
                }
                res
            })
            .collect();
        progress.finish();
        out
    }

    pub fn stats(&self) -> ResolveStats {
        self.stats
    }
}

/// Load the cache at `cache_path`, resolve `entities`, write the cache back
/// once, and hand back resolutions in input order.
pub fn run_pipeline<P, S>(
    provider: &mut P,
    cache_path: &Path,
    entities: &[S],
    options: ResolveOptions,
    progress: &mut dyn Progress,
) -> Result<(Vec<Resolution<P::Output>>, ResolveStats)>
where
    P: Provider,
    S: AsRef<str>,
{
    let mut cache = DiskCache::load(cache_path);
    let (resolutions, stats) = {
        let mut resolver = Resolver::new(provider, &mut cache, options);
        let resolutions = resolver.resolve_all(entities, progress);
        (resolutions, resolver.stats())
    };
    cache.save()?;
    logf!(
        "{}: {} queries, {} cache hits, {} calls, {} found, {} absent, {} failed",
        cache_path.display(),
        entities.len(),
        stats.cache_hits,
        stats.provider_calls,
        stats.found,
        stats.absent,
        stats.failed
    );
    Ok((resolutions, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::progress::NullProgress;

    struct Echo {
        calls: usize,
    }

    impl Provider for Echo {
        type Output = String;
        fn name(&self) -> &'static str {
            "echo"
        }
        fn search(&mut self, q: &str) -> std::result::Result<Option<String>, FetchError> {
            self.calls += 1;
            match q {
                "none" => Ok(None),
                "boom" => Err(FetchError::Status { status: 500, url: s!("stub") }),
                _ => Ok(Some(q.to_uppercase())),
            }
        }
    }

    #[test]
    fn duplicates_in_one_run_cost_one_call() {
        let mut p = Echo { calls: 0 };
        let mut cache = DiskCache::empty("unused.json");
        let mut r = Resolver::new(&mut p, &mut cache, ResolveOptions::default());
        let out = r.resolve_all(&["a", "none", "boom", "a", "none", "boom"], &mut NullProgress);
        let stats = r.stats();
        assert_eq!(out[0], Resolution::Found(s!("A")));
        assert_eq!(out[3], out[0]);
        assert_eq!(out[4], Resolution::Absent);
        assert!(out[5].is_failed());
        assert_eq!(stats.provider_calls, 3);
        assert_eq!(stats.cache_hits, 2);
        assert_eq!(stats.failed, 2);
        assert_eq!(p.calls, 3);
        assert!(!cache.contains("boom"));
    }

    #[test]
    fn requery_absent_asks_again_but_once() {
        let mut p = Echo { calls: 0 };
        let mut cache = DiskCache::empty("unused.json");
        cache.insert("none", None);
        let options = ResolveOptions { requery_absent: true, ..ResolveOptions::default() };
        let mut r = Resolver::new(&mut p, &mut cache, options);
        let out = r.resolve_all(&["none", "none"], &mut NullProgress);
        assert_eq!(out, vec![Resolution::Absent, Resolution::Absent]);
        assert_eq!(p.calls, 1);
    }
}
