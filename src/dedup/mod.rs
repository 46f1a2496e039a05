//! Candidate de-duplication
//!
//! Candidates from every page and strategy are merged once, after the crawl.
//! The merge key is the normalized name plus the site host of the
//! organization's URL:
//! 1. Candidates with equal keys form a group
//! 2. Candidates without a URL join a same-name group that has one,
//!    preferring `.edu` hosts
//! 3. Groups on the same host whose names are near-identical are joined
//! 4. Each group collapses to its best member, with missing fields filled
//!    in from the others
//!
//! Merging a merged list returns it unchanged.

mod similarity;

pub use similarity::{normalize_name, token_similarity};

use crate::config::ExtractionConfig;
use crate::extract::OrganizationCandidate;
use crate::url::site_host;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use url::Url;

/// Merges duplicate organization candidates
#[derive(Debug, Clone)]
pub struct DeduplicationEngine {
    similarity_threshold: f64,
}

impl DeduplicationEngine {
    /// Creates an engine using `similarity-threshold` from `[extraction]`
    pub fn new(config: &ExtractionConfig) -> Self {
        Self::with_threshold(config.similarity_threshold)
    }

    /// Creates an engine with an explicit fuzzy-match threshold
    pub fn with_threshold(similarity_threshold: f64) -> Self {
        Self {
            similarity_threshold,
        }
    }

    /// Merges candidates into one entry per organization
    ///
    /// # Returns
    ///
    /// The merged list sorted by confidence (highest first), then name, then
    /// URL. Running `merge` on its own output yields the same list.
    pub fn merge(&self, candidates: Vec<OrganizationCandidate>) -> Vec<OrganizationCandidate> {
        if candidates.is_empty() {
            return candidates;
        }

        let keys: Vec<(String, String)> = candidates.iter().map(merge_key).collect();

        // 1. exact groups
        let mut groups: BTreeMap<(String, String), Vec<usize>> = BTreeMap::new();
        for (index, key) in keys.iter().enumerate() {
            groups.entry(key.clone()).or_default().push(index);
        }

        // 2. URL-less candidates join a same-name group with a host, .edu first
        let hostless: Vec<(String, String)> = groups
            .keys()
            .filter(|(_, host)| host.is_empty())
            .cloned()
            .collect();

        for key in hostless {
            let target = groups
                .iter()
                .filter(|((name, host), _)| *name == key.0 && !host.is_empty())
                .max_by(|(a_key, a), (b_key, b)| {
                    is_edu_host(&a_key.1)
                        .cmp(&is_edu_host(&b_key.1))
                        .then_with(|| {
                            best_confidence(&candidates, a)
                                .total_cmp(&best_confidence(&candidates, b))
                        })
                        .then_with(|| b_key.cmp(a_key))
                })
                .map(|(k, _)| k.clone());

            if let Some(target) = target {
                if let Some(members) = groups.remove(&key) {
                    groups.entry(target).or_default().extend(members);
                }
            }
        }

        // 3. near-identical names on the same host
        let group_keys: Vec<(String, String)> = groups.keys().cloned().collect();
        let mut sets = DisjointSet::new(group_keys.len());
        for i in 0..group_keys.len() {
            for j in (i + 1)..group_keys.len() {
                let (name_a, host_a) = &group_keys[i];
                let (name_b, host_b) = &group_keys[j];
                if !host_a.is_empty()
                    && host_a == host_b
                    && token_similarity(name_a, name_b) >= self.similarity_threshold
                {
                    sets.union(i, j);
                }
            }
        }

        let mut joined: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (i, key) in group_keys.iter().enumerate() {
            if let Some(members) = groups.get(key) {
                joined.entry(sets.find(i)).or_default().extend(members);
            }
        }

        // 4. collapse
        let mut merged: Vec<OrganizationCandidate> = joined
            .values()
            .map(|members| collapse(&candidates, members))
            .collect();

        merged.sort_by(|a, b| {
            b.confidence()
                .total_cmp(&a.confidence())
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.url.cmp(&b.url))
        });

        tracing::debug!(
            "merged {} candidate(s) into {} organization(s)",
            candidates.len(),
            merged.len()
        );

        merged
    }
}

/// Normalized name and site host of the candidate's URL
pub fn merge_key(candidate: &OrganizationCandidate) -> (String, String) {
    let host = candidate
        .url
        .as_deref()
        .and_then(|u| Url::parse(u).ok())
        .and_then(|u| site_host(&u))
        .unwrap_or_default();

    (normalize_name(&candidate.name), host)
}

fn best_confidence(candidates: &[OrganizationCandidate], members: &[usize]) -> f64 {
    members
        .iter()
        .map(|&i| candidates[i].confidence())
        .fold(0.0, f64::max)
}

/// Total order used to pick a group's representative; greater wins
fn preference(a: &OrganizationCandidate, b: &OrganizationCandidate) -> Ordering {
    a.confidence()
        .total_cmp(&b.confidence())
        .then_with(|| a.name.chars().count().cmp(&b.name.chars().count()))
        .then_with(|| a.method.rank().cmp(&b.method.rank()))
        .then_with(|| b.name.cmp(&a.name))
        .then_with(|| b.url.cmp(&a.url))
        .then_with(|| b.source_url.cmp(&a.source_url))
}

fn collapse(candidates: &[OrganizationCandidate], members: &[usize]) -> OrganizationCandidate {
    let mut ranked: Vec<&OrganizationCandidate> = members.iter().map(|&i| &candidates[i]).collect();
    ranked.sort_by(|a, b| preference(b, a));

    let mut winner = ranked[0].clone();

    if winner.url.is_none() {
        winner.url = ranked
            .iter()
            .filter_map(|c| c.url.as_ref())
            .min_by_key(|u| (!is_edu_url(u), (*u).clone()))
            .cloned();
    }

    if winner.description.is_none() {
        winner.description = ranked.iter().find_map(|c| c.description.clone());
    }

    winner
}

fn is_edu_url(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| site_host(&u))
        .is_some_and(|h| is_edu_host(&h))
}

fn is_edu_host(host: &str) -> bool {
    host.ends_with(".edu") || host.contains(".edu.")
}

/// Union-find over group indices; the smallest index is always the root
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        match ra.cmp(&rb) {
            Ordering::Less => self.parent[rb] = ra,
            Ordering::Greater => self.parent[ra] = rb,
            Ordering::Equal => {}
        }
    }
}
