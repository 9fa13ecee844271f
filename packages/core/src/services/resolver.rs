//! Reference Resolver
//!
//! Turns the query of an open `[[` span into a ranked candidate list plus a
//! "create new note" offer. Resolution never fails from the caller's point of
//! view: a broken search degrades to the create-only option.
//!
//! # Ranking
//!
//! For a non-empty query, matches are grouped into tiers:
//!
//! 1. title starts with the query
//! 2. title contains the query
//! 3. content (raw or markdown-stripped) contains the query
//!
//! Within a tier the most recently updated note comes first, then title.
//! Matching is case-insensitive. An empty query lists the most recently created
//! notes instead and does not offer creation.

use crate::config::EngineConfig;
use crate::db::NoteStore;
use crate::models::{Note, NoteSummary, ValidationError};
use crate::services::{LinkError, LinkResult};
use crate::utils::{slugify, strip_markdown, suffixed_slug};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Duration;

/// How many raw matches to pull per store search for each displayed candidate
///
/// Stores return matches by recency, so a small window could hide older
/// prefix matches behind newer substring matches.
const CANDIDATE_POOL_FACTOR: usize = 5;

/// Result of resolving one query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidates {
    pub existing: Vec<NoteSummary>,
    pub offer_create: bool,
}

impl Candidates {
    /// Only the "create new note" option
    pub fn create_only() -> Self {
        Self {
            existing: Vec::new(),
            offer_create: true,
        }
    }
}

/// What the user picked from the candidate list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Selection {
    /// Link to a note that already exists
    Existing { note: NoteSummary },
    /// Create a note titled after the query, then link to it
    CreateNew { title: String },
}

/// Searches an owner's notes for reference candidates
#[derive(Clone)]
pub struct ReferenceResolver {
    notes: Arc<dyn NoteStore>,
    search_limit: usize,
    recent_limit: usize,
}

impl ReferenceResolver {
    pub fn new(notes: Arc<dyn NoteStore>, config: &EngineConfig) -> Self {
        Self {
            notes,
            search_limit: config.search_limit,
            recent_limit: config.recent_limit,
        }
    }

    /// Resolve `query` for `owner_id`, never listing `exclude_note_id`
    pub async fn resolve(
        &self,
        owner_id: &str,
        query: &str,
        exclude_note_id: Option<&str>,
    ) -> Candidates {
        let query = query.trim();

        if query.is_empty() {
            return match self.recent(owner_id, exclude_note_id).await {
                Ok(existing) => Candidates {
                    existing,
                    offer_create: false,
                },
                Err(e) => {
                    tracing::warn!("Recent notes lookup failed for {}: {}", owner_id, e);
                    Candidates::default()
                }
            };
        }

        match self.ranked(owner_id, query, exclude_note_id).await {
            Ok(existing) => Candidates {
                existing,
                offer_create: true,
            },
            Err(e) => {
                tracing::warn!(
                    "Reference search for '{}' failed, offering create only: {}",
                    query,
                    e
                );
                Candidates::create_only()
            }
        }
    }

    async fn recent(
        &self,
        owner_id: &str,
        exclude_note_id: Option<&str>,
    ) -> LinkResult<Vec<NoteSummary>> {
        let notes = self
            .notes
            .recent_notes(owner_id, self.recent_limit + 1)
            .await?;
        Ok(notes
            .iter()
            .filter(|n| Some(n.id.as_str()) != exclude_note_id)
            .take(self.recent_limit)
            .map(Note::summary)
            .collect())
    }

    async fn ranked(
        &self,
        owner_id: &str,
        query: &str,
        exclude_note_id: Option<&str>,
    ) -> LinkResult<Vec<NoteSummary>> {
        let pool = self.search_limit.saturating_mul(CANDIDATE_POOL_FACTOR) + 1;
        let needle = query.to_lowercase();

        let by_title = self
            .notes
            .search_notes_by_title(owner_id, query, pool)
            .await?;
        let by_content = self
            .notes
            .search_notes_by_content(owner_id, query, pool)
            .await?;

        let mut seen: HashSet<String> = HashSet::new();
        if let Some(id) = exclude_note_id {
            seen.insert(id.to_string());
        }

        let mut prefix = Vec::new();
        let mut anywhere = Vec::new();
        for note in by_title {
            if !seen.insert(note.id.clone()) {
                continue;
            }
            let title = note.title.to_lowercase();
            if title.starts_with(&needle) {
                prefix.push(note);
            } else if title.contains(&needle) {
                anywhere.push(note);
            }
        }

        let mut content = Vec::new();
        for note in by_content {
            if seen.contains(&note.id) {
                continue;
            }
            let matches = note.content.to_lowercase().contains(&needle)
                || strip_markdown(&note.content).to_lowercase().contains(&needle);
            if matches {
                seen.insert(note.id.clone());
                content.push(note);
            }
        }

        let mut ranked = Vec::with_capacity(self.search_limit);
        for mut tier in [prefix, anywhere, content] {
            tier.sort_by(by_recency_then_title);
            ranked.extend(tier.iter().map(Note::summary));
            if ranked.len() >= self.search_limit {
                break;
            }
        }
        ranked.truncate(self.search_limit);

        tracing::debug!(
            "Resolved '{}' to {} candidate(s) for {}",
            query,
            ranked.len(),
            owner_id
        );
        Ok(ranked)
    }

    /// Pick a slug for `title` that no note of `owner_id` uses yet
    ///
    /// Collisions get a numeric suffix: `roadmap`, `roadmap-2`, `roadmap-3`...
    pub async fn unique_slug(&self, owner_id: &str, title: &str) -> LinkResult<String> {
        let base = slugify(title);
        let mut n = 1;
        loop {
            let candidate = suffixed_slug(&base, n);
            if !self.notes.slug_exists(owner_id, &candidate).await? {
                return Ok(candidate);
            }
            n += 1;
        }
    }

    /// Create the note behind a `CreateNew` selection
    ///
    /// The title is the trimmed query; content starts empty.
    pub async fn create_note_for(&self, owner_id: &str, title: &str) -> LinkResult<Note> {
        let title = title.trim();
        if title.is_empty() {
            return Err(LinkError::Validation(ValidationError::EmptyTitle));
        }
        let slug = self.unique_slug(owner_id, title).await?;
        let note = self.notes.create_note(owner_id, title, &slug, "").await?;
        tracing::info!("Created note '{}' ({}) from reference", note.title, note.id);
        Ok(note)
    }
}

fn by_recency_then_title(a: &Note, b: &Note) -> Ordering {
    b.updated_at
        .cmp(&a.updated_at)
        .then_with(|| a.title.cmp(&b.title))
        .then_with(|| a.id.cmp(&b.id))
}

/// Debounced, sequence-guarded resolution for one editor
///
/// Every query change takes a new sequence number. A result is returned only
/// if no newer query (or cancel) arrived while it was waiting or searching;
/// stale results come back as `None`.
pub struct ResolverSession {
    resolver: ReferenceResolver,
    owner_id: String,
    exclude_note_id: Option<String>,
    debounce: Duration,
    latest: AtomicU64,
}

impl ResolverSession {
    pub fn new(
        resolver: ReferenceResolver,
        owner_id: impl Into<String>,
        exclude_note_id: Option<String>,
        debounce: Duration,
    ) -> Self {
        Self {
            resolver,
            owner_id: owner_id.into(),
            exclude_note_id,
            debounce,
            latest: AtomicU64::new(0),
        }
    }

    /// Handle a query change; `None` means the result was superseded
    pub async fn query_changed(&self, query: &str) -> Option<Candidates> {
        let seq = self.latest.fetch_add(1, AtomicOrdering::SeqCst) + 1;

        if !self.debounce.is_zero() {
            tokio::time::sleep(self.debounce).await;
        }
        if !self.is_current(seq) {
            tracing::debug!("Query #{} superseded during debounce", seq);
            return None;
        }

        let candidates = self
            .resolver
            .resolve(&self.owner_id, query, self.exclude_note_id.as_deref())
            .await;

        if !self.is_current(seq) {
            tracing::debug!("Discarding stale result for query #{}", seq);
            return None;
        }
        Some(candidates)
    }

    /// Invalidate every query still in flight (the span closed)
    pub fn cancel(&self) {
        self.latest.fetch_add(1, AtomicOrdering::SeqCst);
    }

    pub fn current_sequence(&self) -> u64 {
        self.latest.load(AtomicOrdering::SeqCst)
    }

    fn is_current(&self, seq: u64) -> bool {
        self.latest.load(AtomicOrdering::SeqCst) == seq
    }
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod resolver_test;
