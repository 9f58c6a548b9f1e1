//! In-memory dataset sessions, one per uploaded file.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use media_core::filter::{self, FilterCriteria};
use media_core::ingest::{CleanedDataset, CleaningReport};
use media_core::types::MediaPost;
use media_core::MediaResult;
use media_reporting::{Analysis, AnalysisSource, ReportScope};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;
use uuid::Uuid;

/// An analysis together with the data scope it was generated over.
#[derive(Debug, Clone)]
pub struct StoredAnalysis {
    pub analysis: Analysis,
    pub scope: ReportScope,
}

#[derive(Debug)]
pub struct DatasetSession {
    pub id: Uuid,
    pub file_name: String,
    pub report: CleaningReport,
    pub posts: Vec<MediaPost>,
    pub columns: Vec<String>,
    pub filters: FilterCriteria,
    pub analyses: HashMap<AnalysisSource, StoredAnalysis>,
    pub current_source: Option<AnalysisSource>,
    pub created_at: DateTime<Utc>,
    pub last_access: DateTime<Utc>,
    access_seq: u64,
}

impl DatasetSession {
    pub fn new(file_name: String, dataset: CleanedDataset) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            file_name,
            report: dataset.report,
            posts: dataset.posts,
            columns: dataset.columns,
            filters: FilterCriteria::default(),
            analyses: HashMap::new(),
            current_source: None,
            created_at: now,
            last_access: now,
            access_seq: 0,
        }
    }

    /// Posts matching the active filters.
    pub fn filtered_posts(&self) -> MediaResult<Vec<MediaPost>> {
        filter::apply(&self.posts, &self.filters)
    }

    pub fn current_analysis(&self) -> Option<&StoredAnalysis> {
        self.current_source.and_then(|s| self.analyses.get(&s))
    }

    /// Store `analysis` and make it the one reports are built from.
    pub fn record_analysis(&mut self, stored: StoredAnalysis) {
        let source = stored.analysis.source;
        self.analyses.insert(source, stored);
        self.current_source = Some(source);
    }
}

/// Concurrent session map with least-recently-used eviction.
pub struct SessionStore {
    sessions: DashMap<Uuid, DatasetSession>,
    max_sessions: usize,
    clock: AtomicU64,
}

impl SessionStore {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            max_sessions: max_sessions.max(1),
            clock: AtomicU64::new(0),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn insert(&self, mut session: DatasetSession) -> Uuid {
        while self.sessions.len() >= self.max_sessions {
            if !self.evict_oldest() {
                break;
            }
        }
        session.access_seq = self.tick();
        let id = session.id;
        self.sessions.insert(id, session);
        metrics::gauge!("sessions.active").set(self.sessions.len() as f64);
        id
    }

    fn evict_oldest(&self) -> bool {
        let oldest = self
            .sessions
            .iter()
            .min_by_key(|entry| entry.access_seq)
            .map(|entry| *entry.key());
        match oldest {
            Some(id) => {
                self.sessions.remove(&id);
                metrics::counter!("sessions.evicted").increment(1);
                info!(dataset_id = %id, "Evicted least recently used dataset");
                true
            }
            None => false,
        }
    }

    /// Run `f` against a session, marking it as accessed. `None` when the
    /// id is unknown.
    pub fn with_session<R>(&self, id: Uuid, f: impl FnOnce(&mut DatasetSession) -> R) -> Option<R> {
        let seq = self.tick();
        let mut entry = self.sessions.get_mut(&id)?;
        entry.access_seq = seq;
        entry.last_access = Utc::now();
        Some(f(entry.value_mut()))
    }

    pub fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.remove(&id).is_some();
        metrics::gauge!("sessions.active").set(self.sessions.len() as f64);
        removed
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
