//! Search Session — the controller behind one user's job search.
//!
//! Flow: search (page 0) → optional fit analysis → load more (offset = job
//! count) → optional fit analysis of the new page. A resume upload re-scores
//! the current job set.
//!
//! State lives behind a `parking_lot::Mutex` that is never held across an
//! `.await`. Every action locks to check guards and snapshot its inputs,
//! releases the lock while the external call runs, then re-locks to apply the
//! result. Each `search` bumps `generation`; results produced under an older
//! generation are discarded.
//!
//! The public actions run on their own task. Dropping the caller's future
//! (a client disconnect) leaves the action running to completion, so the
//! session never stays in a busy status.

pub mod handlers;
pub mod sources;
pub mod store;

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::models::job::{
    Fit, Job, JobRecommendation, JobWithRecommendation, SearchContext, SearchSource,
};
use crate::recommendation::Recommender;
use crate::resume::{read_resume_text, ResumeUpload};
use crate::search::{ensure_unique_ids, JobSearcher, ServiceError, PAGE_SIZE};
use crate::session::sources::merge_sources;

pub const RESUME_READ_FAILED: &str = "Failed to read the resume file.";
pub const RECOMMENDATIONS_FAILED: &str = "Failed to get AI recommendations.";
pub const LOAD_MORE_FAILED: &str = "Failed to load more jobs.";

/// What the session is currently waiting on. At most one request is in
/// flight per generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Searching,
    Analyzing,
    Paginating,
}

/// Serializable view of a session: everything a client renders.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub status: SessionStatus,
    pub error: Option<String>,
    pub jobs: Vec<JobWithRecommendation>,
    pub sources: Vec<SearchSource>,
    pub search: Option<SearchContext>,
    pub has_more: bool,
    pub can_load_more: bool,
    pub resume_loaded: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AnalysisOrigin {
    /// Scoring the first page of a search. Failure clears the job list.
    Search,
    /// Re-scoring after a resume upload. Failure keeps the jobs, unscored.
    Resume,
}

/// Inputs of one recommendation call over the current job set.
struct AnalysisRun {
    generation: u64,
    origin: AnalysisOrigin,
    resume: String,
    jobs: Vec<Job>,
}

struct SessionState {
    status: SessionStatus,
    error: Option<String>,
    jobs: Vec<JobWithRecommendation>,
    sources: Vec<SearchSource>,
    context: Option<SearchContext>,
    has_more: bool,
    resume: Option<String>,
    generation: u64,
    /// A resume arrived while a request was in flight; re-score once it lands.
    reanalyze: bool,
    updated_at: DateTime<Utc>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            status: SessionStatus::Idle,
            error: None,
            jobs: Vec::new(),
            sources: Vec::new(),
            context: None,
            has_more: false,
            resume: None,
            generation: 0,
            reanalyze: false,
            updated_at: Utc::now(),
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn job_ids(&self) -> HashSet<String> {
        self.jobs.iter().map(|e| e.job.id.clone()).collect()
    }

    /// Marks every job as analyzing and returns the call to make, or `None`
    /// when there is no resume or nothing to score.
    fn begin_analysis(&mut self, origin: AnalysisOrigin) -> Option<AnalysisRun> {
        self.reanalyze = false;
        let resume = self.resume.clone()?;
        if self.jobs.is_empty() {
            return None;
        }

        for entry in &mut self.jobs {
            entry.fit = Fit::analyzing();
        }
        self.status = SessionStatus::Analyzing;
        self.touch();

        Some(AnalysisRun {
            generation: self.generation,
            origin,
            resume,
            jobs: self.jobs.iter().map(|e| e.job.clone()).collect(),
        })
    }

    fn take_reanalysis(&mut self) -> Option<AnalysisRun> {
        if self.reanalyze {
            self.begin_analysis(AnalysisOrigin::Resume)
        } else {
            None
        }
    }

    /// Ends the in-flight request with a user-facing error.
    fn finish_with_error(&mut self, message: impl Into<String>) -> Option<AnalysisRun> {
        self.status = SessionStatus::Idle;
        self.error = Some(message.into());
        self.touch();
        self.take_reanalysis()
    }

    fn can_load_more(&self) -> bool {
        self.status == SessionStatus::Idle && self.has_more && self.context.is_some()
    }
}

/// Outcome of the fetch step of `load_more`.
enum PageFetched {
    Stale,
    Failed(Option<AnalysisRun>),
    Ready {
        jobs: Vec<Job>,
        resume: Option<String>,
    },
}

/// Controller for one job search session.
pub struct SearchSession {
    id: Uuid,
    searcher: Arc<dyn JobSearcher>,
    recommender: Arc<dyn Recommender>,
    state: Mutex<SessionState>,
}

impl SearchSession {
    pub fn new(searcher: Arc<dyn JobSearcher>, recommender: Arc<dyn Recommender>) -> Self {
        Self {
            id: Uuid::new_v4(),
            searcher,
            recommender,
            state: Mutex::new(SessionState::new()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let st = self.state.lock();
        self.snapshot_of(&st)
    }

    fn snapshot_of(&self, st: &SessionState) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            status: st.status,
            error: st.error.clone(),
            jobs: st.jobs.clone(),
            sources: st.sources.clone(),
            search: st.context.clone(),
            has_more: st.has_more,
            can_load_more: st.can_load_more(),
            resume_loaded: st.resume.is_some(),
            updated_at: st.updated_at,
        }
    }

    /// Time of the last state change, or `None` while a request is in flight.
    pub fn idle_since(&self) -> Option<DateTime<Utc>> {
        let st = self.state.lock();
        (st.status == SessionStatus::Idle).then_some(st.updated_at)
    }

    /// Starts a new search, replacing all list state. A no-op when both
    /// `query` and `location` are blank.
    pub async fn search(self: &Arc<Self>, query: &str, location: &str) -> SessionSnapshot {
        let session = Arc::clone(self);
        let (query, location) = (query.to_string(), location.to_string());
        self.detached(async move { session.run_search(&query, &location).await })
            .await
    }

    /// Loads a resume. When jobs are present they are re-scored against it.
    pub async fn upload_resume(self: &Arc<Self>, upload: ResumeUpload) -> SessionSnapshot {
        let session = Arc::clone(self);
        self.detached(async move { session.run_upload_resume(upload).await })
            .await
    }

    /// Fetches the next page at offset = current job count and appends it.
    /// A no-op unless the session is idle with more pages believed to exist.
    pub async fn load_more(self: &Arc<Self>) -> SessionSnapshot {
        let session = Arc::clone(self);
        self.detached(async move { session.run_load_more().await })
            .await
    }

    async fn detached<F>(&self, action: F) -> SessionSnapshot
    where
        F: Future<Output = SessionSnapshot> + Send + 'static,
    {
        match tokio::spawn(action).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("Session {}: action task failed: {}", self.id, e);
                self.snapshot()
            }
        }
    }

    async fn run_search(&self, query: &str, location: &str) -> SessionSnapshot {
        let query = query.trim();
        let location = location.trim();
        if query.is_empty() && location.is_empty() {
            debug!("Session {}: empty search ignored", self.id);
            return self.snapshot();
        }

        let generation = {
            let mut st = self.state.lock();
            st.generation += 1;
            st.jobs.clear();
            st.sources.clear();
            st.has_more = false;
            st.error = None;
            st.reanalyze = false;
            st.context = Some(SearchContext {
                query: query.to_string(),
                location: location.to_string(),
            });
            st.status = SessionStatus::Searching;
            st.touch();
            st.generation
        };
        info!(
            "Session {}: searching '{}' in '{}' (generation {})",
            self.id, query, location, generation
        );

        let result = self.searcher.search_jobs(query, location, 0).await;

        let run = {
            let mut st = self.state.lock();
            if st.generation != generation {
                debug!(
                    "Session {}: discarding stale search result (generation {})",
                    self.id, generation
                );
                return self.snapshot_of(&st);
            }

            match result {
                Ok(page) => {
                    let mut jobs = page.jobs;
                    ensure_unique_ids(&mut jobs, &HashSet::new());
                    st.has_more = jobs.len() == PAGE_SIZE;
                    let added = merge_sources(&mut st.sources, page.sources);
                    debug!("Session {}: {} distinct sources on page 0", self.id, added);
                    st.jobs = jobs.into_iter().map(JobWithRecommendation::unscored).collect();
                    st.status = SessionStatus::Idle;
                    st.touch();
                    info!(
                        "Session {}: {} jobs, {} sources, has_more={}",
                        self.id,
                        st.jobs.len(),
                        st.sources.len(),
                        st.has_more
                    );
                    st.begin_analysis(AnalysisOrigin::Search)
                }
                Err(e) => {
                    warn!("Session {}: search failed: {}", self.id, e);
                    st.jobs.clear();
                    st.finish_with_error(format!("Failed to fetch jobs: {e}"))
                }
            }
        };

        self.follow_up(run).await
    }

    async fn run_upload_resume(&self, upload: ResumeUpload) -> SessionSnapshot {
        let text = match read_resume_text(upload).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Session {}: resume read failed: {}", self.id, e);
                let mut st = self.state.lock();
                st.error = Some(RESUME_READ_FAILED.to_string());
                st.touch();
                return self.snapshot_of(&st);
            }
        };

        let run = {
            let mut st = self.state.lock();
            info!(
                "Session {}: resume loaded ({} chars), {} jobs to re-score",
                self.id,
                text.chars().count(),
                st.jobs.len()
            );
            st.resume = Some(text);
            st.error = None;
            st.touch();
            match st.status {
                SessionStatus::Idle => st.begin_analysis(AnalysisOrigin::Resume),
                // The pending search reads the resume when its page arrives.
                SessionStatus::Searching => None,
                SessionStatus::Analyzing | SessionStatus::Paginating => {
                    st.reanalyze = true;
                    None
                }
            }
        };

        self.follow_up(run).await
    }

    async fn run_load_more(&self) -> SessionSnapshot {
        let (generation, context, offset) = {
            let mut st = self.state.lock();
            let context = match (&st.context, st.can_load_more()) {
                (Some(context), true) => context.clone(),
                _ => {
                    debug!(
                        "Session {}: load more ignored (status={:?}, has_more={})",
                        self.id, st.status, st.has_more
                    );
                    return self.snapshot_of(&st);
                }
            };
            st.status = SessionStatus::Paginating;
            st.error = None;
            st.touch();
            (st.generation, context, st.jobs.len())
        };
        info!("Session {}: loading more at offset {}", self.id, offset);

        let result = self
            .searcher
            .search_jobs(&context.query, &context.location, offset)
            .await;

        let fetched = {
            let mut st = self.state.lock();
            if st.generation != generation {
                PageFetched::Stale
            } else {
                match result {
                    Ok(page) => {
                        let added = merge_sources(&mut st.sources, page.sources);
                        debug!(
                            "Session {}: {} new sources at offset {}",
                            self.id, added, offset
                        );
                        st.touch();
                        let mut jobs = page.jobs;
                        ensure_unique_ids(&mut jobs, &st.job_ids());
                        PageFetched::Ready {
                            jobs,
                            resume: st.resume.clone(),
                        }
                    }
                    Err(e) => {
                        warn!("Session {}: load more failed: {}", self.id, e);
                        PageFetched::Failed(st.finish_with_error(LOAD_MORE_FAILED))
                    }
                }
            }
        };

        let (jobs, resume) = match fetched {
            PageFetched::Stale => {
                debug!("Session {}: discarding stale page at offset {}", self.id, offset);
                return self.snapshot();
            }
            PageFetched::Failed(run) => return self.follow_up(run).await,
            PageFetched::Ready { jobs, resume } => (jobs, resume),
        };

        let entries = match resume {
            Some(resume) if !jobs.is_empty() => self
                .recommender
                .recommend(&resume, &jobs)
                .await
                .map(|recommendations| join_recommendations(jobs, recommendations)),
            _ => Ok(jobs.into_iter().map(JobWithRecommendation::unscored).collect()),
        };

        let run = {
            let mut st = self.state.lock();
            if st.generation != generation {
                debug!("Session {}: discarding stale page at offset {}", self.id, offset);
                return self.snapshot_of(&st);
            }
            match entries {
                Ok(entries) => {
                    st.has_more = entries.len() == PAGE_SIZE;
                    st.jobs.extend(entries);
                    st.status = SessionStatus::Idle;
                    st.touch();
                    info!(
                        "Session {}: now {} jobs, {} sources, has_more={}",
                        self.id,
                        st.jobs.len(),
                        st.sources.len(),
                        st.has_more
                    );
                    st.take_reanalysis()
                }
                Err(e) => {
                    warn!("Session {}: scoring the next page failed: {}", self.id, e);
                    st.finish_with_error(LOAD_MORE_FAILED)
                }
            }
        };

        self.follow_up(run).await
    }

    async fn follow_up(&self, run: Option<AnalysisRun>) -> SessionSnapshot {
        if let Some(run) = run {
            self.run_analysis(run).await;
        }
        self.snapshot()
    }

    /// Scores the analyzed job set, repeating while a newer resume arrived
    /// during the call.
    async fn run_analysis(&self, mut run: AnalysisRun) {
        loop {
            info!(
                "Session {}: requesting recommendations for {} jobs",
                self.id,
                run.jobs.len()
            );
            let result = self.recommender.recommend(&run.resume, &run.jobs).await;

            let next = {
                let mut st = self.state.lock();
                if st.generation != run.generation {
                    debug!(
                        "Session {}: discarding stale recommendations (generation {})",
                        self.id, run.generation
                    );
                    return;
                }
                apply_analysis(&mut st, &run, result, self.id)
            };

            match next {
                Some(next) => run = next,
                None => return,
            }
        }
    }
}

fn apply_analysis(
    st: &mut SessionState,
    run: &AnalysisRun,
    result: Result<Vec<JobRecommendation>, ServiceError>,
    session_id: Uuid,
) -> Option<AnalysisRun> {
    let analyzed: HashSet<&str> = run.jobs.iter().map(|j| j.id.as_str()).collect();

    match result {
        Ok(recommendations) => {
            let mut by_id: HashMap<String, JobRecommendation> = recommendations
                .into_iter()
                .map(|r| (r.id.clone(), r))
                .collect();
            for entry in st
                .jobs
                .iter_mut()
                .filter(|e| analyzed.contains(e.job.id.as_str()))
            {
                entry.fit = fit_from(by_id.remove(&entry.job.id));
            }
            st.status = SessionStatus::Idle;
            st.touch();
            st.take_reanalysis()
        }
        Err(e) => {
            warn!("Session {}: recommendations failed: {}", session_id, e);
            match run.origin {
                AnalysisOrigin::Search => {
                    st.jobs.clear();
                    st.finish_with_error(format!("Failed to fetch jobs: {e}"))
                }
                AnalysisOrigin::Resume => {
                    for entry in st
                        .jobs
                        .iter_mut()
                        .filter(|e| analyzed.contains(e.job.id.as_str()))
                    {
                        entry.fit = Fit::NotAnalyzed;
                    }
                    st.finish_with_error(RECOMMENDATIONS_FAILED)
                }
            }
        }
    }
}

fn fit_from(recommendation: Option<JobRecommendation>) -> Fit {
    match recommendation {
        Some(r) => Fit::Analyzed {
            match_score: r.match_score,
            recommendation: r.recommendation,
        },
        None => Fit::NotAnalyzed,
    }
}

fn join_recommendations(
    jobs: Vec<Job>,
    recommendations: Vec<JobRecommendation>,
) -> Vec<JobWithRecommendation> {
    let mut by_id: HashMap<String, JobRecommendation> = recommendations
        .into_iter()
        .map(|r| (r.id.clone(), r))
        .collect();
    jobs.into_iter()
        .map(|job| {
            let fit = fit_from(by_id.remove(&job.id));
            JobWithRecommendation { job, fit }
        })
        .collect()
}
