// src/analytics/session.rs — Session records and composite keys
//
// Sessions are pure in-memory bookkeeping: a start timestamp plus whatever
// the eventual completion event needs. There is no persistence and no
// expiry; an abandoned session lives until its key is overwritten or the
// process exits.

/// Key for a story-creation flow: one per (user, kid) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CreationKey {
    pub user_id: String,
    pub kid_id: String,
}

impl CreationKey {
    pub fn new(user_id: &str, kid_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            kid_id: kid_id.to_string(),
        }
    }
}

/// Key for a reading session: one per (story, user) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReadingKey {
    pub story_id: String,
    pub user_id: String,
}

impl ReadingKey {
    pub fn new(story_id: &str, user_id: &str) -> Self {
        Self {
            story_id: story_id.to_string(),
            user_id: user_id.to_string(),
        }
    }
}

/// Key for one in-flight illustration: page type distinguishes parallel
/// generations within the same story.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageKey {
    pub user_id: String,
    pub story_id: String,
    pub page_type: String,
}

impl ImageKey {
    pub fn new(user_id: &str, story_id: &str, page_type: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            story_id: story_id.to_string(),
            page_type: page_type.to_string(),
        }
    }
}

/// Sub-phases of a creation flow that carry their own timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenPhase {
    Title,
    Text,
}

impl GenPhase {
    /// The `operation` tag used on `openai_cost` events for this phase.
    pub fn operation(&self) -> &'static str {
        match self {
            GenPhase::Title => "title_generation",
            GenPhase::Text => "text_generation",
        }
    }
}

/// Per-phase USD accumulators for one creation flow.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CostBuckets {
    pub title: f64,
    pub text: f64,
    pub image: f64,
}

impl CostBuckets {
    pub fn total(&self) -> f64 {
        self.title + self.text + self.image
    }
}

#[derive(Debug, Clone)]
pub struct CreationSession {
    pub started_ms: i64,
    pub problem_description: Option<String>,
    pub costs: CostBuckets,
}

impl CreationSession {
    pub fn new(started_ms: i64, problem_description: Option<String>) -> Self {
        Self {
            started_ms,
            problem_description,
            costs: CostBuckets::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReadingSession {
    pub started_ms: i64,
    pub story_title: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ImageSession {
    pub started_ms: i64,
}

/// The page a reader is currently on. Dwell time is computed lag-by-one:
/// a page's duration is only known once the reader leaves it.
#[derive(Debug, Clone)]
pub struct PageBaseline {
    pub page_num: u32,
    pub page_type: String,
    pub arrived_ms: i64,
}
