// src/analytics/tracker.rs — Analytics session tracking
//
// The tracker is an injected service, constructed once at the composition
// root and shared via Arc. It keeps every active session in an in-memory
// registry, derives durations and cost totals at completion, and emits
// events through the sink. Contract: no operation blocks, panics, or
// errors on a missing session; derived numbers degrade to zero.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::analytics::events::{names, AnalyticsEvent};
use crate::analytics::session::{
    CostBuckets, CreationKey, CreationSession, GenPhase, ImageKey, ImageSession, PageBaseline,
    ReadingKey, ReadingSession,
};
use crate::analytics::sink::EventSink;
use crate::infra::clock::{Clock, SystemClock};

#[derive(Default)]
struct Registry {
    creation: HashMap<CreationKey, CreationSession>,
    reading: HashMap<ReadingKey, ReadingSession>,
    images: HashMap<ImageKey, ImageSession>,
    /// Title/text sub-timers, kept apart from the creation session so a
    /// phase can be timed even when no enclosing session exists.
    phase_timers: HashMap<(CreationKey, GenPhase), i64>,
    /// Current page per story, for lag-by-one dwell computation.
    baselines: HashMap<String, PageBaseline>,
}

pub struct AnalyticsTracker {
    sink: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    state: Mutex<Registry>,
}

impl AnalyticsTracker {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self::with_clock(sink, Arc::new(SystemClock))
    }

    pub fn with_clock(sink: Arc<dyn EventSink>, clock: Arc<dyn Clock>) -> Self {
        Self {
            sink,
            clock,
            state: Mutex::new(Registry::default()),
        }
    }

    // ─── Story creation ─────────────────────────────────────────

    /// Begins a creation session for (user, kid). An in-flight session for
    /// the same key is replaced and its start time discarded; the return
    /// value reports whether that happened so callers can react.
    pub fn start_creation_session(
        &self,
        user_id: &str,
        kid_id: &str,
        problem_description: Option<&str>,
    ) -> bool {
        let now = self.now();
        let key = CreationKey::new(user_id, kid_id);
        let replaced = {
            let mut reg = self.state_guard();
            reg.creation
                .insert(
                    key,
                    CreationSession::new(now, problem_description.map(str::to_string)),
                )
                .is_some()
        };
        if replaced {
            tracing::warn!(
                user_id,
                kid_id,
                "creation session already in flight for this key; replacing it"
            );
        }
        self.emit(
            AnalyticsEvent::new(names::STORY_CREATION_START, now)
                .field("user_id", user_id)
                .field("kid_id", kid_id)
                .field_opt("problem_description", problem_description),
        );
        replaced
    }

    pub fn start_title_generation(&self, user_id: &str, kid_id: &str) {
        let now = self.now();
        let key = (CreationKey::new(user_id, kid_id), GenPhase::Title);
        self.state_guard().phase_timers.insert(key, now);
    }

    /// Ends the title sub-timer. The cost, when supplied, lands in the
    /// enclosing session's title bucket if that session exists; otherwise
    /// it is dropped.
    pub fn complete_title_generation(
        &self,
        user_id: &str,
        kid_id: &str,
        titles_count: u32,
        cost: Option<f64>,
    ) {
        let now = self.now();
        let duration = self.end_phase(user_id, kid_id, GenPhase::Title, cost, now);
        self.emit(
            AnalyticsEvent::new(names::TITLE_GENERATION, now)
                .field("user_id", user_id)
                .field("kid_id", kid_id)
                .field("titles_count", titles_count)
                .duration(duration),
        );
        if let Some(cost) = cost {
            self.emit_phase_cost(user_id, GenPhase::Title, cost, now);
        }
    }

    pub fn start_text_generation(&self, user_id: &str, kid_id: &str) {
        let now = self.now();
        let key = (CreationKey::new(user_id, kid_id), GenPhase::Text);
        self.state_guard().phase_timers.insert(key, now);
        self.emit(
            AnalyticsEvent::new(names::CREATING_TEXT_START, now)
                .field("user_id", user_id)
                .field("kid_id", kid_id),
        );
    }

    pub fn complete_text_generation(
        &self,
        user_id: &str,
        kid_id: &str,
        pages_count: u32,
        cost: Option<f64>,
    ) {
        let now = self.now();
        let duration = self.end_phase(user_id, kid_id, GenPhase::Text, cost, now);
        self.emit(
            AnalyticsEvent::new(names::CREATING_TEXT_FINISH, now)
                .field("user_id", user_id)
                .field("kid_id", kid_id)
                .field("pages_count", pages_count)
                .duration(duration),
        );
        if let Some(cost) = cost {
            self.emit_phase_cost(user_id, GenPhase::Text, cost, now);
        }
    }

    /// Completes the creation flow: total duration from session start and
    /// total cost from the three buckets. With no active session both
    /// degrade to zero; the events are still emitted.
    pub fn complete_creation_session(
        &self,
        story_id: &str,
        user_id: &str,
        kid_id: &str,
        story_title: Option<&str>,
    ) {
        let now = self.now();
        let key = CreationKey::new(user_id, kid_id);
        let (duration, costs) = {
            let mut reg = self.state_guard();
            reg.phase_timers.retain(|(k, _), _| *k != key);
            match reg.creation.remove(&key) {
                Some(session) => (now.saturating_sub(session.started_ms), session.costs),
                None => (0, CostBuckets::default()),
            }
        };
        self.emit(
            AnalyticsEvent::new(names::STORY_CREATION_COMPLETE, now)
                .field("user_id", user_id)
                .field("kid_id", kid_id)
                .field("story_id", story_id)
                .field_opt("story_title", story_title)
                .duration(duration),
        );
        self.emit(
            AnalyticsEvent::new(names::STORY_CREATION_COST, now)
                .field("user_id", user_id)
                .field("kid_id", kid_id)
                .field("story_id", story_id)
                .field("title_cost_usd", costs.title)
                .field("text_cost_usd", costs.text)
                .field("image_cost_usd", costs.image)
                .field("total_cost_usd", costs.total()),
        );
    }

    /// Abandons the creation flow with an error. The session (and its
    /// timers) are removed whether or not one existed.
    pub fn error_creation_session(&self, user_id: &str, kid_id: &str, error_message: &str) {
        let now = self.now();
        let key = CreationKey::new(user_id, kid_id);
        let duration = {
            let mut reg = self.state_guard();
            reg.phase_timers.retain(|(k, _), _| *k != key);
            reg.creation
                .remove(&key)
                .map(|s| now.saturating_sub(s.started_ms))
                .unwrap_or(0)
        };
        self.emit(
            AnalyticsEvent::new(names::STORY_CREATION_ERROR, now)
                .field("user_id", user_id)
                .field("kid_id", kid_id)
                .field("error", error_message)
                .duration(duration),
        );
    }

    // ─── Story reading ──────────────────────────────────────────

    /// Begins a reading session. The at-most-once guard lives in the
    /// adapter; calling this twice replaces the session like any other
    /// `start_*`.
    pub fn start_reading_session(&self, story_id: &str, user_id: &str, story_title: Option<&str>) {
        let now = self.now();
        let key = ReadingKey::new(story_id, user_id);
        self.state_guard().reading.insert(
            key,
            ReadingSession {
                started_ms: now,
                story_title: story_title.map(str::to_string),
            },
        );
        self.emit(
            AnalyticsEvent::new(names::READING_STORY_START, now)
                .field("user_id", user_id)
                .field("story_id", story_id)
                .field_opt("story_title", story_title),
        );
    }

    /// Records arrival on a page. The first call for a story only sets the
    /// baseline; every later call emits a `story_page_view` for the page
    /// the reader just left, with its dwell time.
    pub fn track_page_view(&self, story_id: &str, page_num: u32, page_type: &str) {
        let now = self.now();
        let (previous, user_id) = {
            let mut reg = self.state_guard();
            // Page views are keyed by story only; the user_id enrichment
            // takes whichever reading session matches first when several
            // users have the same story open.
            let user_id = reg
                .reading
                .keys()
                .find(|k| k.story_id == story_id)
                .map(|k| k.user_id.clone());
            let previous = reg.baselines.insert(
                story_id.to_string(),
                PageBaseline {
                    page_num,
                    page_type: page_type.to_string(),
                    arrived_ms: now,
                },
            );
            (previous, user_id)
        };
        if let Some(prev) = previous {
            self.emit_page_view(story_id, &prev, user_id.as_deref(), now);
        }
    }

    /// Ends the reading session: flushes the final page's dwell time, then
    /// emits the finish event with total duration. A second call for the
    /// same key is a complete no-op.
    pub fn finish_reading_session(&self, story_id: &str, user_id: &str, story_title: Option<&str>) {
        let now = self.now();
        let key = ReadingKey::new(story_id, user_id);
        let (session, baseline) = {
            let mut reg = self.state_guard();
            match reg.reading.remove(&key) {
                Some(session) => (session, reg.baselines.remove(story_id)),
                None => return,
            }
        };
        if let Some(last_page) = baseline {
            self.emit_page_view(story_id, &last_page, Some(user_id), now);
        }
        let title = story_title
            .map(str::to_string)
            .or(session.story_title);
        self.emit(
            AnalyticsEvent::new(names::READING_STORY_FINISH, now)
                .field("user_id", user_id)
                .field("story_id", story_id)
                .field_opt("story_title", title)
                .duration(now.saturating_sub(session.started_ms)),
        );
    }

    /// Records a branching choice. Stateless: emitted whether or not a
    /// reading session exists.
    pub fn track_selected_path(
        &self,
        story_id: &str,
        user_id: &str,
        path_type: &str,
        page_num: u32,
        story_title: Option<&str>,
    ) {
        let now = self.now();
        self.emit(
            AnalyticsEvent::new(names::READING_STORY_SELECTED_PATH, now)
                .field("user_id", user_id)
                .field("story_id", story_id)
                .field("path_type", path_type)
                .field("page_num", page_num)
                .field_opt("story_title", story_title),
        );
    }

    // ─── Image generation ───────────────────────────────────────

    pub fn start_image_generation(&self, user_id: &str, story_id: &str, page_type: &str) {
        let now = self.now();
        let key = ImageKey::new(user_id, story_id, page_type);
        self.state_guard()
            .images
            .insert(key, ImageSession { started_ms: now });
        self.emit(
            AnalyticsEvent::new(names::CREATING_IMAGE_START, now)
                .field("user_id", user_id)
                .field("story_id", story_id)
                .field("page_type", page_type),
        );
    }

    /// Finishes an illustration and returns the cost that was passed in,
    /// so the orchestrating caller can decide whether to fold it into a
    /// creation session via [`record_image_cost`](Self::record_image_cost).
    pub fn complete_image_generation(
        &self,
        user_id: &str,
        story_id: &str,
        page_type: &str,
        cost: Option<f64>,
        is_regeneration: bool,
    ) -> Option<f64> {
        let now = self.now();
        let key = ImageKey::new(user_id, story_id, page_type);
        let duration = self
            .state_guard()
            .images
            .remove(&key)
            .map(|s| now.saturating_sub(s.started_ms))
            .unwrap_or(0);
        self.emit(
            AnalyticsEvent::new(names::CREATING_IMAGE_FINISH, now)
                .field("user_id", user_id)
                .field("story_id", story_id)
                .field("page_type", page_type)
                .duration(duration),
        );
        if let Some(cost) = cost {
            self.emit(
                AnalyticsEvent::new(names::OPENAI_COST, now)
                    .field("user_id", user_id)
                    .field("story_id", story_id)
                    .field("operation", "image_generation")
                    .field("cost_usd", cost),
            );
        }
        if is_regeneration {
            self.emit(
                AnalyticsEvent::new(names::IMAGE_REGENERATION, now)
                    .field("user_id", user_id)
                    .field("story_id", story_id)
                    .field("page_type", page_type),
            );
        }
        cost
    }

    /// Explicit folding step: adds an image cost to the creation session's
    /// image bucket. No-op when no session exists for (user, kid).
    pub fn record_image_cost(&self, user_id: &str, kid_id: &str, cost: f64) {
        let key = CreationKey::new(user_id, kid_id);
        if let Some(session) = self.state_guard().creation.get_mut(&key) {
            session.costs.image += cost;
        }
    }

    pub fn error_image_generation(
        &self,
        user_id: &str,
        story_id: &str,
        page_type: &str,
        error_message: &str,
    ) {
        let now = self.now();
        let key = ImageKey::new(user_id, story_id, page_type);
        let duration = self
            .state_guard()
            .images
            .remove(&key)
            .map(|s| now.saturating_sub(s.started_ms))
            .unwrap_or(0);
        self.emit(
            AnalyticsEvent::new(names::IMAGE_GENERATION_ERROR, now)
                .field("user_id", user_id)
                .field("story_id", story_id)
                .field("page_type", page_type)
                .field("error", error_message)
                .duration(duration),
        );
    }

    // ─── Stateless events ───────────────────────────────────────

    pub fn track_openai_cost(
        &self,
        user_id: &str,
        operation: &str,
        cost_usd: f64,
        model: &str,
        tokens_used: Option<u32>,
        story_id: Option<&str>,
    ) {
        let now = self.now();
        self.emit(
            AnalyticsEvent::new(names::OPENAI_COST, now)
                .field("user_id", user_id)
                .field("operation", operation)
                .field("cost_usd", cost_usd)
                .field("model", model)
                .field_opt("tokens_used", tokens_used)
                .field_opt("story_id", story_id),
        );
    }

    pub fn track_api_performance(
        &self,
        endpoint: &str,
        duration_ms: i64,
        success: bool,
        user_id: Option<&str>,
    ) {
        let now = self.now();
        self.emit(
            AnalyticsEvent::new(names::API_PERFORMANCE, now)
                .field("endpoint", endpoint)
                .field("success", success)
                .field_opt("user_id", user_id)
                .duration(duration_ms),
        );
    }

    // ─── Internals ──────────────────────────────────────────────

    fn now(&self) -> i64 {
        self.clock.now_ms()
    }

    fn emit(&self, event: AnalyticsEvent) {
        self.sink.emit(event);
    }

    /// Removes the phase timer, folds the cost into the matching bucket
    /// when the enclosing session exists, and returns the phase duration
    /// (0 when the timer was never started).
    fn end_phase(
        &self,
        user_id: &str,
        kid_id: &str,
        phase: GenPhase,
        cost: Option<f64>,
        now: i64,
    ) -> i64 {
        let key = CreationKey::new(user_id, kid_id);
        let mut reg = self.state_guard();
        let duration = reg
            .phase_timers
            .remove(&(key.clone(), phase))
            .map(|started| now.saturating_sub(started))
            .unwrap_or(0);
        if let Some(cost) = cost {
            if let Some(session) = reg.creation.get_mut(&key) {
                match phase {
                    GenPhase::Title => session.costs.title += cost,
                    GenPhase::Text => session.costs.text += cost,
                }
            }
        }
        duration
    }

    fn emit_phase_cost(&self, user_id: &str, phase: GenPhase, cost: f64, now: i64) {
        self.emit(
            AnalyticsEvent::new(names::OPENAI_COST, now)
                .field("user_id", user_id)
                .field("operation", phase.operation())
                .field("cost_usd", cost),
        );
    }

    fn emit_page_view(
        &self,
        story_id: &str,
        page: &PageBaseline,
        user_id: Option<&str>,
        now: i64,
    ) {
        self.emit(
            AnalyticsEvent::new(names::STORY_PAGE_VIEW, now)
                .field_opt("user_id", user_id)
                .field("story_id", story_id)
                .field("page_num", page.page_num)
                .field("page_type", page.page_type.as_str())
                .duration(now.saturating_sub(page.arrived_ms)),
        );
    }

    fn state_guard(&self) -> MutexGuard<'_, Registry> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::sink::CaptureSink;
    use std::sync::atomic::{AtomicI64, Ordering};

    struct ManualClock {
        ms: AtomicI64,
    }

    impl ManualClock {
        fn starting_at(ms: i64) -> Arc<Self> {
            Arc::new(Self {
                ms: AtomicI64::new(ms),
            })
        }

        fn advance(&self, delta_ms: i64) {
            self.ms.fetch_add(delta_ms, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now_ms(&self) -> i64 {
            self.ms.load(Ordering::SeqCst)
        }
    }

    fn tracker() -> (AnalyticsTracker, Arc<CaptureSink>, Arc<ManualClock>) {
        let sink = CaptureSink::new();
        let clock = ManualClock::starting_at(1_000_000);
        let tracker = AnalyticsTracker::with_clock(sink.clone(), clock.clone());
        (tracker, sink, clock)
    }

    fn find(sink: &CaptureSink, name: &str) -> crate::analytics::events::AnalyticsEvent {
        sink.captured()
            .into_iter()
            .find(|e| e.name == name)
            .unwrap_or_else(|| panic!("no {name} event captured"))
    }

    // ─── Creation sessions ──────────────────────────────────────

    #[test]
    fn test_creation_start_then_complete() {
        let (t, sink, clock) = tracker();
        t.start_creation_session("u1", "k1", Some("dragon is scared of the dark"));
        clock.advance(4_000);
        t.complete_creation_session("s1", "u1", "k1", Some("The Brave Little Dragon"));

        let complete = find(&sink, names::STORY_CREATION_COMPLETE);
        assert_eq!(complete.get("duration_ms").unwrap().as_i64(), Some(4_000));
        assert_eq!(complete.get("story_id").unwrap().as_str(), Some("s1"));

        let cost = find(&sink, names::STORY_CREATION_COST);
        assert_eq!(cost.get("total_cost_usd").unwrap().as_f64(), Some(0.0));
    }

    #[test]
    fn test_cost_total_is_sum_of_buckets() {
        let (t, sink, clock) = tracker();
        t.start_creation_session("u1", "k1", None);

        t.start_title_generation("u1", "k1");
        clock.advance(900);
        t.complete_title_generation("u1", "k1", 3, Some(0.002));

        t.start_text_generation("u1", "k1");
        clock.advance(6_000);
        t.complete_text_generation("u1", "k1", 8, Some(0.035));

        t.record_image_cost("u1", "k1", 0.08);
        t.record_image_cost("u1", "k1", 0.08);

        t.complete_creation_session("s1", "u1", "k1", None);

        let cost = find(&sink, names::STORY_CREATION_COST);
        assert_eq!(cost.get("title_cost_usd").unwrap().as_f64(), Some(0.002));
        assert_eq!(cost.get("text_cost_usd").unwrap().as_f64(), Some(0.035));
        assert_eq!(cost.get("image_cost_usd").unwrap().as_f64(), Some(0.16));
        let total = cost.get("total_cost_usd").unwrap().as_f64().unwrap();
        assert!((total - 0.197).abs() < 1e-9);
    }

    #[test]
    fn test_complete_without_start_reports_zero() {
        let (t, sink, _) = tracker();
        t.complete_creation_session("s1", "u1", "k1", None);

        let complete = find(&sink, names::STORY_CREATION_COMPLETE);
        assert_eq!(complete.get("duration_ms").unwrap().as_i64(), Some(0));
        let cost = find(&sink, names::STORY_CREATION_COST);
        assert_eq!(cost.get("total_cost_usd").unwrap().as_f64(), Some(0.0));
    }

    #[test]
    fn test_restart_overwrites_start_time() {
        let (t, sink, clock) = tracker();
        t.start_creation_session("u1", "k1", None);
        clock.advance(60_000);
        let replaced = t.start_creation_session("u1", "k1", None);
        assert!(replaced);
        clock.advance(2_000);
        t.complete_creation_session("s1", "u1", "k1", None);

        let complete = find(&sink, names::STORY_CREATION_COMPLETE);
        // Second start's time governs: 2s, not 62s.
        assert_eq!(complete.get("duration_ms").unwrap().as_i64(), Some(2_000));
    }

    #[test]
    fn test_first_start_reports_no_replacement() {
        let (t, _, _) = tracker();
        assert!(!t.start_creation_session("u1", "k1", None));
    }

    #[test]
    fn test_phase_cost_without_session_is_dropped() {
        let (t, sink, clock) = tracker();
        // No enclosing session at all.
        t.start_title_generation("u1", "k1");
        clock.advance(500);
        t.complete_title_generation("u1", "k1", 3, Some(0.002));

        let title = find(&sink, names::TITLE_GENERATION);
        assert_eq!(title.get("duration_ms").unwrap().as_i64(), Some(500));
        // openai_cost is still emitted even though the bucket was dropped.
        let cost = find(&sink, names::OPENAI_COST);
        assert_eq!(
            cost.get("operation").unwrap().as_str(),
            Some("title_generation")
        );

        // Later completion shows nothing accumulated.
        t.complete_creation_session("s1", "u1", "k1", None);
        let cost = find(&sink, names::STORY_CREATION_COST);
        assert_eq!(cost.get("total_cost_usd").unwrap().as_f64(), Some(0.0));
    }

    #[test]
    fn test_phase_completion_without_timer_reports_zero() {
        let (t, sink, _) = tracker();
        t.complete_text_generation("u1", "k1", 4, None);
        let finish = find(&sink, names::CREATING_TEXT_FINISH);
        assert_eq!(finish.get("duration_ms").unwrap().as_i64(), Some(0));
    }

    #[test]
    fn test_no_cost_means_no_openai_cost_event() {
        let (t, sink, _) = tracker();
        t.start_creation_session("u1", "k1", None);
        t.start_title_generation("u1", "k1");
        t.complete_title_generation("u1", "k1", 3, None);
        assert!(!sink.names().contains(&names::OPENAI_COST));
    }

    #[test]
    fn test_error_removes_session_and_emits_once() {
        let (t, sink, clock) = tracker();
        t.start_creation_session("u1", "k1", None);
        clock.advance(1_500);
        t.error_creation_session("u1", "k1", "provider timed out");

        let error = find(&sink, names::STORY_CREATION_ERROR);
        assert_eq!(error.get("duration_ms").unwrap().as_i64(), Some(1_500));
        assert_eq!(
            error.get("error").unwrap().as_str(),
            Some("provider timed out")
        );

        // The session is gone: a later complete reports zero.
        sink.clear();
        t.complete_creation_session("s1", "u1", "k1", None);
        let complete = find(&sink, names::STORY_CREATION_COMPLETE);
        assert_eq!(complete.get("duration_ms").unwrap().as_i64(), Some(0));
    }

    #[test]
    fn test_error_without_session_is_tolerated() {
        let (t, sink, _) = tracker();
        t.error_creation_session("u1", "k1", "boom");
        let error = find(&sink, names::STORY_CREATION_ERROR);
        assert_eq!(error.get("duration_ms").unwrap().as_i64(), Some(0));
    }

    // ─── Reading sessions ───────────────────────────────────────

    #[test]
    fn test_page_views_lag_by_one() {
        let (t, sink, clock) = tracker();
        t.start_reading_session("s1", "u1", Some("The Brave Little Dragon"));

        t.track_page_view("s1", 1, "story");
        clock.advance(10_000);
        t.track_page_view("s1", 2, "story");
        clock.advance(7_000);
        t.track_page_view("s1", 3, "choice");

        let views: Vec<_> = sink
            .captured()
            .into_iter()
            .filter(|e| e.name == names::STORY_PAGE_VIEW)
            .collect();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].get("page_num").unwrap().as_u64(), Some(1));
        assert_eq!(views[0].get("duration_ms").unwrap().as_i64(), Some(10_000));
        assert_eq!(views[1].get("page_num").unwrap().as_u64(), Some(2));
        assert_eq!(views[1].get("duration_ms").unwrap().as_i64(), Some(7_000));
        assert_eq!(views[1].get("user_id").unwrap().as_str(), Some("u1"));
    }

    #[test]
    fn test_finish_flushes_final_page_dwell() {
        let (t, sink, clock) = tracker();
        t.start_reading_session("s1", "u1", None);
        t.track_page_view("s1", 1, "story");
        clock.advance(5_000);
        t.track_page_view("s1", 2, "story");
        clock.advance(3_000);
        t.finish_reading_session("s1", "u1", None);

        let events = sink.captured();
        let views: Vec<_> = events
            .iter()
            .filter(|e| e.name == names::STORY_PAGE_VIEW)
            .collect();
        assert_eq!(views.len(), 2);
        // The finish call flushed page 2's dwell.
        assert_eq!(views[1].get("page_num").unwrap().as_u64(), Some(2));
        assert_eq!(views[1].get("duration_ms").unwrap().as_i64(), Some(3_000));

        let finish = find(&sink, names::READING_STORY_FINISH);
        assert_eq!(finish.get("duration_ms").unwrap().as_i64(), Some(8_000));
    }

    #[test]
    fn test_finish_is_idempotent() {
        let (t, sink, clock) = tracker();
        t.start_reading_session("s1", "u1", None);
        clock.advance(2_000);
        t.finish_reading_session("s1", "u1", None);
        t.finish_reading_session("s1", "u1", None);

        let finishes = sink
            .names()
            .into_iter()
            .filter(|n| *n == names::READING_STORY_FINISH)
            .count();
        assert_eq!(finishes, 1);
    }

    #[test]
    fn test_finish_without_session_is_noop() {
        let (t, sink, _) = tracker();
        t.finish_reading_session("s1", "u1", None);
        assert!(sink.captured().is_empty());
    }

    #[test]
    fn test_finish_prefers_explicit_title_over_session_title() {
        let (t, sink, _) = tracker();
        t.start_reading_session("s1", "u1", Some("Old Title"));
        t.finish_reading_session("s1", "u1", Some("New Title"));
        let finish = find(&sink, names::READING_STORY_FINISH);
        assert_eq!(finish.get("story_title").unwrap().as_str(), Some("New Title"));
    }

    #[test]
    fn test_selected_path_is_stateless() {
        let (t, sink, _) = tracker();
        t.track_selected_path("s1", "u1", "brave", 4, None);
        let path = find(&sink, names::READING_STORY_SELECTED_PATH);
        assert_eq!(path.get("path_type").unwrap().as_str(), Some("brave"));
        assert_eq!(path.get("page_num").unwrap().as_u64(), Some(4));
    }

    #[test]
    fn test_page_view_without_session_omits_user() {
        let (t, sink, clock) = tracker();
        t.track_page_view("s9", 1, "story");
        clock.advance(1_000);
        t.track_page_view("s9", 2, "story");
        let view = find(&sink, names::STORY_PAGE_VIEW);
        assert!(view.get("user_id").is_none());
    }

    #[test]
    fn test_page_view_with_concurrent_readers_picks_an_active_one() {
        let (t, sink, clock) = tracker();
        t.start_reading_session("s1", "u1", None);
        t.start_reading_session("s1", "u2", None);
        t.track_page_view("s1", 1, "story");
        clock.advance(1_000);
        t.track_page_view("s1", 2, "story");

        let view = find(&sink, names::STORY_PAGE_VIEW);
        let user = view.get("user_id").unwrap().as_str().unwrap();
        assert!(user == "u1" || user == "u2", "unexpected user {user}");
    }

    // ─── Image generation ───────────────────────────────────────

    #[test]
    fn test_image_complete_returns_cost_and_folding_is_explicit() {
        let (t, sink, clock) = tracker();
        t.start_creation_session("u1", "k1", None);
        t.start_image_generation("u1", "s1", "cover");
        clock.advance(9_000);
        let cost = t.complete_image_generation("u1", "s1", "cover", Some(0.08), false);
        assert_eq!(cost, Some(0.08));
        t.record_image_cost("u1", "k1", cost.unwrap_or(0.0));

        t.complete_creation_session("s1", "u1", "k1", None);
        let finish = find(&sink, names::CREATING_IMAGE_FINISH);
        assert_eq!(finish.get("duration_ms").unwrap().as_i64(), Some(9_000));
        let total = find(&sink, names::STORY_CREATION_COST);
        assert_eq!(total.get("image_cost_usd").unwrap().as_f64(), Some(0.08));
    }

    #[test]
    fn test_image_complete_without_creation_session_still_emits() {
        let (t, sink, _) = tracker();
        t.start_image_generation("u1", "s1", "page_3");
        let cost = t.complete_image_generation("u1", "s1", "page_3", Some(0.04), false);
        assert_eq!(cost, Some(0.04));
        // Folding into an absent session is a silent no-op.
        t.record_image_cost("u1", "k1", 0.04);

        assert!(sink.names().contains(&names::CREATING_IMAGE_FINISH));
        assert!(sink.names().contains(&names::OPENAI_COST));
    }

    #[test]
    fn test_image_regeneration_emits_extra_event() {
        let (t, sink, _) = tracker();
        t.start_image_generation("u1", "s1", "cover");
        t.complete_image_generation("u1", "s1", "cover", None, true);
        let names_seen = sink.names();
        assert!(names_seen.contains(&names::IMAGE_REGENERATION));
        // No cost supplied, so no cost event.
        assert!(!names_seen.contains(&names::OPENAI_COST));
    }

    #[test]
    fn test_image_error_removes_sub_session() {
        let (t, sink, clock) = tracker();
        t.start_image_generation("u1", "s1", "cover");
        clock.advance(3_000);
        t.error_image_generation("u1", "s1", "cover", "content policy");
        let error = find(&sink, names::IMAGE_GENERATION_ERROR);
        assert_eq!(error.get("duration_ms").unwrap().as_i64(), Some(3_000));

        // Sub-session is gone: a second completion reports zero duration.
        sink.clear();
        t.complete_image_generation("u1", "s1", "cover", None, false);
        let finish = find(&sink, names::CREATING_IMAGE_FINISH);
        assert_eq!(finish.get("duration_ms").unwrap().as_i64(), Some(0));
    }

    // ─── Stateless events ───────────────────────────────────────

    #[test]
    fn test_track_openai_cost_passthrough() {
        let (t, sink, _) = tracker();
        t.track_openai_cost("u1", "text_generation", 0.021, "gpt-4o-mini", Some(5200), Some("s1"));
        let ev = find(&sink, names::OPENAI_COST);
        assert_eq!(ev.get("model").unwrap().as_str(), Some("gpt-4o-mini"));
        assert_eq!(ev.get("tokens_used").unwrap().as_u64(), Some(5200));
        assert_eq!(ev.get("cost_usd").unwrap().as_f64(), Some(0.021));
    }

    #[test]
    fn test_api_performance_duration_fields() {
        let (t, sink, _) = tracker();
        t.track_api_performance("/api/generate/text", 61_200, true, Some("u1"));
        let ev = find(&sink, names::API_PERFORMANCE);
        assert_eq!(ev.get("duration_ms").unwrap().as_i64(), Some(61_200));
        assert_eq!(ev.get("duration_minutes").unwrap().as_i64(), Some(1));
        assert_eq!(ev.get("success").unwrap().as_bool(), Some(true));
    }

    #[test]
    fn test_independent_keys_do_not_interfere() {
        let (t, sink, clock) = tracker();
        t.start_creation_session("u1", "k1", None);
        clock.advance(1_000);
        t.start_creation_session("u1", "k2", None);
        clock.advance(1_000);
        t.complete_creation_session("s1", "u1", "k1", None);
        t.complete_creation_session("s2", "u1", "k2", None);

        let completes: Vec<_> = sink
            .captured()
            .into_iter()
            .filter(|e| e.name == names::STORY_CREATION_COMPLETE)
            .collect();
        assert_eq!(completes[0].get("duration_ms").unwrap().as_i64(), Some(2_000));
        assert_eq!(completes[1].get("duration_ms").unwrap().as_i64(), Some(1_000));
    }
}
