// src/analytics/adapter.rs — View lifecycle adapters
//
// Thin translation layer between UI lifecycle signals (view mounted,
// unmounted, page changed) and the tracker's stable interface. Two rules
// live here, not in the tracker: reading sessions start at most once per
// adapter, and any signal arriving without its required identifiers is
// skipped outright.

use std::sync::Arc;

use crate::analytics::tracker::AnalyticsTracker;

/// Adapter for a story-reading view. One instance per mounted view.
pub struct ReadingViewAdapter {
    tracker: Arc<AnalyticsTracker>,
    story_id: Option<String>,
    user_id: Option<String>,
    story_title: Option<String>,
    started: bool,
}

impl ReadingViewAdapter {
    pub fn new(
        tracker: Arc<AnalyticsTracker>,
        story_id: Option<String>,
        user_id: Option<String>,
        story_title: Option<String>,
    ) -> Self {
        Self {
            tracker,
            story_id,
            user_id,
            story_title,
            started: false,
        }
    }

    /// View appeared. Starts the reading session exactly once.
    pub fn view_mounted(&mut self) {
        if self.started {
            return;
        }
        let (Some(story_id), Some(user_id)) = (self.story_id.as_deref(), self.user_id.as_deref())
        else {
            return;
        };
        self.tracker
            .start_reading_session(story_id, user_id, self.story_title.as_deref());
        self.started = true;
    }

    pub fn page_changed(&self, page_num: u32, page_type: &str) {
        let Some(story_id) = self.story_id.as_deref() else {
            return;
        };
        self.tracker.track_page_view(story_id, page_num, page_type);
    }

    pub fn path_chosen(&self, path_type: &str, page_num: u32) {
        let (Some(story_id), Some(user_id)) = (self.story_id.as_deref(), self.user_id.as_deref())
        else {
            return;
        };
        self.tracker.track_selected_path(
            story_id,
            user_id,
            path_type,
            page_num,
            self.story_title.as_deref(),
        );
    }

    /// View went away. Finishing an unstarted session is skipped here;
    /// the tracker would treat it as a no-op anyway.
    pub fn view_unmounted(&mut self) {
        if !self.started {
            return;
        }
        let (Some(story_id), Some(user_id)) = (self.story_id.as_deref(), self.user_id.as_deref())
        else {
            return;
        };
        self.tracker
            .finish_reading_session(story_id, user_id, self.story_title.as_deref());
        self.started = false;
    }
}

/// Adapter for the story-creation wizard.
pub struct CreationFlowAdapter {
    tracker: Arc<AnalyticsTracker>,
    user_id: Option<String>,
    kid_id: Option<String>,
}

impl CreationFlowAdapter {
    pub fn new(
        tracker: Arc<AnalyticsTracker>,
        user_id: Option<String>,
        kid_id: Option<String>,
    ) -> Self {
        Self {
            tracker,
            user_id,
            kid_id,
        }
    }

    fn ids(&self) -> Option<(&str, &str)> {
        Some((self.user_id.as_deref()?, self.kid_id.as_deref()?))
    }

    pub fn flow_started(&self, problem_description: Option<&str>) {
        if let Some((user_id, kid_id)) = self.ids() {
            self.tracker
                .start_creation_session(user_id, kid_id, problem_description);
        }
    }

    pub fn titles_requested(&self) {
        if let Some((user_id, kid_id)) = self.ids() {
            self.tracker.start_title_generation(user_id, kid_id);
        }
    }

    pub fn titles_ready(&self, titles_count: u32, cost: Option<f64>) {
        if let Some((user_id, kid_id)) = self.ids() {
            self.tracker
                .complete_title_generation(user_id, kid_id, titles_count, cost);
        }
    }

    pub fn text_requested(&self) {
        if let Some((user_id, kid_id)) = self.ids() {
            self.tracker.start_text_generation(user_id, kid_id);
        }
    }

    pub fn text_ready(&self, pages_count: u32, cost: Option<f64>) {
        if let Some((user_id, kid_id)) = self.ids() {
            self.tracker
                .complete_text_generation(user_id, kid_id, pages_count, cost);
        }
    }

    pub fn flow_completed(&self, story_id: &str, story_title: Option<&str>) {
        if let Some((user_id, kid_id)) = self.ids() {
            self.tracker
                .complete_creation_session(story_id, user_id, kid_id, story_title);
        }
    }

    pub fn flow_failed(&self, error_message: &str) {
        if let Some((user_id, kid_id)) = self.ids() {
            self.tracker
                .error_creation_session(user_id, kid_id, error_message);
        }
    }
}
