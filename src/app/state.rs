use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate, Timelike};
use crossterm::event::KeyCode;
use tracing::info;

use crate::projection;
use crate::store::Store;
use crate::suggest::{
    self, CancelToken, PendingSuggestions, StagedApply, SuggestionOutcome, SuggestionRequest,
    SuggestionSource,
};
use crate::types::{
    BlockCategory, BlockId, BlockStatus, NewTimeBlock, Priority, PriorityDomain, TimeBlock,
    TimeBlockPatch, clamp_weight, format_clock, parse_clock,
};

use super::{AppEvent, AppView};

/// The top-level application state.
pub struct App {
    pub running: bool,
    pub store: Store,
    pub view: AppView,
    pub selected_hour: u32,
    pub selected_date: NaiveDate,
    pub status: Option<String>,
    pub onboarding: OnboardingDraft,
    pub new_block_popup: Option<NewBlockPopup>,
    pub magic_fill: Option<MagicFillPopup>,
    source: Arc<dyn SuggestionSource>,
    stage_interval: Duration,
    staged: Option<StagedApply>,
}

/// Priorities collected on the onboarding screen before they are committed.
#[derive(Clone, Debug)]
pub struct OnboardingDraft {
    pub input: String,
    pub domain: PriorityDomain,
    pub priorities: Vec<Priority>,
    pub selected: usize,
    /// Index into the current domain's examples shown in `input`.
    pub example: Option<usize>,
}

impl Default for OnboardingDraft {
    fn default() -> Self {
        Self {
            input: String::new(),
            domain: PriorityDomain::You,
            priorities: Vec::new(),
            selected: 0,
            example: None,
        }
    }
}

impl OnboardingDraft {
    fn select_prev(&mut self) {
        if self.priorities.is_empty() {
            return;
        }
        if self.selected == 0 {
            self.selected = self.priorities.len() - 1;
        } else {
            self.selected -= 1;
        }
    }

    fn select_next(&mut self) {
        if self.priorities.is_empty() {
            return;
        }
        self.selected = (self.selected + 1) % self.priorities.len();
    }

    /// Replaces the input with the next (or previous) example name.
    fn cycle_example(&mut self, forward: bool) {
        let examples = self.domain.examples();
        if examples.is_empty() {
            return;
        }
        let len = examples.len();
        let index = match (self.example, forward) {
            (None, true) => 0,
            (None, false) => len - 1,
            (Some(index), true) => (index + 1) % len,
            (Some(index), false) => (index + len - 1) % len,
        };
        self.example = Some(index);
        self.input = examples[index].to_string();
    }

    fn adjust_weight(&mut self, delta: i64) {
        if let Some(priority) = self.priorities.get_mut(self.selected) {
            priority.weight = clamp_weight(i64::from(priority.weight) + delta);
        }
    }

    fn remove_selected(&mut self) {
        if self.selected < self.priorities.len() {
            self.priorities.remove(self.selected);
            self.selected = self.selected.min(self.priorities.len().saturating_sub(1));
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NewBlockField {
    Title,
    Category,
    Start,
    End,
}

#[derive(Clone, Debug)]
pub struct NewBlockPopup {
    pub title: String,
    pub category: BlockCategory,
    pub start: String,
    pub end: String,
    pub field: NewBlockField,
}

impl NewBlockPopup {
    fn at_hour(hour: u32) -> Self {
        let end = if hour + 1 < projection::HOURS_PER_DAY {
            format!("{:02}:00", hour + 1)
        } else {
            "23:59".to_string()
        };
        Self {
            title: String::new(),
            category: BlockCategory::Focus,
            start: format!("{hour:02}:00"),
            end,
            field: NewBlockField::Title,
        }
    }

    fn active_text(&mut self) -> Option<&mut String> {
        match self.field {
            NewBlockField::Title => Some(&mut self.title),
            NewBlockField::Start => Some(&mut self.start),
            NewBlockField::End => Some(&mut self.end),
            NewBlockField::Category => None,
        }
    }
}

/// Magic fill: one suggestion round, the user's picks, and the staged apply.
pub struct MagicFillPopup {
    pending: Option<PendingSuggestions>,
    pub suggestions: Vec<NewTimeBlock>,
    /// Indices into `suggestions`, in the order they were picked.
    pub chosen: Vec<usize>,
    pub cursor: usize,
    pub notice: Option<String>,
    pub staging: bool,
    token: CancelToken,
}

impl MagicFillPopup {
    fn loading(pending: PendingSuggestions) -> Self {
        Self {
            pending: Some(pending),
            suggestions: Vec::new(),
            chosen: Vec::new(),
            cursor: 0,
            notice: None,
            staging: false,
            token: CancelToken::new(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_chosen(&self, index: usize) -> bool {
        self.chosen.contains(&index)
    }

    fn receive(&mut self, outcome: SuggestionOutcome) {
        self.pending = None;
        self.suggestions = outcome.blocks;
        self.notice = outcome.notice;
        self.chosen.clear();
        self.cursor = 0;
    }

    fn toggle_current(&mut self) {
        if self.cursor >= self.suggestions.len() {
            return;
        }
        match self.chosen.iter().position(|index| *index == self.cursor) {
            Some(position) => {
                self.chosen.remove(position);
            }
            None => self.chosen.push(self.cursor),
        }
    }

    fn choose_all(&mut self) {
        self.chosen = (0..self.suggestions.len()).collect();
    }

    fn chosen_blocks(&self) -> Vec<NewTimeBlock> {
        self.chosen
            .iter()
            .filter_map(|index| self.suggestions.get(*index).cloned())
            .collect()
    }
}

impl App {
    pub fn new(store: Store, source: Arc<dyn SuggestionSource>, stage_interval: Duration) -> Self {
        let view = if store.profile().has_completed_onboarding {
            AppView::Day
        } else {
            AppView::Onboarding
        };
        let now = Local::now();
        Self {
            running: true,
            store,
            view,
            selected_hour: now.hour(),
            selected_date: now.date_naive(),
            status: None,
            onboarding: OnboardingDraft::default(),
            new_block_popup: None,
            magic_fill: None,
            source,
            stage_interval,
            staged: None,
        }
    }

    /// Central update function - process an event and mutate state.
    pub fn update(&mut self, event: AppEvent) {
        match event {
            AppEvent::Tick => self.tick_at(Instant::now()),
            AppEvent::KeyPress(key) => self.handle_key(key),
        }
    }

    /// Block drawn under the hour cursor, if any.
    pub fn selected_block(&self) -> Option<&TimeBlock> {
        projection::block_covering(self.store.blocks(), self.selected_hour)
    }

    /// Blocks still waiting in the staged apply.
    pub fn staged_remaining(&self) -> usize {
        self.staged.as_ref().map_or(0, StagedApply::remaining)
    }

    pub(crate) fn tick_at(&mut self, now: Instant) {
        if let Some(popup) = self.magic_fill.as_mut() {
            let outcome = popup.pending.as_ref().and_then(PendingSuggestions::try_take);
            if let Some(outcome) = outcome {
                if let Some(notice) = &outcome.notice {
                    self.status = Some(notice.clone());
                }
                popup.receive(outcome);
            }
        }

        let Some(staged) = self.staged.as_mut() else {
            return;
        };
        staged.apply_due(&mut self.store, now);
        if staged.is_finished() {
            let count = staged.applied().len();
            self.staged = None;
            if self.magic_fill.as_ref().is_some_and(|popup| popup.staging) {
                self.magic_fill = None;
            }
            info!(count, "magic fill applied");
            self.status = Some(format!("Added {count} block(s)."));
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        if self.new_block_popup.is_some() {
            self.handle_new_block_key(key);
            return;
        }
        if self.magic_fill.is_some() {
            self.handle_magic_fill_key(key);
            return;
        }

        match self.view {
            AppView::Onboarding => self.handle_onboarding_key(key),
            AppView::Help => match key {
                KeyCode::Char('q') => self.running = false,
                KeyCode::Char('?') | KeyCode::Esc => self.view = AppView::Day,
                _ => {}
            },
            AppView::Day => self.handle_day_key(key),
        }
    }

    fn handle_day_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') => self.running = false,
            KeyCode::Char('?') => self.view = AppView::Help,
            KeyCode::Up => {
                self.selected_hour = self.selected_hour.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected_hour + 1 < projection::HOURS_PER_DAY {
                    self.selected_hour += 1;
                }
            }
            KeyCode::Left => {
                if let Some(date) = self.selected_date.pred_opt() {
                    self.selected_date = date;
                }
            }
            KeyCode::Right => {
                if let Some(date) = self.selected_date.succ_opt() {
                    self.selected_date = date;
                }
            }
            KeyCode::Char('t') => self.selected_date = Local::now().date_naive(),
            KeyCode::Char('c') => self.set_selected_status(BlockStatus::Completed),
            KeyCode::Char('x') => self.set_selected_status(BlockStatus::Distracted),
            KeyCode::Char('p') => self.set_selected_status(BlockStatus::Planned),
            KeyCode::Char('d') => self.delete_selected(),
            KeyCode::Char('n') => {
                self.new_block_popup = Some(NewBlockPopup::at_hour(self.selected_hour));
                self.clear_status();
            }
            KeyCode::Char('m') => self.open_magic_fill(),
            KeyCode::Esc => self.clear_status(),
            _ => {}
        }
    }

    fn selected_block_id(&self) -> Option<BlockId> {
        self.selected_block().map(|block| block.id)
    }

    fn set_selected_status(&mut self, status: BlockStatus) {
        let Some(id) = self.selected_block_id() else {
            self.status = Some("No block at this hour.".to_string());
            return;
        };
        self.store.update_time_block(id, TimeBlockPatch::status(status));
        self.status = Some(format!("Marked {status}."));
    }

    fn delete_selected(&mut self) {
        let Some(id) = self.selected_block_id() else {
            self.status = Some("No block at this hour.".to_string());
            return;
        };
        self.store.delete_time_block(id);
        self.status = Some("Block deleted.".to_string());
    }

    fn handle_onboarding_key(&mut self, key: KeyCode) {
        let draft = &mut self.onboarding;
        match key {
            KeyCode::Esc => self.running = false,
            KeyCode::Tab => {
                draft.domain = draft.domain.next();
                draft.example = None;
            }
            KeyCode::Right => draft.cycle_example(true),
            KeyCode::Left => draft.cycle_example(false),
            KeyCode::Up => draft.select_prev(),
            KeyCode::Down => draft.select_next(),
            KeyCode::Delete => draft.remove_selected(),
            KeyCode::Backspace => {
                draft.input.pop();
                draft.example = None;
            }
            KeyCode::Char('+') if draft.input.is_empty() => draft.adjust_weight(1),
            KeyCode::Char('-') if draft.input.is_empty() => draft.adjust_weight(-1),
            KeyCode::Char(ch) => {
                if !ch.is_control() {
                    draft.input.push(ch);
                    draft.example = None;
                }
            }
            KeyCode::Enter => {
                let name = draft.input.trim().to_string();
                if name.is_empty() {
                    self.finish_onboarding();
                } else {
                    draft.priorities.push(Priority::new(draft.domain, name));
                    draft.selected = draft.priorities.len() - 1;
                    draft.input.clear();
                    draft.example = None;
                }
            }
            _ => {}
        }
    }

    fn finish_onboarding(&mut self) {
        let priorities = std::mem::take(&mut self.onboarding.priorities);
        self.store.complete_onboarding(priorities);
        self.onboarding = OnboardingDraft::default();
        self.view = AppView::Day;
        self.status = Some("Welcome! Press n to add a block or m for magic fill.".to_string());
    }

    fn handle_new_block_key(&mut self, key: KeyCode) {
        let Some(popup) = self.new_block_popup.as_mut() else {
            return;
        };
        match key {
            KeyCode::Esc => {
                self.new_block_popup = None;
                self.clear_status();
            }
            KeyCode::Enter => self.apply_new_block_popup(),
            KeyCode::Tab => {
                popup.field = match popup.field {
                    NewBlockField::Title => NewBlockField::Category,
                    NewBlockField::Category => NewBlockField::Start,
                    NewBlockField::Start => NewBlockField::End,
                    NewBlockField::End => NewBlockField::Title,
                };
            }
            KeyCode::Up | KeyCode::Down | KeyCode::Char(' ')
                if popup.field == NewBlockField::Category =>
            {
                popup.category = popup.category.next();
            }
            KeyCode::Backspace | KeyCode::Delete => {
                if let Some(text) = popup.active_text() {
                    text.pop();
                }
            }
            KeyCode::Char(ch) => {
                if ch.is_control() {
                    return;
                }
                if let Some(text) = popup.active_text() {
                    text.push(ch);
                }
            }
            _ => {}
        }
    }

    fn apply_new_block_popup(&mut self) {
        let Some(popup) = self.new_block_popup.take() else {
            return;
        };

        let title = popup.title.trim().to_string();
        if title.is_empty() {
            self.status = Some("Title is required.".to_string());
            self.new_block_popup = Some(popup);
            return;
        }
        let (Some(start), Some(end)) = (parse_clock(&popup.start), parse_clock(&popup.end)) else {
            self.status = Some("Times must look like HH:mm.".to_string());
            self.new_block_popup = Some(popup);
            return;
        };
        if start >= end {
            self.status = Some("Start time must be before end time.".to_string());
            self.new_block_popup = Some(popup);
            return;
        }

        self.store.add_time_block(NewTimeBlock::planned(
            title,
            popup.category,
            format_clock(start),
            format_clock(end),
        ));
        self.status = Some("Block added.".to_string());
    }

    fn open_magic_fill(&mut self) {
        let request = SuggestionRequest {
            priorities: self.store.profile().priorities.clone(),
            voice_input: None,
            current_time: Some(Local::now().format("%H:%M").to_string()),
        };
        let pending = suggest::spawn_fetch(Arc::clone(&self.source), request);
        self.magic_fill = Some(MagicFillPopup::loading(pending));
        self.clear_status();
    }

    fn handle_magic_fill_key(&mut self, key: KeyCode) {
        let Some(popup) = self.magic_fill.as_mut() else {
            return;
        };
        if key == KeyCode::Esc {
            popup.token.cancel();
            self.magic_fill = None;
            self.clear_status();
            return;
        }
        if popup.staging {
            return;
        }
        match key {
            KeyCode::Char('r') => self.open_magic_fill(),
            KeyCode::Up => popup.cursor = popup.cursor.saturating_sub(1),
            KeyCode::Down => {
                if popup.cursor + 1 < popup.suggestions.len() {
                    popup.cursor += 1;
                }
            }
            KeyCode::Char(' ') => popup.toggle_current(),
            KeyCode::Char('a') => popup.choose_all(),
            KeyCode::Enter => self.apply_magic_fill(Instant::now()),
            _ => {}
        }
    }

    /// Clears the day and stages the picked suggestions.
    fn apply_magic_fill(&mut self, now: Instant) {
        let Some(popup) = self.magic_fill.as_mut() else {
            return;
        };
        if popup.is_loading() {
            return;
        }
        let blocks = popup.chosen_blocks();
        if blocks.is_empty() {
            self.status = Some("Pick at least one suggestion.".to_string());
            return;
        }
        popup.staging = true;
        let token = popup.token.clone();
        self.store.clear_time_blocks();
        self.staged = Some(StagedApply::new(blocks, now, self.stage_interval, token));
        self.status = Some("Adding blocks...".to_string());
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::config::SuggestionsConfig;
    use crate::db;
    use crate::suggest::fallback_blocks;

    fn app() -> App {
        let store = Store::load(db::init_in_memory().expect("db"));
        let source = suggest::build_source(&SuggestionsConfig::default());
        App::new(store, source, Duration::from_millis(100))
    }

    fn onboarded_app() -> App {
        let mut app = app();
        app.store.complete_onboarding(Vec::new());
        app.view = AppView::Day;
        app
    }

    fn press(app: &mut App, keys: &[KeyCode]) {
        for key in keys {
            app.update(AppEvent::KeyPress(*key));
        }
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.update(AppEvent::KeyPress(KeyCode::Char(ch)));
        }
    }

    fn wait_for_suggestions(app: &mut App) {
        for _ in 0..200 {
            app.tick_at(Instant::now());
            if app.magic_fill.as_ref().is_some_and(|popup| !popup.is_loading()) {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("suggestions never arrived");
    }

    #[test]
    fn starts_on_onboarding_until_completed() {
        assert_eq!(app().view, AppView::Onboarding);
        assert_eq!(onboarded_app().view, AppView::Day);
    }

    #[test]
    fn onboarding_collects_weighted_priorities() {
        let mut app = app();
        type_text(&mut app, "Health");
        press(&mut app, &[KeyCode::Enter, KeyCode::Char('+'), KeyCode::Tab, KeyCode::Tab]);
        type_text(&mut app, "Career");
        press(&mut app, &[KeyCode::Enter, KeyCode::Enter]);

        assert_eq!(app.view, AppView::Day);
        let profile = app.store.profile();
        assert!(profile.has_completed_onboarding);
        assert_eq!(profile.priorities.len(), 2);
        assert_eq!(profile.priorities[0].name, "Health");
        assert_eq!(profile.priorities[0].weight, 4);
        assert_eq!(profile.priorities[1].domain, PriorityDomain::Work);
    }

    #[test]
    fn onboarding_offers_domain_examples() {
        let mut app = app();
        press(&mut app, &[KeyCode::Tab, KeyCode::Tab, KeyCode::Right, KeyCode::Right]);
        assert_eq!(app.onboarding.input, "Meetings");
        press(&mut app, &[KeyCode::Enter, KeyCode::Left]);
        assert_eq!(app.onboarding.input, "Side Projects");
        press(&mut app, &[KeyCode::Enter, KeyCode::Enter]);

        let names = app
            .store
            .profile()
            .priorities
            .iter()
            .map(|p| (p.domain, p.name.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                (PriorityDomain::Work, "Meetings"),
                (PriorityDomain::Work, "Side Projects"),
            ]
        );
    }

    #[test]
    fn status_keys_act_on_block_under_cursor() {
        let mut app = onboarded_app();
        let id = app.store.add_time_block(NewTimeBlock::planned(
            "Deep Work",
            BlockCategory::Focus,
            "07:00",
            "09:00",
        ));
        app.selected_hour = 8;
        press(&mut app, &[KeyCode::Char('c')]);
        assert_eq!(
            app.store.block(id).map(|b| b.status),
            Some(BlockStatus::Completed)
        );

        app.selected_hour = 10;
        press(&mut app, &[KeyCode::Char('d')]);
        assert_eq!(app.store.blocks().len(), 1);

        app.selected_hour = 7;
        press(&mut app, &[KeyCode::Char('d')]);
        assert!(app.store.blocks().is_empty());
    }

    #[test]
    fn new_block_popup_prefills_selected_hour() {
        let mut app = onboarded_app();
        app.selected_hour = 14;
        press(&mut app, &[KeyCode::Char('n')]);
        type_text(&mut app, "Inbox zero");
        press(&mut app, &[KeyCode::Tab, KeyCode::Down, KeyCode::Enter]);

        assert!(app.new_block_popup.is_none());
        let block = &app.store.blocks()[0];
        assert_eq!(block.title, "Inbox zero");
        assert_eq!(block.category, BlockCategory::Admin);
        assert_eq!(block.start_time, "14:00");
        assert_eq!(block.end_time, "15:00");
    }

    #[test]
    fn new_block_popup_rejects_inverted_times() {
        let mut app = onboarded_app();
        app.selected_hour = 9;
        press(&mut app, &[KeyCode::Char('n')]);
        type_text(&mut app, "Backwards");
        press(&mut app, &[KeyCode::Tab, KeyCode::Tab]);
        press(&mut app, &[KeyCode::Backspace; 5]);
        type_text(&mut app, "11:00");
        press(&mut app, &[KeyCode::Enter]);

        assert!(app.new_block_popup.is_some());
        assert!(app.store.blocks().is_empty());
    }

    #[test]
    fn magic_fill_replaces_day_with_picked_suggestions() {
        let mut app = onboarded_app();
        app.store.add_time_block(NewTimeBlock::planned(
            "Old",
            BlockCategory::Rest,
            "01:00",
            "02:00",
        ));
        press(&mut app, &[KeyCode::Char('m')]);
        wait_for_suggestions(&mut app);
        assert!(app.status.is_some());

        press(&mut app, &[KeyCode::Char('a'), KeyCode::Enter]);
        assert!(app.store.blocks().is_empty());

        app.tick_at(Instant::now() + Duration::from_secs(60));
        assert!(app.magic_fill.is_none());
        assert_eq!(app.staged_remaining(), 0);
        let titles = app
            .store
            .blocks()
            .iter()
            .map(|b| b.title.clone())
            .collect::<Vec<_>>();
        let expected = fallback_blocks()
            .into_iter()
            .map(|b| b.title)
            .collect::<Vec<_>>();
        assert_eq!(titles, expected);
    }

    #[test]
    fn closing_magic_fill_cancels_staging() {
        let mut app = onboarded_app();
        press(&mut app, &[KeyCode::Char('m')]);
        wait_for_suggestions(&mut app);
        press(&mut app, &[KeyCode::Char(' '), KeyCode::Down, KeyCode::Char(' ')]);
        press(&mut app, &[KeyCode::Enter, KeyCode::Esc]);

        app.tick_at(Instant::now() + Duration::from_secs(60));
        assert!(app.magic_fill.is_none());
        assert!(app.store.blocks().is_empty());
    }

    #[test]
    fn magic_fill_needs_a_pick() {
        let mut app = onboarded_app();
        press(&mut app, &[KeyCode::Char('m')]);
        wait_for_suggestions(&mut app);
        press(&mut app, &[KeyCode::Enter]);
        assert!(app.magic_fill.as_ref().is_some_and(|popup| !popup.staging));
    }

    #[test]
    fn arrows_move_date_and_t_returns_to_today() {
        let mut app = onboarded_app();
        let today = app.selected_date;
        press(&mut app, &[KeyCode::Right, KeyCode::Right, KeyCode::Left]);
        assert_eq!(app.selected_date, today.succ_opt().expect("next day"));
        press(&mut app, &[KeyCode::Char('t')]);
        assert_eq!(app.selected_date, Local::now().date_naive());
    }
}
