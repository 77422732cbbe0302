use anyhow::Result;
use ratatui::widgets::ListState;
use tokio::task::JoinHandle;

use crate::chat::{Conversation, TurnOutcome};
use crate::config::Config;
use crate::groq::{GroqClient, DEFAULT_MODEL};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Conversation state
    pub conversation: Conversation,
    pub pending_turn: Option<JoinHandle<TurnOutcome>>,

    // Chat viewport (updated during render, used for scroll calculations)
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Completion client
    pub client: Option<GroqClient>,
    pub model: String,

    // API key input state (shown on first run when no key is configured)
    pub show_api_key_input: bool,
    pub api_key_input: String,
    pub api_key_cursor: usize,

    // Model picker state
    pub show_model_picker: bool,
    pub available_models: Vec<String>,
    pub model_picker_state: ListState,
}

impl App {
    pub fn new(config: &Config, model_override: Option<String>) -> Result<Self> {
        let client = match config.resolve_api_key() {
            Some(key) => Some(GroqClient::new(&key)?),
            None => None,
        };
        let show_api_key_input = client.is_none();

        let model = model_override
            .or_else(|| config.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self {
            should_quit: false,
            input_mode: InputMode::Editing,

            conversation: Conversation::new(),
            pending_turn: None,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            animation_frame: 0,

            client,
            model,

            show_api_key_input,
            api_key_input: String::new(),
            api_key_cursor: 0,

            show_model_picker: false,
            available_models: Vec::new(),
            model_picker_state: ListState::default(),
        })
    }

    /// Submit the current draft. Spawns one background request per accepted
    /// turn; the Tick handler collects the result. Does nothing while a
    /// request is outstanding or when the draft is blank.
    pub fn submit_draft(&mut self) {
        let Some(client) = self.client.clone() else {
            self.show_api_key_input = true;
            return;
        };

        let Some(payload) = self.conversation.begin_turn() else {
            return;
        };

        self.scroll_to_bottom();

        let model = self.model.clone();
        self.pending_turn = Some(tokio::spawn(async move {
            client.chat(&model, &payload).await
        }));
    }

    /// Collect the outstanding request once it settles (called on Tick).
    pub async fn poll_pending_turn(&mut self) {
        let finished = self
            .pending_turn
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        if let Some(task) = self.pending_turn.take() {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(err) => Err(anyhow::anyhow!("completion task failed: {err}")),
            };
            self.conversation.resolve_turn(outcome);
            self.scroll_to_bottom();
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.conversation.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Chat scrolling

    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    pub fn scroll_to_top(&mut self) {
        self.chat_scroll = 0;
    }

    /// Scroll so the newest message (or the busy indicator) is visible.
    pub fn scroll_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 50 if the
        // first frame hasn't been rendered yet
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in self.conversation.messages() {
            total_lines += 1; // Role line ("Você:" or "IA:")
            for line in msg.content.lines() {
                // Character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1;
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // Blank line after message
        }

        if self.conversation.is_busy() {
            total_lines += 2; // "IA:" + thinking indicator
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        if total_lines > visible_height {
            self.chat_scroll = total_lines.saturating_sub(visible_height);
        }
    }

    // Model picker

    pub fn model_picker_nav_down(&mut self) {
        let len = self.available_models.len();
        if len > 0 {
            let i = self.model_picker_state.selected().unwrap_or(0);
            self.model_picker_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn model_picker_nav_up(&mut self) {
        let i = self.model_picker_state.selected().unwrap_or(0);
        self.model_picker_state.select(Some(i.saturating_sub(1)));
    }

    pub fn select_model(&mut self) {
        if let Some(i) = self.model_picker_state.selected() {
            if let Some(model) = self.available_models.get(i) {
                self.model = model.clone();
                self.show_model_picker = false;
                let _ = Config::save_model(&self.model);
            }
        }
    }
}
