use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, InputMode};
use crate::chat::char_to_byte_index;
use crate::config::Config;
use crate::groq::GroqClient;
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key).await?,
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
            app.poll_pending_turn().await;
        }
    }
    Ok(())
}

async fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return Ok(());
    }

    // Popups take priority over the chat screen
    if app.show_api_key_input {
        handle_api_key_input(app, key);
        return Ok(());
    }
    if app.show_model_picker {
        handle_model_picker(app, key);
        return Ok(());
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key).await,
        InputMode::Editing => handle_editing_mode(app, key),
    }

    Ok(())
}

async fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Back to typing
        KeyCode::Char('i') | KeyCode::Tab => {
            app.input_mode = InputMode::Editing;
            app.conversation.cursor_end();
        }

        // Chat scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(),
        KeyCode::Char('g') => app.scroll_to_top(),
        KeyCode::Char('G') => app.scroll_to_bottom(),

        // Open model picker
        KeyCode::Char('M') => {
            if let Some(client) = app.client.clone() {
                app.available_models = client.list_models().await.unwrap_or_default();
                if !app.available_models.is_empty() {
                    // Select current model if in list, otherwise first
                    let current_idx = app
                        .available_models
                        .iter()
                        .position(|m| m == &app.model)
                        .unwrap_or(0);
                    app.model_picker_state.select(Some(current_idx));
                    app.show_model_picker = true;
                }
            }
        }

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            app.submit_draft();
        }
        KeyCode::Backspace => {
            app.conversation.backspace();
        }
        KeyCode::Delete => {
            app.conversation.delete();
        }
        KeyCode::Left => {
            app.conversation.cursor_left();
        }
        KeyCode::Right => {
            app.conversation.cursor_right();
        }
        KeyCode::Home => {
            app.conversation.cursor_home();
        }
        KeyCode::End => {
            app.conversation.cursor_end();
        }
        // Scroll the chat log without leaving the input
        KeyCode::Up => app.scroll_up(),
        KeyCode::Down => app.scroll_down(),
        KeyCode::Char(c) => {
            app.conversation.insert_char(c);
        }
        _ => {}
    }
}

fn handle_api_key_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.show_api_key_input = false;
            app.api_key_input.clear();
            app.api_key_cursor = 0;
        }
        KeyCode::Enter => {
            if !app.api_key_input.is_empty() {
                if let Ok(client) = GroqClient::new(&app.api_key_input) {
                    let mut config = Config::load().unwrap_or_else(|_| Config::new());
                    config.api_key = Some(app.api_key_input.clone());
                    let _ = config.save();
                    app.client = Some(client);
                }
                app.show_api_key_input = false;
                app.api_key_input.clear();
                app.api_key_cursor = 0;
            }
        }
        KeyCode::Backspace => {
            if app.api_key_cursor > 0 {
                app.api_key_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.api_key_input, app.api_key_cursor);
                app.api_key_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.api_key_cursor = app.api_key_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.api_key_input.chars().count();
            app.api_key_cursor = (app.api_key_cursor + 1).min(char_count);
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.api_key_input, app.api_key_cursor);
            app.api_key_input.insert(byte_pos, c);
            app.api_key_cursor += 1;
        }
        _ => {}
    }
}

fn handle_model_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.show_model_picker = false;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.model_picker_nav_down();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.model_picker_nav_up();
        }
        KeyCode::Enter => {
            app.select_model();
        }
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => {
            app.scroll_down();
            app.scroll_down();
            app.scroll_down();
        }
        MouseEventKind::ScrollUp => {
            app.scroll_up();
            app.scroll_up();
            app.scroll_up();
        }
        _ => {}
    }
}
