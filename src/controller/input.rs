//! Key event handling

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::AppController;

impl AppController {
    pub async fn handle_key_event(&self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        let model = self.model.lock().await;

        // Handle error message first (blocks all other interactions)
        if model.has_error().await {
            return match key.code {
                KeyCode::Esc | KeyCode::Enter => {
                    model.clear_error().await;
                    Ok(())
                }
                _ => Ok(()),
            }
        }

        // Handle help popup
        if model.is_help_popup_open().await {
            return match key.code {
                KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('H') => {
                    model.hide_help_popup().await;
                    Ok(())
                }
                _ => Ok(()),
            }
        }

        // Handle style picker modal
        if model.is_style_picker_open().await {
            return match key.code {
                KeyCode::Up => {
                    model.style_picker_move_up().await;
                    Ok(())
                }
                KeyCode::Down => {
                    model.style_picker_move_down().await;
                    Ok(())
                }
                KeyCode::Enter => {
                    model.confirm_style_picker().await;
                    let filter = model.get_style_filter().await;
                    tracing::debug!(filter = %filter.label(), "Style filter picked");
                    Ok(())
                }
                KeyCode::Esc | KeyCode::Char('f') | KeyCode::Char('F') => {
                    model.hide_style_picker().await;
                    Ok(())
                }
                _ => Ok(()),
            }
        }

        // Global keybindings
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                model.set_should_quit(true).await;
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                model.set_should_quit(true).await;
            }
            KeyCode::Up => {
                model.listing_move_up().await;
            }
            KeyCode::Down => {
                model.listing_move_down().await;
            }
            KeyCode::Left => {
                model.cycle_style_filter(false).await;
            }
            KeyCode::Right => {
                model.cycle_style_filter(true).await;
            }
            KeyCode::Char('f') | KeyCode::Char('F') => {
                model.show_style_picker().await;
            }
            KeyCode::Char('h') | KeyCode::Char('H') => {
                model.show_help_popup().await;
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                drop(model);
                self.toggle_selected_preview().await;
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                drop(model);
                self.stop_all_previews().await;
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                let loading = model.is_loading_listings().await;
                drop(model);
                if loading {
                    tracing::debug!("Reload ignored, fetch already in flight");
                } else {
                    let controller = self.clone();
                    tokio::spawn(async move {
                        controller.reload_listings().await;
                    });
                }
            }
            _ => {}
        }

        Ok(())
    }
}
