use crate::application::{
    ActionError, AdminApp, AdminMode, AdminScreen, FormRow, PortalApp, PortalMode, PortalScreen, Review, TextInput,
};
use crate::infrastructure::ApplicationService;
use crossterm::event::{KeyCode, KeyModifiers};

pub struct InputHandler;

/// Puts the outcome of an action into the status line.
fn report(status_message: &mut Option<String>, result: Result<(), ActionError>) {
    if let Err(e) = result {
        *status_message = Some(e.to_string());
    }
}

/// Line editing shared by every prompt. Returns `false` for keys it ignores.
fn edit_text(input: &mut TextInput, key: KeyCode) -> bool {
    match key {
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Left => input.left(),
        KeyCode::Right => input.right(),
        KeyCode::Home => input.home(),
        KeyCode::End => input.end(),
        KeyCode::Char(c) => input.insert(c),
        _ => return false,
    }
    true
}

fn scroll_help(help_scroll: &mut usize, key: KeyCode) -> bool {
    match key {
        KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('?') | KeyCode::Char('q') => return true,
        KeyCode::Up | KeyCode::Char('k') => *help_scroll = help_scroll.saturating_sub(1),
        KeyCode::Down | KeyCode::Char('j') => *help_scroll += 1,
        KeyCode::PageUp => *help_scroll = help_scroll.saturating_sub(5),
        KeyCode::PageDown => *help_scroll += 5,
        KeyCode::Home => *help_scroll = 0,
        _ => {}
    }
    false
}

impl InputHandler {
    pub fn handle_portal_key<S: ApplicationService>(app: &mut PortalApp<S>, key: KeyCode, modifiers: KeyModifiers) {
        match app.mode.clone() {
            PortalMode::Normal => match app.screen {
                PortalScreen::Search => Self::handle_portal_search_screen(app, key),
                PortalScreen::Application => Self::handle_portal_application_screen(app, key, modifiers),
            },
            PortalMode::Searching => match key {
                KeyCode::Enter => {
                    let result = app.finish_search();
                    report(&mut app.status_message, result);
                }
                KeyCode::Esc => app.cancel_prompt(),
                _ => {
                    edit_text(&mut app.input, key);
                }
            },
            PortalMode::Editing(_) => match key {
                KeyCode::Enter => app.finish_editing(),
                KeyCode::Esc => app.cancel_prompt(),
                _ => {
                    edit_text(&mut app.input, key);
                }
            },
            PortalMode::UploadPath(_) => match key {
                KeyCode::Enter => {
                    let result = app.finish_upload();
                    report(&mut app.status_message, result);
                }
                KeyCode::Esc => app.cancel_prompt(),
                _ => {
                    edit_text(&mut app.input, key);
                }
            },
            PortalMode::ConfirmDelete(_) => match key {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    let result = app.confirm_delete();
                    report(&mut app.status_message, result);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.cancel_prompt();
                    app.status_message = None;
                }
                _ => {}
            },
            PortalMode::Help => {
                if scroll_help(&mut app.help_scroll, key) {
                    app.mode = PortalMode::Normal;
                }
            }
        }
    }

    fn handle_portal_search_screen<S: ApplicationService>(app: &mut PortalApp<S>, key: KeyCode) {
        app.status_message = None;
        let result = match key {
            KeyCode::Char('/') => {
                app.start_search();
                Ok(())
            }
            KeyCode::Up | KeyCode::Char('k') => {
                app.select_previous_result();
                Ok(())
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.select_next_result();
                Ok(())
            }
            KeyCode::Enter => app.open_selected(),
            KeyCode::Char('n') => {
                app.new_application();
                Ok(())
            }
            KeyCode::Char('r') => app.search(),
            KeyCode::F(1) | KeyCode::Char('?') => {
                app.mode = PortalMode::Help;
                app.help_scroll = 0;
                Ok(())
            }
            _ => Ok(()),
        };
        report(&mut app.status_message, result);
    }

    fn handle_portal_application_screen<S: ApplicationService>(
        app: &mut PortalApp<S>,
        key: KeyCode,
        modifiers: KeyModifiers,
    ) {
        if modifiers.contains(KeyModifiers::CONTROL) && key == KeyCode::Char('s') {
            let result = app.submit();
            report(&mut app.status_message, result);
            return;
        }

        app.status_message = None;
        let result = match key {
            KeyCode::Up | KeyCode::Char('k') => {
                app.move_cursor_up();
                Ok(())
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.move_cursor_down();
                Ok(())
            }
            KeyCode::Enter | KeyCode::F(2) => app.activate_current_row(),
            KeyCode::Char('c') => {
                match app.form.current_row() {
                    Some(FormRow::Section(file_type)) | Some(FormRow::File { file_type, .. }) => {
                        app.cycle_choice(file_type)
                    }
                    _ => {}
                }
                Ok(())
            }
            KeyCode::Char('s') => app.submit(),
            KeyCode::Char('r') => app.refresh(),
            KeyCode::Esc => {
                app.back_to_search();
                Ok(())
            }
            KeyCode::F(1) | KeyCode::Char('?') => {
                app.mode = PortalMode::Help;
                app.help_scroll = 0;
                Ok(())
            }
            _ => Ok(()),
        };
        report(&mut app.status_message, result);
    }

    pub fn handle_admin_key<S: ApplicationService>(app: &mut AdminApp<S>, key: KeyCode, _modifiers: KeyModifiers) {
        match app.mode {
            AdminMode::Normal => match app.screen {
                AdminScreen::List => Self::handle_admin_list_screen(app, key),
                AdminScreen::Detail => Self::handle_admin_detail_screen(app, key),
            },
            AdminMode::Searching => match key {
                KeyCode::Enter => {
                    let result = app.finish_search();
                    report(&mut app.status_message, result);
                }
                KeyCode::Esc => app.cancel_prompt(),
                _ => {
                    edit_text(&mut app.input, key);
                }
            },
            AdminMode::ExportPath => match key {
                KeyCode::Enter => {
                    let result = app.finish_export();
                    report(&mut app.status_message, result);
                }
                KeyCode::Esc => app.cancel_prompt(),
                _ => {
                    edit_text(&mut app.input, key);
                }
            },
            AdminMode::ConfirmComplete => match key {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    let result = app.mark_complete();
                    report(&mut app.status_message, result);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_prompt(),
                _ => {}
            },
            AdminMode::ConfirmDelete(_) => match key {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    let result = app.confirm_delete();
                    report(&mut app.status_message, result);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_prompt(),
                _ => {}
            },
            AdminMode::Help => {
                if scroll_help(&mut app.help_scroll, key) {
                    app.mode = AdminMode::Normal;
                }
            }
        }
    }

    fn handle_admin_list_screen<S: ApplicationService>(app: &mut AdminApp<S>, key: KeyCode) {
        let result = match key {
            KeyCode::Char('/') => {
                app.start_search();
                Ok(())
            }
            KeyCode::Char('f') => app.cycle_filter(),
            KeyCode::Up | KeyCode::Char('k') => {
                app.select_previous();
                Ok(())
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.select_next();
                Ok(())
            }
            KeyCode::Enter => app.open_selected(),
            KeyCode::Char('r') => app.load_list(),
            KeyCode::Char('e') => {
                app.start_export();
                Ok(())
            }
            KeyCode::F(1) | KeyCode::Char('?') => {
                app.mode = AdminMode::Help;
                app.help_scroll = 0;
                Ok(())
            }
            _ => Ok(()),
        };
        report(&mut app.status_message, result);
    }

    fn handle_admin_detail_screen<S: ApplicationService>(app: &mut AdminApp<S>, key: KeyCode) {
        app.status_message = None;
        let result = match key {
            KeyCode::Up | KeyCode::Char('k') => {
                app.select_previous();
                Ok(())
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.select_next();
                Ok(())
            }
            KeyCode::Char('a') => app.review_selected(Review::Accept),
            KeyCode::Char('x') => app.review_selected(Review::Reject),
            KeyCode::Char('d') => app.start_delete(),
            KeyCode::Char('c') => app.start_mark_complete(),
            KeyCode::Char('r') => app.refresh(),
            KeyCode::Esc => app.back_to_list(),
            KeyCode::F(1) | KeyCode::Char('?') => {
                app.mode = AdminMode::Help;
                app.help_scroll = 0;
                Ok(())
            }
            _ => Ok(()),
        };
        report(&mut app.status_message, result);
    }
}
