use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use std::time::Duration;

use super::App;

pub fn poll_event(timeout: Duration) -> anyhow::Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Keys stand in for the notifications a dashboard host would broadcast.
pub fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match (code, modifiers) {
        (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
            app.running = false;
        }
        (KeyCode::Char('w'), _) => app.show_week(),
        (KeyCode::Char('m'), _) => app.show_next_module(),
        (KeyCode::Char('h'), _) | (KeyCode::Esc, _) => app.hide(),
        (KeyCode::Char('p'), _) => app.toggle_suspend(),
        (KeyCode::Char('r'), _) => app.refresh(),
        (KeyCode::Char('s'), _) => app.start_sync(),
        _ => {}
    }
}
