use std::time::{Duration, Instant};

use crossterm::event::{self, Event, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{backend::Backend, layout::Rect, Terminal};

use crate::{
    app::{App, Focus},
    ui,
};

pub fn run<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> anyhow::Result<()> {
    let mut last_draw = Instant::now();
    let heartbeat = Duration::from_millis(500);
    loop {
        if app.dirty || last_draw.elapsed() >= heartbeat {
            terminal.draw(|f| ui::draw(f, app))?;
            app.dirty = false;
            last_draw = Instant::now();
        }
        if matches!(app.focus, Focus::Input) || app.rename.is_some() {
            let _ = terminal.show_cursor();
        } else {
            let _ = terminal.hide_cursor();
        }

        if event::poll(Duration::from_millis(120))? {
            match event::read()? {
                Event::Key(key) => app.on_key(key),
                Event::Paste(s) => app.insert_text(&s),
                Event::Resize(_, _) => app.dirty = true,
                Event::Mouse(me) => on_mouse(app, me),
                _ => {}
            }
        }

        app.on_tick();

        if app.should_quit {
            app.save_state();
            break;
        }
    }
    Ok(())
}

fn contains(area: Rect, x: u16, y: u16) -> bool {
    x >= area.x && x < area.x + area.width && y >= area.y && y < area.y + area.height
}

fn on_mouse(app: &mut App, me: MouseEvent) {
    if app.show_help || app.rename.is_some() || app.confirm.is_some() {
        return;
    }
    let (x, y) = (me.column, me.row);

    if app.chat_area.is_some_and(|a| contains(a, x, y)) {
        match me.kind {
            MouseEventKind::ScrollUp => app.scroll_up(3),
            MouseEventKind::ScrollDown => app.scroll_down(3),
            _ => return,
        }
        app.dirty = true;
        return;
    }

    if let Some(area) = app.sidebar_area.filter(|a| app.show_sidebar && contains(*a, x, y)) {
        match me.kind {
            MouseEventKind::ScrollUp => {
                app.sidebar_scroll = app.sidebar_scroll.saturating_sub(1);
            }
            MouseEventKind::ScrollDown => {
                let max = app.sidebar_max_scroll();
                app.sidebar_scroll = (app.sidebar_scroll + 1).min(max);
            }
            MouseEventKind::Down(MouseButton::Left) => {
                if y > area.y && y + 1 < area.y + area.height {
                    let idx = app.sidebar_scroll as usize + (y - (area.y + 1)) as usize;
                    app.focus = Focus::Sidebar;
                    app.select_thread(idx);
                }
            }
            _ => return,
        }
        app.dirty = true;
        return;
    }

    if let Some(area) = app.context_area.filter(|a| app.show_context && contains(*a, x, y)) {
        if let MouseEventKind::Down(MouseButton::Left) = me.kind {
            if y > area.y && y + 1 < area.y + area.height {
                let idx = (y - (area.y + 1)) as usize;
                if idx < app.context.entries().len() {
                    app.context_current = idx;
                }
                app.focus = Focus::Context;
                app.dirty = true;
            }
        }
    }
}
