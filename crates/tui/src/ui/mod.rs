use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap,
    },
    Frame,
};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::app::{App, ConfirmAction, ConfirmState, Focus, RenameState, Role};
use crate::strings::{
    build_status_line, build_stick_label, confirm_delete_thread_message, help_lines_ascii,
    StatusInfo, EMPTY_CHAT, INPUT_HINT, NO_CONTEXT, PREFIX_ASSISTANT, PREFIX_NOTICE, PREFIX_USER,
    TITLE_CHAT, TITLE_CONFIRM, TITLE_CONTEXT, TITLE_HELP, TITLE_INPUT, TITLE_RENAME,
    TITLE_THREADS,
};
use crate::theme::THEME;

pub fn draw(f: &mut Frame, app: &mut App) {
    // Layout: optional left sidebar (26), main, optional right context (32)
    let mut constraints: Vec<Constraint> = Vec::new();
    if app.show_sidebar {
        constraints.push(Constraint::Length(26));
    }
    constraints.push(Constraint::Min(10));
    if app.show_context {
        constraints.push(Constraint::Length(32));
    }
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(f.area());
    let mut idx = 0usize;
    if app.show_sidebar {
        app.sidebar_area = Some(chunks[idx]);
        draw_sidebar(f, chunks[idx], app);
        idx += 1;
    } else {
        app.sidebar_area = None;
    }
    let main_area = chunks[idx];
    idx += 1;
    draw_main(f, main_area, app);
    if app.show_context {
        app.context_area = Some(chunks[idx]);
        draw_context(f, chunks[idx], app);
    } else {
        app.context_area = None;
    }

    if let Some(state) = &app.rename {
        draw_rename(f, f.area(), state);
    }
    if let Some(confirm) = &app.confirm {
        draw_confirm(f, f.area(), confirm, app);
    }
    if app.show_help {
        draw_help(f, f.area());
    }
}

fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(THEME.border_focus)
    } else {
        Style::default().fg(THEME.border_inactive)
    }
}

fn selected_style(focused: bool) -> Style {
    if focused {
        Style::default()
            .fg(THEME.selected_fg)
            .bg(THEME.selected_bg)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
            .fg(THEME.border_focus)
            .add_modifier(Modifier::BOLD)
    }
}

fn title_span(text: &str) -> Span<'_> {
    Span::styled(
        text,
        Style::default()
            .fg(THEME.title)
            .add_modifier(Modifier::BOLD),
    )
}

fn inner_rect(area: Rect) -> Rect {
    Rect {
        x: area.x.saturating_add(1),
        y: area.y.saturating_add(1),
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    }
}

fn draw_sidebar(f: &mut Frame, area: Rect, app: &App) {
    let focused = matches!(app.focus, Focus::Sidebar);
    let block = Block::default()
        .title(title_span(TITLE_THREADS))
        .borders(Borders::ALL)
        .border_style(border_style(focused));
    let inner_h = area.height.saturating_sub(2) as usize;
    let start = app.sidebar_scroll as usize;
    let lines: Vec<Line> = app
        .threads
        .iter()
        .enumerate()
        .skip(start)
        .take(inner_h)
        .map(|(i, name)| {
            let current = i == app.current_thread;
            let prefix = if current { "> " } else { "  " };
            let style = if current {
                selected_style(focused)
            } else {
                Style::default()
            };
            Line::from(Span::styled(format!("{}{}", prefix, name), style))
        })
        .collect();
    f.render_widget(Paragraph::new(lines).block(block), area);

    let inner = inner_rect(area);
    let total = app.threads.len();
    if total > inner.height as usize {
        let mut sb_state = ScrollbarState::new(total).position(start);
        let sb = Scrollbar::default().orientation(ScrollbarOrientation::VerticalRight);
        f.render_stateful_widget(sb, inner, &mut sb_state);
    }
}

fn draw_main(f: &mut Frame, area: Rect, app: &mut App) {
    let inner_width = area.width.saturating_sub(2);
    let input_total_lines = measure_total_lines(app.editor.text(), inner_width).max(1) as u16;
    let target_lines = input_total_lines.min(app.input_max_lines);
    // Grow or shrink the input box one line per frame.
    let current = app.input_visible_lines.max(1);
    app.input_visible_lines = if current < target_lines {
        current + 1
    } else if current > target_lines {
        current - 1
    } else {
        current
    };
    let input_height = app.input_visible_lines + 2;

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),
            Constraint::Length(1),
            Constraint::Length(input_height),
        ])
        .split(area);

    app.chat_area = Some(main_chunks[0]);
    draw_chat(f, main_chunks[0], app);
    draw_status(f, main_chunks[1], app, inner_width);
    draw_input(f, main_chunks[2], app, app.input_visible_lines, inner_width);
}

fn draw_context(f: &mut Frame, area: Rect, app: &App) {
    let focused = matches!(app.focus, Focus::Context);
    let block = Block::default()
        .title(title_span(TITLE_CONTEXT))
        .borders(Borders::ALL)
        .border_style(border_style(focused));
    let entries = app.context.entries();
    let lines: Vec<Line> = if entries.is_empty() {
        vec![Line::from(Span::styled(
            NO_CONTEXT,
            Style::default().fg(THEME.hint),
        ))]
    } else {
        entries
            .iter()
            .enumerate()
            .map(|(i, (_, label))| {
                let current = i == app.context_current;
                let prefix = if current { "> " } else { "  " };
                let style = if current {
                    selected_style(focused)
                } else {
                    Style::default()
                };
                Line::from(Span::styled(format!("{}{}", prefix, label), style))
            })
            .collect()
    };
    let para = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(para, area);
}

fn role_style(role: Role) -> Style {
    let color = match role {
        Role::User => THEME.user,
        Role::Assistant => THEME.assistant,
        Role::Notice => THEME.notice,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn draw_chat(f: &mut Frame, area: Rect, app: &mut App) {
    let block = Block::default()
        .title(title_span(TITLE_CHAT))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(THEME.chat_border));

    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);
    app.ensure_chat_wrapped(inner_width);

    if app.messages.is_empty() {
        let greeting = Line::from(Span::styled(EMPTY_CHAT, Style::default().fg(THEME.hint)));
        let para = Paragraph::new(greeting)
            .block(block)
            .wrap(Wrap { trim: false });
        f.render_widget(para, area);
        app.chat_viewport = inner_height;
        return;
    }

    let (viewport, _max_scroll, start) = app.compute_chat_layout(inner_height);
    app.chat_viewport = viewport as u16;

    let mut vis_lines: Vec<Line> = Vec::with_capacity(viewport);
    let mut skip = start;
    for cached in &app.chat_cache {
        if vis_lines.len() >= viewport {
            break;
        }
        if skip >= cached.lines.len() {
            skip -= cached.lines.len();
            continue;
        }
        let prefix = match cached.role {
            Role::User => PREFIX_USER,
            Role::Assistant => PREFIX_ASSISTANT,
            Role::Notice => PREFIX_NOTICE,
        };
        let thinking = cached.role == Role::Assistant && cached.content_len == 0;
        let body_style = match cached.role {
            Role::Notice => Style::default().fg(THEME.notice),
            _ if thinking => Style::default()
                .fg(THEME.hint)
                .add_modifier(Modifier::ITALIC),
            _ => Style::default(),
        };
        for (i, line) in cached.lines.iter().enumerate().skip(skip) {
            if vis_lines.len() >= viewport {
                break;
            }
            // The prefix is ASCII, so its width is also a byte boundary.
            let hb = if i == 0 {
                UnicodeWidthStr::width(prefix).min(line.len())
            } else {
                0
            };
            let (head, body) = line.split_at(hb);
            let mut spans = Vec::with_capacity(2);
            if !head.is_empty() {
                spans.push(Span::styled(head.to_string(), role_style(cached.role)));
            }
            spans.push(Span::styled(body.to_string(), body_style));
            vis_lines.push(Line::from(spans));
        }
        skip = 0;
    }

    f.render_widget(Paragraph::new(vis_lines).block(block), area);

    let inner = inner_rect(area);
    if app.chat_total_lines > inner.height as usize {
        let mut sb_state = ScrollbarState::new(app.chat_total_lines).position(start);
        let sb = Scrollbar::default().orientation(ScrollbarOrientation::VerticalRight);
        f.render_stateful_widget(sb, inner, &mut sb_state);
    }
}

fn draw_input(f: &mut Frame, area: Rect, app: &App, input_visible_lines: u16, inner_width: u16) {
    let focused = matches!(app.focus, Focus::Input) && app.rename.is_none();
    let block = Block::default()
        .title(title_span(TITLE_INPUT))
        .borders(Borders::ALL)
        .border_style(border_style(focused));
    let graphemes: Vec<&str> = app.editor.text().graphemes(true).collect();
    let upto = app.editor.cursor().min(graphemes.len());
    let (line_idx, col_width) = measure_prefix_line_col(&graphemes, upto, inner_width);
    let offset_y = line_idx.saturating_sub(input_visible_lines.saturating_sub(1));

    let para = if app.editor.is_empty() {
        let hint = Line::from(Span::styled(INPUT_HINT, Style::default().fg(THEME.hint)));
        Paragraph::new(hint).block(block).wrap(Wrap { trim: false })
    } else {
        Paragraph::new(app.editor.text().to_string())
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((offset_y, 0))
    };
    f.render_widget(para, area);

    if focused {
        let cursor_x = area.x + 1 + col_width;
        let cursor_y = area.y + 1 + line_idx.saturating_sub(offset_y);
        f.set_cursor_position(Position::new(cursor_x, cursor_y));
    }
}

fn draw_status(f: &mut Frame, area: Rect, app: &App, inner_width: u16) {
    let stick = build_stick_label(app.chat_scroll, app.stick_to_bottom);
    let graphemes: Vec<&str> = app.editor.text().graphemes(true).collect();
    let upto = app.editor.cursor().min(graphemes.len());
    let (line_idx, col_width) = measure_prefix_line_col(&graphemes, upto, inner_width);
    let focus = match app.focus {
        Focus::Input => "Input",
        Focus::Sidebar => "Threads",
        Focus::Context => "Context",
    };
    let model = app.model_label();
    let info = StatusInfo {
        stick: &stick,
        focus,
        line: line_idx + 1,
        col: col_width + 1,
        thread: app.current_thread_name(),
        model: &model,
        keys: app.client.as_ref().map(|c| c.credential_count()),
        context_len: app.context.entries().len(),
        waiting: app.is_waiting(),
        usage: app.last_usage,
    };
    let tips = build_status_line(&info, area.width);
    let style = if app.is_waiting() {
        Style::default().fg(THEME.notice)
    } else {
        Style::default().fg(THEME.hint)
    };
    f.render_widget(Paragraph::new(Line::from(Span::styled(tips, style))), area);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(80, 80, area);
    let block = Block::default()
        .title(title_span(TITLE_HELP))
        .borders(Borders::ALL);
    let lines = help_lines_ascii()
        .iter()
        .map(|s| Line::from(*s))
        .collect::<Vec<Line>>();
    let para = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, popup_area);
    f.render_widget(para, popup_area);
}

fn draw_rename(f: &mut Frame, area: Rect, state: &RenameState) {
    let popup_area = centered_rect(60, 30, area);
    let block = Block::default()
        .title(title_span(TITLE_RENAME))
        .borders(Borders::ALL);
    let lines = vec![
        Line::from("Enter new name, Enter to confirm, Esc to cancel:"),
        Line::from(format!(">> {}", state.editor.text())),
    ];
    f.render_widget(Clear, popup_area);
    f.render_widget(Paragraph::new(lines).block(block), popup_area);
    let typed: String = state
        .editor
        .text()
        .graphemes(true)
        .take(state.editor.cursor())
        .collect();
    let cursor_x = popup_area.x + 4 + UnicodeWidthStr::width(typed.as_str()) as u16;
    let cursor_y = popup_area.y + 2;
    f.set_cursor_position(Position::new(cursor_x, cursor_y));
}

fn draw_confirm(f: &mut Frame, area: Rect, confirm: &ConfirmState, app: &App) {
    let popup_area = centered_rect(60, 30, area);
    let block = Block::default()
        .title(title_span(TITLE_CONFIRM))
        .borders(Borders::ALL);
    let text = match confirm.action {
        ConfirmAction::DeleteThread(idx) => {
            let name = app.threads.get(idx).cloned().unwrap_or_default();
            confirm_delete_thread_message(&name)
        }
    };
    let para = Paragraph::new(Line::from(text))
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, popup_area);
    f.render_widget(para, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vert[1]);
    horiz[1]
}

fn measure_total_lines(s: &str, width: u16) -> usize {
    let graphemes: Vec<&str> = s.graphemes(true).collect();
    measure_prefix_line_col(&graphemes, graphemes.len(), width).0 as usize + 1
}

// (line, column) of the cursor after `upto` graphemes, wrapping at `width`.
fn measure_prefix_line_col(graphemes: &[&str], upto: usize, width: u16) -> (u16, u16) {
    if width == 0 {
        return (0, 0);
    }
    let mut line = 0usize;
    let mut col = 0usize;
    for g in graphemes.iter().take(upto) {
        if *g == "\n" {
            line += 1;
            col = 0;
            continue;
        }
        let w = UnicodeWidthStr::width(*g);
        if col + w > width as usize {
            line += 1;
            col = 0;
        }
        col += w;
    }
    (line as u16, col as u16)
}
