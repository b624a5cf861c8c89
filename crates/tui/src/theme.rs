use ratatui::style::Color;

pub struct Theme {
    pub border_focus: Color,
    pub border_inactive: Color,
    pub chat_border: Color,
    pub title: Color,
    pub user: Color,
    pub assistant: Color,
    pub notice: Color,
    pub hint: Color,
    pub selected_fg: Color,
    pub selected_bg: Color,
}

pub const THEME: Theme = Theme {
    border_focus: Color::Magenta,
    border_inactive: Color::DarkGray,
    chat_border: Color::DarkGray,
    title: Color::LightMagenta,
    user: Color::Green,
    assistant: Color::Magenta,
    notice: Color::Yellow,
    hint: Color::DarkGray,
    selected_fg: Color::Black,
    selected_bg: Color::Magenta,
};
