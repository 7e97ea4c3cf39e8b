use ratatui::style::Color;

#[derive(Clone, Copy, Debug)]
pub struct Palette {
    pub fg: Color,
    pub muted: Color,
    pub accent: Color,
    pub header: Color,
    pub border_active: Color,
    pub border_inactive: Color,
    pub selection_bg: Color,
    pub marked: Color,
    pub matched: Color,
    pub busy: Color,
    pub info: Color,
    pub error: Color,
    pub diff_add: Color,
    pub diff_del: Color,
    pub diff_hunk: Color,
    pub diff_header: Color,
}

impl Default for Palette {
    /// 256-color indices only.
    fn default() -> Self {
        Self {
            fg: Color::Reset,
            muted: Color::Indexed(245),
            accent: Color::Indexed(205),
            header: Color::Indexed(39),
            border_active: Color::Indexed(205),
            border_inactive: Color::Indexed(240),
            selection_bg: Color::Indexed(236),
            marked: Color::Indexed(214),
            matched: Color::Indexed(46),
            busy: Color::Indexed(244),
            info: Color::Indexed(46),
            error: Color::Indexed(196),
            diff_add: Color::Indexed(46),
            diff_del: Color::Indexed(196),
            diff_hunk: Color::Indexed(208),
            diff_header: Color::Indexed(33),
        }
    }
}
