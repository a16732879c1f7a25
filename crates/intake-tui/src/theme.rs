use ratatui::style::{Color, Modifier, Style};

use intake_core::FileStatus;

use crate::model::file::RowPhase;
use crate::tui_event::NoticeLevel;

/// Color theme for the TUI.
pub struct Theme {
    pub success: Color,
    pub failed: Color,
    pub retrying: Color,

    pub header_fg: Color,
    pub header_bg: Color,
    pub border: Color,
    pub text: Color,
    pub dim: Color,
    pub highlight_bg: Color,
    pub active: Color,
    pub footer_fg: Color,
    pub footer_bg: Color,
}

impl Theme {
    /// Default dark terminal theme.
    pub fn dark() -> Self {
        Self {
            success: Color::Green,
            failed: Color::Red,
            retrying: Color::Yellow,

            header_fg: Color::Black,
            header_bg: Color::Cyan,
            border: Color::DarkGray,
            text: Color::White,
            dim: Color::DarkGray,
            highlight_bg: Color::Rgb(25, 45, 55),
            active: Color::Cyan,
            footer_fg: Color::DarkGray,
            footer_bg: Color::Reset,
        }
    }

    pub fn status_color(&self, status: &FileStatus) -> Color {
        match status {
            FileStatus::Success => self.success,
            FileStatus::Failed => self.failed,
        }
    }

    pub fn phase_color(&self, phase: &RowPhase) -> Color {
        match phase {
            RowPhase::Success => self.success,
            RowPhase::Failed => self.failed,
            RowPhase::Retrying => self.retrying,
        }
    }

    pub fn notice_color(&self, level: &NoticeLevel) -> Color {
        match level {
            NoticeLevel::Info => self.active,
            NoticeLevel::Warn => self.retrying,
            NoticeLevel::Error => self.failed,
        }
    }

    pub fn header_style(&self) -> Style {
        Style::default().fg(self.header_fg).bg(self.header_bg).add_modifier(Modifier::BOLD)
    }

    pub fn highlight_style(&self) -> Style {
        Style::default().bg(self.highlight_bg).add_modifier(Modifier::BOLD)
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    pub fn footer_style(&self) -> Style {
        Style::default().fg(self.footer_fg).bg(self.footer_bg)
    }
}
