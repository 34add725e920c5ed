use crate::error::SaysError;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

const MAX_VISIBLE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Destructive,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub kind: ToastKind,
    shown_at: Instant,
}

/// Transient notifications, newest last. Each expires `ttl` after it was shown.
#[derive(Debug)]
pub struct ToastQueue {
    ttl: Duration,
    toasts: VecDeque<Toast>,
}

impl ToastQueue {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            toasts: VecDeque::new(),
        }
    }

    pub fn push(&mut self, title: impl Into<String>, description: impl Into<String>, kind: ToastKind) {
        self.push_at(title, description, kind, Instant::now());
    }

    fn push_at(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
        kind: ToastKind,
        now: Instant,
    ) {
        if self.toasts.len() == MAX_VISIBLE {
            self.toasts.pop_front();
        }
        self.toasts.push_back(Toast {
            title: title.into(),
            description: description.into(),
            kind,
            shown_at: now,
        });
    }

    pub fn info(&mut self, title: impl Into<String>, description: impl Into<String>) {
        self.push(title, description, ToastKind::Info);
    }

    pub fn error(&mut self, err: &SaysError) {
        let (title, description) = err.notice();
        self.push(title, description, ToastKind::Destructive);
    }

    pub fn prune(&mut self) {
        self.prune_at(Instant::now());
    }

    fn prune_at(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.toasts
            .retain(|t| now.saturating_duration_since(t.shown_at) < ttl);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn latest(&self) -> Option<&Toast> {
        self.toasts.back()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    /// Stacks the toasts in the bottom-right corner of `area`.
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let width = area.width.min(48);
        let mut bottom = area.y + area.height;

        for toast in self.toasts.iter().rev() {
            let height = 4;
            if bottom < area.y + height {
                break;
            }
            bottom -= height;
            let toast_area = Rect::new(
                area.x + area.width.saturating_sub(width + 1),
                bottom,
                width,
                height,
            );

            let color = match toast.kind {
                ToastKind::Info => Color::Green,
                ToastKind::Destructive => Color::Red,
            };
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color));
            let text = vec![
                Line::from(Span::styled(
                    toast.title.as_str(),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                )),
                Line::from(toast.description.as_str()),
            ];

            frame.render_widget(Clear, toast_area);
            frame.render_widget(
                Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
                toast_area,
            );
        }
    }
}
