use crate::tweet::{is_valid_content, MAX_TWEET_LEN};
use crate::ui::widgets::center_rect;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeKind {
    Say,
    Comment { tweet_id: String },
}

/// Text entry for a new say or a comment on an existing one.
#[derive(Debug, Clone)]
pub struct ComposeForm {
    kind: ComposeKind,
    text: String,
}

impl ComposeForm {
    pub fn say() -> Self {
        Self {
            kind: ComposeKind::Say,
            text: String::new(),
        }
    }

    pub fn comment(tweet_id: impl Into<String>) -> Self {
        Self {
            kind: ComposeKind::Comment {
                tweet_id: tweet_id.into(),
            },
            text: String::new(),
        }
    }

    pub fn kind(&self) -> &ComposeKind {
        &self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn add_char(&mut self, c: char) {
        self.text.push(c);
    }

    pub fn delete_char(&mut self) {
        self.text.pop();
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Characters left before the limit; negative once over it.
    pub fn remaining(&self) -> i64 {
        MAX_TWEET_LEN as i64 - self.text.chars().count() as i64
    }

    /// A say needs a connected address and valid content. A comment only
    /// needs non-blank text.
    pub fn can_submit(&self, address: Option<&str>) -> bool {
        match self.kind {
            ComposeKind::Say => address.is_some() && is_valid_content(&self.text),
            ComposeKind::Comment { .. } => !self.text.trim().is_empty(),
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, address: Option<&str>) {
        let modal_area = center_rect(60, 40, area);
        frame.render_widget(Clear, modal_area);

        let title = match self.kind {
            ComposeKind::Say => " What's on your mind? ",
            ComposeKind::Comment { .. } => " Add a comment... ",
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(title);

        let inner = block.inner(modal_area);
        frame.render_widget(block, modal_area);

        let enabled = self.can_submit(address);
        let mut text = vec![Line::from(""), Line::from(self.text.as_str()), Line::from("")];

        if self.kind == ComposeKind::Say {
            let remaining = self.remaining();
            let counter_style = if remaining < 0 {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            text.push(Line::from(Span::styled(
                format!("{remaining} characters remaining"),
                counter_style,
            )));
            if address.is_none() {
                text.push(Line::from(Span::styled(
                    "Connect a wallet to post",
                    Style::default().fg(Color::Yellow),
                )));
            }
        }

        let action = match self.kind {
            ComposeKind::Say => "Enter: Say It !",
            ComposeKind::Comment { .. } => "Enter: Send",
        };
        let action_style = if enabled {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        text.push(Line::from(vec![
            Span::styled(action, action_style),
            Span::styled(" | Esc to cancel", Style::default().fg(Color::DarkGray)),
        ]));

        let paragraph = Paragraph::new(text).wrap(Wrap { trim: false });
        frame.render_widget(paragraph, inner);
    }
}
