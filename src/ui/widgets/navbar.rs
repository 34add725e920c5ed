use crate::app::Route;
use crate::tweet::short_address;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub struct Navbar<'a> {
    pub route: Route,
    pub address: Option<&'a str>,
}

impl Navbar<'_> {
    pub fn wallet_label(&self) -> String {
        match self.address {
            Some(address) => format!("{}  [d] Disconnect", short_address(address)),
            None => "[c] Connect Wallet".to_string(),
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let label = self.wallet_label();
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(label.chars().count() as u16 + 2),
            ])
            .split(inner);

        let link = |key: &'static str, name: &'static str, route: Route| {
            let style = if self.route == route {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            vec![
                Span::styled(key, Style::default().fg(Color::DarkGray)),
                Span::styled(name, style),
                Span::raw("  "),
            ]
        };

        let mut spans = vec![
            Span::styled(
                " SS ",
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                " saysome   ",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
        ];
        spans.extend(link("[h] ", "Home", Route::Landing));
        spans.extend(link("[Tab] ", "Says", Route::Feed));
        frame.render_widget(Paragraph::new(Line::from(spans)), chunks[0]);

        let wallet_style = if self.address.is_some() {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        };
        frame.render_widget(
            Paragraph::new(Span::styled(label, wallet_style)),
            chunks[1],
        );
    }
}
