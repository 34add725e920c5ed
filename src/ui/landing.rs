use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub const HEADLINE: &str = "Say Something. Say Anything. saysome.";
pub const TAGLINE: &str =
    "A decentralized platform where your thoughts are truly yours, secured on the blockchain forever.";

pub const FEATURES: [(&str, &str); 3] = [
    (
        "Decentralized",
        "Your says are stored on the blockchain, not on centralized servers.",
    ),
    (
        "Censorship Resistant",
        "No one can delete or modify your says once they're on the blockchain.",
    ),
    (
        "Own Your Data",
        "Your content belongs to you, not to a corporation.",
    ),
];

pub fn render(frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let hero = vec![
        Line::from(""),
        Line::from(Span::styled(
            HEADLINE,
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(TAGLINE, Style::default().fg(Color::Gray))),
        Line::from(""),
        Line::from(Span::styled(
            " Say and Slay ! (Enter) ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
    ];
    frame.render_widget(
        Paragraph::new(hero)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        chunks[0],
    );

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(chunks[1]);

    for ((title, body), column) in FEATURES.iter().zip(columns.iter()) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta))
            .title(Span::styled(
                format!(" {title} "),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        frame.render_widget(
            Paragraph::new(*body).wrap(Wrap { trim: true }).block(block),
            *column,
        );
    }
}
