use crate::feeds::{SortOrder, TimeWindow};
use crate::tweet::{short_address, Tweet};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs},
    Frame,
};
use std::collections::HashSet;

const AVATAR_COLORS: [Color; 4] = [Color::Green, Color::Magenta, Color::LightRed, Color::Blue];

/// What the feed area should show besides the cards themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    Loading,
    Ready,
    /// Contract mode without a wallet.
    NeedsWallet,
}

/// Card list with a selection cursor and per-card comment expansion.
#[derive(Debug, Clone)]
pub struct FeedView {
    list_state: ListState,
    expanded: HashSet<String>,
}

impl Default for FeedView {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedView {
    pub fn new() -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self {
            list_state,
            expanded: HashSet::new(),
        }
    }

    pub fn selected(&self) -> usize {
        self.list_state.selected().unwrap_or(0)
    }

    pub fn selected_tweet<'a>(&self, tweets: &'a [Tweet]) -> Option<&'a Tweet> {
        tweets.get(self.selected())
    }

    pub fn scroll_up(&mut self) {
        let selected = self.selected();
        if selected > 0 {
            self.list_state.select(Some(selected - 1));
        }
    }

    pub fn scroll_down(&mut self, len: usize) {
        let selected = self.selected();
        if selected < len.saturating_sub(1) {
            self.list_state.select(Some(selected + 1));
        }
    }

    /// Keeps the cursor inside a list that may have shrunk.
    pub fn clamp(&mut self, len: usize) {
        if self.selected() >= len {
            self.list_state.select(Some(len.saturating_sub(1)));
        }
    }

    pub fn toggle_comments(&mut self, id: &str) {
        if !self.expanded.remove(id) {
            self.expanded.insert(id.to_string());
        }
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        tweets: &[Tweet],
        header: FeedHeader,
        status: FeedStatus,
        now_ms: i64,
    ) {
        if status == FeedStatus::NeedsWallet {
            render_connect_prompt(frame, area);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        header.render(frame, chunks[0]);

        let block = Block::default()
            .title(" Says ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow));

        if status == FeedStatus::Loading && tweets.is_empty() {
            let loading = List::new(vec![ListItem::new("Loading says...")]).block(block);
            frame.render_widget(loading, chunks[1]);
            return;
        }

        if tweets.is_empty() {
            let empty = Paragraph::new("No says found. Be the first to post something!")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            frame.render_widget(empty, chunks[1]);
            return;
        }

        let width = block.inner(chunks[1]).width.saturating_sub(2).max(10) as usize;
        let items: Vec<ListItem> = tweets
            .iter()
            .map(|tweet| {
                ListItem::new(card_lines(tweet, self.is_expanded(&tweet.id), width, now_ms))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol("▌");

        let mut state = self.list_state.clone();
        frame.render_stateful_widget(list, chunks[1], &mut state);
    }
}

/// Window tabs and the sort selector above the cards.
#[derive(Debug, Clone, Copy)]
pub struct FeedHeader {
    pub window: TimeWindow,
    pub sort: SortOrder,
    pub demo: bool,
}

impl FeedHeader {
    fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(28)])
            .split(area);

        let selected = TimeWindow::ALL
            .iter()
            .position(|w| *w == self.window)
            .unwrap_or(0);
        let title = if self.demo { " [f] Window · Demo Mode " } else { " [f] Window " };
        let tabs = Tabs::new(TimeWindow::ALL.iter().map(|w| w.label()))
            .select(selected)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, chunks[0]);

        let sort = Paragraph::new(self.sort.label())
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(" [s] Sort by "));
        frame.render_widget(sort, chunks[1]);
    }
}

fn render_connect_prompt(frame: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Connect Your Wallet to View Says",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Press c to Connect Wallet",
            Style::default().fg(Color::Green),
        )),
    ];
    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

/// Lines of one card: author header, wrapped content, counters, and the
/// comment thread when expanded.
pub fn card_lines(tweet: &Tweet, expanded: bool, width: usize, now_ms: i64) -> Vec<Line<'static>> {
    let avatar = AVATAR_COLORS[tweet.avatar_slot()];
    let mut lines = vec![Line::from(vec![
        Span::styled(
            format!(" {} ", tweet.initials()),
            Style::default()
                .fg(Color::White)
                .bg(avatar)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            short_address(&tweet.author),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}", relative_time(tweet.timestamp, now_ms)),
            Style::default().fg(Color::DarkGray),
        ),
    ])];

    for row in textwrap::wrap(&tweet.content, width) {
        lines.push(Line::from(format!("  {row}")));
    }

    lines.push(Line::from(vec![
        Span::styled(format!("  ▲ {}", tweet.likes), Style::default().fg(Color::Green)),
        Span::styled(format!("   ▼ {}", tweet.dislikes), Style::default().fg(Color::Yellow)),
        Span::styled(
            format!("   ✉ {}", tweet.comments.len()),
            Style::default().fg(Color::Magenta),
        ),
    ]));

    if expanded {
        if tweet.comments.is_empty() {
            lines.push(Line::from(Span::styled(
                "    No comments yet",
                Style::default().fg(Color::DarkGray),
            )));
        }
        for (idx, comment) in tweet.comments.iter().enumerate() {
            let initials: String = comment
                .author
                .chars()
                .skip(2)
                .take(2)
                .collect::<String>()
                .to_uppercase();
            lines.push(Line::from(vec![
                Span::styled(
                    format!("    {initials} "),
                    Style::default().fg(AVATAR_COLORS[idx % 4]),
                ),
                Span::styled(
                    short_address(&comment.author),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("  {}", relative_time(comment.timestamp, now_ms)),
                    Style::default().fg(Color::DarkGray),
                ),
            ]));
            for row in textwrap::wrap(&comment.content, width.saturating_sub(6).max(10)) {
                lines.push(Line::from(format!("      {row}")));
            }
        }
        lines.push(Line::from(Span::styled(
            "    r to add a comment",
            Style::default().fg(Color::DarkGray),
        )));
    }

    lines.push(Line::from(""));
    lines
}

const MINUTES_IN_DAY: i64 = 1440;
const MINUTES_IN_MONTH: i64 = 43200;

/// "5 minutes ago" style distance between a timestamp and now, both in ms.
pub fn relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let seconds = now_ms.saturating_sub(timestamp_ms).max(0) / 1000;
    let minutes = (seconds + 30) / 60;

    let distance = if seconds < 30 {
        "less than a minute".to_string()
    } else if minutes < 2 {
        "1 minute".to_string()
    } else if minutes < 45 {
        format!("{minutes} minutes")
    } else if minutes < 90 {
        "about 1 hour".to_string()
    } else if minutes < MINUTES_IN_DAY {
        format!("about {} hours", (minutes + 30) / 60)
    } else if minutes < 42 * 60 {
        "1 day".to_string()
    } else if minutes < 30 * MINUTES_IN_DAY {
        format!("{} days", (minutes + MINUTES_IN_DAY / 2) / MINUTES_IN_DAY)
    } else if minutes < 45 * MINUTES_IN_DAY {
        "about 1 month".to_string()
    } else if minutes < 60 * MINUTES_IN_DAY {
        "about 2 months".to_string()
    } else if minutes < 365 * MINUTES_IN_DAY {
        format!("{} months", minutes / MINUTES_IN_MONTH)
    } else {
        match minutes / (365 * MINUTES_IN_DAY) {
            1 => "about 1 year".to_string(),
            years => format!("about {years} years"),
        }
    };

    format!("{distance} ago")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tweet::Comment;

    const SECOND: i64 = 1000;
    const MINUTE: i64 = 60 * SECOND;
    const HOUR: i64 = 60 * MINUTE;
    const DAY: i64 = 24 * HOUR;

    fn tweet(id: &str, comments: Vec<Comment>) -> Tweet {
        Tweet {
            id: id.to_string(),
            content: "Just deployed my first smart contract!".to_string(),
            author: "0xab12cd34ef56ab12cd34ef56ab12cd34ef56ab12".to_string(),
            timestamp: 0,
            likes: 5,
            dislikes: 1,
            comments,
        }
    }

    fn text(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_relative_time() {
        let now = 400 * DAY;
        assert_eq!(relative_time(now - 10 * SECOND, now), "less than a minute ago");
        assert_eq!(relative_time(now - MINUTE, now), "1 minute ago");
        assert_eq!(relative_time(now - 5 * MINUTE, now), "5 minutes ago");
        assert_eq!(relative_time(now - HOUR, now), "about 1 hour ago");
        assert_eq!(relative_time(now - 3 * HOUR, now), "about 3 hours ago");
        assert_eq!(relative_time(now - DAY, now), "1 day ago");
        assert_eq!(relative_time(now - 7 * DAY, now), "7 days ago");
        assert_eq!(relative_time(now - 40 * DAY, now), "about 1 month ago");
        assert_eq!(relative_time(now - 90 * DAY, now), "3 months ago");
        assert_eq!(relative_time(now - 370 * DAY, now), "about 1 year ago");
    }

    #[test]
    fn test_future_timestamp_reads_as_now() {
        assert_eq!(relative_time(5 * MINUTE, 0), "less than a minute ago");
    }

    #[test]
    fn test_card_header_and_counters() {
        let lines = card_lines(&tweet("1", Vec::new()), false, 80, 5 * MINUTE);
        let text = text(&lines);
        assert!(text[0].contains(" AB "));
        assert!(text[0].contains("0xab12...ab12"));
        assert!(text[0].contains("5 minutes ago"));
        assert!(text[1].contains("Just deployed"));
        assert!(text[2].contains("▲ 5"));
        assert!(text[2].contains("▼ 1"));
        assert!(text[2].contains("✉ 0"));
    }

    #[test]
    fn test_expanded_card_shows_comments() {
        let comment = Comment {
            id: "1".to_string(),
            content: "Congrats!".to_string(),
            author: "0xcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcd".to_string(),
            timestamp: 0,
        };
        let collapsed = text(&card_lines(&tweet("1", vec![comment.clone()]), false, 80, 0));
        assert!(!collapsed.iter().any(|l| l.contains("Congrats!")));

        let expanded = text(&card_lines(&tweet("1", vec![comment]), true, 80, 0));
        assert!(expanded.iter().any(|l| l.contains("Congrats!")));
        assert!(expanded.iter().any(|l| l.contains("CD 0xcdcd...cdcd")));
    }

    #[test]
    fn test_expanded_without_comments() {
        let lines = text(&card_lines(&tweet("2", Vec::new()), true, 80, 0));
        assert!(lines.iter().any(|l| l.contains("No comments yet")));
    }

    #[test]
    fn test_content_wraps_to_width() {
        let lines = card_lines(&tweet("1", Vec::new()), false, 12, 0);
        // header + several wrapped rows + counters + spacer
        assert!(lines.len() > 4);
    }

    #[test]
    fn test_scroll_bounds() {
        let mut view = FeedView::new();
        assert_eq!(view.selected(), 0);
        view.scroll_up();
        assert_eq!(view.selected(), 0);
        view.scroll_down(3);
        view.scroll_down(3);
        view.scroll_down(3);
        assert_eq!(view.selected(), 2);
        view.clamp(1);
        assert_eq!(view.selected(), 0);
    }

    #[test]
    fn test_toggle_comments() {
        let mut view = FeedView::new();
        assert!(!view.is_expanded("1"));
        view.toggle_comments("1");
        assert!(view.is_expanded("1"));
        view.toggle_comments("1");
        assert!(!view.is_expanded("1"));
    }
}
