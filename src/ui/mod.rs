pub mod landing;
pub mod toast;
pub mod widgets;

use crate::app::{App, Route};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::Line,
    widgets::Paragraph,
    Frame,
};
use widgets::feed::FeedHeader;
use widgets::navbar::Navbar;

const FEED_HELP: &str =
    " j/k move · n say · l like · x dislike · Enter comments · r reply · f window · s sort · R refresh · q quit";
const LANDING_HELP: &str = " Enter open says · c connect wallet · q quit";

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let address = app.address();
    Navbar {
        route: app.route(),
        address: address.as_deref(),
    }
    .render(frame, chunks[0]);

    let help = match app.route() {
        Route::Landing => {
            landing::render(frame, chunks[1]);
            LANDING_HELP
        }
        Route::Feed => {
            let header = FeedHeader {
                window: app.feed().window(),
                sort: app.feed().sort(),
                demo: app.is_demo(),
            };
            app.view().render(
                frame,
                chunks[1],
                app.feed().tweets(),
                header,
                app.feed_status(),
                chrono::Utc::now().timestamp_millis(),
            );
            if let Some(form) = app.compose() {
                form.render(frame, chunks[1], address.as_deref());
            }
            FEED_HELP
        }
    };

    frame.render_widget(
        Paragraph::new(Line::from(help)).style(Style::default().fg(Color::DarkGray)),
        chunks[2],
    );

    app.toasts().render(frame, chunks[1]);
}
