use super::demo::sample_tweets;
use super::filter::{self, SortOrder, TimeWindow};
use super::{FeedSource, Followup, Write};
use crate::error::Result;
use crate::tweet::{Comment, Tweet};
use chrono::{DateTime, Local, TimeZone};

pub const DEFAULT_BATCH_SIZE: u64 = 10;

/// Author stamped on local writes when no wallet is connected.
const ANONYMOUS: &str = "0x0000";

/// Holds the feed: the records last fetched (source order) and the
/// filtered, sorted view derived from them.
pub struct FeedAssembler {
    source: FeedSource,
    batch_size: u64,
    window: TimeWindow,
    sort: SortOrder,
    viewer: Option<String>,
    records: Vec<Tweet>,
    visible: Vec<Tweet>,
    loaded: bool,
}

impl FeedAssembler {
    pub fn new(source: FeedSource, batch_size: u64) -> Self {
        Self {
            source,
            batch_size,
            window: TimeWindow::default(),
            sort: SortOrder::default(),
            viewer: None,
            records: Vec::new(),
            visible: Vec::new(),
            loaded: false,
        }
    }

    pub fn source(&self) -> FeedSource {
        self.source.clone()
    }

    /// Swaps the backing source, e.g. after the gateway was re-initialized.
    /// Records from a previous contract are dropped; demo records survive a
    /// demo-to-demo swap.
    pub fn set_source(&mut self, source: FeedSource) {
        if !(self.source.is_demo() && source.is_demo()) {
            self.records.clear();
            self.visible.clear();
            self.loaded = false;
        }
        self.source = source;
    }

    pub fn is_demo(&self) -> bool {
        self.source.is_demo()
    }

    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }

    pub fn set_viewer(&mut self, viewer: Option<String>) {
        self.viewer = viewer;
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    pub fn set_window(&mut self, window: TimeWindow) {
        self.window = window;
        self.rebuild_at(&Local::now());
    }

    pub fn set_sort(&mut self, sort: SortOrder) {
        self.sort = sort;
        self.rebuild_at(&Local::now());
    }

    /// The filtered, sorted feed.
    pub fn tweets(&self) -> &[Tweet] {
        &self.visible
    }

    pub fn records(&self) -> &[Tweet] {
        &self.records
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn get(&self, id: &str) -> Option<&Tweet> {
        self.visible.iter().find(|t| t.id == id)
    }

    /// Fetches one page and rebuilds the view.
    pub async fn refresh(&mut self) -> Result<()> {
        let fetched = self.source.fetch(self.batch_size).await?;
        self.load_at(fetched, &Local::now());
        Ok(())
    }

    /// Installs a fetch result. `None` (demo mode) keeps the in-memory records,
    /// seeding the samples on first load.
    pub fn load(&mut self, fetched: Option<Vec<Tweet>>) {
        self.load_at(fetched, &Local::now());
    }

    pub fn load_at<Tz: TimeZone>(&mut self, fetched: Option<Vec<Tweet>>, now: &DateTime<Tz>) {
        match fetched {
            Some(records) => self.records = records,
            None if !self.loaded => {
                self.records = sample_tweets(self.viewer.as_deref(), now.timestamp_millis());
            }
            None => {}
        }
        self.loaded = true;
        self.rebuild_at(now);
    }

    /// Applies the local effect of a confirmed write and says whether a full
    /// refresh must follow.
    pub fn settle(&mut self, write: &Write) -> Followup {
        self.settle_at(write, &Local::now())
    }

    pub fn settle_at<Tz: TimeZone>(&mut self, write: &Write, now: &DateTime<Tz>) -> Followup {
        let demo = self.source.is_demo();
        let followup = match write {
            Write::Like(id) => {
                self.bump(id, |t| t.likes = t.likes.saturating_add(1));
                Followup::Done
            }
            Write::Dislike(id) => {
                self.bump(id, |t| t.dislikes = t.dislikes.saturating_add(1));
                Followup::Done
            }
            Write::Create(content) if demo => {
                let tweet = Tweet {
                    id: (self.records.len() + 1).to_string(),
                    content: content.clone(),
                    author: self.author(),
                    timestamp: now.timestamp_millis(),
                    likes: 0,
                    dislikes: 0,
                    comments: Vec::new(),
                };
                self.records.insert(0, tweet);
                Followup::Done
            }
            Write::Comment { tweet_id, content } if demo => {
                let author = self.author();
                if let Some(tweet) = self.records.iter_mut().find(|t| &t.id == tweet_id) {
                    let id = next_comment_id(&tweet.comments);
                    tweet.comments.push(Comment {
                        id,
                        content: content.clone(),
                        author,
                        timestamp: now.timestamp_millis(),
                    });
                }
                Followup::Done
            }
            Write::Create(_) | Write::Comment { .. } => Followup::Refresh,
        };
        self.rebuild_at(now);
        followup
    }

    /// Submits a write and brings the feed up to date, either in place or by
    /// reloading.
    pub async fn submit(&mut self, write: Write) -> Result<Followup> {
        self.source.submit(&write).await?;
        let followup = self.settle(&write);
        if followup == Followup::Refresh {
            self.refresh().await?;
        }
        Ok(followup)
    }

    pub async fn create(&mut self, content: &str) -> Result<Followup> {
        self.submit(Write::Create(content.to_string())).await
    }

    pub async fn like(&mut self, id: &str) -> Result<Followup> {
        self.submit(Write::Like(id.to_string())).await
    }

    pub async fn dislike(&mut self, id: &str) -> Result<Followup> {
        self.submit(Write::Dislike(id.to_string())).await
    }

    pub async fn add_comment(&mut self, id: &str, content: &str) -> Result<Followup> {
        self.submit(Write::Comment {
            tweet_id: id.to_string(),
            content: content.to_string(),
        })
        .await
    }

    fn author(&self) -> String {
        self.viewer.clone().unwrap_or_else(|| ANONYMOUS.to_string())
    }

    fn bump(&mut self, id: &str, f: impl Fn(&mut Tweet)) {
        if let Some(tweet) = self.records.iter_mut().find(|t| t.id == id) {
            f(tweet);
        }
    }

    fn rebuild_at<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) {
        self.visible = filter::apply(&self.records, self.window, self.sort, now);
    }
}

fn next_comment_id(comments: &[Comment]) -> String {
    let max = comments
        .iter()
        .filter_map(|c| c.id.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    (max.max(comments.len() as u64) + 1).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 15, 30, 0).unwrap()
    }

    fn demo() -> FeedAssembler {
        let mut feed = FeedAssembler::new(FeedSource::Demo, DEFAULT_BATCH_SIZE);
        feed.load_at(None, &now());
        feed
    }

    fn ids(feed: &FeedAssembler) -> Vec<&str> {
        feed.tweets().iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_demo_seeds_once() {
        let mut feed = demo();
        assert_eq!(feed.records().len(), 3);
        feed.settle_at(&Write::Create("hello".into()), &now());
        feed.load_at(None, &now());
        assert_eq!(feed.records().len(), 4);
    }

    #[test]
    fn test_demo_most_liked() {
        let mut feed = demo();
        feed.sort = SortOrder::MostLiked;
        feed.rebuild_at(&now());
        let likes: Vec<u64> = feed.tweets().iter().map(|t| t.likes).collect();
        assert_eq!(likes, vec![10, 8, 5]);
    }

    #[test]
    fn test_like_increments_only_likes() {
        let mut feed = demo();
        let before = feed.get("1").cloned().unwrap();
        assert_eq!(before.likes, 5);

        let followup = feed.settle_at(&Write::Like("1".into()), &now());
        assert_eq!(followup, Followup::Done);

        let after = feed.get("1").unwrap();
        assert_eq!(after.likes, 6);
        assert_eq!(after.dislikes, before.dislikes);
        assert_eq!(after.comments, before.comments);
    }

    #[test]
    fn test_dislike_increments_only_dislikes() {
        let mut feed = demo();
        feed.settle_at(&Write::Dislike("2".into()), &now());
        let t = feed.get("2").unwrap();
        assert_eq!(t.dislikes, 3);
        assert_eq!(t.likes, 10);
    }

    #[test]
    fn test_counters_saturate_at_max() {
        let mut feed = demo();
        let mut pinned = feed.get("1").cloned().unwrap();
        pinned.likes = u64::MAX;
        pinned.dislikes = u64::MAX;
        feed.load_at(Some(vec![pinned]), &now());

        feed.settle_at(&Write::Like("1".into()), &now());
        feed.settle_at(&Write::Dislike("1".into()), &now());
        let t = feed.get("1").unwrap();
        assert_eq!(t.likes, u64::MAX);
        assert_eq!(t.dislikes, u64::MAX);
    }

    #[test]
    fn test_unknown_id_is_ignored() {
        let mut feed = demo();
        let before = feed.records().to_vec();
        feed.settle_at(&Write::Like("99".into()), &now());
        assert_eq!(feed.records(), before.as_slice());
    }

    #[test]
    fn test_demo_create_prepends() {
        let mut feed = demo();
        feed.set_viewer(Some("0xA11CE".into()));
        let followup = feed.settle_at(&Write::Create("gm".into()), &now());
        assert_eq!(followup, Followup::Done);

        let first = &feed.records()[0];
        assert_eq!(first.id, "4");
        assert_eq!(first.author, "0xA11CE");
        assert_eq!(first.timestamp, now().timestamp_millis());
        // newest sort puts it on top of the view as well
        assert_eq!(ids(&feed)[0], "4");
    }

    #[test]
    fn test_demo_comment_appends() {
        let mut feed = demo();
        feed.settle_at(
            &Write::Comment {
                tweet_id: "1".into(),
                content: "wagmi".into(),
            },
            &now(),
        );
        let comments = &feed.get("1").unwrap().comments;
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[1].content, "wagmi");
        assert_eq!(comments[1].author, ANONYMOUS);
        assert_ne!(comments[0].id, comments[1].id);
    }

    #[test]
    fn test_structural_writes_refresh_outside_demo() {
        let mut feed = FeedAssembler::new(FeedSource::Pending, DEFAULT_BATCH_SIZE);
        assert_eq!(
            feed.settle_at(&Write::Create("x".into()), &now()),
            Followup::Refresh
        );
        assert_eq!(
            feed.settle_at(
                &Write::Comment {
                    tweet_id: "1".into(),
                    content: "x".into()
                },
                &now()
            ),
            Followup::Refresh
        );
        assert!(feed.records().is_empty());
    }

    #[test]
    fn test_window_change_refilters_without_fetch() {
        let mut feed = demo();
        feed.window = TimeWindow::Today;
        feed.rebuild_at(&now());
        // only the one-hour-old sample is from today
        assert_eq!(ids(&feed), vec!["1"]);
        assert_eq!(feed.records().len(), 3);
    }

    #[test]
    fn test_switching_source_drops_records() {
        let mut feed = demo();
        feed.set_source(FeedSource::Pending);
        assert!(feed.records().is_empty());
        assert!(!feed.is_loaded());
    }

    #[test]
    fn test_next_comment_id() {
        assert_eq!(next_comment_id(&[]), "1");
        let c = |id: &str| Comment {
            id: id.into(),
            content: String::new(),
            author: String::new(),
            timestamp: 0,
        };
        assert_eq!(next_comment_id(&[c("1"), c("7")]), "8");
        assert_eq!(next_comment_id(&[c("x"), c("y")]), "3");
    }
}
