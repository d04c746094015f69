//! Pure transforms over normalized posts.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::twitter::{Metric, Post};

static STATUS_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/(?:(?:i/web|[A-Za-z0-9_]{1,15})/)?status(?:es)?/(\d+)(?:/|$)")
        .expect("Invalid status path pattern")
});

const POST_HOSTS: &[&str] = &["x.com", "twitter.com"];

/// Posts ordered by `metric`, highest first. Ties keep their input order.
pub fn sort_by(posts: &[Post], metric: Metric) -> Vec<Post> {
    let mut sorted = posts.to_vec();
    sorted.sort_by_key(|post| Reverse(post.metrics.get(metric)));
    sorted
}

/// Minimum engagement thresholds. Unset thresholds accept every post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngagementFilter {
    pub min_likes: Option<u64>,
    pub min_impressions: Option<u64>,
}

impl EngagementFilter {
    #[must_use]
    pub fn with_min_likes(mut self, likes: u64) -> Self {
        self.min_likes = Some(likes);
        self
    }

    #[must_use]
    pub fn with_min_impressions(mut self, impressions: u64) -> Self {
        self.min_impressions = Some(impressions);
        self
    }

    /// Whether `post` meets every set threshold.
    pub fn matches(&self, post: &Post) -> bool {
        self.min_likes.is_none_or(|min| post.metrics.likes >= min)
            && self
                .min_impressions
                .is_none_or(|min| post.metrics.impressions >= min)
    }
}

/// Posts meeting every threshold in `filter`, in input order.
pub fn filter_engagement(posts: &[Post], filter: &EngagementFilter) -> Vec<Post> {
    posts
        .iter()
        .filter(|post| filter.matches(post))
        .cloned()
        .collect()
}

/// First occurrence of each post id, in input order.
pub fn dedupe(posts: &[Post]) -> Vec<Post> {
    let mut seen = HashSet::with_capacity(posts.len());
    posts
        .iter()
        .filter(|post| seen.insert(post.id.as_str()))
        .cloned()
        .collect()
}

/// Extract a post ID from a status URL or path.
///
/// Accepts `https://x.com/<user>/status/<id>` (or twitter.com, with optional
/// `www.`/`mobile.` prefix), `/i/web/status/<id>` and relative paths such as
/// `/<user>/status/<id>` or `/status/<id>`. Query strings and fragments are
/// ignored.
pub fn extract_post_id(url: &str) -> Option<String> {
    let url = url.trim();
    let path = match url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
    {
        Some(rest) => {
            let (host, path) = rest.split_at(rest.find('/')?);
            let host = host.to_ascii_lowercase();
            let host = host
                .strip_prefix("www.")
                .or_else(|| host.strip_prefix("mobile."))
                .unwrap_or(&host);
            if !POST_HOSTS.contains(&host) {
                return None;
            }
            path
        }
        None => url,
    };

    let path = path.split(['?', '#']).next().unwrap_or_default();
    let path = format!("/{}", path.trim_start_matches('/'));
    STATUS_PATH.captures(&path).map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: &str, likes: u64, impressions: u64) -> Post {
        let mut post = Post::new(id, format!("post {id}"));
        post.metrics.likes = likes;
        post.metrics.impressions = impressions;
        post
    }

    fn ids(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_sort_by_is_descending_and_stable() {
        let posts = vec![
            post("a", 5, 0),
            post("b", 9, 0),
            post("c", 5, 0),
            post("d", 1, 0),
        ];

        let sorted = sort_by(&posts, Metric::Likes);
        assert_eq!(ids(&sorted), ["b", "a", "c", "d"]);

        // Every value is zero, so input order is kept.
        let by_quotes = sort_by(&posts, Metric::Quotes);
        assert_eq!(ids(&by_quotes), ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_sort_by_leaves_input_untouched() {
        let posts = vec![post("a", 1, 0), post("b", 2, 0)];
        let _ = sort_by(&posts, Metric::Likes);
        assert_eq!(ids(&posts), ["a", "b"]);
    }

    #[test]
    fn test_filter_engagement_thresholds() {
        let posts = vec![post("a", 10, 1_000), post("b", 50, 100), post("c", 0, 0)];

        assert_eq!(
            filter_engagement(&posts, &EngagementFilter::default()).len(),
            3
        );
        assert_eq!(
            ids(&filter_engagement(&posts, &EngagementFilter::default().with_min_likes(10))),
            ["a", "b"]
        );
        assert_eq!(
            ids(&filter_engagement(
                &posts,
                &EngagementFilter::default()
                    .with_min_likes(10)
                    .with_min_impressions(500)
            )),
            ["a"]
        );
    }

    #[test]
    fn test_filter_engagement_is_monotonic() {
        let posts: Vec<Post> = (0..20).map(|n| post(&n.to_string(), n * 3, n * 50)).collect();

        let mut previous = usize::MAX;
        for threshold in (0..=60).step_by(5) {
            let filter = EngagementFilter::default().with_min_likes(threshold);
            let kept = filter_engagement(&posts, &filter).len();
            assert!(kept <= previous);
            previous = kept;
        }
    }

    #[test]
    fn test_dedupe_keeps_first_and_is_idempotent() {
        let mut second_a = post("a", 99, 0);
        second_a.text = "later copy".to_string();
        let posts = vec![
            post("a", 1, 0),
            post("b", 2, 0),
            second_a,
            post("c", 3, 0),
            post("b", 4, 0),
        ];

        let once = dedupe(&posts);
        assert_eq!(ids(&once), ["a", "b", "c"]);
        assert_eq!(once[0].text, "post a");
        assert_eq!(dedupe(&once), once);
    }

    #[test]
    fn test_extract_post_id() {
        assert_eq!(
            extract_post_id("https://x.com/user/status/123456"),
            Some("123456".to_string())
        );
        assert_eq!(
            extract_post_id("https://twitter.com/user/status/789?s=20&t=abc"),
            Some("789".to_string())
        );
        assert_eq!(
            extract_post_id("https://mobile.twitter.com/user/status/42#reply"),
            Some("42".to_string())
        );
        assert_eq!(
            extract_post_id("https://x.com/i/web/status/555"),
            Some("555".to_string())
        );
        assert_eq!(
            extract_post_id("https://x.com/user/status/77/photo/1"),
            Some("77".to_string())
        );
        assert_eq!(extract_post_id("/user/status/321"), Some("321".to_string()));
        assert_eq!(extract_post_id("/status/654"), Some("654".to_string()));
        assert_eq!(extract_post_id("https://google.com/user/status/1"), None);
        assert_eq!(extract_post_id("https://x.com/user"), None);
        assert_eq!(extract_post_id("https://x.com"), None);
    }
}
