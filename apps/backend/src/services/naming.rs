//! Title cleanup and stream URL construction for downloads.
//!
//! Provider titles carry a category or series label before the first `" - "`
//! and decorations in parentheses. Downloads are named after the cleaned title.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

use crate::config::XtreamConfig;
use crate::error::AppError;

lazy_static! {
    /// A parenthesized group, e.g. `(Extended)` or `(2021)`.
    static ref PAREN_GROUP: Regex = Regex::new(r"\([^)]*\)").unwrap();

    /// Four consecutive ASCII digits anywhere in a group.
    static ref YEAR: Regex = Regex::new(r"[0-9]{4}").unwrap();

    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();

    /// Characters that are unsafe in filenames across platforms.
    static ref UNSAFE_CHARS: Regex = Regex::new(r#"[<>:"/\\|?*\x00-\x1F]"#).unwrap();
}

const SEPARATOR: &str = " - ";

/// Cleans a provider title for use as a download name.
///
/// 1. If the title contains `" - "`, the first segment is dropped and the rest
///    rejoined with `" - "`.
/// 2. Parenthesized groups are removed unless they contain a 4-digit year.
/// 3. Whitespace runs collapse to one space; the result is trimmed.
///
/// A title made only of a prefix (`"A - "`) cleans to an empty string.
pub fn sanitize_title(raw: &str) -> String {
    let without_prefix = match raw.split_once(SEPARATOR) {
        Some((_, rest)) => rest,
        None => raw,
    };

    let without_groups = PAREN_GROUP.replace_all(without_prefix, |caps: &regex::Captures| {
        let group = &caps[0];
        if YEAR.is_match(group) {
            group.to_string()
        } else {
            String::new()
        }
    });

    WHITESPACE_RUN
        .replace_all(&without_groups, " ")
        .trim()
        .to_string()
}

/// Builds the on-disk filename for a download: the cleaned title with
/// filesystem-unsafe characters removed, plus the container extension.
///
/// Returns `None` when nothing usable is left of the title.
pub fn output_filename(raw_title: &str, extension: &str) -> Option<String> {
    let title = sanitize_title(raw_title);
    let title = UNSAFE_CHARS.replace_all(&title, "");
    let title = WHITESPACE_RUN.replace_all(&title, " ");
    let title = title.trim();

    if title.is_empty() {
        return None;
    }

    let extension = extension.trim_start_matches('.');
    if extension.is_empty() {
        Some(title.to_string())
    } else {
        Some(format!("{}.{}", title, extension))
    }
}

/// Kind of provider stream, which is also the first path segment of its URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamType {
    Live,
    Movie,
    Series,
}

impl StreamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamType::Live => "live",
            StreamType::Movie => "movie",
            StreamType::Series => "series",
        }
    }
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "live" => Ok(StreamType::Live),
            "movie" => Ok(StreamType::Movie),
            "series" => Ok(StreamType::Series),
            other => Err(AppError::BadRequest(format!(
                "Invalid stream type: {}",
                other
            ))),
        }
    }
}

/// Builds direct stream URLs on the provider.
///
/// Credentials are baked into the path:
/// `{base}/{type}/{user}/{password}/{id}[.{ext}]`. Identifiers are not
/// escaped; the provider hands out numeric ids.
#[derive(Clone)]
pub struct StreamUrlBuilder {
    base_url: String,
    username: String,
    password: String,
}

impl StreamUrlBuilder {
    pub fn new(config: &XtreamConfig) -> Self {
        Self {
            base_url: config.base_url(),
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    pub fn stream_url(
        &self,
        stream_type: StreamType,
        stream_id: &str,
        extension: Option<&str>,
    ) -> String {
        let base = format!(
            "{}/{}/{}/{}/{}",
            self.base_url, stream_type, self.username, self.password, stream_id
        );
        match extension.filter(|ext| !ext.is_empty()) {
            Some(ext) => format!("{}.{}", base, ext),
            None => base,
        }
    }
}

impl fmt::Debug for StreamUrlBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamUrlBuilder")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
