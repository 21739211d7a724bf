//! Typed records for the Xtream Codes `player_api.php` responses.
//!
//! Providers are loose about types: ids and ratings arrive as numbers or
//! strings, lists arrive as arrays or index-keyed objects. The helpers below
//! normalize those shapes so the rest of the crate sees one schema.

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{AppError, Result};

// =============================================================================
// Deserialization helpers
// =============================================================================

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(D::Error::custom("Expected string or number")),
    }
}

pub(crate) fn optional_string_or_number<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        _ => Err(D::Error::custom("Expected string, number, or null")),
    }
}

fn id_from_any<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| D::Error::custom(format!("Invalid id: {}", n))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("Invalid id: {}", s))),
        _ => Err(D::Error::custom("Expected numeric id")),
    }
}

fn optional_u32_from_any<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => Ok(n.as_u64().and_then(|v| u32::try_from(v).ok())),
        Value::String(s) => Ok(s.trim().parse().ok()),
        _ => Ok(None),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or_vec<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::Array(arr) => {
            let strings: Vec<String> = arr
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) if !s.is_empty() => Some(s),
                    _ => None,
                })
                .collect();
            Ok(if strings.is_empty() {
                None
            } else {
                Some(strings)
            })
        }
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(vec![s])),
        Value::Null => Ok(None),
        _ => Err(D::Error::custom("Expected string or array")),
    }
}

fn list_or_map<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    use serde::de::Error;

    let value = Value::deserialize(deserializer)?;
    into_list(value).map_err(D::Error::custom)
}

/// Episodes grouped by season: providers send either `{"1": [...]}` or
/// `[[...], [...]]`. Array groups are keyed by the season of their first
/// episode, falling back to their position.
fn season_groups<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, Vec<Episode>>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::Null => Ok(BTreeMap::new()),
        Value::Object(map) => map
            .into_iter()
            .map(|(season, episodes)| -> std::result::Result<_, D::Error> {
                let episodes: Vec<Episode> =
                    into_records(episodes, "episodes").map_err(D::Error::custom)?;
                Ok((season, episodes))
            })
            .collect(),
        Value::Array(groups) => {
            let mut seasons = BTreeMap::new();
            for (index, group) in groups.into_iter().enumerate() {
                let episodes: Vec<Episode> =
                    into_records(group, "episodes").map_err(D::Error::custom)?;
                let season = episodes
                    .first()
                    .and_then(|e| e.season)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| (index + 1).to_string());
                seasons.insert(season, episodes);
            }
            Ok(seasons)
        }
        _ => Err(D::Error::custom("Expected episode map or array")),
    }
}

fn into_list<T: DeserializeOwned>(value: Value) -> std::result::Result<Vec<T>, serde_json::Error> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => map
            .into_iter()
            .map(|(_, v)| serde_json::from_value(v))
            .collect(),
        other => serde_json::from_value(other),
    }
}

/// Decodes the items of a list one by one. Records that fail to decode are
/// logged and skipped. An index-keyed object where nothing decodes is not a
/// list at all and fails with the first record error.
fn into_records<T: DeserializeOwned>(
    value: Value,
    context: &str,
) -> std::result::Result<Vec<T>, serde_json::Error> {
    let (items, keyed): (Vec<Value>, bool) = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => (items, false),
        Value::Object(map) => (map.into_iter().map(|(_, v)| v).collect(), true),
        other => return serde_json::from_value(other),
    };

    let total = items.len();
    let mut first_error = None;
    let mut records = Vec::with_capacity(total);
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value(item) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::debug!(context, index, "Skipping malformed record: {}", e);
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    match first_error {
        Some(e) if keyed && records.is_empty() => Err(e),
        Some(_) => {
            tracing::warn!(
                context,
                kept = records.len(),
                skipped = total - records.len(),
                "Dropped malformed records"
            );
            Ok(records)
        }
        None => Ok(records),
    }
}

/// Decodes a provider list response, accepting arrays or index-keyed objects.
/// Individual bad records are skipped; only a response that is not a list
/// fails.
pub fn decode_list<T: DeserializeOwned>(value: Value, action: &str) -> Result<Vec<T>> {
    into_records(value, action).map_err(|e| {
        AppError::UpstreamUnavailable(format!("Malformed {} response: {}", action, e))
    })
}

// =============================================================================
// Provider records
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    #[serde(deserialize_with = "string_or_number")]
    pub category_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category_name: String,
    #[serde(default, deserialize_with = "optional_u32_from_any")]
    pub parent_id: Option<u32>,
}

/// Live channel as returned by `get_live_streams`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveStream {
    #[serde(deserialize_with = "id_from_any")]
    pub stream_id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub stream_type: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub stream_icon: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub category_id: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub category_name: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub container_extension: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub epg_channel_id: Option<String>,
}

/// Movie as returned by `get_vod_streams`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VodStream {
    #[serde(default, deserialize_with = "optional_u32_from_any")]
    pub num: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub stream_type: Option<String>,
    #[serde(deserialize_with = "id_from_any")]
    pub stream_id: u64,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub stream_icon: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub rating: Option<String>,
    #[serde(default)]
    pub rating_5based: Option<Value>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub added: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub category_id: Option<String>,
    #[serde(default)]
    pub category_ids: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub container_extension: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub tmdb: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub year: Option<String>,
}

/// Series listing entry (`get_series`), projected to the fields the UI uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Series {
    #[serde(default, deserialize_with = "optional_u32_from_any")]
    pub num: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "id_from_any")]
    pub series_id: u64,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub cover: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub plot: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub cast: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub director: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub genre: Option<String>,
    #[serde(
        rename = "releaseDate",
        default,
        deserialize_with = "optional_string_or_number"
    )]
    pub release_date_display: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub release_date: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub last_modified: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub rating: Option<String>,
    #[serde(default)]
    pub rating_5based: Option<Value>,
    #[serde(default, deserialize_with = "string_or_vec")]
    pub backdrop_path: Option<Vec<String>>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub youtube_trailer: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub tmdb: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub episode_run_time: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub category_id: Option<String>,
    #[serde(default)]
    pub category_ids: Option<Vec<Value>>,
}

/// The `info` block of `get_series_info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesDetailInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub cover: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub plot: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub cast: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub director: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub genre: Option<String>,
    #[serde(
        rename = "releaseDate",
        default,
        deserialize_with = "optional_string_or_number"
    )]
    pub release_date: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub rating: Option<String>,
    #[serde(default, deserialize_with = "string_or_vec")]
    pub backdrop_path: Option<Vec<String>>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub youtube_trailer: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub episode_run_time: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Season {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "optional_u32_from_any")]
    pub season_number: Option<u32>,
    #[serde(default, deserialize_with = "optional_u32_from_any")]
    pub episode_count: Option<u32>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub overview: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub air_date: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub cover: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "optional_u32_from_any")]
    pub episode_num: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub container_extension: Option<String>,
    #[serde(default, deserialize_with = "optional_u32_from_any")]
    pub season: Option<u32>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub added: Option<String>,
    #[serde(default, deserialize_with = "episode_info")]
    pub info: Option<EpisodeInfo>,
}

/// Providers send `[]` instead of an object when an episode has no details.
fn episode_info<'de, D>(deserializer: D) -> std::result::Result<Option<EpisodeInfo>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => serde_json::from_value(value)
            .map(Some)
            .map_err(D::Error::custom),
        _ => Ok(None),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeInfo {
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub plot: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub duration: Option<String>,
    #[serde(
        rename = "durationSecs",
        default,
        deserialize_with = "optional_u32_from_any"
    )]
    pub duration_secs: Option<u32>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub releasedate: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub air_date: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub movie_image: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub rating: Option<String>,
}

/// Full `get_series_info` response for a series that exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesDetail {
    pub info: SeriesDetailInfo,
    #[serde(default, deserialize_with = "list_or_map")]
    pub seasons: Vec<Season>,
    #[serde(default, deserialize_with = "season_groups")]
    pub episodes: BTreeMap<String, Vec<Episode>>,
}

// =============================================================================
// Local shapes
// =============================================================================

/// A live channel as served by `/api/playlist`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaylistEntry {
    pub category_name: String,
    pub name: String,
    pub stream_icon: String,
    pub stream_url: String,
    pub stream_type: String,
}

/// Contents of the movies snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoviesSnapshot {
    #[serde(default, deserialize_with = "list_or_map")]
    pub movies: Vec<VodStream>,
    #[serde(default, deserialize_with = "list_or_map")]
    pub categories: Vec<Category>,
}
