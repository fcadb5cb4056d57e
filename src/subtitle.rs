//! Subtitle selection sub-model
//!
//! Holds every subtitle the player knows about (embedded streams, sidecar
//! files, remote search hits) and the single active selection. Remote search
//! is a call site only: one GET against a configurable JSON endpoint on a
//! background thread, results merged back through a channel.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::models::TrackId;

pub type SubtitleId = String;

/// Where a subtitle comes from; embedded ones also need an engine track
/// switch when selected.
#[derive(Debug, Clone, PartialEq)]
pub enum SubtitleOrigin {
    Embedded(TrackId),
    File(PathBuf),
    Remote(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleInfo {
    pub id: SubtitleId,
    pub name: String,
    pub origin: SubtitleOrigin,
}

/// File extensions treated as sidecar subtitles when opened or dropped.
pub const SUBTITLE_EXTENSIONS: &[&str] = &["srt", "ass", "ssa", "vtt", "sub"];

pub fn is_subtitle_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUBTITLE_EXTENSIONS.iter().any(|s| e.eq_ignore_ascii_case(s)))
        .unwrap_or(false)
}

/// A provider of subtitles for a given media URL.
pub trait SubtitleSource: Send {
    fn subtitles_for(&self, media_url: &str) -> Vec<SubtitleInfo>;
}

/// Scans the opened file's directory for sidecar subtitle files.
pub struct DirectorySource;

impl SubtitleSource for DirectorySource {
    fn subtitles_for(&self, media_url: &str) -> Vec<SubtitleInfo> {
        let media_path = Path::new(media_url);
        let Some(dir) = media_path.parent() else {
            return Vec::new();
        };
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok().map(|e| e.path()))
                .collect::<Vec<_>>(),
            Err(_) => return Vec::new(),
        };
        sidecar_candidates(media_path, &entries)
            .into_iter()
            .map(|path| SubtitleInfo {
                id: format!("file:{}", path.display()),
                name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                origin: SubtitleOrigin::File(path),
            })
            .collect()
    }
}

/// Sidecar files: subtitle extension and a file stem starting with the
/// media's stem ("movie.srt", "movie.en.srt" next to "movie.mkv").
pub fn sidecar_candidates(media_path: &Path, entries: &[PathBuf]) -> Vec<PathBuf> {
    let Some(stem) = media_path.file_stem().and_then(|s| s.to_str()) else {
        return Vec::new();
    };
    let mut found: Vec<PathBuf> = entries
        .iter()
        .filter(|p| is_subtitle_file(p))
        .filter(|p| {
            p.file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.starts_with(stem))
                .unwrap_or(false)
        })
        .cloned()
        .collect();
    found.sort();
    found
}

/// One remote search hit as returned by the search endpoint.
#[derive(Debug, Deserialize)]
struct RemoteSubtitle {
    #[serde(default)]
    id: Option<String>,
    name: String,
    url: String,
}

enum SearchOutcome {
    Results(Vec<SubtitleInfo>),
    Error(String),
}

/// The coordinator-owned subtitle model. Views bind to `selected` through
/// the subtitle menu; at most one subtitle is active.
pub struct SubtitleModel {
    infos: Vec<SubtitleInfo>,
    selected: Option<SubtitleId>,
    pub delay_seconds: f64,
    sources: Vec<Box<dyn SubtitleSource>>,
    search_endpoint: String,
    search_rx: Option<Receiver<SearchOutcome>>,
    pub search_status: String,
}

impl SubtitleModel {
    pub fn new(search_endpoint: String) -> Self {
        Self {
            infos: Vec::new(),
            selected: None,
            delay_seconds: 0.0,
            sources: Vec::new(),
            search_endpoint,
            search_rx: None,
            search_status: String::new(),
        }
    }

    pub fn add_source(&mut self, source: Box<dyn SubtitleSource>) {
        self.sources.push(source);
    }

    pub fn infos(&self) -> &[SubtitleInfo] {
        &self.infos
    }

    pub fn selected(&self) -> Option<&SubtitleId> {
        self.selected.as_ref()
    }

    pub fn selected_info(&self) -> Option<&SubtitleInfo> {
        let id = self.selected.as_ref()?;
        self.infos.iter().find(|info| &info.id == id)
    }

    /// Select a subtitle by id, or `None` for "Off". Returns the newly
    /// selected info so the caller can route embedded subtitles to the
    /// engine. Unknown ids clear the selection.
    pub fn select(&mut self, id: Option<SubtitleId>) -> Option<&SubtitleInfo> {
        self.selected = id.filter(|id| self.infos.iter().any(|info| &info.id == id));
        self.selected_info()
    }

    /// Rebuild the list for newly opened media: embedded tracks come from
    /// the caller, sidecars from the registered sources. The selection is
    /// kept if the same id is still present.
    pub fn reload(&mut self, media_url: &str, embedded: Vec<SubtitleInfo>) {
        self.infos = embedded;
        let sidecars: Vec<SubtitleInfo> = self
            .sources
            .iter()
            .flat_map(|s| s.subtitles_for(media_url))
            .collect();
        self.merge(sidecars);
        if let Some(id) = self.selected.clone() {
            if !self.infos.iter().any(|info| info.id == id) {
                self.selected = None;
            }
        }
    }

    /// Merge new infos, ignoring ids already present.
    pub fn merge(&mut self, incoming: Vec<SubtitleInfo>) {
        for info in incoming {
            if !self.infos.iter().any(|existing| existing.id == info.id) {
                self.infos.push(info);
            }
        }
    }

    /// Kick off a free-text remote search. Non-blocking; results are picked
    /// up by [`SubtitleModel::poll_search`]. A search already in flight is
    /// left to finish.
    pub fn search(&mut self, query: &str, languages: &[String]) {
        if self.search_endpoint.is_empty() || query.trim().is_empty() {
            return;
        }
        if self.search_rx.is_some() {
            return;
        }
        info!(query, "subtitle search started");
        self.search_status = "Searching...".to_string();

        let (tx, rx) = channel();
        self.search_rx = Some(rx);
        let endpoint = self.search_endpoint.clone();
        let query = query.to_string();
        let languages = languages.join(",");

        thread::spawn(move || {
            let outcome = match fetch_remote_subtitles(&endpoint, &query, &languages) {
                Ok(results) => SearchOutcome::Results(results),
                Err(e) => SearchOutcome::Error(e),
            };
            let _ = tx.send(outcome);
        });
    }

    /// Drain finished searches; returns true when the info list changed.
    pub fn poll_search(&mut self) -> bool {
        let Some(ref rx) = self.search_rx else {
            return false;
        };
        match rx.try_recv() {
            Ok(SearchOutcome::Results(results)) => {
                self.search_status = format!("Found {} subtitles", results.len());
                self.merge(results);
                self.search_rx = None;
                true
            }
            Ok(SearchOutcome::Error(e)) => {
                warn!(error = %e, "subtitle search failed");
                self.search_status = format!("Search failed: {}", e);
                self.search_rx = None;
                false
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                self.search_rx = None;
                false
            }
        }
    }
}

fn fetch_remote_subtitles(
    endpoint: &str,
    query: &str,
    languages: &str,
) -> Result<Vec<SubtitleInfo>, String> {
    let agent = ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(30)))
        .timeout_connect(Some(Duration::from_secs(10)))
        .build()
        .new_agent();

    let mut response = agent
        .get(endpoint)
        .query("query", query)
        .query("languages", languages)
        .call()
        .map_err(|e| format!("Request failed: {}", e))?;

    if response.status() != 200 {
        return Err(format!("HTTP error: {}", response.status()));
    }

    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| format!("Read failed: {}", e))?;

    let hits: Vec<RemoteSubtitle> =
        serde_json::from_str(&body).map_err(|e| format!("Bad response: {}", e))?;

    Ok(hits
        .into_iter()
        .map(|hit| SubtitleInfo {
            id: hit.id.unwrap_or_else(|| format!("remote:{}", hit.url)),
            name: hit.name,
            origin: SubtitleOrigin::Remote(hit.url),
        })
        .collect())
}

#[cfg(test)]
#[path = "subtitle_tests.rs"]
mod tests;
