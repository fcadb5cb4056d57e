//! Tests for the subtitle selection sub-model

#[cfg(test)]
mod tests {
    use crate::subtitle::*;
    use crate::subtitle::SearchOutcome;
    use std::path::{Path, PathBuf};

    fn info(id: &str, name: &str) -> SubtitleInfo {
        SubtitleInfo {
            id: id.to_string(),
            name: name.to_string(),
            origin: SubtitleOrigin::Remote(format!("http://example.com/{}", id)),
        }
    }

    #[test]
    fn test_at_most_one_selected() {
        let mut model = SubtitleModel::new(String::new());
        model.merge(vec![info("a", "English"), info("b", "German")]);

        model.select(Some("a".to_string()));
        assert_eq!(model.selected(), Some(&"a".to_string()));

        model.select(Some("b".to_string()));
        assert_eq!(model.selected(), Some(&"b".to_string()));
        assert_eq!(model.selected_info().unwrap().name, "German");

        // "Off" clears the selection
        model.select(None);
        assert!(model.selected().is_none());
    }

    #[test]
    fn test_unknown_id_clears_selection() {
        let mut model = SubtitleModel::new(String::new());
        model.merge(vec![info("a", "English")]);
        model.select(Some("a".to_string()));
        model.select(Some("missing".to_string()));
        assert!(model.selected().is_none());
    }

    #[test]
    fn test_merge_skips_duplicates() {
        let mut model = SubtitleModel::new(String::new());
        model.merge(vec![info("a", "English"), info("b", "German")]);
        model.merge(vec![info("b", "German (dup)"), info("c", "French")]);

        let names: Vec<&str> = model.infos().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["English", "German", "French"]);
    }

    #[test]
    fn test_reload_keeps_selection_when_still_present() {
        let mut model = SubtitleModel::new(String::new());
        model.merge(vec![info("a", "English")]);
        model.select(Some("a".to_string()));

        model.reload("/videos/movie.mkv", vec![info("a", "English"), info("b", "German")]);
        assert_eq!(model.selected(), Some(&"a".to_string()));

        model.reload("/videos/other.mkv", vec![info("b", "German")]);
        assert!(model.selected().is_none());
    }

    #[test]
    fn test_subtitle_file_detection() {
        assert!(is_subtitle_file(Path::new("movie.srt")));
        assert!(is_subtitle_file(Path::new("movie.en.SRT")));
        assert!(is_subtitle_file(Path::new("/tmp/movie.ass")));
        assert!(!is_subtitle_file(Path::new("movie.mkv")));
        assert!(!is_subtitle_file(Path::new("srt")));
    }

    #[test]
    fn test_sidecar_candidates() {
        let media = Path::new("/videos/movie.mkv");
        let entries = vec![
            PathBuf::from("/videos/movie.srt"),
            PathBuf::from("/videos/movie.en.srt"),
            PathBuf::from("/videos/other.srt"),
            PathBuf::from("/videos/movie.mkv"),
            PathBuf::from("/videos/movie.jpg"),
        ];
        let found = sidecar_candidates(media, &entries);
        assert_eq!(
            found,
            vec![
                PathBuf::from("/videos/movie.en.srt"),
                PathBuf::from("/videos/movie.srt"),
            ]
        );
    }

    #[test]
    fn test_search_without_endpoint_is_noop() {
        let mut model = SubtitleModel::new(String::new());
        model.search("big buck bunny", &["en".to_string()]);
        assert!(!model.poll_search());
        assert!(model.search_status.is_empty());
    }

    /// Wire a channel where `search()` would have put the worker thread's,
    /// so the delivery path can be driven synchronously.
    fn searching_model() -> (SubtitleModel, std::sync::mpsc::Sender<SearchOutcome>) {
        let mut model = SubtitleModel::new("http://localhost/search".to_string());
        let (tx, rx) = std::sync::mpsc::channel();
        model.search_rx = Some(rx);
        model.search_status = "Searching...".to_string();
        (model, tx)
    }

    #[test]
    fn test_search_results_merge_and_update_status() {
        let (mut model, tx) = searching_model();
        model.merge(vec![info("a", "English")]);

        // Nothing delivered yet
        assert!(!model.poll_search());
        assert_eq!(model.search_status, "Searching...");

        tx.send(SearchOutcome::Results(vec![
            info("a", "English (dup)"),
            info("r", "English (remote)"),
        ]))
        .unwrap();

        assert!(model.poll_search());
        assert_eq!(model.search_status, "Found 2 subtitles");
        let names: Vec<&str> = model.infos().iter().map(|i| i.name.as_str()).collect();
        // Known ids keep their existing entry, new ones are appended
        assert_eq!(names, vec!["English", "English (remote)"]);

        // The channel is spent; later polls are quiet
        assert!(!model.poll_search());
    }

    #[test]
    fn test_search_failure_sets_status_without_merging() {
        let (mut model, tx) = searching_model();

        tx.send(SearchOutcome::Error("timeout".to_string())).unwrap();

        assert!(!model.poll_search());
        assert_eq!(model.search_status, "Search failed: timeout");
        assert!(model.infos().is_empty());
    }
}
