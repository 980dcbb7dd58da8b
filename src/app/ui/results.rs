use eframe::egui::{self, RichText, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::model::SearchResult;

use super::super::ViewModel;

const SNIPPET_PREVIEW_CHARS: usize = 80;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

/// Indices of the results matching `query`, best first. An empty query keeps
/// the backend's ranking.
pub(in crate::app) fn filtered_rows(results: &[SearchResult], query: &str) -> Vec<usize> {
    let query = query.trim();
    if query.is_empty() {
        return (0..results.len()).collect();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored = results
        .iter()
        .enumerate()
        .filter_map(|(index, result)| {
            [&result.name, &result.result_type, &result.snippet]
                .into_iter()
                .filter_map(|text| fuzzy_match_score(&matcher, text, query))
                .max()
                .map(|score| (index, score))
        })
        .collect::<Vec<_>>();
    scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    scored.into_iter().map(|(index, _)| index).collect()
}

fn line_span(result: &SearchResult) -> Option<String> {
    match (result.line_start, result.line_end) {
        (Some(start), Some(end)) if end > start => Some(format!("L{start}-{end}")),
        (Some(start), _) => Some(format!("L{start}")),
        _ => result.source_ref.as_ref().map(|source| source.span_label()),
    }
}

fn snippet_preview(snippet: &str) -> String {
    let first_line = snippet.lines().find(|line| !line.trim().is_empty()).unwrap_or("");
    let trimmed = first_line.trim();
    if trimmed.chars().count() > SNIPPET_PREVIEW_CHARS {
        let cut = trimmed.chars().take(SNIPPET_PREVIEW_CHARS).collect::<String>();
        format!("{cut}…")
    } else {
        trimmed.to_owned()
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_results(&mut self, ui: &mut Ui, now: f64) {
        ui.heading("Search Results");
        if let Some(query) = &self.query {
            ui.label(format!("Query: {query}"));
        }

        ui.horizontal(|ui| {
            if ui
                .button("Highlight all")
                .on_hover_text("Re-apply every result's highlight to the current view.")
                .clicked()
            {
                self.session.rehighlight(now);
            }
            if ui.button("Clear").clicked() {
                self.session.clear_highlights();
                self.hovered_row = None;
            }

            let has_path = self.offered_path.is_some();
            let showing_path = self.session.retrieval_path().is_some();
            let label = if showing_path { "Hide path" } else { "Show path" };
            if ui
                .add_enabled(has_path, egui::Button::new(label))
                .on_hover_text("Trace the call-graph hops the search backend reported.")
                .clicked()
            {
                if showing_path {
                    self.session.clear_retrieval_path();
                } else if let Some(path) = self.offered_path.clone() {
                    self.session.apply_retrieval_path(path);
                }
            }
        });

        ui.add(egui::TextEdit::singleline(&mut self.filter).hint_text("Filter results"))
            .on_hover_text("Fuzzy filter over result names, types and snippets.");
        ui.separator();

        let results = self.session.results();
        if results.is_empty() {
            ui.label("No search results loaded.");
            return;
        }

        let rows = filtered_rows(results, &self.filter);
        let mut hovered_now = None;
        let mut clicked = None;

        egui::ScrollArea::vertical()
            .id_salt("results_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for &index in &rows {
                    let result = &results[index];
                    let mut header = format!("{:.2}  {}  {}", result.score, result.result_type, result.name);
                    if let Some(span) = line_span(result) {
                        header.push_str(&format!("  ({span})"));
                    }

                    let response = ui
                        .vertical(|ui| {
                            let row = ui.selectable_label(self.hovered_row == Some(index), RichText::new(header).strong());
                            let preview = snippet_preview(&result.snippet);
                            if !preview.is_empty() {
                                ui.small(preview);
                            }
                            if let Some(path) = &result.file_path {
                                ui.small(path.as_str());
                            }
                            row
                        })
                        .inner;

                    if response.hovered() {
                        hovered_now = Some(index);
                    }
                    if response.clicked() {
                        clicked = result.source_ref.as_ref().map(|source| source.node_id.clone());
                    }
                    ui.add_space(4.0);
                }
            });

        if hovered_now != self.hovered_row {
            match hovered_now {
                Some(index) => self.session.hover_enter(index, now),
                None => self.session.hover_leave(),
            }
            self.hovered_row = hovered_now;
        }

        if let Some(node_id) = clicked {
            self.selected = self
                .session
                .rendered()
                .and_then(|view| view.index_by_id.get(&node_id))
                .and_then(|indices| indices.first().copied());
        }
    }
}
