use eframe::egui::{self, RichText, Ui};

use crate::model::{NodeKind, SourceRef};

use super::super::ViewModel;
use super::super::highlight::{HighlightStyle, PathRole};
use super::super::render::NodeMark;

const DOCSTRING_PREVIEW_LINES: usize = 6;

fn mark_flags(mark: &NodeMark) -> Vec<&'static str> {
    let mut flags = Vec::new();
    match mark.tier {
        Some(HighlightStyle::Direct) => flags.push("direct match"),
        Some(HighlightStyle::Hierarchical) => flags.push("owning class"),
        Some(HighlightStyle::Secondary) => flags.push("hover"),
        None => {}
    }
    if mark.secondary && mark.tier != Some(HighlightStyle::Secondary) {
        flags.push("hover");
    }
    match mark.path_role {
        Some(PathRole::Endpoint) => flags.push("path endpoint"),
        Some(PathRole::Intermediate) => flags.push("path hop"),
        None => {}
    }
    if mark.dimmed {
        flags.push("dimmed");
    }
    flags
}

fn kind_facts(kind: &NodeKind) -> Vec<String> {
    match kind {
        NodeKind::Root => vec!["Synthetic root".to_owned()],
        NodeKind::Class(meta) => {
            let mut facts = vec![
                format!("Methods: {}", meta.method_count),
                format!("Attributes: {}", meta.attribute_count),
            ];
            if !meta.bases.is_empty() {
                facts.push(format!("Bases: {}", meta.bases.join(", ")));
            }
            facts
        }
        NodeKind::Method(meta) => vec![
            format!("Class: {}", meta.class_name),
            format!("Parameters: {}", meta.param_count),
        ],
        NodeKind::Function(meta) => vec![format!("Parameters: {}", meta.param_count)],
        NodeKind::Call(meta) => {
            let mut facts = vec![
                format!("Parameters: {}", meta.param_count),
                format!("Calls: {}", meta.calls.len()),
                format!("Called by: {}", meta.called_by.len()),
            ];
            if meta.external {
                facts.push("Defined outside the analysed sources".to_owned());
            }
            facts
        }
        NodeKind::Syntax(meta) => {
            let mut facts = vec![format!("Node type: {}", meta.node_type)];
            if let Some(value) = &meta.value {
                facts.push(format!("Value: {value}"));
            }
            facts
        }
    }
}

fn docstring(kind: &NodeKind) -> Option<&str> {
    match kind {
        NodeKind::Class(meta) => meta.docstring.as_deref(),
        NodeKind::Method(meta) => meta.docstring.as_deref(),
        NodeKind::Function(meta) => meta.docstring.as_deref(),
        _ => None,
    }
}

fn source_facts(source: &SourceRef) -> Vec<String> {
    let mut facts = vec![
        format!("Id: {}", source.node_id),
        format!("Span: {}", source.span_label()),
    ];
    if !source.path.is_empty() {
        facts.push(format!("Scope: {}", source.path.join(" > ")));
    }
    facts
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let Some(selected) = self.selected else {
            ui.label("Select a node from the graph or the result list.");
            return;
        };
        let Some(view) = self.session.rendered() else {
            ui.label("No view is rendered yet.");
            return;
        };
        let Some(node) = view.nodes.get(selected) else {
            ui.label("Selected node no longer exists in this view.");
            return;
        };

        ui.label(RichText::new(node.label.as_str()).strong());
        ui.small(node.kind.label());
        ui.add_space(6.0);

        for fact in kind_facts(&node.kind) {
            ui.label(fact);
        }
        if let Some(source) = &node.source_ref {
            ui.separator();
            for fact in source_facts(source) {
                ui.label(fact);
            }
        }
        if let Some(doc) = docstring(&node.kind) {
            ui.separator();
            let preview = doc
                .lines()
                .take(DOCSTRING_PREVIEW_LINES)
                .collect::<Vec<_>>()
                .join("\n");
            ui.label(RichText::new(preview).italics());
        }

        let flags = mark_flags(&node.mark);
        if !flags.is_empty() {
            ui.separator();
            ui.label(format!("Highlight: {}", flags.join(", ")));
        }

        if !matches!(node.kind, NodeKind::Call(_)) {
            return;
        }
        let Some(graph) = self.analysis.call_graph.as_ref() else {
            return;
        };
        let calls = graph.calls(&node.label);
        let called_by = graph.called_by(&node.label);

        let mut jump_to = None;
        ui.separator();
        egui::ScrollArea::vertical()
            .id_salt("call_links_scroll")
            .max_height(320.0)
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for (heading, names) in [("Calls", calls), ("Called by", called_by)] {
                    ui.label(RichText::new(heading).strong());
                    if names.is_empty() {
                        ui.small("none");
                    }
                    for name in names {
                        let target = view
                            .index_by_name
                            .get(name)
                            .and_then(|indices| indices.first().copied());
                        let clicked = ui
                            .add_enabled(target.is_some(), egui::Link::new(name.as_str()))
                            .clicked();
                        if clicked {
                            jump_to = target;
                        }
                    }
                    ui.add_space(4.0);
                }
            });

        if jump_to.is_some() {
            self.selected = jump_to;
        }
    }
}
