//! Pure rendering of the widget state into a [`Node`] tree.
//!
//! Nothing in here touches the network or mutates state; the host mounts
//! whatever tree comes out. Text is always stored as text nodes, so a title
//! containing `<b>` stays a title containing `<b>` in every backend.

pub mod html;

use chrono::{DateTime, Local};

use crate::config::Config;
use crate::controller::ViewMode;
use crate::format::{
    color_for_module_id, days_until_due_at, format_date, format_days_until, progress_percent,
    progress_tier, urgency_class, Urgency, INVALID_DATE,
};
use crate::models::{Assignment, Module, Snapshot};

pub const WEEK_TITLE: &str = "📚 Abgaben diese Woche";
pub const MODULE_TITLE: &str = "📊 Module Übersicht";
pub const EMPTY_WEEK: &str = "🎉 Keine Abgaben diese Woche!";

// ─── Tree ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: &'static str,
    pub classes: Vec<&'static str>,
    pub style: Vec<(&'static str, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            classes: Vec::new(),
            style: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn class(mut self, class: &'static str) -> Self {
        self.classes.push(class);
        self
    }

    pub fn style(mut self, property: &'static str, value: impl Into<String>) -> Self {
        self.style.push((property, value.into()));
        self
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(Node::Text(text.into()))
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| *c == class)
    }

    pub fn style_value(&self, property: &str) -> Option<&str> {
        self.style
            .iter()
            .find(|(p, _)| *p == property)
            .map(|(_, v)| v.as_str())
    }

    /// Depth-first search for every descendant (and self) carrying `class`.
    pub fn find_all(&self, class: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect(class, &mut found);
        found
    }

    pub fn find(&self, class: &str) -> Option<&Element> {
        self.find_all(class).into_iter().next()
    }

    fn collect<'a>(&'a self, class: &str, out: &mut Vec<&'a Element>) {
        if self.has_class(class) {
            out.push(self);
        }
        for child in &self.children {
            if let Node::Element(el) = child {
                el.collect(class, out);
            }
        }
    }

    /// Concatenated text of all descendants.
    #[cfg(test)]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(el) => out.push_str(&el.text_content()),
            }
        }
        out
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

impl Node {
    #[cfg(test)]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }
}

// ─── Entry point ────────────────────────────────────────────────────────────

pub fn render(mode: &ViewMode, snapshot: &Snapshot, config: &Config, now: DateTime<Local>) -> Node {
    let wrapper = Element::new("div").class("uni-assignments-wrapper");

    match mode {
        ViewMode::Hidden => wrapper.style("display", "none").into(),
        ViewMode::Week => wrapper
            .child(week_view(&snapshot.assignments, config.max_assignments, now))
            .into(),
        ViewMode::Module { selected } => wrapper
            .child(module_view(&snapshot.modules, selected.as_deref()))
            .into(),
    }
}

// ─── Week ───────────────────────────────────────────────────────────────────

fn week_view(assignments: &[Assignment], max: usize, now: DateTime<Local>) -> Element {
    let header = Element::new("div")
        .class("view-header")
        .child(Element::new("h2").text(WEEK_TITLE))
        .child(
            Element::new("span")
                .class("week-subtitle")
                .text(format!("{} Aufgaben", assignments.len())),
        );

    let list = Element::new("div").class("assignments-list");
    let list = if assignments.is_empty() {
        list.child(Element::new("div").class("empty-state").text(EMPTY_WEEK))
    } else {
        list.children(
            assignments
                .iter()
                .take(max)
                .map(|a| assignment_item(a, now).into()),
        )
    };

    Element::new("div").class("week-view").child(header).child(list)
}

fn assignment_item(assignment: &Assignment, now: DateTime<Local>) -> Element {
    let days = days_until_due_at(assignment.due(), now);
    let (label, urgency) = match days {
        Some(d) => (format_days_until(d), urgency_class(d)),
        None => (INVALID_DATE.to_string(), Urgency::Normal),
    };

    let header = Element::new("div")
        .class("assignment-header")
        .child(
            Element::new("span")
                .class("module-badge")
                .style(
                    "background",
                    color_for_module_id(assignment.module_id.as_deref()),
                )
                .text(assignment.module_name.as_str()),
        )
        .child(
            Element::new("span")
                .class("due-date")
                .class(urgency.css_class())
                .text(label),
        );

    let mut meta = Element::new("div")
        .class("assignment-meta")
        .child(Element::new("span").text(format!("📅 {}", format_date(assignment.due()))));
    if let Some(description) = assignment.description_text() {
        meta = meta.child(Element::new("span").text(format!("📝 {description}")));
    }

    Element::new("div")
        .class("assignment-item")
        .child(header)
        .child(
            Element::new("div")
                .class("assignment-title")
                .text(assignment.title.as_str()),
        )
        .child(meta)
}

// ─── Modules ────────────────────────────────────────────────────────────────

fn module_view(modules: &[Module], selected: Option<&str>) -> Element {
    let header = Element::new("div")
        .class("view-header")
        .child(Element::new("h2").text(MODULE_TITLE));

    let grid = Element::new("div")
        .class("modules-grid")
        .children(modules.iter().map(|m| module_card(m, selected).into()));

    Element::new("div").class("module-view").child(header).child(grid)
}

fn module_card(module: &Module, selected: Option<&str>) -> Element {
    let percent = progress_percent(module.completed, module.total);
    let tier = progress_tier(percent);

    let mut card = Element::new("div").class("module-card");
    if selected.is_some() && selected == module.id.as_deref() {
        card = card.class("selected");
    }

    let progress = Element::new("div")
        .class("progress-section")
        .child(
            Element::new("div")
                .class("progress-bar")
                .class(tier.css_class())
                .child(
                    Element::new("div")
                        .class("progress-fill")
                        .style("width", format!("{percent}%")),
                ),
        )
        .child(
            Element::new("div")
                .class("progress-text")
                .text(format!("{}/{} erledigt", module.completed, module.total)),
        );

    card.child(
        Element::new("div")
            .class("module-card-header")
            .style("background", color_for_module_id(module.id.as_deref()))
            .child(Element::new("h3").text(module.name.as_str())),
    )
    .child(
        Element::new("div")
            .class("module-card-body")
            .child(progress)
            .child(
                Element::new("div")
                    .class("upcoming-count")
                    .text(format!("{} anstehend", module.upcoming)),
            ),
    )
}
