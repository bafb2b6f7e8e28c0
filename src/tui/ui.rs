use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use super::App;
use crate::view::{Element, Node};
use chrono::Local;

const ACCENT: Color = Color::Cyan;
const HEADER_BG: Color = Color::DarkGray;
const DIM: Color = Color::DarkGray;
const GOOD: Color = Color::Green;
const WARN: Color = Color::Yellow;
const BAD: Color = Color::Red;

const GAUGE_WIDTH: usize = 20;
const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

// ─── Main render ────────────────────────────────────────────────────────────

pub fn render(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_title(f, chunks[0]);
    render_clock(f, chunks[0]);
    render_widget_tree(f, app, chunks[1]);
    render_status_bar(f, app, chunks[2]);
}

// ─── Title / Clock ──────────────────────────────────────────────────────────

fn render_title(f: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .title(" Uni Mirror ")
        .title_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD));
    f.render_widget(block, area);
}

fn render_clock(f: &mut Frame, title_area: Rect) {
    let time_str = format!(" {} ", Local::now().format("%a %d.%m.%Y  %H:%M:%S"));
    let clock_width = time_str.width() as u16;
    let clock_area = Rect {
        x: title_area.right().saturating_sub(clock_width),
        y: title_area.y,
        width: clock_width.min(title_area.width),
        height: 1,
    };
    f.render_widget(
        Paragraph::new(time_str).style(Style::default().fg(ACCENT)),
        clock_area,
    );
}

// ─── Status Bar ─────────────────────────────────────────────────────────────

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let sync_hint = app
        .widget
        .snapshot()
        .last_sync
        .as_deref()
        .map(|t| format!("  backend synced {t}"))
        .unwrap_or_default();

    let spinner = if app.sync_rx.is_some() {
        format!("{} ", SPINNER[(app.frame_count / 2) as usize % SPINNER.len()])
    } else {
        String::new()
    };

    let (message, color) = match app.widget.last_error() {
        Some(err) => (format!("Fetch failed: {err}"), BAD),
        None => (app.status_message.clone(), Color::White),
    };

    let polling = if app.widget.is_polling() { "polling" } else { "paused" };

    let status = Paragraph::new(Line::from(vec![
        Span::styled(format!(" [{}] [{polling}] ", app.mode_label()), Style::default().fg(ACCENT)),
        Span::styled(format!("{spinner}{message}"), Style::default().fg(color)),
        Span::styled(
            format!("  w:week  m:modules  h:hide  r:refresh  s:sync  p:pause  q:quit{sync_hint}  "),
            Style::default().fg(DIM),
        ),
    ]))
    .style(Style::default().bg(HEADER_BG));

    f.render_widget(status, area);
}

// ─── Widget tree ────────────────────────────────────────────────────────────

fn render_widget_tree(f: &mut Frame, app: &App, area: Rect) {
    let mut lines = tree_to_lines(&app.mounted.tree);
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "  (hidden — waiting for a show notification)",
            Style::default().fg(DIM),
        )));
    }

    let fading = app.mounted.is_fading();
    if fading {
        for line in &mut lines {
            for span in &mut line.spans {
                span.style = span.style.add_modifier(Modifier::DIM);
            }
        }
    }

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

/// Lay a render tree out as terminal lines: block elements start new lines,
/// spans stay inline, classes pick the colors.
pub fn tree_to_lines(node: &Node) -> Vec<Line<'static>> {
    let mut writer = LineWriter::default();
    if let Node::Element(el) = node {
        walk(el, &mut writer, Style::default());
    }
    writer.flush();
    writer.lines
}

#[derive(Default)]
struct LineWriter {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
}

impl LineWriter {
    fn push(&mut self, text: String, style: Style) {
        self.current.push(Span::styled(text, style));
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.current)));
        }
    }

    fn blank(&mut self) {
        self.flush();
        self.lines.push(Line::from(""));
    }
}

fn walk(el: &Element, out: &mut LineWriter, inherited: Style) {
    if el.style_value("display") == Some("none") {
        return;
    }
    let style = inherited.patch(element_style(el));

    if el.has_class("progress-bar") {
        out.flush();
        out.push(gauge(el), style);
        out.flush();
        return;
    }

    let block = el.tag != "span";
    if block {
        out.flush();
    }
    for child in &el.children {
        match child {
            Node::Text(text) => out.push(text.clone(), style),
            Node::Element(child) => walk(child, out, style),
        }
    }
    if block {
        out.flush();
    } else {
        out.push(" ".into(), inherited);
    }
    if el.has_class("assignment-item") || el.has_class("module-card") || el.has_class("view-header") {
        out.blank();
    }
}

fn element_style(el: &Element) -> Style {
    let mut style = Style::default();
    if matches!(el.tag, "h2" | "h3") {
        style = style.add_modifier(Modifier::BOLD);
    }
    for class in &el.classes {
        style = match *class {
            "week-subtitle" | "assignment-meta" | "progress-text" | "upcoming-count" => style.fg(DIM),
            "assignment-title" => style.fg(Color::White).add_modifier(Modifier::BOLD),
            "empty-state" | "normal" | "complete" | "good" => style.fg(GOOD),
            "warning" => style.fg(WARN),
            "urgent" | "needs-work" => style.fg(BAD),
            "selected" => style.add_modifier(Modifier::ITALIC),
            "module-badge" => match el.style_value("background").and_then(hex_color) {
                Some(bg) => style.bg(bg).fg(Color::Black),
                None => style,
            },
            "module-card-header" => match el.style_value("background").and_then(hex_color) {
                Some(fg) => style.fg(fg),
                None => style,
            },
            _ => style,
        };
    }
    style
}

/// Text gauge for a `progress-bar`, sized from its `progress-fill` width.
fn gauge(bar: &Element) -> String {
    let percent = bar
        .find("progress-fill")
        .and_then(|fill| fill.style_value("width"))
        .and_then(|w| w.trim_end_matches('%').parse::<f64>().ok())
        .unwrap_or(0.0)
        .clamp(0.0, 100.0);
    let filled = ((percent / 100.0) * GAUGE_WIDTH as f64).round() as usize;
    format!(
        "{}{} {:>3.0}%",
        "█".repeat(filled),
        "░".repeat(GAUGE_WIDTH - filled),
        percent
    )
}

fn hex_color(value: &str) -> Option<Color> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect()
    }

    #[test]
    fn test_hidden_tree_has_no_lines() {
        let node: Node = Element::new("div").style("display", "none").into();
        assert!(tree_to_lines(&node).is_empty());
    }

    #[test]
    fn test_blocks_and_spans() {
        let node: Node = Element::new("div")
            .child(
                Element::new("div")
                    .child(Element::new("span").text("A"))
                    .child(Element::new("span").text("B")),
            )
            .child(Element::new("div").text("C"))
            .into();
        assert_eq!(plain(&tree_to_lines(&node)), vec!["A B ", "C"]);
    }

    #[test]
    fn test_gauge() {
        let bar = Element::new("div")
            .class("progress-bar")
            .child(Element::new("div").class("progress-fill").style("width", "50%"));
        let g = gauge(&bar);
        assert!(g.starts_with(&"█".repeat(10)));
        assert!(g.ends_with(" 50%"));
    }

    #[test]
    fn test_hex_color() {
        assert_eq!(hex_color("#667eea"), Some(Color::Rgb(0x66, 0x7e, 0xea)));
        assert_eq!(hex_color("667eea"), None);
        assert_eq!(hex_color("#zzzzzz"), None);
    }
}
