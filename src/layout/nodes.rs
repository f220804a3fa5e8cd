//! Typed markup tree for one page and the walk that serializes it.
//!
//! Every node kind has a fixed field set; attribute names, class lists and
//! element choices live only in the serializer below.

use super::numerals::page_file_name;

pub const OPENING_FORMULA_GLYPH: &str = "\u{FDFD}";
pub const JUZ_GLYPH: &str = "\u{FC38}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderNode {
    pub surah: u16,
    pub page_numeral: String,
    pub juz_numeral: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharSpanNode {
    pub text: String,
    pub verse_final: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerseBlockNode {
    pub surah: u16,
    pub verse: u16,
    /// Opaque payload for the host UI's double-click handler.
    pub activation_hint: String,
    pub spans: Vec<CharSpanNode>,
}

impl VerseBlockNode {
    pub fn verse_ref(&self) -> String {
        format!("{}:{}", self.surah, self.verse)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineNode {
    SectionTitle {
        line: u16,
        surah: u16,
    },
    OpeningFormula {
        line: u16,
    },
    Words {
        line: u16,
        centered: bool,
        verses: Vec<VerseBlockNode>,
    },
}

impl LineNode {
    #[cfg(test)]
    pub fn spans(&self) -> impl Iterator<Item = &CharSpanNode> {
        let verses: &[VerseBlockNode] = match self {
            Self::Words { verses, .. } => verses,
            _ => &[],
        };
        verses.iter().flat_map(|verse| verse.spans.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineContainerNode {
    pub line_number: u16,
    pub line: LineNode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlsNode {
    pub previous_page: Option<u16>,
    pub next_page: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageChild {
    Header(HeaderNode),
    Line(LineContainerNode),
    Controls(ControlsNode),
}

/// The head's `<style>` element: the template's opening tag and rules plus
/// anything appended per page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleNode {
    pub open_tag: String,
    pub css: String,
}

impl Default for StyleNode {
    fn default() -> Self {
        Self {
            open_tag: "<style>".to_string(),
            css: String::new(),
        }
    }
}

impl StyleNode {
    pub fn append(&mut self, css: &str) {
        self.css.push_str(css);
    }
}

pub fn write_page_child(out: &mut String, child: &PageChild) {
    match child {
        PageChild::Header(header) => write_header(out, header),
        PageChild::Line(container) => write_line_container(out, container),
        PageChild::Controls(controls) => write_controls(out, controls),
    }
}

pub fn write_style(out: &mut String, style: &StyleNode) {
    out.push_str(&style.open_tag);
    out.push_str(&style.css);
    out.push_str("</style>");
}

fn write_surah_name(out: &mut String, surah: u16) {
    out.push_str(r#"<div class="surah-name">"#);
    out.push_str(r#"<span class="icon-surah icon-surah-surah"></span>"#);
    out.push_str(&format!(
        r#"<span class="icon-surah icon-surah{surah}"></span>"#
    ));
    out.push_str("</div>");
}

fn write_header(out: &mut String, header: &HeaderNode) {
    out.push_str("<header>");
    out.push_str(r#"<div class="surah-title">"#);
    write_surah_name(out, header.surah);
    out.push_str("</div>");
    out.push_str("<div>");
    out.push_str(&escape_text(&header.page_numeral));
    out.push_str("</div>");
    out.push_str("<div>");
    out.push_str(JUZ_GLYPH);
    out.push(' ');
    out.push_str(&escape_text(&header.juz_numeral));
    out.push_str("</div>");
    out.push_str("</header>");
}

fn write_line_container(out: &mut String, container: &LineContainerNode) {
    out.push_str(&format!(
        r#"<div class="line-container" data-line="{}">"#,
        container.line_number
    ));
    write_line(out, &container.line);
    out.push_str("</div>");
}

fn write_line(out: &mut String, line: &LineNode) {
    match line {
        LineNode::SectionTitle { line, surah } => {
            out.push_str(&format!(
                r#"<div class="line line--surah-name" id="line-{line}">"#
            ));
            write_surah_name(out, *surah);
            out.push_str("</div>");
        }
        LineNode::OpeningFormula { line } => {
            out.push_str(&format!(
                r#"<div class="line line---bismillah" id="line-{line}">"#
            ));
            out.push_str(r#"<div class="bismillah text-center">"#);
            out.push_str(OPENING_FORMULA_GLYPH);
            out.push_str("</div></div>");
        }
        LineNode::Words {
            line,
            centered,
            verses,
        } => {
            let class = if *centered { "line line--center" } else { "line" };
            out.push_str(&format!(r#"<div class="{class}" id="line-{line}">"#));
            for verse in verses {
                write_verse_block(out, verse);
            }
            out.push_str("</div>");
        }
    }
}

fn write_verse_block(out: &mut String, verse: &VerseBlockNode) {
    out.push_str(&format!(
        r#"<div class="ayah-container" ondblclick="{}" style="cursor: pointer;">"#,
        escape_attr(&verse.activation_hint)
    ));
    out.push_str(&format!(
        r#"<div class="ayah" data-ayah="{}">"#,
        verse.verse_ref()
    ));
    for span in &verse.spans {
        let class = if span.verse_final {
            "char char-end"
        } else {
            "char char-word"
        };
        out.push_str(&format!(r#"<span class="{class}">"#));
        out.push_str(&escape_text(&span.text));
        out.push_str("</span>");
    }
    out.push_str("</div></div>");
}

fn write_controls(out: &mut String, controls: &ControlsNode) {
    out.push_str(r#"<div><div class="controls">"#);
    if let Some(page) = controls.previous_page {
        write_navigation_button(out, "prevPage", page, "Previous Page");
    }
    write_action_button(out, "nextAyah", "Next V");
    write_action_button(out, "nextWord", "Next W");
    write_action_button(out, "toggleAll", "Toggle All");
    if let Some(page) = controls.next_page {
        write_navigation_button(out, "nextPage", page, "Next Page");
    }
    out.push_str("</div></div>");
}

fn write_navigation_button(out: &mut String, id: &str, target_page: u16, label: &str) {
    out.push_str(&format!(
        r#"<button class="btn" id="{id}" onclick="window.location.href='{}'">{label}</button>"#,
        page_file_name(target_page)
    ));
}

fn write_action_button(out: &mut String, id: &str, label: &str) {
    out.push_str(&format!(
        r#"<button class="btn" id="{id}">{label}</button>"#
    ));
}

pub fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn escape_attr(input: &str) -> String {
    escape_text(input).replace('"', "&quot;")
}
