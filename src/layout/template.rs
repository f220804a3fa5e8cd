use std::path::Path;

use regex::Regex;

use super::error::{ComposeError, ComposeResult};
use super::nodes::{PageChild, StyleNode, write_page_child, write_style};

const BUNDLED_TEMPLATE: &str = include_str!("../../assets/index.html");

/// Empty-page skeleton, parsed and validated once per run.
///
/// The source markup is kept as raw segments around the two places the
/// composer writes into: the head's style element and the page-root
/// container. Every call to [`PageTemplate::fresh_page`] hands out a new,
/// independently owned document.
#[derive(Debug, Clone)]
pub struct PageTemplate {
    before_style: String,
    style: Option<StyleNode>,
    before_children: String,
    after_children: String,
    script: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDocument {
    before_style: String,
    style: Option<StyleNode>,
    before_children: String,
    children: Vec<PageChild>,
    after_children: String,
}

impl PageTemplate {
    pub fn bundled() -> ComposeResult<Self> {
        Self::parse(BUNDLED_TEMPLATE)
    }

    pub fn load(path: &Path) -> ComposeResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| ComposeError::TemplateCorrupted {
            missing: format!("readable template at {} ({err})", path.display()),
        })?;
        Self::parse(&raw)
    }

    pub fn parse(html: &str) -> ComposeResult<Self> {
        let head_close_regex = compile(r"(?i)</head\s*>")?;
        let style_regex = compile(r"(?is)(<style\b[^>]*>)(.*?)</style\s*>")?;
        let script_regex = compile(r"(?is)<script\b[^>]*>.*?</script\s*>")?;
        let page_root_regex =
            compile(r#"(?is)(<div\b[^>]*\bid\s*=\s*["']page["'][^>]*>)\s*(</div\s*>)"#)?;

        let head_close = head_close_regex
            .find(html)
            .ok_or_else(|| missing("closing </head> tag"))?;

        let root = page_root_regex
            .captures_at(html, head_close.end())
            .ok_or_else(|| missing("empty page-root container <div id=\"page\">"))?;
        let (Some(root_open), Some(root_close)) = (root.get(1), root.get(2)) else {
            return Err(missing("page-root container tags"));
        };

        let head_style = style_regex
            .captures(&html[..head_close.start()])
            .and_then(|captures| Some((captures.get(0)?, captures.get(1)?, captures.get(2)?)));

        let (before_style, style, style_end) = match head_style {
            Some((whole, open_tag, css)) => (
                html[..whole.start()].to_string(),
                Some(StyleNode {
                    open_tag: open_tag.as_str().to_string(),
                    css: css.as_str().to_string(),
                }),
                whole.end(),
            ),
            None => (html[..head_close.start()].to_string(), None, head_close.start()),
        };

        let script = script_regex
            .find(html)
            .map(|found| found.as_str().to_string());

        Ok(Self {
            before_style,
            style,
            before_children: html[style_end..root_open.end()].to_string(),
            after_children: html[root_close.start()..].to_string(),
            script,
        })
    }

    pub fn fresh_page(&self) -> PageDocument {
        PageDocument {
            before_style: self.before_style.clone(),
            style: self.style.clone(),
            before_children: self.before_children.clone(),
            children: Vec::new(),
            after_children: self.after_children.clone(),
        }
    }

    /// The first `<script>` element of the template, tags included.
    pub fn script(&self) -> Option<&str> {
        self.script.as_deref()
    }
}

impl PageDocument {
    #[cfg(test)]
    pub fn children(&self) -> &[PageChild] {
        &self.children
    }

    pub fn prepend_child(&mut self, child: PageChild) {
        self.children.insert(0, child);
    }

    pub fn push_child(&mut self, child: PageChild) {
        self.children.push(child);
    }

    #[cfg(test)]
    pub fn style(&self) -> Option<&StyleNode> {
        self.style.as_ref()
    }

    /// The head's style element; created at the end of the head when the
    /// template has none.
    pub fn style_mut(&mut self) -> &mut StyleNode {
        self.style.get_or_insert_with(StyleNode::default)
    }

    pub fn serialize(&self) -> String {
        let mut out = String::with_capacity(
            self.before_style.len() + self.before_children.len() + self.after_children.len(),
        );
        out.push_str(&self.before_style);
        if let Some(style) = &self.style {
            write_style(&mut out, style);
        }
        out.push_str(&self.before_children);
        for child in &self.children {
            write_page_child(&mut out, child);
        }
        out.push_str(&self.after_children);
        out
    }
}

fn compile(pattern: &str) -> ComposeResult<Regex> {
    Regex::new(pattern).map_err(|err| ComposeError::TemplateCorrupted {
        missing: format!("usable template matcher ({err})"),
    })
}

fn missing(what: &str) -> ComposeError {
    ComposeError::TemplateCorrupted {
        missing: what.to_string(),
    }
}
