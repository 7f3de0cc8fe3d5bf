use lazy_static::lazy_static;
use regex::Regex;
use std::fmt::Display;

const DATA_COLOR: &str = "#009185";

lazy_static! {
    static ref MARKUP_TAG: Regex = Regex::new(r"</?span[^>]*>").unwrap();
}

/// Builds an undo description alternating plain text with highlighted data,
/// e.g. "Renamed key composer to author in genre Jazz".
#[derive(Default)]
pub struct CommentBuilder {
    parts: Vec<String>,
}

impl CommentBuilder {
    pub fn new(text: &str) -> Self {
        CommentBuilder {
            parts: vec![text.to_string()],
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.parts.push(text.to_string());
        self
    }

    pub fn data<D: Display>(mut self, data: D) -> Self {
        self.parts.push(format!(
            "<span foreground=\"{}\">{}</span>",
            DATA_COLOR,
            escape_markup(&data.to_string())
        ));
        self
    }

    pub fn build(self) -> String {
        self.parts.join(" ")
    }
}

fn escape_markup(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Strips highlighting from a comment for display on a plain terminal.
pub fn plain_comment(comment: &str) -> String {
    MARKUP_TAG
        .replace_all(comment, "")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
