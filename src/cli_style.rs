use clap::builder::styling::{AnsiColor, Color, Style};
use clap::builder::Styles;
use crossterm::style::{Attribute, Color as TermColor, Stylize};
use unicode_width::UnicodeWidthStr;

// ═══════════════════════════════════════════════════════════════════════════════
// Clap Styles
// ═══════════════════════════════════════════════════════════════════════════════

fn ansi(color: AnsiColor) -> Style {
    Style::new().fg_color(Some(Color::Ansi(color)))
}

pub fn get_styles() -> Styles {
    let heading = ansi(AnsiColor::Cyan).bold().underline();
    let problem = ansi(AnsiColor::Red).bold();
    Styles::styled()
        .header(heading)
        .usage(heading)
        .literal(ansi(AnsiColor::Green).bold())
        .placeholder(ansi(AnsiColor::BrightBlack))
        .valid(ansi(AnsiColor::Green))
        .invalid(problem)
        .error(problem)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Palette and glyphs
// ═══════════════════════════════════════════════════════════════════════════════

pub mod colors {
    use crossterm::style::Color;

    const fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color::Rgb { r, g, b }
    }

    /// Same green as the highlighted data of undo comments.
    pub const WAX: Color = rgb(0x00, 0x91, 0x85);
    pub const TEAL: Color = rgb(0x00, 0xc8, 0xb4);
    pub const AMBER: Color = rgb(0xff, 0xb0, 0x20);
    pub const RED: Color = rgb(0xf0, 0x50, 0x50);
    pub const GREY: Color = rgb(0x80, 0x80, 0x80);
    pub const TEXT: Color = rgb(0xf0, 0xf0, 0xf0);
}

mod glyph {
    pub const OK: &str = "✓";
    pub const FAIL: &str = "✗";
    pub const WARN: &str = "!";
    pub const UNDO: &str = "↶";
    pub const ITEM: &str = "›";
    pub const DOT: &str = "•";
    pub const HOLLOW: &str = "◦";
    pub const RULE: &str = "─";
    pub const BAR: &str = "│";
}

/// Left corner, junction and right corner of one horizontal border.
struct Frame(&'static str, &'static str, &'static str);

const TOP: Frame = Frame("╭", "┬", "╮");
const MIDDLE: Frame = Frame("├", "┼", "┤");
const BOTTOM: Frame = Frame("╰", "┴", "╯");

// ═══════════════════════════════════════════════════════════════════════════════
// Status lines
// ═══════════════════════════════════════════════════════════════════════════════

fn status(symbol: &str, color: TermColor, message: &str) {
    println!(" {} {}", symbol.with(color).bold(), message.with(color));
}

pub fn print_success(message: &str) {
    status(glyph::OK, colors::WAX, message);
}

pub fn print_error(message: &str) {
    status(glyph::FAIL, colors::RED, message);
}

pub fn print_warning(message: &str) {
    status(glyph::WARN, colors::AMBER, message);
}

/// Shows what the next undo would revert.
pub fn print_undo_status(comment: &str) {
    if comment.is_empty() {
        println!(
            " {} {}",
            glyph::UNDO.with(colors::GREY),
            "nothing to undo".with(colors::GREY).attribute(Attribute::Italic)
        );
        return;
    }
    println!(
        " {} {} {}",
        glyph::UNDO.with(colors::TEAL).bold(),
        "undo:".with(colors::GREY),
        comment.with(colors::TEXT)
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// Sections and lists
// ═══════════════════════════════════════════════════════════════════════════════

const SECTION_WIDTH: usize = 60;

pub fn print_section_header(title: &str) {
    let label = format!(" {} ", title);
    let rest = SECTION_WIDTH.saturating_sub(label.width() + 2);
    println!();
    println!(
        "{}{}{}{}",
        TOP.0.with(colors::WAX),
        glyph::RULE.repeat(2).with(colors::WAX),
        label.with(colors::WAX).bold(),
        glyph::RULE.repeat(rest).with(colors::WAX)
    );
}

pub fn print_section_footer() {
    println!(
        "{}{}",
        BOTTOM.0.with(colors::WAX),
        glyph::RULE.repeat(SECTION_WIDTH).with(colors::WAX)
    );
    println!();
}

pub fn print_key_value(key: &str, value: &str) {
    println!(
        "  {} {} {}",
        glyph::DOT.with(colors::TEAL),
        format!("{}:", key).with(colors::GREY),
        value.with(colors::TEXT)
    );
}

pub fn print_list_item(item: &str, indent: usize) {
    println!(
        "{}{} {}",
        "  ".repeat(indent),
        glyph::ITEM.with(colors::WAX),
        item.with(colors::TEXT)
    );
}

pub fn print_empty_list(message: &str) {
    println!(
        "  {} {}",
        glyph::HOLLOW.with(colors::GREY),
        message.with(colors::GREY).attribute(Attribute::Italic)
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tables
// ═══════════════════════════════════════════════════════════════════════════════

/// Boxed table. Column widths are measured when printing.
pub struct TableBuilder {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TableBuilder {
    pub fn new(header: Vec<&str>) -> Self {
        TableBuilder {
            header: header.into_iter().map(str::to_string).collect(),
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn widths(&self) -> Vec<usize> {
        (0..self.header.len())
            .map(|i| {
                std::iter::once(&self.header)
                    .chain(self.rows.iter())
                    .filter_map(|row| row.get(i))
                    .map(|cell| cell.width())
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    fn border(widths: &[usize], frame: &Frame) {
        let segments: Vec<String> = widths.iter().map(|w| glyph::RULE.repeat(w + 2)).collect();
        let line = format!("{}{}{}", frame.0, segments.join(frame.1), frame.2);
        println!("{}", line.with(colors::WAX));
    }

    fn line(widths: &[usize], cells: &[String], heading: bool) {
        let mut out = glyph::BAR.with(colors::WAX).to_string();
        for (i, width) in widths.iter().enumerate() {
            let cell = cells.get(i).map(String::as_str).unwrap_or_default();
            let pad = " ".repeat(width.saturating_sub(cell.width()));
            let styled = if heading {
                cell.with(colors::WAX).bold()
            } else {
                cell.with(colors::TEXT)
            };
            out.push_str(&format!(" {}{} {}", styled, pad, glyph::BAR.with(colors::WAX)));
        }
        println!("{}", out);
    }

    pub fn print(&self) {
        let widths = self.widths();
        if widths.is_empty() {
            return;
        }
        Self::border(&widths, &TOP);
        Self::line(&widths, &self.header, true);
        Self::border(&widths, &MIDDLE);
        for row in &self.rows {
            Self::line(&widths, row, false);
        }
        Self::border(&widths, &BOTTOM);
    }
}

pub fn print_welcome(db_path: &str) {
    println!();
    println!(
        "  {} {}",
        "waxconfig".with(colors::WAX).bold(),
        concat!("v", env!("CARGO_PKG_VERSION")).with(colors::GREY)
    );
    print_key_value("Database", db_path);
    println!("  {}", "Type 'help' for available commands".with(colors::GREY));
    println!();
}
