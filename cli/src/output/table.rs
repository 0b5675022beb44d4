//! Column layout and table rendering for terminal and pipe output.

use owo_colors::{OwoColorize as _, Style};

use super::Styles;

/// One table cell: plain text plus a display style.
///
/// Layout always measures the plain text, so escape sequences never count
/// toward column widths.
pub struct Cell {
    text: String,
    style: Style,
}

impl Cell {
    /// Unstyled cell.
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: Style::new(),
        }
    }

    /// Styled cell. Empty text stays unstyled so no stray escape sequences
    /// are emitted for blank fields.
    #[must_use]
    pub fn styled(text: impl Into<String>, style: Style) -> Self {
        let text = text.into();
        if text.is_empty() {
            Self::plain(text)
        } else {
            Self { text, style }
        }
    }

    fn width(&self) -> usize {
        self.text.chars().count()
    }
}

/// A header row plus data rows, renderable for terminals or pipes.
pub struct Table {
    headers: Vec<&'static str>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    #[must_use]
    pub fn new(headers: Vec<&'static str>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Append a row. Must have one cell per header.
    pub fn push_row(&mut self, cells: Vec<Cell>) {
        debug_assert_eq!(cells.len(), self.headers.len());
        self.rows.push(cells);
    }

    /// Aligned human rendering: each column is padded to the widest plain
    /// text it holds (header included), columns are joined with two spaces,
    /// and the last column is never padded.
    #[must_use]
    pub fn render_terminal(&self, styles: &Styles) -> String {
        let widths = self.column_widths();
        let mut out = String::new();

        let header_cells: Vec<Cell> = self
            .headers
            .iter()
            .map(|header| Cell::styled(*header, styles.header))
            .collect();
        render_row(&mut out, &header_cells, &widths);
        for row in &self.rows {
            render_row(&mut out, row, &widths);
        }
        out
    }

    /// Machine rendering: one line per row, every field (headers included)
    /// followed by a single tab, no padding, no styling.
    #[must_use]
    pub fn render_pipe(&self) -> String {
        let mut out = String::new();
        for header in &self.headers {
            out.push_str(header);
            out.push('\t');
        }
        out.push('\n');
        for row in &self.rows {
            for cell in row {
                out.push_str(&cell.text);
                out.push('\t');
            }
            out.push('\n');
        }
        out
    }

    /// Widest plain text per column over header and rows. The last column
    /// reports zero so it is never padded.
    fn column_widths(&self) -> Vec<usize> {
        let count = self.headers.len();
        let mut widths = vec![0usize; count];
        for (idx, header) in self.headers.iter().enumerate() {
            if idx + 1 < count {
                widths[idx] = header.chars().count();
            }
        }
        for row in &self.rows {
            for (idx, cell) in row.iter().enumerate() {
                if idx + 1 < count {
                    widths[idx] = widths[idx].max(cell.width());
                }
            }
        }
        widths
    }
}

fn render_row(out: &mut String, cells: &[Cell], widths: &[usize]) {
    let mut line = String::new();
    for (idx, cell) in cells.iter().enumerate() {
        line.push_str(&cell.text.style(cell.style).to_string());
        if idx + 1 < cells.len() {
            for _ in cell.width()..widths[idx] {
                line.push(' ');
            }
            line.push_str("  ");
        }
    }
    out.push_str(line.trim_end());
    out.push('\n');
}
