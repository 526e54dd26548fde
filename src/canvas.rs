use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::Widget;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub style: Style,
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            ch: ' ',
            style: Style::default(),
        }
    }
}

/// A piece of a styled line. Style markers take no columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Style(Style),
    Reset,
    Text(String),
}

/// Text with inline style markers. A style stays in effect until the next
/// marker, across any number of text tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledLine {
    tokens: Vec<Token>,
}

impl StyledLine {
    pub fn new() -> Self {
        StyledLine::default()
    }

    pub fn style(mut self, style: Style) -> Self {
        self.tokens.push(Token::Style(style));
        self
    }

    pub fn reset(mut self) -> Self {
        self.tokens.push(Token::Reset);
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.tokens.push(Token::Text(text.into()));
        self
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// The visible characters with all markers removed.
    pub fn plain_text(&self) -> String {
        self.tokens
            .iter()
            .filter_map(|t| match t {
                Token::Text(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn width(&self) -> usize {
        self.plain_text().chars().count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxState {
    Plain,
    Selected,
    Active,
}

/// Border, title and interior of a framed panel, one line per row.
///
/// Every line is exactly `width` columns wide once markers are stripped.
pub fn draw_box(
    width: usize,
    height: usize,
    title: &str,
    state: BoxState,
    theme: &BoxTheme,
) -> Vec<StyledLine> {
    if width < 2 || height < 2 {
        return Vec::new();
    }
    let border = match state {
        BoxState::Active => theme.active,
        BoxState::Selected => theme.selected,
        BoxState::Plain => theme.plain,
    };
    let inner = width - 2;
    let title_space: String = if title.is_empty() {
        String::new()
    } else {
        format!(" {} ", title).chars().take(inner).collect()
    };
    let title_len = title_space.chars().count();

    let mut top = StyledLine::new().style(border).text("┌");
    if title_len > 0 {
        let title_style = match state {
            BoxState::Active => theme.active_title,
            BoxState::Selected => theme.selected_title,
            BoxState::Plain => theme.plain,
        };
        top = top.style(title_style).text(title_space).style(border);
    }
    top = top.text("─".repeat(inner - title_len)).text("┐").reset();

    let middle = StyledLine::new()
        .style(border)
        .text("│")
        .text(" ".repeat(inner))
        .text("│")
        .reset();
    let bottom = StyledLine::new()
        .style(border)
        .text("└")
        .text("─".repeat(inner))
        .text("┘")
        .reset();

    let mut lines = Vec::with_capacity(height);
    lines.push(top);
    lines.extend(std::iter::repeat(middle).take(height - 2));
    lines.push(bottom);
    lines
}

/// Border styles for each panel state.
#[derive(Debug, Clone, Copy)]
pub struct BoxTheme {
    pub plain: Style,
    pub selected: Style,
    pub active: Style,
    pub selected_title: Style,
    pub active_title: Style,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Canvas {
            width,
            height,
            cells: vec![Cell::default(); width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        if x < self.width && y < self.height {
            self.cells.get(y * self.width + x)
        } else {
            None
        }
    }

    /// Writes one cell; anything outside the canvas is dropped.
    pub fn put(&mut self, x: usize, y: usize, ch: char, style: Style) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = Cell { ch, style };
        }
    }

    /// Writes `text` starting at (x, y), stopping before column `limit`.
    /// Returns the number of columns written.
    pub fn put_str(&mut self, x: usize, y: usize, text: &str, style: Style, limit: usize) -> usize {
        let mut written = 0;
        for (k, ch) in text.chars().enumerate() {
            if x + k >= limit {
                break;
            }
            self.put(x + k, y, ch, style);
            written += 1;
        }
        written
    }

    /// Copies styled lines into the canvas with their top-left at (x, y),
    /// clipping at the canvas edges.
    pub fn write_region(&mut self, x: usize, y: usize, lines: &[StyledLine]) {
        let mut style = Style::default();
        for (dy, line) in lines.iter().enumerate() {
            let row = y + dy;
            if row >= self.height {
                break;
            }
            let mut col = x;
            for token in line.tokens() {
                match token {
                    Token::Style(s) => style = *s,
                    Token::Reset => style = Style::default(),
                    Token::Text(text) => {
                        for ch in text.chars() {
                            self.put(col, row, ch, style);
                            col += 1;
                        }
                    }
                }
            }
        }
    }

    /// The characters of one row, styles dropped.
    pub fn row_text(&self, y: usize) -> String {
        (0..self.width)
            .filter_map(|x| self.cell(x, y))
            .map(|c| c.ch)
            .collect()
    }
}

impl Widget for &Canvas {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let rows = self.height.min(area.height as usize);
        let cols = self.width.min(area.width as usize);
        for y in 0..rows {
            for x in 0..cols {
                let cell = &self.cells[y * self.width + x];
                buf.get_mut(area.x + x as u16, area.y + y as u16)
                    .set_char(cell.ch)
                    .set_style(cell.style);
            }
        }
    }
}
