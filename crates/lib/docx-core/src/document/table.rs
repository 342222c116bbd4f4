use super::{Block, Paragraph};
use super::paragraph::Alignment;

/// Vertical merge marker of a table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VMerge {
    Restart,
    Continue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCell {
    /// Preferred width in twips.
    pub width: Option<u32>,
    pub grid_span: u32,
    pub v_merge: Option<VMerge>,
    pub shading: Option<String>,
    pub blocks: Vec<Block>,
}

impl Default for TableCell {
    fn default() -> Self {
        Self {
            width: None,
            grid_span: 1,
            v_merge: None,
            shading: None,
            blocks: vec![Block::Paragraph(Paragraph::default())],
        }
    }
}

impl TableCell {
    #[must_use]
    pub fn with_width(width: u32) -> Self {
        Self {
            width: Some(width),
            ..Self::default()
        }
    }

    /// Cell text: paragraph texts joined with newlines. Nested tables are
    /// flattened row by row.
    #[must_use]
    pub fn text(&self) -> String {
        let mut lines = Vec::new();
        for block in &self.blocks {
            match block {
                Block::Paragraph(paragraph) => lines.push(paragraph.text()),
                Block::Table(table) => {
                    for row in table.rows_as_text() {
                        lines.push(row.join("\t"));
                    }
                }
            }
        }
        lines.join("\n")
    }

    /// Replaces the cell content with one paragraph per line, keeping the
    /// first paragraph's formatting.
    pub fn set_text(&mut self, text: &str) {
        let template = self.blocks.iter().find_map(|block| match block {
            Block::Paragraph(paragraph) => Some(paragraph.format.clone()),
            Block::Table(_) => None,
        });
        let run_format = self.blocks.iter().find_map(|block| match block {
            Block::Paragraph(paragraph) => paragraph.runs().next().map(|run| run.format.clone()),
            Block::Table(_) => None,
        });
        self.blocks = text
            .split('\n')
            .map(|line| {
                let mut paragraph = Paragraph::default();
                if let Some(format) = &template {
                    paragraph.format = format.clone();
                }
                if !line.is_empty() {
                    paragraph.push_run(super::Run::with_format(
                        line,
                        run_format.clone().unwrap_or_default(),
                    ));
                }
                Block::Paragraph(paragraph)
            })
            .collect();
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Paragraph(paragraph) => Some(paragraph),
            Block::Table(_) => None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
    pub header: bool,
    /// Row height in twips.
    pub height: Option<u32>,
}

impl TableRow {
    /// Number of grid columns covered by the row.
    #[must_use]
    pub fn span(&self) -> usize {
        self.cells.iter().map(|cell| cell.grid_span.max(1) as usize).sum()
    }

    /// Physical index of the cell covering grid column `col`.
    #[must_use]
    pub fn cell_index_for_column(&self, col: usize) -> Option<usize> {
        let mut start = 0;
        for (index, cell) in self.cells.iter().enumerate() {
            let span = cell.grid_span.max(1) as usize;
            if col < start + span {
                return Some(index);
            }
            start += span;
        }
        None
    }

    /// Grid column where the physical cell `index` starts.
    #[must_use]
    pub fn column_of_cell(&self, index: usize) -> usize {
        self.cells
            .iter()
            .take(index)
            .map(|cell| cell.grid_span.max(1) as usize)
            .sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub style: Option<String>,
    pub alignment: Option<Alignment>,
    /// Border style applied to every edge, for example `single`.
    pub borders: Option<String>,
    /// Grid column widths in twips.
    pub grid: Vec<u32>,
    pub rows: Vec<TableRow>,
}

impl Table {
    /// Builds an empty `rows` by `cols` grid with uniform column widths.
    #[must_use]
    pub fn new(rows: usize, cols: usize, column_width: u32) -> Self {
        Self {
            style: None,
            alignment: None,
            borders: None,
            grid: vec![column_width; cols],
            rows: (0..rows)
                .map(|_| TableRow {
                    cells: (0..cols).map(|_| TableCell::with_width(column_width)).collect(),
                    header: false,
                    height: None,
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(TableRow::span)
            .max()
            .unwrap_or(0)
            .max(self.grid.len())
    }

    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Option<&TableCell> {
        let row = self.rows.get(row)?;
        row.cells.get(row.cell_index_for_column(col)?)
    }

    pub fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut TableCell> {
        let row = self.rows.get_mut(row)?;
        let index = row.cell_index_for_column(col)?;
        row.cells.get_mut(index)
    }

    /// Cell texts per grid column. Horizontally merged cells repeat their
    /// text for every column they cover.
    #[must_use]
    pub fn rows_as_text(&self) -> Vec<Vec<String>> {
        let cols = self.column_count();
        self.rows
            .iter()
            .map(|row| {
                (0..cols)
                    .map(|col| {
                        row.cell_index_for_column(col)
                            .and_then(|index| row.cells.get(index))
                            .map(TableCell::text)
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_lookup_honours_spans() {
        let mut table = Table::new(1, 3, 2160);
        table.rows[0].cells.remove(1);
        table.rows[0].cells[0].grid_span = 2;
        assert_eq!(table.rows[0].cell_index_for_column(1), Some(0));
        assert_eq!(table.rows[0].cell_index_for_column(2), Some(1));
        assert_eq!(table.rows[0].column_of_cell(1), 2);
        assert_eq!(table.column_count(), 3);
    }

    #[test]
    fn cell_text_round_trips_lines() {
        let mut cell = TableCell::default();
        cell.set_text("one\ntwo");
        assert_eq!(cell.blocks.len(), 2);
        assert_eq!(cell.text(), "one\ntwo");
    }
}
