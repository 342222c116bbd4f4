use serde::{Deserialize, Serialize};

use super::{DocumentError, DocumentResult};
use crate::document::{
    Block,
    Paragraph,
    StyleType,
    Table,
    TableCell,
    TableRow,
    VMerge,
    WordDocument,
    inches_to_twips,
};

pub const MAX_TABLE_ROWS: usize = 32_767;
pub const MAX_TABLE_COLUMNS: usize = 63;
/// Default column width: 1.5 inches.
pub const DEFAULT_COLUMN_WIDTH: u32 = 2160;
pub const BORDER_STYLES: &[&str] = &["single", "double", "dotted", "dashed", "thick", "none"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableInfo {
    pub index: usize,
    pub rows: usize,
    pub columns: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    pub cells: Vec<Vec<String>>,
}

/// Inclusive rectangle of grid cells.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CellRange {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

fn describe(index: usize, table: &Table) -> TableInfo {
    TableInfo {
        index,
        rows: table.row_count(),
        columns: table.column_count(),
        style: table.style.clone(),
        cells: table.rows_as_text(),
    }
}

fn check_cell(table: &Table, row: usize, col: usize) -> DocumentResult<()> {
    if row >= table.row_count() {
        return Err(DocumentError::out_of_range("Row", row, table.row_count()));
    }
    if col >= table.column_count() {
        return Err(DocumentError::out_of_range("Column", col, table.column_count()));
    }
    Ok(())
}

fn empty_like(cell: &TableCell) -> TableCell {
    TableCell {
        width: cell.width,
        grid_span: cell.grid_span,
        v_merge: None,
        shading: cell.shading.clone(),
        blocks: vec![Block::Paragraph(Paragraph::default())],
    }
}

impl WordDocument {
    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` for an unknown table.
    pub fn table_info(&self, index: usize) -> DocumentResult<TableInfo> {
        Ok(describe(index, self.table(index)?))
    }

    #[must_use]
    pub fn table_infos(&self) -> Vec<TableInfo> {
        self.tables()
            .enumerate()
            .map(|(index, table)| describe(index, table))
            .collect()
    }

    /// Adds a table at the end of the body, or after a paragraph. `data` is
    /// truncated to the grid. Returns the new table index.
    ///
    /// # Errors
    /// Returns `DocumentError::InvalidArgument` for dimensions outside
    /// 1..=32767 rows and 1..=63 columns or a non-table style.
    pub fn add_table(
        &mut self,
        rows: usize,
        cols: usize,
        style: Option<&str>,
        data: Option<&[Vec<String>]>,
        after_paragraph: Option<usize>,
    ) -> DocumentResult<usize> {
        if !(1..=MAX_TABLE_ROWS).contains(&rows) {
            return Err(DocumentError::invalid(format!(
                "Rows must be between 1 and {MAX_TABLE_ROWS}"
            )));
        }
        if !(1..=MAX_TABLE_COLUMNS).contains(&cols) {
            return Err(DocumentError::invalid(format!(
                "Columns must be between 1 and {MAX_TABLE_COLUMNS}"
            )));
        }
        let style = style.map(|name| self.resolve_table_style(name)).transpose()?;
        let position = match after_paragraph {
            Some(paragraph) => self.paragraph_block_index(paragraph)? + 1,
            None => self.body.len(),
        };
        let mut table = Table::new(rows, cols, DEFAULT_COLUMN_WIDTH);
        table.style = style;
        if let Some(data) = data {
            for (row_index, values) in data.iter().take(rows).enumerate() {
                for (col_index, value) in values.iter().take(cols).enumerate() {
                    if let Some(cell) = table.cell_mut(row_index, col_index) {
                        cell.set_text(value);
                    }
                }
            }
        }
        self.body.insert(position, Block::Table(table));
        Ok(self.body[..position]
            .iter()
            .filter(|block| matches!(block, Block::Table(_)))
            .count())
    }

    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` for an unknown table.
    pub fn delete_table(&mut self, index: usize) -> DocumentResult<()> {
        let position = self.table_block_index(index)?;
        self.body.remove(position);
        Ok(())
    }

    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` for unknown tables or cells.
    pub fn cell_text(&self, index: usize, row: usize, col: usize) -> DocumentResult<String> {
        let table = self.table(index)?;
        check_cell(table, row, col)?;
        Ok(table.cell(row, col).map(TableCell::text).unwrap_or_default())
    }

    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` for unknown tables or cells.
    pub fn set_cell(&mut self, index: usize, row: usize, col: usize, text: &str) -> DocumentResult<()> {
        let table = self.table_mut(index)?;
        check_cell(table, row, col)?;
        if let Some(cell) = table.cell_mut(row, col) {
            cell.set_text(text);
        }
        Ok(())
    }

    /// Adds a row shaped like the last row, at `position` or the end.
    /// Returns the new row index.
    ///
    /// # Errors
    /// Returns `DocumentError::InvalidArgument` when the table is full or the
    /// position is past the end.
    pub fn add_row(&mut self, index: usize, values: Option<&[String]>, position: Option<usize>) -> DocumentResult<usize> {
        let table = self.table_mut(index)?;
        if table.row_count() >= MAX_TABLE_ROWS {
            return Err(DocumentError::invalid(format!("Maximum rows ({MAX_TABLE_ROWS}) exceeded")));
        }
        let position = position.unwrap_or(table.row_count());
        if position > table.row_count() {
            return Err(DocumentError::out_of_range("Row", position, table.row_count() + 1));
        }
        let template = table.rows.get(position.saturating_sub(1)).or_else(|| table.rows.first());
        let mut row = template.map_or_else(
            || TableRow {
                cells: table.grid.iter().map(|width| TableCell::with_width(*width)).collect(),
                header: false,
                height: None,
            },
            |template| TableRow {
                cells: template.cells.iter().map(empty_like).collect(),
                header: false,
                height: template.height,
            },
        );
        if let Some(values) = values {
            for (col, value) in values.iter().enumerate() {
                if let Some(cell_index) = row.cell_index_for_column(col) {
                    row.cells[cell_index].set_text(value);
                }
            }
        }
        table.rows.insert(position, row);
        Ok(position)
    }

    /// Adds a column at `position` or the end. Returns the new column index.
    ///
    /// # Errors
    /// Returns `DocumentError::InvalidArgument` when the table is full or the
    /// position is past the end.
    pub fn add_column(
        &mut self,
        index: usize,
        width_inches: Option<f64>,
        values: Option<&[String]>,
        position: Option<usize>,
    ) -> DocumentResult<usize> {
        let width = match width_inches {
            Some(inches) if !inches.is_finite() || inches <= 0.0 => {
                return Err(DocumentError::invalid("Column width must be positive"));
            }
            Some(inches) => inches_to_twips(inches),
            None => DEFAULT_COLUMN_WIDTH,
        };
        let table = self.table_mut(index)?;
        let columns = table.column_count();
        if columns >= MAX_TABLE_COLUMNS {
            return Err(DocumentError::invalid(format!(
                "Maximum columns ({MAX_TABLE_COLUMNS}) exceeded"
            )));
        }
        let position = position.unwrap_or(columns);
        if position > columns {
            return Err(DocumentError::out_of_range("Column", position, columns + 1));
        }
        for (row_index, row) in table.rows.iter_mut().enumerate() {
            let mut cell = TableCell::with_width(width);
            if let Some(value) = values.and_then(|values| values.get(row_index)) {
                cell.set_text(value);
            }
            match row.cell_index_for_column(position) {
                Some(cell_index) if row.column_of_cell(cell_index) == position => {
                    row.cells.insert(cell_index, cell);
                }
                Some(cell_index) => row.cells[cell_index].grid_span += 1,
                None => row.cells.push(cell),
            }
        }
        let grid_position = position.min(table.grid.len());
        table.grid.insert(grid_position, width);
        Ok(position)
    }

    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` or `DocumentError::InvalidArgument`
    /// when removing the only row.
    pub fn delete_row(&mut self, index: usize, row: usize) -> DocumentResult<()> {
        let table = self.table_mut(index)?;
        if row >= table.row_count() {
            return Err(DocumentError::out_of_range("Row", row, table.row_count()));
        }
        if table.row_count() == 1 {
            return Err(DocumentError::invalid("Cannot delete the only row of a table"));
        }
        let removed = table.rows.remove(row);
        if let Some(next) = table.rows.get_mut(row) {
            for (cell_index, cell) in removed.cells.iter().enumerate() {
                if cell.v_merge != Some(VMerge::Restart) {
                    continue;
                }
                let col = removed.column_of_cell(cell_index);
                if let Some(below) = next
                    .cell_index_for_column(col)
                    .and_then(|below| next.cells.get_mut(below))
                    && below.v_merge == Some(VMerge::Continue)
                {
                    below.v_merge = Some(VMerge::Restart);
                    below.blocks.clone_from(&cell.blocks);
                }
            }
        }
        Ok(())
    }

    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` or `DocumentError::InvalidArgument`
    /// when removing the only column.
    pub fn delete_column(&mut self, index: usize, col: usize) -> DocumentResult<()> {
        let table = self.table_mut(index)?;
        let columns = table.column_count();
        if col >= columns {
            return Err(DocumentError::out_of_range("Column", col, columns));
        }
        if columns == 1 {
            return Err(DocumentError::invalid("Cannot delete the only column of a table"));
        }
        for row in &mut table.rows {
            let Some(cell_index) = row.cell_index_for_column(col) else {
                continue;
            };
            let cell = &mut row.cells[cell_index];
            if cell.grid_span > 1 {
                cell.grid_span -= 1;
            } else {
                row.cells.remove(cell_index);
            }
        }
        if col < table.grid.len() {
            table.grid.remove(col);
        }
        Ok(())
    }

    /// Merges a rectangle into its top-left cell: `gridSpan` across columns
    /// and `vMerge` down rows. Text of the merged cells is moved into the
    /// top-left cell.
    ///
    /// # Errors
    /// Returns `DocumentError::InvalidArgument` for inverted or out-of-range
    /// rectangles, or when the rectangle cuts through an existing merge.
    pub fn merge_cells(&mut self, index: usize, range: CellRange) -> DocumentResult<()> {
        let CellRange {
            start_row,
            start_col,
            end_row,
            end_col,
        } = range;
        let table = self.table_mut(index)?;
        if start_row > end_row || start_col > end_col {
            return Err(DocumentError::invalid("Invalid cell range for merge"));
        }
        check_cell(table, end_row, end_col)?;
        if start_row == end_row && start_col == end_col {
            return Ok(());
        }

        let mut spans = Vec::new();
        for row in &table.rows[start_row..=end_row] {
            let first = row.cell_index_for_column(start_col);
            let last = row.cell_index_for_column(end_col);
            let (Some(first), Some(last)) = (first, last) else {
                return Err(DocumentError::invalid("Merge range covers missing cells"));
            };
            let aligned = row.column_of_cell(first) == start_col
                && row.column_of_cell(last) + row.cells[last].grid_span.max(1) as usize == end_col + 1;
            if !aligned {
                return Err(DocumentError::invalid("Merge range splits an already merged cell"));
            }
            spans.push((first, last));
        }

        let mut merged_blocks = Vec::new();
        for (row, (first, last)) in table.rows[start_row..=end_row].iter().zip(&spans) {
            for cell in &row.cells[*first..=*last] {
                if !cell.text().is_empty() {
                    merged_blocks.extend(cell.blocks.iter().cloned());
                }
            }
        }
        if merged_blocks.is_empty() {
            merged_blocks.push(Block::Paragraph(Paragraph::default()));
        }

        let span = u32::try_from(end_col - start_col + 1)
            .map_err(|_| DocumentError::invalid("Merge range is too wide"))?;
        for (offset, (first, last)) in spans.into_iter().enumerate() {
            let row = &mut table.rows[start_row + offset];
            let width = row.cells[first..=last]
                .iter()
                .map(|cell| cell.width.unwrap_or(0))
                .sum::<u32>();
            let replaced: Vec<TableCell> = row.cells.drain(first..=last).collect();
            let shading = replaced.first().and_then(|cell| cell.shading.clone());
            let cell = TableCell {
                width: (width > 0).then_some(width),
                grid_span: span,
                v_merge: match (start_row == end_row, offset) {
                    (true, _) => None,
                    (false, 0) => Some(VMerge::Restart),
                    (false, _) => Some(VMerge::Continue),
                },
                shading,
                blocks: if offset == 0 {
                    std::mem::take(&mut merged_blocks)
                } else {
                    vec![Block::Paragraph(Paragraph::default())]
                },
            };
            row.cells.insert(first, cell);
        }
        Ok(())
    }

    /// # Errors
    /// Returns `DocumentError::NotFound` for an unknown style.
    pub fn set_table_style(&mut self, index: usize, style: &str) -> DocumentResult<()> {
        self.table(index)?;
        let style_id = self.resolve_table_style(style)?;
        self.table_mut(index)?.style = Some(style_id);
        Ok(())
    }

    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` or `DocumentError::InvalidArgument`
    /// for a non-positive width.
    pub fn set_column_width(&mut self, index: usize, col: usize, inches: f64) -> DocumentResult<()> {
        if !inches.is_finite() || inches <= 0.0 {
            return Err(DocumentError::invalid("Column width must be positive"));
        }
        let width = inches_to_twips(inches);
        let table = self.table_mut(index)?;
        let columns = table.column_count();
        if col >= columns {
            return Err(DocumentError::out_of_range("Column", col, columns));
        }
        if table.grid.len() < columns {
            table.grid.resize(columns, DEFAULT_COLUMN_WIDTH);
        }
        table.grid[col] = width;
        for row in &mut table.rows {
            if let Some(cell_index) = row.cell_index_for_column(col)
                && row.cells[cell_index].grid_span <= 1
            {
                row.cells[cell_index].width = Some(width);
            }
        }
        Ok(())
    }

    /// # Errors
    /// Returns `DocumentError::InvalidArgument` for an unknown border style.
    pub fn set_table_borders(&mut self, index: usize, style: &str) -> DocumentResult<()> {
        let wanted = style.trim().to_ascii_lowercase();
        if !BORDER_STYLES.contains(&wanted.as_str()) {
            return Err(DocumentError::invalid(format!(
                "Invalid border style: {style}. Use one of {}",
                BORDER_STYLES.join(", ")
            )));
        }
        self.table_mut(index)?.borders = Some(wanted);
        Ok(())
    }

    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` for an unknown table.
    pub fn table_as_rows(&self, index: usize) -> DocumentResult<Vec<Vec<String>>> {
        Ok(self.table(index)?.rows_as_text())
    }

    fn resolve_table_style(&mut self, name: &str) -> DocumentResult<String> {
        let id = self.resolve_style(name)?;
        match self.styles.find(&id).map(|style| style.style_type) {
            Some(StyleType::Table) | None => Ok(id),
            Some(_) => Err(DocumentError::invalid(format!("{name} is not a table style"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: usize, cols: usize) -> Vec<Vec<String>> {
        (0..rows)
            .map(|r| (0..cols).map(|c| format!("{r}{c}")).collect())
            .collect()
    }

    #[test]
    fn add_table_validates_and_fills() {
        let mut doc = WordDocument::new();
        assert!(doc.add_table(0, 2, None, None, None).is_err());
        assert!(doc.add_table(2, 64, None, None, None).is_err());
        let data = grid(3, 3);
        let index = doc.add_table(2, 2, Some("Table Grid"), Some(&data), None).unwrap();
        let info = doc.table_info(index).unwrap();
        assert_eq!(info.style.as_deref(), Some("TableGrid"));
        assert_eq!(info.cells, vec![vec!["00", "01"], vec!["10", "11"]]);
        assert!(doc.add_table(1, 1, Some("Heading 1"), None, None).is_err());
    }

    #[test]
    fn table_after_paragraph_gets_correct_index() {
        let mut doc = WordDocument::new();
        doc.add_paragraph("a", None, None).unwrap();
        doc.add_table(1, 1, None, None, None).unwrap();
        let index = doc.add_table(1, 1, None, None, Some(0)).unwrap();
        assert_eq!(index, 0);
        assert!(matches!(doc.body[1], Block::Table(_)));
    }

    #[test]
    fn rows_and_columns() {
        let mut doc = WordDocument::new();
        let data = grid(2, 2);
        doc.add_table(2, 2, None, Some(&data), None).unwrap();
        let values = vec!["x".to_string(), "y".to_string()];
        assert_eq!(doc.add_row(0, Some(&values), Some(1)).unwrap(), 1);
        assert_eq!(doc.add_column(0, Some(1.0), None, None).unwrap(), 2);
        let rows = doc.table_as_rows(0).unwrap();
        assert_eq!(rows[1], vec!["x", "y", ""]);
        assert_eq!(doc.table(0).unwrap().grid.len(), 3);
        doc.delete_column(0, 0).unwrap();
        doc.delete_row(0, 0).unwrap();
        assert_eq!(doc.table_as_rows(0).unwrap(), vec![vec!["y", ""], vec!["11", ""]]);
        assert!(doc.delete_row(0, 5).is_err());
    }

    #[test]
    fn merge_spans_columns_and_rows() {
        let mut doc = WordDocument::new();
        let data = grid(3, 3);
        doc.add_table(3, 3, None, Some(&data), None).unwrap();
        doc.merge_cells(
            0,
            CellRange {
                start_row: 0,
                start_col: 0,
                end_row: 1,
                end_col: 1,
            },
        )
        .unwrap();
        let table = doc.table(0).unwrap();
        assert_eq!(table.rows[0].cells.len(), 2);
        assert_eq!(table.rows[0].cells[0].grid_span, 2);
        assert_eq!(table.rows[0].cells[0].v_merge, Some(VMerge::Restart));
        assert_eq!(table.rows[1].cells[0].v_merge, Some(VMerge::Continue));
        assert_eq!(table.rows[0].cells[0].text(), "00\n01\n10\n11");
        let bad = CellRange {
            start_row: 0,
            start_col: 1,
            end_row: 0,
            end_col: 2,
        };
        assert!(doc.merge_cells(0, bad).is_err());
    }

    #[test]
    fn cell_access_and_borders() {
        let mut doc = WordDocument::new();
        doc.add_table(1, 2, None, None, None).unwrap();
        doc.set_cell(0, 0, 1, "hi").unwrap();
        assert_eq!(doc.cell_text(0, 0, 1).unwrap(), "hi");
        assert_eq!(
            doc.cell_text(0, 3, 0).unwrap_err().to_string(),
            "Row index 3 out of range (0-0)"
        );
        doc.set_table_borders(0, "Double").unwrap();
        assert!(doc.set_table_borders(0, "wavy").is_err());
        doc.set_column_width(0, 1, 2.0).unwrap();
        assert_eq!(doc.table(0).unwrap().grid[1], 2880);
    }
}
