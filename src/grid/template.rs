//! Grid Template - immutable rectangular matrix of cell kinds.
//!
//! A template describes one page of the mosaic. Templates are validated
//! eagerly and shared (`Rc<GridTemplate>`) by every page built from them.

use std::fmt;

use crate::error::{GridError, Result};
use crate::types::CellKind;

/// Rectangular mosaic layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridTemplate {
    rows: usize,
    cols: usize,
    content: Vec<Vec<CellKind>>,
}

/// Validate a matrix and build a template from it.
///
/// The first row sets the column count; any row of a different length fails
/// with [`GridError::RaggedRow`] naming that row.
pub fn create_grid_template(content: Vec<Vec<CellKind>>) -> Result<GridTemplate> {
    let cols = content.first().map(Vec::len).unwrap_or(0);
    if cols == 0 {
        return Err(GridError::EmptyTemplate);
    }

    for (row, cells) in content.iter().enumerate() {
        if cells.len() != cols {
            return Err(GridError::RaggedRow {
                row,
                expected: cols,
                found: cells.len(),
            });
        }
    }

    Ok(GridTemplate {
        rows: content.len(),
        cols,
        content,
    })
}

impl GridTemplate {
    /// Parse the text notation, one string per row.
    ///
    /// ```ignore
    /// let template = GridTemplate::parse(&["_X_X", "X_X_"])?;
    /// ```
    pub fn parse<S: AsRef<str>>(rows: &[S]) -> Result<Self> {
        let content = rows
            .iter()
            .map(|row| {
                row.as_ref()
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .map(CellKind::from_tag)
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        create_grid_template(content)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Kind at a coordinate, `None` when outside the template.
    pub fn kind_at(&self, col: usize, row: usize) -> Option<CellKind> {
        self.content.get(row).and_then(|cells| cells.get(col)).copied()
    }

    /// Number of cells of the given kind.
    pub fn count(&self, kind: CellKind) -> usize {
        self.content
            .iter()
            .flatten()
            .filter(|cell| **cell == kind)
            .count()
    }

    pub fn content(&self) -> &[Vec<CellKind>] {
        &self.content
    }
}

impl fmt::Display for GridTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.content.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for cell in row {
                write!(f, "{}", cell.tag())?;
            }
        }
        Ok(())
    }
}
