//! Notebook document model and traversal.
//!
//! A notebook is an ordered sequence of worksheets, each an ordered sequence
//! of cells. Only code cells carry execution artifacts (`outputs` and
//! `prompt_number`); the other kinds are narrative content the engine never
//! touches. Every struct keeps unmodeled fields in a flattened `extra` map
//! so a load → mutate → save cycle preserves them.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Format version this model was written against.
pub const NBFORMAT: u32 = 3;

/// A notebook document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notebook {
    /// Document metadata.
    #[serde(default)]
    pub metadata: NotebookMetadata,

    /// Format version of the persisted document.
    pub nbformat: u32,

    /// Ordered worksheets; in the observed format, typically exactly one.
    #[serde(default)]
    pub worksheets: Vec<Worksheet>,

    /// Unmodeled top-level fields, preserved across load/save.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Notebook metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotebookMetadata {
    /// Notebook name, used in run summaries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// An ordered grouping of cells within a notebook.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Worksheet {
    /// Ordered cells; order is significant and stable.
    #[serde(default)]
    pub cells: Vec<Cell>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One unit of notebook content, tagged by kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
pub enum Cell {
    /// Executable cell with recorded execution state.
    Code(CodeCell),

    /// Narrative prose.
    Markdown(TextCell),

    /// Unrendered text passed through untouched.
    Raw(TextCell),

    /// Section heading.
    Heading(HeadingCell),
}

/// The closed set of cell kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Code,
    Markdown,
    Raw,
    Heading,
}

impl Cell {
    /// The kind tag of this cell.
    pub fn kind(&self) -> CellKind {
        match self {
            Cell::Code(_) => CellKind::Code,
            Cell::Markdown(_) => CellKind::Markdown,
            Cell::Raw(_) => CellKind::Raw,
            Cell::Heading(_) => CellKind::Heading,
        }
    }

    /// The code payload, if this is a code cell.
    pub fn as_code(&self) -> Option<&CodeCell> {
        match self {
            Cell::Code(code) => Some(code),
            _ => None,
        }
    }

    /// Mutable variant of [`Cell::as_code`].
    pub fn as_code_mut(&mut self) -> Option<&mut CodeCell> {
        match self {
            Cell::Code(code) => Some(code),
            _ => None,
        }
    }
}

/// An executable cell.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeCell {
    /// Source text submitted to the kernel.
    #[serde(default)]
    pub source: String,

    /// Prompt number recorded by a prior run; `None` means never executed
    /// or previously cleared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_number: Option<u64>,

    /// Recorded execution artifacts.
    #[serde(default)]
    pub outputs: Vec<Output>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CodeCell {
    /// A code cell is clean when it carries no execution artifacts.
    pub fn is_clean(&self) -> bool {
        self.outputs.is_empty() && self.prompt_number.is_none()
    }
}

/// A narrative or raw cell.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextCell {
    /// Cell text.
    #[serde(default)]
    pub source: String,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A heading cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadingCell {
    /// Heading text.
    #[serde(default)]
    pub source: String,

    /// Heading depth, 1-based.
    #[serde(default = "default_heading_level")]
    pub level: u32,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_heading_level() -> u32 {
    1
}

/// A recorded execution artifact attached to a code cell.
///
/// The payload is mime-typed data the engine never interprets; only its
/// presence or absence matters here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Output(pub serde_json::Value);

impl Notebook {
    /// Create an empty notebook at the current format version.
    pub fn new() -> Self {
        Self {
            metadata: NotebookMetadata::default(),
            nbformat: NBFORMAT,
            worksheets: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }

    /// Iterate all cells in (worksheet, cell) order.
    ///
    /// The sequence is lazy and fresh on each call; repeated calls on an
    /// unmodified document yield the same order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.worksheets.iter().flat_map(|ws| ws.cells.iter())
    }

    /// Mutable variant of [`Notebook::cells`].
    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> + '_ {
        self.worksheets.iter_mut().flat_map(|ws| ws.cells.iter_mut())
    }

    /// Iterate cells of one kind, in traversal order.
    pub fn cells_of(&self, kind: CellKind) -> impl Iterator<Item = &Cell> + '_ {
        self.cells().filter(move |cell| cell.kind() == kind)
    }

    /// Iterate code cells together with their positions in the full
    /// traversal.
    pub fn code_cells(&self) -> impl Iterator<Item = (usize, &CodeCell)> + '_ {
        self.cells()
            .enumerate()
            .filter_map(|(index, cell)| cell.as_code().map(|code| (index, code)))
    }

    /// Mutable variant of [`Notebook::code_cells`].
    pub fn code_cells_mut(&mut self) -> impl Iterator<Item = (usize, &mut CodeCell)> + '_ {
        self.cells_mut()
            .enumerate()
            .filter_map(|(index, cell)| cell.as_code_mut().map(|code| (index, code)))
    }

    /// Read a notebook from a file.
    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        check_file_name(path)?;
        let content = fs::read_to_string(path)?;
        let notebook = serde_json::from_str(&content)?;
        Ok(notebook)
    }

    /// Write the notebook to a file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

impl Default for Notebook {
    fn default() -> Self {
        Self::new()
    }
}

/// Notebook file names must not contain whitespace.
fn check_file_name(path: &Path) -> Result<()> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    if name.chars().any(char::is_whitespace) {
        return Err(Error::Filename(format!(
            "'{}' contains whitespace",
            path.display()
        )));
    }
    Ok(())
}
