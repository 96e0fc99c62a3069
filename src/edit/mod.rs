//! Vector-level text editing.
//!
//! A click is resolved by the [`TextProximityLocator`] to an existing
//! element or to the line of page text under it. Elements live in the
//! [`EditElementStore`] with linear undo history. On save the
//! [`VectorPatcher`] plans a background fill plus redrawn text for each
//! element and the [`PatchWriter`] appends them as a new content stream,
//! so the page is never rasterized.

mod locator;
mod patcher;
mod raster;
mod sanitize;
mod session;
mod store;
mod writer;

pub use locator::{LocateResult, TextMatch, TextProximityLocator};
pub use patcher::{DrawCommand, PagePatch, PlacedLine, TextDraw, VectorPatcher, LINE_HEIGHT};
pub use raster::{BlankPageSource, PageRasterSource, RasterSurface, MAX_SURFACE_SIDE};
pub use sanitize::{sanitize_text, split_lines};
pub use session::{ClickOutcome, EditorSession};
pub use store::{EditElementStore, HistorySnapshot};
pub use writer::{encode_win_ansi, PatchWriter};
