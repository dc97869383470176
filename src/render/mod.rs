//! Message rendering.
//!
//! Model replies mix markdown prose with fenced code blocks. The optimized
//! prompt itself is usually delivered inside a fence, so code sections are
//! kept verbatim and rendered separately from the prose around them.
//!
//! - [`split_sections`]: the fence scanner shared by every renderer
//! - [`render_html`]: chat view markup
//! - [`render_terminal`]: CLI output

mod fence;
mod html;
mod terminal;

pub use fence::{Section, SectionKind, code_blocks, split_sections};
pub use html::{escape_html, render_html};
pub use terminal::render_terminal;
