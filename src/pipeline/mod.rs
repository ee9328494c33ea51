//! Pipeline stages for finding and quarantining unused images.
//!
//! Each submodule implements exactly one step and is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! document text ──▶ extract ──▶ normalize ──▶ resolve ──▶ relocate
//!                   (regex)     (lexical)     (working     (move into
//!                                              set)         quarantine)
//! ```
//!
//! 1. [`extract`]   — pull raw image paths out of Markdown embeds
//! 2. [`normalize`] — turn a raw path into a comparable absolute key
//! 3. [`resolve`]   — eliminate referenced images from the working set
//! 4. [`relocate`]  — move survivors into the quarantine directory; the only
//!    stage that writes to the workspace

pub mod extract;
pub mod normalize;
pub mod relocate;
pub mod resolve;
