//! Verse input types and loading.

mod loader;
mod verse;

pub use loader::{file_digest, load_verses};
pub use verse::{Token, Verse, VerseId};
