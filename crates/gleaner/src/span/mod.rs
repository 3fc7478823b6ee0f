//! Character spans: alignment, assembly and overlap resolution.

mod align;
mod resolve;
mod types;

pub use align::{Aligner, Alignment, DEFAULT_SEARCH_WINDOW, align_tokens};
pub use resolve::{MergeMode, TokenLabel, assemble_spans, merge_contiguous, resolve_overlaps};
pub use types::{CharOffsets, Span, SpanSource, ranges_intersect};
