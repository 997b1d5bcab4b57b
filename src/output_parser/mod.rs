//! # Judge Output Parser
//!
//! Extracts candidate indices from judge-model replies (Rank, Vote).
//! Handles think blocks, prose around the numbers, and out-of-range or
//! repeated indices without another model call.
//!
//! | Parser | Use Case |
//! |--------|----------|
//! | [`parse_ranking`] | Ordered list of candidate indices |
//! | [`parse_choice_index`] | A single chosen candidate |
//! | [`strip_think_tags`] | Remove `<think>` blocks from text |

pub mod error;
pub mod extract;
pub mod ranking;

pub use error::ParseError;
pub use extract::{preprocess, strip_think_tags};
pub use ranking::{parse_choice_index, parse_ranking};
