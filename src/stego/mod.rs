//! Steganographic message hiding.
//!
//! An experimental sibling of the text pipeline: the substitution layer's
//! output is embedded directly into a carrier image's least-significant
//! bits. Layers 2 and 3 are not involved — confidentiality rests on the
//! substitution cipher plus the obscurity of the hiding location, which is
//! deliberately weaker than the full chain.

mod image;

pub use image::{hide, reveal, StegoError};
