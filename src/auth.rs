//! Identity-provider seams: access tokens, token sources, and the shared token accessor.

pub mod provider;
pub mod token;

pub use provider::*;
pub use token::*;
