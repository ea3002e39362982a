//! UI components for Draftroom

pub mod editor;
pub mod outline;
pub mod preview;
pub mod status;
