/*!
 * API Module
 * Boundary contracts for dialogs, diff commands and document colors
 */

pub mod color;
pub mod commands;
pub mod dialogs;

// Re-export for convenience
pub use color::{
    Color, ColorError, ColorFormat, ColorProviderRegistry, ColorRange, DocumentColorProvider,
    Position, Range,
};
pub use commands::{CommandError, DiffCommandRegistry, LineChange};
pub use dialogs::{DialogService, OpenDialogOptions, SaveDialogOptions};
