/*!
 * Dialog Options
 * Data contracts for open/save dialogs addressed by resource identifiers
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::vfs::resource::ResourceId;
use crate::vfs::types::FileStat;

/// Options for an open-file dialog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenDialogOptions {
    /// Where the dialog starts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_resource: Option<ResourceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_label: Option<String>,
    pub open_files: bool,
    pub open_folders: bool,
    pub open_many: bool,
}

impl Default for OpenDialogOptions {
    fn default() -> Self {
        Self {
            default_resource: None,
            open_label: None,
            open_files: true,
            open_folders: false,
            open_many: false,
        }
    }
}

impl OpenDialogOptions {
    pub fn starting_at(mut self, resource: ResourceId) -> Self {
        self.default_resource = Some(resource);
        self
    }

    /// True if an entry with this stat may be picked
    pub fn accepts(&self, stat: &FileStat) -> bool {
        if stat.is_dir() {
            self.open_folders
        } else {
            self.open_files
        }
    }

    /// Apply `open_many` to a raw selection, keeping order
    pub fn limit_selection(&self, mut selection: Vec<ResourceId>) -> Vec<ResourceId> {
        if !self.open_many {
            selection.truncate(1);
        }
        selection
    }
}

/// Options for a save-file dialog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveDialogOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_resource: Option<ResourceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_label: Option<String>,
}

/// Presents dialogs and reports what the user chose
///
/// An empty open selection and a `None` save target both mean the dialog was
/// dismissed.
#[async_trait]
pub trait DialogService: Send + Sync {
    async fn show_open_dialog(&self, options: &OpenDialogOptions) -> Vec<ResourceId>;

    async fn show_save_dialog(&self, options: &SaveDialogOptions) -> Option<ResourceId>;
}
