//! Extension-based file classification.

use std::fmt;

use crate::naming::split_name;

/// Destination bucket for a file, named after the folder it lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Images,
    Videos,
    Audio,
    Documents,
    Archives,
    /// Fallback for unrecognized or missing extensions
    Others,
}

impl Category {
    /// Every category, in lookup order.
    pub const ALL: [Category; 6] = [
        Category::Images,
        Category::Videos,
        Category::Audio,
        Category::Documents,
        Category::Archives,
        Category::Others,
    ];

    /// Lower-case extensions owned by this category. Empty for `Others`.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Category::Images => &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "svg"],
            Category::Videos => &["mp4", "mkv", "avi", "mov", "wmv", "flv"],
            Category::Audio => &["mp3", "wav", "aac", "flac", "ogg"],
            Category::Documents => &[
                "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "md",
            ],
            Category::Archives => &["zip", "rar", "7z", "tar", "gz"],
            Category::Others => &[],
        }
    }

    /// Folder name under the destination root.
    pub fn folder_name(self) -> &'static str {
        match self {
            Category::Images => "Images",
            Category::Videos => "Videos",
            Category::Audio => "Audio",
            Category::Documents => "Documents",
            Category::Archives => "Archives",
            Category::Others => "Others",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.folder_name())
    }
}

/// The lower-cased text after the last `.` of `file_name`, or `""` if there is none.
///
/// Uses the same split as collision renaming, so a leading-dot name such as
/// `.jpg` or `.bashrc` has no extension.
pub fn extension_of(file_name: &str) -> String {
    let (_, ext) = split_name(file_name);
    ext.trim_start_matches('.').to_ascii_lowercase()
}

/// Classify a file name by its extension.
///
/// Matching is case-insensitive. Anything not in the fixed tables,
/// including names without an extension, is `Others`.
pub fn categorize(file_name: &str) -> Category {
    let ext = extension_of(file_name);
    if ext.is_empty() {
        return Category::Others;
    }

    Category::ALL
        .into_iter()
        .find(|category| category.extensions().contains(&ext.as_str()))
        .unwrap_or(Category::Others)
}
