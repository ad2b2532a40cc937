use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils;

/// A single note. Field names on disk are camelCase and must stay stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: i64, // epoch millis
    pub updated_at: i64, // epoch millis, never below created_at
    #[serde(default)]
    pub color: NoteColor,
    pub is_pinned: bool,
    pub is_locked: bool,
    #[serde(default)]
    pub category: NoteCategory,
}

impl Note {
    /// Blank note with a fresh id, stamped now.
    pub fn new() -> Self {
        let now = utils::now_millis();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: String::new(),
            content: String::new(),
            created_at: now,
            updated_at: now,
            color: NoteColor::default(),
            is_pinned: false,
            is_locked: false,
            category: NoteCategory::default(),
        }
    }

    /// Title for display; empty titles read as "Untitled".
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Untitled"
        } else {
            &self.title
        }
    }
}

impl Default for Note {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteColor {
    #[default]
    Default,
    Red,
    Orange,
    Yellow,
    Green,
    Cyan,
    Blue,
    Purple,
    Pink,
}

impl NoteColor {
    pub const ALL: [NoteColor; 9] = [
        NoteColor::Default,
        NoteColor::Red,
        NoteColor::Orange,
        NoteColor::Yellow,
        NoteColor::Green,
        NoteColor::Cyan,
        NoteColor::Blue,
        NoteColor::Purple,
        NoteColor::Pink,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NoteColor::Default => "default",
            NoteColor::Red => "red",
            NoteColor::Orange => "orange",
            NoteColor::Yellow => "yellow",
            NoteColor::Green => "green",
            NoteColor::Cyan => "cyan",
            NoteColor::Blue => "blue",
            NoteColor::Purple => "purple",
            NoteColor::Pink => "pink",
        }
    }

    /// Next palette entry, wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// Storable categories. "All" is a view filter, see [`CategoryFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NoteCategory {
    #[default]
    Personal,
    Work,
    Ideas,
    #[serde(rename = "To-Do")]
    ToDo,
}

impl NoteCategory {
    pub const ALL: [NoteCategory; 4] = [
        NoteCategory::Personal,
        NoteCategory::Work,
        NoteCategory::Ideas,
        NoteCategory::ToDo,
    ];

    pub fn label(self) -> &'static str {
        match self {
            NoteCategory::Personal => "Personal",
            NoteCategory::Work => "Work",
            NoteCategory::Ideas => "Ideas",
            NoteCategory::ToDo => "To-Do",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for NoteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for NoteCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "personal" => Ok(NoteCategory::Personal),
            "work" => Ok(NoteCategory::Work),
            "ideas" => Ok(NoteCategory::Ideas),
            "todo" => Ok(NoteCategory::ToDo),
            _ => Err(format!(
                "Unknown category '{}' (expected Personal, Work, Ideas or To-Do)",
                s
            )),
        }
    }
}

/// Category selection for the list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(NoteCategory),
}

impl CategoryFilter {
    /// Filter bar order: All first, then every storable category.
    pub fn options() -> Vec<CategoryFilter> {
        std::iter::once(CategoryFilter::All)
            .chain(NoteCategory::ALL.iter().copied().map(CategoryFilter::Only))
            .collect()
    }

    pub fn label(self) -> &'static str {
        match self {
            CategoryFilter::All => "All",
            CategoryFilter::Only(category) => category.label(),
        }
    }

    pub fn matches(self, category: NoteCategory) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => wanted == category,
        }
    }

    pub fn next(self) -> Self {
        let options = Self::options();
        let idx = options.iter().position(|f| *f == self).unwrap_or(0);
        options[(idx + 1) % options.len()]
    }

    pub fn previous(self) -> Self {
        let options = Self::options();
        let idx = options.iter().position(|f| *f == self).unwrap_or(0);
        options[(idx + options.len() - 1) % options.len()]
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(CategoryFilter::All)
        } else {
            s.parse::<NoteCategory>().map(CategoryFilter::Only)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiAction {
    Summarize,
    FixGrammar,
    Continue,
}

impl AiAction {
    pub const ALL: [AiAction; 3] = [AiAction::Summarize, AiAction::FixGrammar, AiAction::Continue];

    pub fn label(self) -> &'static str {
        match self {
            AiAction::Summarize => "Summarize",
            AiAction::FixGrammar => "Fix Grammar",
            AiAction::Continue => "Continue",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_serializes_with_camel_case_fields() {
        let mut note = Note::new();
        note.category = NoteCategory::ToDo;
        note.color = NoteColor::Purple;
        let value = serde_json::to_value(&note).unwrap();

        for field in ["id", "title", "content", "createdAt", "updatedAt", "color", "isPinned", "isLocked", "category"] {
            assert!(value.get(field).is_some(), "missing field {field}");
        }
        assert_eq!(value["category"], "To-Do");
        assert_eq!(value["color"], "purple");
    }

    #[test]
    fn missing_color_and_category_fall_back_to_defaults() {
        let json = r#"{"id":"a","title":"t","content":"c","createdAt":1,"updatedAt":2,"isPinned":false,"isLocked":false}"#;
        let note: Note = serde_json::from_str(json).unwrap();
        assert_eq!(note.color, NoteColor::Default);
        assert_eq!(note.category, NoteCategory::Personal);
    }

    #[test]
    fn new_notes_get_distinct_ids() {
        let a = Note::new();
        let b = Note::new();
        assert_ne!(a.id, b.id);
        assert!(a.updated_at >= a.created_at);
    }

    #[test]
    fn category_parsing_accepts_common_spellings() {
        assert_eq!("to-do".parse::<NoteCategory>(), Ok(NoteCategory::ToDo));
        assert_eq!("TODO".parse::<NoteCategory>(), Ok(NoteCategory::ToDo));
        assert_eq!("Ideas".parse::<NoteCategory>(), Ok(NoteCategory::Ideas));
        assert!("All".parse::<NoteCategory>().is_err());
        assert_eq!("all".parse::<CategoryFilter>(), Ok(CategoryFilter::All));
    }

    #[test]
    fn filter_cycles_through_all_options() {
        let mut filter = CategoryFilter::All;
        for _ in 0..CategoryFilter::options().len() {
            filter = filter.next();
        }
        assert_eq!(filter, CategoryFilter::All);
        assert_eq!(CategoryFilter::All.previous(), CategoryFilter::Only(NoteCategory::ToDo));
    }
}
