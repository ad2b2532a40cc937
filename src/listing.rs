//! What the note list shows: search, category filter and ordering.

use std::cmp::Reverse;

use crate::models::{CategoryFilter, Note};

/// Notes matching `query` and `filter`, pinned first, newest edit first.
///
/// The query is a case-insensitive substring match against title or content;
/// an empty query matches everything. The sort is stable, so notes with equal
/// keys keep their collection order between renders.
pub fn visible_notes(notes: &[Note], query: &str, filter: CategoryFilter) -> Vec<Note> {
    let needle = query.to_lowercase();
    let mut visible: Vec<Note> = notes
        .iter()
        .filter(|note| matches_query(note, &needle))
        .filter(|note| filter.matches(note.category))
        .cloned()
        .collect();

    visible.sort_by_key(|note| (Reverse(note.is_pinned), Reverse(note.updated_at)));
    visible
}

/// `needle` must already be lowercased.
fn matches_query(note: &Note, needle: &str) -> bool {
    needle.is_empty()
        || note.title.to_lowercase().contains(needle)
        || note.content.to_lowercase().contains(needle)
}

/// Number of notes per filter option, in filter bar order.
pub fn category_counts(notes: &[Note]) -> Vec<(CategoryFilter, usize)> {
    CategoryFilter::options()
        .into_iter()
        .map(|filter| {
            let count = notes.iter().filter(|n| filter.matches(n.category)).count();
            (filter, count)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NoteCategory;

    fn note(title: &str, content: &str, updated_at: i64) -> Note {
        let mut n = Note::new();
        n.title = title.to_string();
        n.content = content.to_string();
        n.created_at = 0;
        n.updated_at = updated_at;
        n
    }

    #[test]
    fn query_matches_content_case_insensitively() {
        let notes = vec![note("a", "Remember the MILK", 1), note("b", "nothing", 2)];
        let visible = visible_notes(&notes, "milk", CategoryFilter::All);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "a");
    }

    #[test]
    fn equal_keys_keep_collection_order() {
        let notes = vec![note("x", "", 5), note("y", "", 5), note("z", "", 5)];
        let titles: Vec<_> = visible_notes(&notes, "", CategoryFilter::All)
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["x", "y", "z"]);
    }

    #[test]
    fn counts_cover_every_option() {
        let mut work = note("w", "", 1);
        work.category = NoteCategory::Work;
        let notes = vec![work, note("p", "", 2)];
        let counts = category_counts(&notes);
        assert_eq!(counts[0], (CategoryFilter::All, 2));
        assert!(counts.contains(&(CategoryFilter::Only(NoteCategory::Work), 1)));
        assert!(counts.contains(&(CategoryFilter::Only(NoteCategory::Ideas), 0)));
    }
}
