use crate::todo::{FilterCriteria, TodoRecord};

/// Keeps the todos whose owner and category contain the set criteria.
///
/// Matching is a case-insensitive substring test and the criteria are
/// ANDed. Unset criteria match everything. The input is left untouched.
pub fn filter_todos(todos: &[TodoRecord], criteria: &FilterCriteria) -> Vec<TodoRecord> {
    let owner = criteria.owner.as_deref().map(str::to_lowercase);
    let category = criteria.category.as_deref().map(str::to_lowercase);

    todos
        .iter()
        .filter(|todo| matches(&todo.owner, owner.as_deref()))
        .filter(|todo| matches(&todo.category, category.as_deref()))
        .cloned()
        .collect()
}

fn matches(field: &str, needle: Option<&str>) -> bool {
    match needle {
        Some(needle) => field.to_lowercase().contains(needle),
        None => true,
    }
}
