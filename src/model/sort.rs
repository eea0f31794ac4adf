use std::cmp::Ordering;

use super::status::normalize_status;
use super::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    Start,
    End,
    Progress,
    Status,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Ascending,
        }
    }

    /// Header-click behaviour: same key flips direction, a new key starts ascending.
    pub fn toggled(current: Option<SortSpec>, key: SortKey) -> SortSpec {
        match current {
            Some(spec) if spec.key == key => SortSpec {
                key,
                direction: match spec.direction {
                    SortDirection::Ascending => SortDirection::Descending,
                    SortDirection::Descending => SortDirection::Ascending,
                },
            },
            _ => SortSpec::ascending(key),
        }
    }
}

fn compare(a: &Task, b: &Task, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortKey::Start => a.start.cmp(&b.start),
        SortKey::End => a.end.cmp(&b.end),
        SortKey::Progress => a.effective_progress().total_cmp(&b.effective_progress()),
        SortKey::Status => {
            let status = |t: &Task| t.status.as_deref().map(normalize_status).unwrap_or_default();
            status(a).cmp(&status(b))
        }
    }
}

/// Stable sort of every sibling list in the forest. Parents never move
/// below their own subtasks.
pub fn sort_forest(tasks: &mut [Task], spec: SortSpec) {
    tasks.sort_by(|a, b| {
        let ord = compare(a, b, spec.key);
        match spec.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
    for task in tasks.iter_mut() {
        sort_forest(&mut task.subtasks, spec);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn task(id: &str, start_day: u32, progress: f32) -> Task {
        let d = NaiveDate::from_ymd_opt(2024, 1, start_day).unwrap();
        Task::new(id, id, d, d).with_progress(progress)
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn sorts_roots_and_each_sibling_list() {
        let mut forest = vec![
            task("b", 5, 0.0).with_subtasks(vec![task("b2", 9, 0.0), task("b1", 6, 0.0)]),
            task("a", 2, 0.0),
        ];
        sort_forest(&mut forest, SortSpec::ascending(SortKey::Start));
        assert_eq!(ids(&forest), ["a", "b"]);
        assert_eq!(ids(&forest[1].subtasks), ["b1", "b2"]);
    }

    #[test]
    fn descending_is_stable_for_ties() {
        let mut forest = vec![task("x", 1, 50.0), task("y", 1, 10.0), task("z", 1, 50.0)];
        sort_forest(
            &mut forest,
            SortSpec {
                key: SortKey::Progress,
                direction: SortDirection::Descending,
            },
        );
        assert_eq!(ids(&forest), ["x", "z", "y"]);
    }

    #[test]
    fn name_sort_ignores_case() {
        let mut forest = vec![task("beta", 1, 0.0), task("Alpha", 1, 0.0)];
        sort_forest(&mut forest, SortSpec::ascending(SortKey::Name));
        assert_eq!(ids(&forest), ["Alpha", "beta"]);
    }

    #[test]
    fn header_clicks_flip_direction() {
        let first = SortSpec::toggled(None, SortKey::End);
        assert_eq!(first, SortSpec::ascending(SortKey::End));
        let second = SortSpec::toggled(Some(first), SortKey::End);
        assert_eq!(second.direction, SortDirection::Descending);
        let other = SortSpec::toggled(Some(second), SortKey::Name);
        assert_eq!(other, SortSpec::ascending(SortKey::Name));
    }
}
