//! Task trees: flattening into display rows, expand/selection state, and
//! assembling flat `parent_id` lists into a forest.

use std::collections::{HashMap, HashSet};
use std::fmt;

use super::task::{walk, Task};

/// One display row of the task table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Row<'a> {
    pub task: &'a Task,
    /// 0 for roots, 1 for their direct subtasks, and so on.
    pub depth: usize,
    pub is_expanded: bool,
    pub is_subtask: bool,
    pub has_children: bool,
    pub parent_id: Option<&'a str>,
}

/// Which rows are expanded. Owned by the caller, never by the flattener.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded: HashSet<String>,
}

impl ExpansionState {
    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    pub fn toggle(&mut self, id: &str) {
        if !self.expanded.remove(id) {
            self.expanded.insert(id.to_string());
        }
    }

    pub fn expand(&mut self, id: &str) {
        self.expanded.insert(id.to_string());
    }

    pub fn collapse(&mut self, id: &str) {
        self.expanded.remove(id);
    }

    /// Expand every task in the forest that has subtasks.
    pub fn expand_all(&mut self, forest: &[Task]) {
        self.expanded
            .extend(walk(forest).filter(|t| t.has_children()).map(|t| t.id.clone()));
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// Forget ids no longer present in the forest.
    pub fn retain_existing(&mut self, forest: &[Task]) {
        let ids: HashSet<&str> = walk(forest).map(|t| t.id.as_str()).collect();
        self.expanded.retain(|id| ids.contains(id.as_str()));
    }
}

/// Which rows are checked. Independent of expansion; selecting a parent
/// does not select its children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected: HashSet<String>,
}

impl SelectionState {
    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn toggle(&mut self, id: &str) {
        if !self.selected.remove(id) {
            self.selected.insert(id.to_string());
        }
    }

    pub fn select(&mut self, id: &str) {
        self.selected.insert(id.to_string());
    }

    /// Select exactly the given rows.
    pub fn select_rows(&mut self, rows: &[Row<'_>]) {
        self.selected = rows.iter().map(|r| r.task.id.clone()).collect();
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn retain_existing(&mut self, forest: &[Task]) {
        let ids: HashSet<&str> = walk(forest).map(|t| t.id.as_str()).collect();
        self.selected.retain(|id| ids.contains(id.as_str()));
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

/// Flatten a forest into display rows. A task's subtasks follow it,
/// one level deeper, only while it is expanded. Input order is kept.
pub fn flatten_rows<'a>(roots: &'a [Task], expansion: &ExpansionState) -> Vec<Row<'a>> {
    let mut rows = Vec::new();
    push_rows(roots, None, 0, expansion, &mut rows);
    rows
}

fn push_rows<'a>(
    tasks: &'a [Task],
    parent_id: Option<&'a str>,
    depth: usize,
    expansion: &ExpansionState,
    rows: &mut Vec<Row<'a>>,
) {
    for task in tasks {
        let is_expanded = expansion.is_expanded(&task.id);
        rows.push(Row {
            task,
            depth,
            is_expanded,
            is_subtask: depth > 0,
            has_children: task.has_children(),
            parent_id,
        });
        if is_expanded {
            push_rows(&task.subtasks, Some(&task.id), depth + 1, expansion, rows);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrphanKind {
    /// The declared parent is not in the list.
    MissingParent,
    /// The task names itself as parent.
    SelfParent,
    /// The parent chain loops back on itself.
    Cycle,
}

/// A task shown at the top level because its declared parent could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanDiagnostic {
    pub task_id: String,
    pub task_name: String,
    pub declared_parent: String,
    pub kind: OrphanKind,
}

impl fmt::Display for OrphanDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let why = match self.kind {
            OrphanKind::MissingParent => "is not in the task list",
            OrphanKind::SelfParent => "is the task itself",
            OrphanKind::Cycle => "forms a cycle",
        };
        write!(
            f,
            "'{}' ({}) shown at top level: parent '{}' {}",
            self.task_name, self.task_id, self.declared_parent, why
        )
    }
}

/// Assemble a list of tasks carrying `parent_id` into a forest.
///
/// Subtasks already nested in their parent are kept, and a declared parent
/// may be any task in the input, nested or not. Tasks whose declared parent
/// is missing or themselves become roots and are reported. A parent cycle
/// is broken at its first member in input order, which becomes a root.
/// Roots and siblings keep their input order; nested subtasks come before
/// tasks attached by `parent_id`.
pub fn build_forest(tasks: Vec<Task>) -> (Vec<Task>, Vec<OrphanDiagnostic>) {
    // Slot table in pre-order, remembering which slot each nested task sat in.
    let mut slots: Vec<(Task, Option<usize>)> = Vec::new();
    flatten_into_slots(tasks, None, &mut slots);
    let n = slots.len();

    let mut index: HashMap<&str, usize> = HashMap::new();
    for (i, (task, _)) in slots.iter().enumerate() {
        if index.insert(task.id.as_str(), i).is_some() {
            log::warn!("Duplicate task id '{}'; parents resolve to the last one", task.id);
        }
    }

    let mut orphans = Vec::new();
    let mut parent: Vec<Option<usize>> = vec![None; n];
    for (i, (task, nested_in)) in slots.iter().enumerate() {
        if nested_in.is_some() {
            parent[i] = *nested_in;
            continue;
        }
        let Some(declared) = task.parent_id.as_deref() else {
            continue;
        };
        match index.get(declared) {
            Some(&p) if p == i => orphans.push((i, OrphanKind::SelfParent)),
            Some(&p) => parent[i] = Some(p),
            None => orphans.push((i, OrphanKind::MissingParent)),
        }
    }

    let mut is_root: Vec<bool> = parent.iter().map(Option::is_none).collect();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    for nested in [true, false] {
        for i in 0..n {
            if let Some(p) = parent[i] {
                if slots[i].1.is_some() == nested {
                    children[p].push(i);
                }
            }
        }
    }

    // Anything not reachable from a root hangs off a parent cycle.
    let mut visited = vec![false; n];
    for i in 0..n {
        if is_root[i] {
            mark_reachable(i, &children, &mut visited);
        }
    }
    for i in 0..n {
        if visited[i] {
            continue;
        }
        let member = first_cycle_member(i, &parent);
        is_root[member] = true;
        orphans.push((member, OrphanKind::Cycle));
        mark_reachable(member, &children, &mut visited);
    }

    let diagnostics: Vec<OrphanDiagnostic> = orphans
        .into_iter()
        .map(|(i, kind)| {
            let task = &slots[i].0;
            OrphanDiagnostic {
                task_id: task.id.clone(),
                task_name: task.name.clone(),
                declared_parent: task.parent_id.clone().unwrap_or_default(),
                kind,
            }
        })
        .collect();
    for diagnostic in &diagnostics {
        log::warn!("Orphaned task {}", diagnostic);
    }

    let mut slots: Vec<Option<Task>> = slots.into_iter().map(|(task, _)| Some(task)).collect();
    let mut forest = Vec::new();
    for i in 0..n {
        if is_root[i] {
            if let Some(mut root) = assemble(i, &mut slots, &children, &is_root) {
                root.parent_id = None;
                forest.push(root);
            }
        }
    }
    (forest, diagnostics)
}

fn flatten_into_slots(tasks: Vec<Task>, nested_in: Option<usize>, slots: &mut Vec<(Task, Option<usize>)>) {
    for mut task in tasks {
        let subtasks = std::mem::take(&mut task.subtasks);
        let i = slots.len();
        slots.push((task, nested_in));
        flatten_into_slots(subtasks, Some(i), slots);
    }
}

/// Follow parents up from `start` until one repeats, and return the member
/// of that loop that comes first in input order. `start` must not reach a root.
fn first_cycle_member(start: usize, parent: &[Option<usize>]) -> usize {
    let mut chain = Vec::new();
    let mut node = start;
    let loop_start = loop {
        if let Some(pos) = chain.iter().position(|&c| c == node) {
            break pos;
        }
        chain.push(node);
        match parent[node] {
            Some(p) => node = p,
            None => break chain.len() - 1,
        }
    };
    chain[loop_start..].iter().copied().min().unwrap_or(start)
}

fn mark_reachable(from: usize, children: &[Vec<usize>], visited: &mut [bool]) {
    let mut stack = vec![from];
    while let Some(i) = stack.pop() {
        if !std::mem::replace(&mut visited[i], true) {
            stack.extend(children[i].iter().copied());
        }
    }
}

fn assemble(
    i: usize,
    slots: &mut [Option<Task>],
    children: &[Vec<usize>],
    is_root: &[bool],
) -> Option<Task> {
    let mut task = slots[i].take()?;
    for &child in &children[i] {
        if is_root[child] {
            continue;
        }
        if let Some(mut sub) = assemble(child, slots, children, is_root) {
            sub.parent_id = Some(task.id.clone());
            task.subtasks.push(sub);
        }
    }
    Some(task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn task(id: &str) -> Task {
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Task::new(id, id.to_uppercase(), d, d)
    }

    fn child_of(id: &str, parent: &str) -> Task {
        let mut t = task(id);
        t.parent_id = Some(parent.to_string());
        t
    }

    fn ids<'a>(rows: &[Row<'a>]) -> Vec<&'a str> {
        rows.iter().map(|r| r.task.id.as_str()).collect()
    }

    #[test]
    fn collapsed_parent_hides_its_subtasks() {
        let forest = vec![task("A").with_subtasks(vec![task("A.1")])];
        let rows = flatten_rows(&forest, &ExpansionState::default());
        assert_eq!(ids(&rows), ["A"]);
        assert!(rows[0].has_children);
        assert!(!rows[0].is_expanded);
    }

    #[test]
    fn expanded_parent_shows_subtasks_one_level_deeper() {
        let forest = vec![task("A").with_subtasks(vec![task("A.1")])];
        let mut expansion = ExpansionState::default();
        expansion.expand("A");
        let rows = flatten_rows(&forest, &expansion);
        assert_eq!(ids(&rows), ["A", "A.1"]);
        assert_eq!(rows[1].depth, 1);
        assert!(rows[1].is_subtask);
        assert_eq!(rows[1].parent_id, Some("A"));
        assert_eq!(rows[0].parent_id, None);
    }

    #[test]
    fn deeper_levels_need_every_ancestor_expanded() {
        let forest = vec![
            task("a").with_subtasks(vec![
                task("a1").with_subtasks(vec![task("a1x"), task("a1y")]),
                task("a2"),
            ]),
            task("b"),
        ];
        let mut expansion = ExpansionState::default();
        expansion.expand("a1");
        assert_eq!(ids(&flatten_rows(&forest, &expansion)), ["a", "b"]);

        expansion.expand("a");
        let rows = flatten_rows(&forest, &expansion);
        assert_eq!(ids(&rows), ["a", "a1", "a1x", "a1y", "a2", "b"]);
        assert_eq!(rows.iter().map(|r| r.depth).collect::<Vec<_>>(), [0, 1, 2, 2, 1, 0]);
        assert_eq!(rows[2].parent_id, Some("a1"));
    }

    #[test]
    fn input_order_is_never_resorted() {
        let forest = vec![
            task("z").with_subtasks(vec![task("z2"), task("z1")]),
            task("m"),
        ];
        let mut expansion = ExpansionState::default();
        expansion.expand_all(&forest);
        assert_eq!(ids(&flatten_rows(&forest, &expansion)), ["z", "z2", "z1", "m"]);
    }

    #[test]
    fn expansion_state_toggles_and_prunes() {
        let forest = vec![task("a").with_subtasks(vec![task("a1")]), task("b")];
        let mut expansion = ExpansionState::default();
        expansion.toggle("a");
        assert!(expansion.is_expanded("a"));
        expansion.toggle("a");
        assert!(!expansion.is_expanded("a"));

        expansion.expand_all(&forest);
        assert!(expansion.is_expanded("a"));
        assert!(!expansion.is_expanded("b"));
        expansion.expand("gone");
        expansion.retain_existing(&forest);
        assert!(!expansion.is_expanded("gone"));
        expansion.collapse("a");
        assert!(!expansion.is_expanded("a"));
        expansion.expand("b");
        expansion.collapse_all();
        assert_eq!(expansion, ExpansionState::default());
    }

    #[test]
    fn selecting_a_parent_leaves_children_alone() {
        let forest = vec![task("a").with_subtasks(vec![task("a1")])];
        let mut selection = SelectionState::default();
        selection.toggle("a");
        assert!(selection.is_selected("a"));
        assert!(!selection.is_selected("a1"));

        let mut expansion = ExpansionState::default();
        expansion.expand("a");
        let rows = flatten_rows(&forest, &expansion);
        selection.select_rows(&rows);
        assert_eq!(selection.len(), 2);
        selection.toggle("a");
        assert!(selection.is_selected("a1"));
        selection.clear();
        assert!(selection.is_empty());
    }

    #[test]
    fn flat_list_is_assembled_into_a_tree() {
        let tasks = vec![task("p"), child_of("c1", "p"), task("q"), child_of("c2", "p"), child_of("g", "c1")];
        let (forest, orphans) = build_forest(tasks);
        assert!(orphans.is_empty());
        assert_eq!(forest.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(), ["p", "q"]);
        let p = &forest[0];
        assert_eq!(p.subtasks.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(), ["c1", "c2"]);
        assert_eq!(p.subtasks[0].subtasks[0].id, "g");
    }

    #[test]
    fn child_listed_before_its_parent_is_still_attached() {
        let (forest, orphans) = build_forest(vec![child_of("c", "p"), task("p")]);
        assert!(orphans.is_empty());
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].subtasks[0].id, "c");
    }

    #[test]
    fn orphans_become_roots_in_place() {
        let tasks = vec![task("a"), child_of("lost", "nowhere"), child_of("me", "me"), task("b")];
        let (forest, orphans) = build_forest(tasks);
        assert_eq!(
            forest.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(),
            ["a", "lost", "me", "b"]
        );
        assert!(forest.iter().all(|t| t.parent_id.is_none()));
        assert_eq!(orphans.len(), 2);
        assert_eq!(orphans[0].kind, OrphanKind::MissingParent);
        assert_eq!(orphans[0].declared_parent, "nowhere");
        assert_eq!(orphans[1].kind, OrphanKind::SelfParent);
    }

    #[test]
    fn parent_cycles_are_broken_at_the_first_member() {
        let tasks = vec![task("root"), child_of("x", "y"), child_of("y", "x")];
        let (forest, orphans) = build_forest(tasks);
        assert_eq!(forest.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(), ["root", "x"]);
        assert_eq!(forest[1].subtasks[0].id, "y");
        assert!(forest[1].subtasks[0].subtasks.is_empty());
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].kind, OrphanKind::Cycle);
        assert_eq!(walk(&forest).count(), 3);
    }

    #[test]
    fn tasks_hanging_off_a_cycle_stay_attached() {
        let tasks = vec![child_of("z", "y"), child_of("x", "y"), child_of("y", "x")];
        let (forest, orphans) = build_forest(tasks);
        assert_eq!(forest.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(), ["x"]);
        let y = &forest[0].subtasks[0];
        assert_eq!(y.id, "y");
        assert_eq!(y.subtasks.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(), ["z"]);
        assert_eq!(y.subtasks[0].parent_id.as_deref(), Some("y"));
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].task_id, "x");
        assert_eq!(orphans[0].kind, OrphanKind::Cycle);
    }

    #[test]
    fn parent_may_be_a_nested_subtask() {
        let tasks = vec![task("1").with_subtasks(vec![task("1.1")]), child_of("g", "1.1")];
        let (forest, orphans) = build_forest(tasks);
        assert!(orphans.is_empty());
        assert_eq!(forest.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(), ["1"]);
        let nested = &forest[0].subtasks[0];
        assert_eq!(nested.id, "1.1");
        assert_eq!(nested.subtasks[0].id, "g");
        assert_eq!(nested.subtasks[0].parent_id.as_deref(), Some("1.1"));
    }

    #[test]
    fn nested_subtasks_come_before_linked_ones() {
        let tasks = vec![child_of("late", "p"), task("p").with_subtasks(vec![task("early")])];
        let (forest, _) = build_forest(tasks);
        assert_eq!(
            forest[0].subtasks.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(),
            ["early", "late"]
        );
    }
}
