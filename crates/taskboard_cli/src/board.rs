//! Presentation state for the task board.
//!
//! # Responsibility
//! - Mirror the task list from the last successful API call.
//! - Derive the visible subset from the local filter only.
//! - Track in-flight operations so affected controls can be disabled.
//!
//! # Invariants
//! - A failed operation sets one user-visible message, clears its flag and
//!   leaves the task list untouched. Nothing is retried.
//! - Toggle sends the locally held copy of the task with `completed`
//!   flipped; a concurrent edit by another client is overwritten.

use crate::client::{ClientError, CreateTaskInput, ListOptions, TaskApi, UpdateTaskInput};
use clap::ValueEnum;
use log::warn;
use std::fmt::{Display, Formatter, Write as _};
use taskboard_core::{Task, TaskId};

pub const LOAD_ERROR: &str = "Could not load tasks. Please try again later.";
pub const ADD_ERROR: &str = "Could not add the task. Please try again later.";
pub const UPDATE_ERROR: &str = "Could not update the task. Please try again later.";
pub const DELETE_ERROR: &str = "Could not delete the task. Please try again later.";

/// Which tasks the board shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ViewFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl ViewFilter {
    pub fn shows(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.completed,
            Self::Completed => task.completed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

impl Display for ViewFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client-side task board over any `TaskApi`.
pub struct TaskBoard<A> {
    api: A,
    tasks: Vec<Task>,
    filter: ViewFilter,
    is_loading: bool,
    is_adding: bool,
    updating_id: Option<TaskId>,
    deleting_id: Option<TaskId>,
    error: Option<String>,
}

impl<A: TaskApi> TaskBoard<A> {
    /// A board that has not loaded yet; it starts in the loading state.
    pub fn new(api: A) -> Self {
        Self {
            api,
            tasks: Vec::new(),
            filter: ViewFilter::default(),
            is_loading: true,
            is_adding: false,
            updating_id: None,
            deleting_id: None,
            error: None,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn filter(&self) -> ViewFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: ViewFilter) {
        self.filter = filter;
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_adding(&self) -> bool {
        self.is_adding
    }

    pub fn updating_id(&self) -> Option<TaskId> {
        self.updating_id
    }

    pub fn deleting_id(&self) -> Option<TaskId> {
        self.deleting_id
    }

    /// Tasks passing the current filter, in stored order.
    pub fn visible_tasks(&self) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| self.filter.shows(task))
            .collect()
    }

    pub fn can_add(&self) -> bool {
        !self.is_adding
    }

    pub fn can_toggle(&self, id: TaskId) -> bool {
        self.updating_id != Some(id) && self.deleting_id != Some(id)
    }

    pub fn can_delete(&self, id: TaskId) -> bool {
        self.deleting_id != Some(id) && self.updating_id != Some(id)
    }

    pub async fn load(&mut self, options: &ListOptions) {
        self.begin_load();
        let result = self.api.list_tasks(options).await;
        self.finish_load(result);
    }

    pub async fn add_task(&mut self, input: CreateTaskInput) {
        self.begin_add();
        let result = self.api.create_task(&input).await;
        self.finish_add(result);
    }

    /// Flips `completed` on the locally held task. Unknown ids are ignored.
    pub async fn toggle_complete(&mut self, id: TaskId) {
        let Some(input) = self.begin_toggle(id) else {
            return;
        };
        let result = self.api.update_task(id, &input).await;
        self.finish_update(id, result);
    }

    pub async fn delete_task(&mut self, id: TaskId) {
        self.begin_delete(id);
        let result = self.api.delete_task(id).await;
        self.finish_delete(id, result);
    }

    pub fn begin_load(&mut self) {
        self.is_loading = true;
        self.error = None;
    }

    pub fn finish_load(&mut self, result: Result<Vec<Task>, ClientError>) {
        match result {
            Ok(tasks) => self.tasks = tasks,
            Err(err) => self.fail("load", LOAD_ERROR, &err),
        }
        self.is_loading = false;
    }

    pub fn begin_add(&mut self) {
        self.is_adding = true;
        self.error = None;
    }

    /// Newly created tasks go to the front, newest first.
    pub fn finish_add(&mut self, result: Result<Task, ClientError>) {
        match result {
            Ok(task) => self.tasks.insert(0, task),
            Err(err) => self.fail("add", ADD_ERROR, &err),
        }
        self.is_adding = false;
    }

    /// Marks `id` as updating and returns the full body to send, or `None`
    /// when the task is not held locally.
    pub fn begin_toggle(&mut self, id: TaskId) -> Option<UpdateTaskInput> {
        self.error = None;
        let input = self.tasks.iter().find(|task| task.id == id).map(|task| {
            let mut input = UpdateTaskInput::from_task(task);
            input.completed = Some(!task.completed);
            input
        });
        self.updating_id = input.as_ref().map(|_| id);
        input
    }

    pub fn finish_update(&mut self, id: TaskId, result: Result<Task, ClientError>) {
        match result {
            Ok(updated) => {
                if let Some(slot) = self.tasks.iter_mut().find(|task| task.id == id) {
                    *slot = updated;
                }
            }
            Err(err) => self.fail("update", UPDATE_ERROR, &err),
        }
        self.updating_id = None;
    }

    pub fn begin_delete(&mut self, id: TaskId) {
        self.deleting_id = Some(id);
        self.error = None;
    }

    pub fn finish_delete(&mut self, id: TaskId, result: Result<(), ClientError>) {
        match result {
            Ok(()) => self.tasks.retain(|task| task.id != id),
            Err(err) => self.fail("delete", DELETE_ERROR, &err),
        }
        self.deleting_id = None;
    }

    /// Plain-text rendering of the visible board.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let visible = self.visible_tasks();
        let _ = writeln!(
            out,
            "Tasks ({}): {} shown of {}",
            self.filter,
            visible.len(),
            self.tasks.len()
        );
        if let Some(error) = &self.error {
            let _ = writeln!(out, "! {error}");
        }
        if self.is_loading {
            let _ = writeln!(out, "Loading tasks...");
            return out;
        }
        if visible.is_empty() {
            let _ = writeln!(out, "No tasks.");
            return out;
        }
        for task in visible {
            let _ = writeln!(out, "{}", render_task(task));
        }
        out
    }

    fn fail(&mut self, operation: &str, message: &str, err: &ClientError) {
        warn!("event=board_{operation} module=board status=error error={err}");
        self.error = Some(message.to_string());
    }
}

fn render_task(task: &Task) -> String {
    let mark = if task.completed { "x" } else { " " };
    let mut line = format!("[{mark}] {}  ({})", task.title, task.priority);
    if let Some(due_date) = task.due_date {
        let _ = write!(line, " due {}", due_date.format("%Y-%m-%d"));
    }
    let _ = write!(line, "  {}", task.id);
    line
}

#[cfg(test)]
mod tests {
    use super::{TaskBoard, ViewFilter, ADD_ERROR, DELETE_ERROR, LOAD_ERROR, UPDATE_ERROR};
    use crate::client::{ClientError, CreateTaskInput, ListOptions, TaskApi, UpdateTaskInput};
    use chrono::Utc;
    use std::sync::Mutex;
    use taskboard_core::{NewTask, Task, TaskId};

    /// In-memory stand-in for the HTTP API.
    #[derive(Default)]
    struct FakeApi {
        tasks: Mutex<Vec<Task>>,
        fail: bool,
        updates: Mutex<Vec<UpdateTaskInput>>,
    }

    impl FakeApi {
        fn with_titles(titles: &[&str]) -> Self {
            let tasks = titles
                .iter()
                .map(|title| Task::from_new(NewTask::new(*title), Utc::now()))
                .collect();
            Self {
                tasks: Mutex::new(tasks),
                ..Self::default()
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn check(&self) -> Result<(), ClientError> {
            if self.fail {
                return Err(ClientError::Status {
                    url: "http://fake/api".to_string(),
                    status: 500,
                    error: Some("Internal Server Error".to_string()),
                    message: "boom".to_string(),
                });
            }
            Ok(())
        }
    }

    impl TaskApi for FakeApi {
        async fn list_tasks(&self, _options: &ListOptions) -> Result<Vec<Task>, ClientError> {
            self.check()?;
            Ok(self.tasks.lock().unwrap().clone())
        }

        async fn create_task(&self, input: &CreateTaskInput) -> Result<Task, ClientError> {
            self.check()?;
            let task = Task::from_new(NewTask::new(input.title.clone()), Utc::now());
            self.tasks.lock().unwrap().push(task.clone());
            Ok(task)
        }

        async fn update_task(
            &self,
            id: TaskId,
            input: &UpdateTaskInput,
        ) -> Result<Task, ClientError> {
            self.check()?;
            self.updates.lock().unwrap().push(input.clone());
            let mut tasks = self.tasks.lock().unwrap();
            let task = tasks.iter_mut().find(|task| task.id == id).unwrap();
            if let Some(completed) = input.completed {
                task.completed = completed;
            }
            Ok(task.clone())
        }

        async fn delete_task(&self, id: TaskId) -> Result<(), ClientError> {
            self.check()?;
            self.tasks.lock().unwrap().retain(|task| task.id != id);
            Ok(())
        }
    }

    fn titles(board: &TaskBoard<FakeApi>) -> Vec<String> {
        board
            .visible_tasks()
            .iter()
            .map(|task| task.title.clone())
            .collect()
    }

    #[tokio::test]
    async fn load_mirrors_server_state_and_clears_loading() {
        let mut board = TaskBoard::new(FakeApi::with_titles(&["a", "b"]));
        assert!(board.is_loading());

        board.load(&ListOptions::default()).await;

        assert!(!board.is_loading());
        assert_eq!(titles(&board), vec!["a", "b"]);
        assert_eq!(board.error(), None);
    }

    #[tokio::test]
    async fn add_prepends_the_created_task() {
        let mut board = TaskBoard::new(FakeApi::with_titles(&["old"]));
        board.load(&ListOptions::default()).await;

        board.begin_add();
        assert!(!board.can_add());
        let created = board
            .api()
            .create_task(&CreateTaskInput::titled("new"))
            .await;
        board.finish_add(created);

        assert!(board.can_add());
        assert_eq!(titles(&board), vec!["new", "old"]);
    }

    #[tokio::test]
    async fn toggle_sends_full_task_and_replaces_it_in_place() {
        let mut board = TaskBoard::new(FakeApi::with_titles(&["a", "b"]));
        board.load(&ListOptions::default()).await;
        let id = board.tasks()[1].id;

        let input = board.begin_toggle(id).expect("task is held locally");
        assert!(!board.can_toggle(id));
        assert_eq!(input.completed, Some(true));
        assert_eq!(input.title.as_deref(), Some("b"));

        let updated = board.api().update_task(id, &input).await;
        board.finish_update(id, updated);

        assert!(board.can_toggle(id));
        assert!(board.tasks()[1].completed);
        assert_eq!(board.tasks()[1].id, id);
        assert_eq!(board.api().updates.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn toggle_of_unknown_task_does_nothing() {
        let mut board = TaskBoard::new(FakeApi::with_titles(&["a"]));
        board.load(&ListOptions::default()).await;

        board.toggle_complete(uuid::Uuid::new_v4()).await;

        assert_eq!(board.updating_id(), None);
        assert!(board.api().updates.lock().unwrap().is_empty());
        assert_eq!(board.error(), None);
    }

    #[tokio::test]
    async fn delete_removes_the_task_locally() {
        let mut board = TaskBoard::new(FakeApi::with_titles(&["a", "b"]));
        board.load(&ListOptions::default()).await;
        let id = board.tasks()[0].id;

        board.begin_delete(id);
        assert!(!board.can_delete(id));
        assert!(!board.can_toggle(id));
        let result = board.api().delete_task(id).await;
        board.finish_delete(id, result);

        assert_eq!(board.deleting_id(), None);
        assert_eq!(titles(&board), vec!["b"]);
    }

    #[tokio::test]
    async fn filter_is_applied_locally() {
        let mut board = TaskBoard::new(FakeApi::with_titles(&["a", "b"]));
        board.load(&ListOptions::default()).await;
        let id = board.tasks()[0].id;
        board.toggle_complete(id).await;

        board.set_filter(ViewFilter::Active);
        assert_eq!(titles(&board), vec!["b"]);
        board.set_filter(ViewFilter::Completed);
        assert_eq!(titles(&board), vec!["a"]);
        board.set_filter(ViewFilter::All);
        assert_eq!(titles(&board).len(), 2);
    }

    #[tokio::test]
    async fn failures_set_one_message_and_clear_flags() {
        let mut board = TaskBoard::new(FakeApi::failing());

        board.load(&ListOptions::default()).await;
        assert_eq!(board.error(), Some(LOAD_ERROR));
        assert!(!board.is_loading());

        board.add_task(CreateTaskInput::titled("x")).await;
        assert_eq!(board.error(), Some(ADD_ERROR));
        assert!(!board.is_adding());

        let id = uuid::Uuid::new_v4();
        board.delete_task(id).await;
        assert_eq!(board.error(), Some(DELETE_ERROR));
        assert_eq!(board.deleting_id(), None);
    }

    #[tokio::test]
    async fn failed_update_keeps_local_task() {
        let mut board = TaskBoard::new(FakeApi::with_titles(&["a"]));
        board.load(&ListOptions::default()).await;
        let id = board.tasks()[0].id;

        assert!(board.begin_toggle(id).is_some());
        board.finish_update(
            id,
            Err(ClientError::Decode {
                url: "http://fake/api".to_string(),
                message: "bad json".to_string(),
            }),
        );

        assert_eq!(board.error(), Some(UPDATE_ERROR));
        assert!(!board.tasks()[0].completed);
        assert_eq!(board.updating_id(), None);
    }

    #[tokio::test]
    async fn next_operation_clears_previous_error() {
        let mut board = TaskBoard::new(FakeApi::with_titles(&["a"]));
        board.finish_load(Err(ClientError::Decode {
            url: "http://fake/api".to_string(),
            message: "bad json".to_string(),
        }));
        assert!(board.error().is_some());

        board.load(&ListOptions::default()).await;
        assert_eq!(board.error(), None);
    }

    #[tokio::test]
    async fn render_lists_visible_tasks() {
        let mut board = TaskBoard::new(FakeApi::with_titles(&["Buy milk"]));
        assert!(board.render().contains("Loading tasks..."));

        board.load(&ListOptions::default()).await;
        let rendered = board.render();
        assert!(rendered.starts_with("Tasks (all): 1 shown of 1"));
        assert!(rendered.contains("[ ] Buy milk  (medium)"));

        board.set_filter(ViewFilter::Completed);
        assert!(board.render().contains("No tasks."));
    }
}
