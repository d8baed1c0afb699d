use tracing::info;

use crate::{
    error::Result,
    local_store::LocalTaskStore,
    task::{Task, TaskStatus},
};

/// One partition's in-memory list. Every mutation writes the partition
/// back through the store.
#[derive(Debug, Clone)]
pub struct TaskList {
    status: TaskStatus,
    tasks: Vec<Task>,
}

impl TaskList {
    pub fn load(store: &LocalTaskStore, status: TaskStatus) -> Result<Self> {
        Ok(Self {
            status,
            tasks: store.load(status)?,
        })
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// The task joins this partition whatever status it came with.
    pub fn add(&mut self, store: &LocalTaskStore, task: Task) -> Result<()> {
        let mut tasks = self.tasks.clone();
        tasks.push(task.with_status(self.status));
        self.commit(store, tasks)
    }

    pub fn toggle_complete(&mut self, store: &LocalTaskStore, id: &str) -> Result<bool> {
        let mut tasks = self.tasks.clone();
        let Some(task) = tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(false);
        };
        task.status = task.status.toggled();
        self.commit(store, tasks)?;
        self.tasks.retain(|t| t.status == self.status);
        Ok(true)
    }

    pub fn delete(&mut self, store: &LocalTaskStore, id: &str) -> Result<bool> {
        let mut tasks = self.tasks.clone();
        tasks.retain(|t| t.id != id);
        if tasks.len() == self.tasks.len() {
            return Ok(false);
        }
        self.commit(store, tasks)?;
        Ok(true)
    }

    /// The in-memory list only changes once storage has accepted it.
    fn commit(&mut self, store: &LocalTaskStore, tasks: Vec<Task>) -> Result<()> {
        store.save(self.status, &tasks)?;
        self.tasks = tasks;
        Ok(())
    }
}

/// Four-column board over the local task store.
pub struct KanbanBoard {
    store: LocalTaskStore,
    lists: Vec<TaskList>,
    pub selected_status: usize,
    pub selected_task: usize,
}

impl KanbanBoard {
    pub fn new(store: LocalTaskStore) -> Result<Self> {
        let mut board = Self {
            store,
            lists: Vec::new(),
            selected_status: 0,
            selected_task: 0,
        };
        board.reload()?;
        Ok(board)
    }

    pub fn reload(&mut self) -> Result<()> {
        self.lists = TaskStatus::ALL
            .into_iter()
            .map(|status| TaskList::load(&self.store, status))
            .collect::<Result<_>>()?;
        self.clamp_selection();
        Ok(())
    }

    pub fn lists(&self) -> &[TaskList] {
        &self.lists
    }

    pub fn selected_list(&self) -> TaskStatus {
        TaskStatus::ALL[self.selected_status]
    }

    pub fn get_tasks_by_status(&self, status: TaskStatus) -> &[Task] {
        self.lists
            .iter()
            .find(|list| list.status() == status)
            .map(TaskList::tasks)
            .unwrap_or_default()
    }

    pub fn selected(&self) -> Option<&Task> {
        self.get_tasks_by_status(self.selected_list())
            .get(self.selected_task)
    }

    /// Adds a task to the selected column.
    pub fn add_task(&mut self, title: String, description: Option<String>) -> Result<Task> {
        let task = Task::new(title, description);
        let index = self.selected_status;
        self.lists[index].add(&self.store, task.clone())?;
        info!(task_id = %task.id, column = %self.selected_list(), "task added");
        self.reload()?;
        Ok(task.with_status(self.selected_list()))
    }

    pub fn toggle_selected(&mut self) -> Result<()> {
        let Some(id) = self.selected().map(|t| t.id.clone()) else {
            return Ok(());
        };
        let index = self.selected_status;
        self.lists[index].toggle_complete(&self.store, &id)?;
        self.reload()
    }

    pub fn delete_selected(&mut self) -> Result<()> {
        let Some(id) = self.selected().map(|t| t.id.clone()) else {
            return Ok(());
        };
        let index = self.selected_status;
        self.lists[index].delete(&self.store, &id)?;
        info!(task_id = %id, "task deleted");
        self.reload()
    }

    /// Drops the task with `id` onto the `status` column.
    pub fn move_task_to(&mut self, id: &str, status: TaskStatus) -> Result<bool> {
        let moved = self.store.move_task(id, status)?;
        self.reload()?;
        Ok(moved)
    }

    /// Moves the selected task one column left or right and keeps it
    /// selected.
    pub fn move_task(&mut self, direction: isize) -> Result<()> {
        let Some(task) = self.selected().cloned() else {
            return Ok(());
        };
        let target = task.status.shifted(direction);
        if target == task.status {
            return Ok(());
        }
        self.move_task_to(&task.id, target)?;
        self.selected_status = TaskStatus::ALL
            .iter()
            .position(|s| *s == target)
            .unwrap_or(self.selected_status);
        self.selected_task = self
            .get_tasks_by_status(target)
            .iter()
            .position(|t| t.id == task.id)
            .unwrap_or(0);
        Ok(())
    }

    /// Puts the selection on the first task of `status`'s column.
    pub fn focus_column(&mut self, status: TaskStatus) {
        self.selected_status = TaskStatus::ALL
            .iter()
            .position(|s| *s == status)
            .unwrap_or(0);
        self.selected_task = 0;
    }

    pub fn select_status(&mut self, direction: isize) {
        let last = TaskStatus::ALL.len() as isize - 1;
        self.selected_status = (self.selected_status as isize + direction).clamp(0, last) as usize;
        self.clamp_selection();
    }

    pub fn select_task(&mut self, direction: isize) {
        let count = self.get_tasks_by_status(self.selected_list()).len() as isize;
        if count == 0 {
            self.selected_task = 0;
            return;
        }
        self.selected_task = (self.selected_task as isize + direction).clamp(0, count - 1) as usize;
    }

    fn clamp_selection(&mut self) {
        let count = self.get_tasks_by_status(self.selected_list()).len();
        self.selected_task = self.selected_task.min(count.saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        error::Error,
        storage::{KeyValueStore, MemoryStorage, TASKS_KEY},
    };

    /// Reads from memory, refuses every write.
    #[derive(Default)]
    struct ReadOnlyStorage {
        inner: MemoryStorage,
    }

    impl KeyValueStore for ReadOnlyStorage {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(disk_full())
        }

        fn remove(&self, _key: &str) -> Result<()> {
            Err(disk_full())
        }

        fn update(
            &self,
            _key: &str,
            _f: &mut dyn FnMut(Option<String>) -> Result<Option<String>>,
        ) -> Result<()> {
            Err(disk_full())
        }
    }

    fn disk_full() -> Error {
        Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
    }

    fn board_with(raw: Option<&str>) -> (Arc<MemoryStorage>, KanbanBoard) {
        let storage = Arc::new(MemoryStorage::new());
        if let Some(raw) = raw {
            storage.set(TASKS_KEY, raw).unwrap();
        }
        let board = KanbanBoard::new(LocalTaskStore::new(storage.clone())).unwrap();
        (storage, board)
    }

    #[test]
    fn add_lands_in_selected_column() {
        let (_, mut board) = board_with(None);
        board.select_status(2);
        let task = board.add_task("Review PR".to_string(), None).unwrap();
        assert_eq!(task.status, TaskStatus::Review);
        assert_eq!(board.get_tasks_by_status(TaskStatus::Review).len(), 1);
        assert!(board.get_tasks_by_status(TaskStatus::Pending).is_empty());
    }

    #[test]
    fn toggling_twice_returns_task_to_pending() {
        let (_, mut board) = board_with(Some(r#"[{"id":"1","title":"A"}]"#));
        board.toggle_selected().unwrap();
        assert!(board.get_tasks_by_status(TaskStatus::Pending).is_empty());
        assert_eq!(board.get_tasks_by_status(TaskStatus::Completed)[0].id, "1");

        board.select_status(3);
        board.toggle_selected().unwrap();
        assert_eq!(board.get_tasks_by_status(TaskStatus::Pending)[0].id, "1");
        assert!(board.get_tasks_by_status(TaskStatus::Completed).is_empty());
    }

    #[test]
    fn delete_removes_from_memory_and_storage() {
        let (storage, mut board) =
            board_with(Some(r#"[{"id":"1","title":"A"},{"id":"2","title":"B","completed":true}]"#));
        board.delete_selected().unwrap();
        assert!(board.get_tasks_by_status(TaskStatus::Pending).is_empty());

        let raw = storage.get(TASKS_KEY).unwrap().unwrap();
        assert!(!raw.contains("\"id\":\"1\""));
        assert!(raw.contains("\"id\":\"2\""));
    }

    #[test]
    fn list_delete_of_unknown_id_leaves_storage_alone() {
        let storage = Arc::new(MemoryStorage::new());
        let store = LocalTaskStore::new(storage.clone());
        let mut list = TaskList::load(&store, TaskStatus::Pending).unwrap();
        assert!(!list.delete(&store, "missing").unwrap());
        assert_eq!(storage.get(TASKS_KEY).unwrap(), None);
    }

    #[test]
    fn move_follows_the_task_across_columns() {
        let (_, mut board) = board_with(Some(r#"[{"id":"1","title":"A"}]"#));
        board.move_task(1).unwrap();
        assert_eq!(board.selected_list(), TaskStatus::InProgress);
        assert_eq!(board.selected().map(|t| t.id.as_str()), Some("1"));

        board.move_task(1).unwrap();
        board.move_task(1).unwrap();
        board.move_task(1).unwrap();
        assert_eq!(board.selected_list(), TaskStatus::Completed);
    }

    #[test]
    fn drop_onto_column() {
        let (_, mut board) = board_with(Some(r#"[{"id":"1","title":"A","inReview":true}]"#));
        assert!(board.move_task_to("1", TaskStatus::Pending).unwrap());
        assert_eq!(board.get_tasks_by_status(TaskStatus::Pending)[0].id, "1");
        assert!(!board.move_task_to("9", TaskStatus::Pending).unwrap());
    }

    #[test]
    fn focus_column_selects_its_first_task() {
        let (_, mut board) =
            board_with(Some(r#"[{"id":"1","title":"A"},{"id":"2","title":"B","inReview":true}]"#));
        board.focus_column(TaskStatus::Review);
        assert_eq!(board.selected_list(), TaskStatus::Review);
        assert_eq!(board.selected().map(|t| t.id.as_str()), Some("2"));
    }

    #[test]
    fn selection_is_clamped_on_empty_columns() {
        let (_, mut board) = board_with(None);
        board.select_task(1);
        board.select_task(-1);
        assert_eq!(board.selected_task, 0);
        assert!(board.selected().is_none());
        board.toggle_selected().unwrap();
        board.delete_selected().unwrap();
    }

    #[test]
    fn failed_writes_leave_columns_as_stored() {
        let storage = Arc::new(ReadOnlyStorage::default());
        storage
            .inner
            .set(TASKS_KEY, r#"[{"id":"1","title":"A"}]"#)
            .unwrap();
        let mut board = KanbanBoard::new(LocalTaskStore::new(storage.clone())).unwrap();

        assert!(board.add_task("Ghost".to_string(), None).is_err());
        assert!(board.toggle_selected().is_err());
        assert!(board.delete_selected().is_err());
        assert!(board.move_task(1).is_err());

        let pending: Vec<_> = board
            .get_tasks_by_status(TaskStatus::Pending)
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(pending, ["1"]);
        assert!(board.get_tasks_by_status(TaskStatus::Completed).is_empty());
        assert!(board.get_tasks_by_status(TaskStatus::InProgress).is_empty());
        assert_eq!(
            storage.get(TASKS_KEY).unwrap().as_deref(),
            Some(r#"[{"id":"1","title":"A"}]"#)
        );
    }
}
