//! Task persistence under the `"tasks"` storage key.
//!
//! The stored value is a JSON array of records that mark their column with
//! three booleans (`completed`, `inProgress`, `inReview`). Records are turned
//! into [`Task`]s on read, and every write emits exactly one flag per record.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::Result,
    storage::{KeyValueStore, TASKS_KEY},
    task::{Task, TaskStatus},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTask {
    id: String,
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    in_progress: bool,
    #[serde(default)]
    in_review: bool,
}

impl StoredTask {
    /// completed > review > in-progress > pending, so every combination of
    /// flags lands in exactly one partition.
    fn status(&self) -> TaskStatus {
        if self.completed {
            TaskStatus::Completed
        } else if self.in_review {
            TaskStatus::Review
        } else if self.in_progress {
            TaskStatus::InProgress
        } else {
            TaskStatus::Pending
        }
    }

    fn set_status(&mut self, status: TaskStatus) {
        self.completed = status == TaskStatus::Completed;
        self.in_review = status == TaskStatus::Review;
        self.in_progress = status == TaskStatus::InProgress;
    }
}

impl From<StoredTask> for Task {
    fn from(stored: StoredTask) -> Self {
        let status = stored.status();
        Task {
            id: stored.id,
            user_id: stored.user_id,
            title: stored.title,
            description: stored.description,
            status,
            created_at: stored.created_at,
        }
    }
}

impl From<&Task> for StoredTask {
    fn from(task: &Task) -> Self {
        let mut stored = StoredTask {
            id: task.id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            user_id: task.user_id.clone(),
            created_at: task.created_at,
            completed: false,
            in_progress: false,
            in_review: false,
        };
        stored.set_status(task.status);
        stored
    }
}

fn parse(raw: Option<&str>) -> Result<Vec<StoredTask>> {
    match raw {
        Some(data) if !data.trim().is_empty() => Ok(serde_json::from_str(data)?),
        _ => Ok(Vec::new()),
    }
}

#[derive(Clone)]
pub struct LocalTaskStore {
    storage: Arc<dyn KeyValueStore>,
}

impl LocalTaskStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    pub fn load_all(&self) -> Result<Vec<Task>> {
        let raw = self.storage.get(TASKS_KEY)?;
        Ok(parse(raw.as_deref())?.into_iter().map(Task::from).collect())
    }

    /// Tasks currently stored in `partition`, in storage order.
    pub fn load(&self, partition: TaskStatus) -> Result<Vec<Task>> {
        Ok(self
            .load_all()?
            .into_iter()
            .filter(|task| task.status == partition)
            .collect())
    }

    /// Drops every stored task of `partition` and appends `tasks` as given.
    ///
    /// A task in `tasks` whose status no longer matches `partition` is
    /// written with its own status, which is how a task leaves a column.
    pub fn save(&self, partition: TaskStatus, tasks: &[Task]) -> Result<()> {
        self.storage.update(TASKS_KEY, &mut |raw| {
            let mut all = parse(raw.as_deref())?;
            all.retain(|stored| stored.status() != partition);
            all.extend(tasks.iter().map(StoredTask::from));
            Ok(Some(serde_json::to_string(&all)?))
        })?;
        debug!(%partition, count = tasks.len(), "partition saved");
        Ok(())
    }

    /// Rewrites one record's status in place. Returns `false` when there is
    /// nothing stored under that id.
    pub fn move_task(&self, id: &str, status: TaskStatus) -> Result<bool> {
        let mut moved = false;
        self.storage.update(TASKS_KEY, &mut |raw| {
            moved = false;
            let Some(data) = raw else {
                return Ok(None);
            };
            let mut all = parse(Some(data.as_str()))?;
            if let Some(stored) = all.iter_mut().find(|stored| stored.id == id) {
                stored.set_status(status);
                moved = true;
            }
            Ok(Some(serde_json::to_string(&all)?))
        })?;
        if moved {
            debug!(id, %status, "task moved");
        }
        Ok(moved)
    }

    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut removed = false;
        self.storage.update(TASKS_KEY, &mut |raw| {
            let Some(data) = raw else {
                return Ok(None);
            };
            let mut all = parse(Some(data.as_str()))?;
            let before = all.len();
            all.retain(|stored| stored.id != id);
            removed = all.len() != before;
            Ok(Some(serde_json::to_string(&all)?))
        })?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use rstest::rstest;

    fn store_with(raw: &str) -> (Arc<MemoryStorage>, LocalTaskStore) {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(TASKS_KEY, raw).unwrap();
        (storage.clone(), LocalTaskStore::new(storage))
    }

    fn stored_ids(storage: &MemoryStorage) -> Vec<String> {
        let raw = storage.get(TASKS_KEY).unwrap().unwrap();
        parse(Some(raw.as_str()))
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect()
    }

    #[test]
    fn loads_single_pending_record() {
        let (_, store) = store_with(r#"[{"id":"1","title":"A","completed":false}]"#);

        let pending = store.load(TaskStatus::Pending).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "1");
        assert_eq!(pending[0].title, "A");

        assert!(store.load(TaskStatus::Completed).unwrap().is_empty());
    }

    #[test]
    fn missing_key_loads_nothing() {
        let store = LocalTaskStore::new(Arc::new(MemoryStorage::new()));
        assert!(store.load(TaskStatus::Pending).unwrap().is_empty());
    }

    #[test]
    fn malformed_array_is_an_error() {
        let (_, store) = store_with("{\"id\":1}");
        assert!(store.load_all().is_err());
    }

    #[rstest]
    #[case(false, false, false, TaskStatus::Pending)]
    #[case(false, true, false, TaskStatus::InProgress)]
    #[case(false, false, true, TaskStatus::Review)]
    #[case(false, true, true, TaskStatus::Review)]
    #[case(true, false, false, TaskStatus::Completed)]
    #[case(true, true, false, TaskStatus::Completed)]
    #[case(true, false, true, TaskStatus::Completed)]
    #[case(true, true, true, TaskStatus::Completed)]
    fn every_flag_combination_has_one_partition(
        #[case] completed: bool,
        #[case] in_progress: bool,
        #[case] in_review: bool,
        #[case] expected: TaskStatus,
    ) {
        let raw = serde_json::json!([{
            "id": "x",
            "title": "t",
            "completed": completed,
            "inProgress": in_progress,
            "inReview": in_review,
        }])
        .to_string();
        let (_, store) = store_with(&raw);

        let owners: Vec<TaskStatus> = TaskStatus::ALL
            .into_iter()
            .filter(|partition| !store.load(*partition).unwrap().is_empty())
            .collect();
        assert_eq!(owners, vec![expected]);
    }

    #[test]
    fn save_replaces_only_its_partition() {
        let (storage, store) = store_with(
            r#"[
                {"id":"1","title":"A"},
                {"id":"2","title":"B","completed":true},
                {"id":"3","title":"C","inProgress":true}
            ]"#,
        );

        let replacement = vec![Task::new("D", None)];
        store.save(TaskStatus::Pending, &replacement).unwrap();

        let mut ids = stored_ids(&storage);
        ids.sort();
        let mut expected = vec!["2".to_string(), "3".to_string(), replacement[0].id.clone()];
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[test]
    fn written_records_carry_one_flag() {
        let storage = Arc::new(MemoryStorage::new());
        let store = LocalTaskStore::new(storage.clone());
        let task = Task::new("A", None).with_status(TaskStatus::Review);
        store.save(TaskStatus::Review, &[task]).unwrap();

        let raw = storage.get(TASKS_KEY).unwrap().unwrap();
        let records: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
        assert_eq!(records[0]["inReview"], true);
        assert_eq!(records[0]["inProgress"], false);
        assert_eq!(records[0]["completed"], false);
    }

    #[test]
    fn saving_a_changed_task_moves_it_out_of_the_partition() {
        let (_, store) = store_with(r#"[{"id":"1","title":"A"}]"#);
        let mut pending = store.load(TaskStatus::Pending).unwrap();
        pending[0].status = TaskStatus::Completed;
        store.save(TaskStatus::Pending, &pending).unwrap();

        assert!(store.load(TaskStatus::Pending).unwrap().is_empty());
        assert_eq!(store.load(TaskStatus::Completed).unwrap()[0].id, "1");
    }

    #[test]
    fn move_task_clears_other_flags() {
        let (_, store) = store_with(r#"[{"id":"1","title":"A","inProgress":true}]"#);
        assert!(store.move_task("1", TaskStatus::Pending).unwrap());
        let pending = store.load(TaskStatus::Pending).unwrap();
        assert_eq!(pending[0].id, "1");
        assert!(store.load(TaskStatus::InProgress).unwrap().is_empty());
    }

    #[test]
    fn move_of_unknown_task_is_a_no_op() {
        let (_, store) = store_with(r#"[{"id":"1","title":"A"}]"#);
        assert!(!store.move_task("9", TaskStatus::Review).unwrap());

        let empty = LocalTaskStore::new(Arc::new(MemoryStorage::new()));
        assert!(!empty.move_task("1", TaskStatus::Review).unwrap());
    }

    #[test]
    fn delete_removes_record() {
        let (storage, store) = store_with(r#"[{"id":"1","title":"A"},{"id":"2","title":"B"}]"#);
        assert!(store.delete("1").unwrap());
        assert!(!store.delete("1").unwrap());
        assert_eq!(stored_ids(&storage), vec!["2".to_string()]);
    }
}
