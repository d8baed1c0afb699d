use std::{fs, path::PathBuf};

use clap::{Parser, Subcommand};

use crate::{
    error::{Error, Result},
    task::TaskStatus,
};

const STORAGE_FILE: &str = "storage.json";
const BACKEND_FILE: &str = "backend.json";
const LOG_FILE: &str = "taskboard.log";

#[derive(Debug, Parser)]
#[command(name = "taskboard")]
#[command(about = "Terminal task board with accounts and realtime sync")]
pub struct Cli {
    /// Directory holding local storage, account data and the log file
    #[arg(long, env = "TASKBOARD_DATA_DIR", default_value = ".taskboard")]
    pub data_dir: PathBuf,

    /// Log filter directives, e.g. `taskboard=debug`
    #[arg(long, env = "TASKBOARD_LOG", default_value = "taskboard=info")]
    pub log_filter: String,

    /// Page to open on start
    #[arg(long, env = "TASKBOARD_START_PATH", default_value = "/")]
    pub path: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Open the four-column board over local storage
    Board {
        /// Column to start on: todo, in-progress, review or completed
        #[arg(long)]
        column: Option<TaskStatus>,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub storage_file: PathBuf,
    pub backend_file: PathBuf,
    pub log_file: PathBuf,
    pub log_filter: String,
    pub start_path: String,
}

impl Config {
    /// Resolves file locations under the data directory, creating it when
    /// missing.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let data_dir = cli.data_dir.clone();
        if data_dir.exists() && !data_dir.is_dir() {
            return Err(Error::Config(format!(
                "{} exists and is not a directory",
                data_dir.display()
            )));
        }
        fs::create_dir_all(&data_dir).map_err(|err| {
            Error::Config(format!("cannot create {}: {err}", data_dir.display()))
        })?;
        if !cli.path.starts_with('/') {
            return Err(Error::Config(format!(
                "start path must begin with '/', got {:?}",
                cli.path
            )));
        }

        Ok(Self {
            storage_file: data_dir.join(STORAGE_FILE),
            backend_file: data_dir.join(BACKEND_FILE),
            log_file: data_dir.join(LOG_FILE),
            log_filter: cli.log_filter.clone(),
            start_path: cli.path.clone(),
            data_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("taskboard").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn resolves_files_under_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("nested/data");
        let cli = cli(&["--data-dir", data_dir.to_str().unwrap(), "--path", "/tasks"]);

        let config = Config::from_cli(&cli).unwrap();
        assert!(data_dir.is_dir());
        assert_eq!(config.storage_file, data_dir.join("storage.json"));
        assert_eq!(config.backend_file, data_dir.join("backend.json"));
        assert_eq!(config.log_file, data_dir.join("taskboard.log"));
        assert_eq!(config.start_path, "/tasks");
        assert_eq!(cli.command, None);
    }

    #[test]
    fn board_subcommand() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().to_str().unwrap();
        let plain = cli(&["--data-dir", data_dir, "board"]);
        assert_eq!(plain.command, Some(Command::Board { column: None }));

        let focused = cli(&["--data-dir", data_dir, "board", "--column", "done"]);
        assert_eq!(
            focused.command,
            Some(Command::Board {
                column: Some(TaskStatus::Completed)
            })
        );
        assert!(Cli::try_parse_from(["taskboard", "board", "--column", "archived"]).is_err());
    }

    #[test]
    fn file_in_place_of_data_dir_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("taken");
        fs::write(&file, "").unwrap();
        let cli = cli(&["--data-dir", file.to_str().unwrap()]);
        assert!(matches!(Config::from_cli(&cli), Err(Error::Config(_))));
    }

    #[test]
    fn relative_start_path_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cli = cli(&["--data-dir", dir.path().to_str().unwrap(), "--path", "tasks"]);
        assert!(matches!(Config::from_cli(&cli), Err(Error::Config(_))));
    }
}
