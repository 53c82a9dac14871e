use anyhow::Result;
use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Логгер для записи информации о выполнении задачи в файл.
/// Каждый лог-файл привязан к конкретной сессии выполнения задачи.
pub struct TaskLogger {
    log_dir: PathBuf,
}

impl TaskLogger {
    pub fn new(storage_dir: &Path) -> Self {
        Self {
            log_dir: storage_dir.join("task_logs"),
        }
    }

    /// Возвращает путь к лог-файлу для данной сессии.
    pub fn get_log_file_path(&self, session_id: &str) -> PathBuf {
        self.log_dir.join(format!("{}.log", session_id))
    }

    /// Записывает сообщение в лог-файл для указанной сессии.
    /// Если файл не существует, он будет создан.
    pub fn write_log(&self, session_id: &str, message: &str) -> Result<()> {
        fs::create_dir_all(&self.log_dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.get_log_file_path(session_id))?;

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string();
        writeln!(file, "[{}] {}", timestamp, message)?;
        Ok(())
    }

    /// Читает лог-файл сессии; None если такой сессии не было
    pub fn read_log(&self, session_id: &str) -> Result<Option<String>> {
        // session id приходит из URL
        if session_id.is_empty() || !session_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Ok(None);
        }
        let file_path = self.get_log_file_path(session_id);
        if file_path.exists() {
            Ok(Some(fs::read_to_string(&file_path)?))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_read() {
        let dir = std::env::temp_dir().join(format!("hub-task-logs-{}", uuid::Uuid::new_v4()));
        let logger = TaskLogger::new(&dir);
        logger.write_log("abc-1", "started").unwrap();
        logger.write_log("abc-1", "done").unwrap();

        let content = logger.read_log("abc-1").unwrap().unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("] done"));
        assert!(logger.read_log("missing").unwrap().is_none());
        assert!(logger.read_log("../etc/passwd").unwrap().is_none());
        let _ = fs::remove_dir_all(dir);
    }
}
