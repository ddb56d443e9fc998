//! Single-writer persistence queue.
//!
//! Every persist hands a fully rendered document to one background thread.
//! Writes land in submission order, so rapid consecutive persists cannot
//! interleave on disk. Failures are logged; the caller never sees them.

use crate::error::Result;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

enum Job {
    Write { path: PathBuf, contents: String },
    Flush(Sender<()>),
}

/// Background writer owned by a store.
pub struct PersistQueue {
    sender: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl PersistQueue {
    /// Spawn the writer thread.
    pub fn spawn() -> Result<Self> {
        let (sender, receiver) = unbounded();
        let handle = std::thread::Builder::new()
            .name("docstore-writer".to_string())
            .spawn(move || run(receiver))?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Queue `contents` to be written to `path`. Returns immediately.
    pub fn submit(&self, path: PathBuf, contents: String) {
        let Some(sender) = &self.sender else {
            return;
        };
        tracing::debug!(path = %path.display(), bytes = contents.len(), "queued write");
        if sender.send(Job::Write { path, contents }).is_err() {
            tracing::error!("persist queue is closed, write dropped");
        }
    }

    /// Block until every write submitted before this call has finished.
    pub fn flush(&self) {
        let Some(sender) = &self.sender else {
            return;
        };
        let (done, wait) = bounded(1);
        if sender.send(Job::Flush(done)).is_ok() {
            let _ = wait.recv();
        }
    }
}

impl Drop for PersistQueue {
    fn drop(&mut self) {
        // Closing the channel lets the thread drain what is queued and exit.
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("persist writer thread panicked");
            }
        }
    }
}

fn run(receiver: Receiver<Job>) {
    tracing::debug!("persist writer started");
    for job in receiver {
        match job {
            Job::Write { path, contents } => {
                if let Err(e) = write_replace(&path, contents.as_bytes()) {
                    tracing::error!(path = %path.display(), error = %e, "failed to persist records");
                }
            }
            Job::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    tracing::debug!("persist writer stopped");
}

/// Write to a sibling temp file, then rename it over `path`.
pub(crate) fn write_replace(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, contents)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_writes_in_submission_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        let queue = PersistQueue::spawn().unwrap();

        for i in 0..50 {
            queue.submit(path.clone(), format!("[{}]", i));
        }
        queue.flush();

        assert_eq!(fs::read_to_string(&path).unwrap(), "[49]");
        assert!(!dir.path().join("db.json.tmp").exists());
    }

    #[test]
    fn test_drop_drains_queue() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");

        {
            let queue = PersistQueue::spawn().unwrap();
            queue.submit(path.clone(), "[1,2]".to_string());
        }

        assert_eq!(fs::read_to_string(&path).unwrap(), "[1,2]");
    }

    #[test]
    fn test_failed_write_is_swallowed() {
        let dir = TempDir::new().unwrap();
        let queue = PersistQueue::spawn().unwrap();

        queue.submit(dir.path().join("missing/dir/db.json"), "[]".to_string());
        queue.flush();

        // The writer keeps going after a failure.
        let ok = dir.path().join("ok.json");
        queue.submit(ok.clone(), "[]".to_string());
        queue.flush();
        assert!(ok.exists());
    }
}
