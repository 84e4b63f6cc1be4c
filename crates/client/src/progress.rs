//! Per-file upload progress, published over a `watch` channel.

use tokio::sync::watch;

/// Lifecycle of one file in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    /// Not started.
    Pending,
    /// Bytes are moving.
    Uploading,
    /// Stored (and confirmed, for the batch as a whole).
    Completed,
    /// Failed.
    Error,
}

/// Progress of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileProgress {
    /// File name.
    pub file_name: String,
    /// Percent transferred, 0 to 100. Never decreases within one attempt.
    pub percent: u8,
    /// Current status.
    pub status: UploadStatus,
    /// Failure text when `status` is `Error`.
    pub error: Option<String>,
}

/// Shared progress board for one batch.
///
/// Cloning is cheap; all clones publish to the same channel.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    tx: watch::Sender<Vec<FileProgress>>,
}

impl ProgressTracker {
    /// A board with every file pending.
    #[must_use]
    pub fn new<I, S>(file_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let files = file_names
            .into_iter()
            .map(|name| FileProgress {
                file_name: name.into(),
                percent: 0,
                status: UploadStatus::Pending,
                error: None,
            })
            .collect();
        let (tx, _rx) = watch::channel(files);
        Self { tx }
    }

    /// Receiver that sees every update.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<FileProgress>> {
        self.tx.subscribe()
    }

    /// Current state of every file.
    #[must_use]
    pub fn snapshot(&self) -> Vec<FileProgress> {
        self.tx.borrow().clone()
    }

    fn update(&self, index: usize, f: impl FnOnce(&mut FileProgress)) {
        self.tx.send_if_modified(|files| match files.get_mut(index) {
            Some(file) => {
                let before = file.clone();
                f(file);
                *file != before
            }
            None => false,
        });
    }

    /// Marks a file as uploading.
    pub fn start(&self, index: usize) {
        self.update(index, |f| {
            f.status = UploadStatus::Uploading;
            f.error = None;
        });
    }

    /// Records `sent` of `total` bytes. Lower percentages than already
    /// reported are ignored.
    pub fn advance(&self, index: usize, sent: u64, total: u64) {
        let percent = percent_of(sent, total);
        self.update(index, |f| {
            if percent > f.percent {
                f.percent = percent;
            }
        });
    }

    /// Marks a file as done.
    pub fn complete(&self, index: usize) {
        self.update(index, |f| {
            f.percent = 100;
            f.status = UploadStatus::Completed;
            f.error = None;
        });
    }

    /// Marks a file as failed, keeping its last percentage.
    pub fn fail(&self, index: usize, message: impl Into<String>) {
        let message = message.into();
        self.update(index, |f| {
            f.status = UploadStatus::Error;
            f.error = Some(message);
        });
    }

    /// Starts a fresh attempt for the whole batch (server-mediated path).
    ///
    /// Percentages and errors left by a failed direct attempt are cleared.
    pub fn start_all(&self) {
        self.tx.send_modify(|files| {
            for file in files.iter_mut() {
                file.percent = 0;
                file.status = UploadStatus::Uploading;
                file.error = None;
            }
        });
    }

    /// Marks every file as done.
    pub fn complete_all(&self) {
        for index in 0..self.len() {
            self.complete(index);
        }
    }

    /// Fails every file not already completed.
    pub fn fail_unfinished(&self, message: &str) {
        for index in 0..self.len() {
            let done = self
                .tx
                .borrow()
                .get(index)
                .is_some_and(|f| f.status == UploadStatus::Completed);
            if !done {
                self.fail(index, message);
            }
        }
    }

    /// Number of files on the board.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    /// Whether the board is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[allow(clippy::cast_possible_truncation)]
fn percent_of(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    // Bounded to 100 before the cast.
    (u128::from(sent.min(total)) * 100 / u128::from(total)) as u8
}
