#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use video_queue::config::settings::StorageConfig;
use video_queue::infrastructure::encoder::{Encoder, EncoderError, TranscodeSpec};
use video_queue::infrastructure::scratch::ScratchSpace;
use video_queue::infrastructure::storage::s3::StorageService;
use video_queue::infrastructure::storage::{ObjectStore, PutObject, StoreError, UploadReceipt};
use video_queue::{Destination, Dispatcher, JobContext, StepTimeouts};

/// Encoder double that writes a small file and records what it was asked.
#[derive(Default)]
pub struct FakeEncoder {
    log: Mutex<Vec<String>>,
    calls: Mutex<Vec<EncoderCall>>,
    delays: HashMap<String, Duration>,
    fail_with: Option<String>,
    panic_once: AtomicBool,
    scratch_dir: Option<PathBuf>,
    files_seen_at_start: Mutex<Vec<usize>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EncoderCall {
    Transcode {
        source: PathBuf,
        spec: TranscodeSpec,
        output: PathBuf,
    },
    Capture {
        source: PathBuf,
        offset: Duration,
        output: PathBuf,
    },
}

impl FakeEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long while "encoding" `source`.
    pub fn with_delay(mut self, source: &str, delay: Duration) -> Self {
        self.delays.insert(source.to_string(), delay);
        self
    }

    /// Write the output, then fail.
    pub fn failing(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_string());
        self
    }

    /// Write the output, then panic on the first call only.
    pub fn panicking_once(self) -> Self {
        self.panic_once.store(true, Ordering::SeqCst);
        self
    }

    /// Count files in `dir` whenever a call starts.
    pub fn watching(mut self, dir: &Path) -> Self {
        self.scratch_dir = Some(dir.to_path_buf());
        self
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<EncoderCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn files_seen_at_start(&self) -> Vec<usize> {
        self.files_seen_at_start.lock().unwrap().clone()
    }

    async fn run(
        &self,
        source: &Path,
        output: &Path,
        stop: &CancellationToken,
    ) -> Result<(), EncoderError> {
        let name = source.to_string_lossy().to_string();
        if let Some(dir) = &self.scratch_dir {
            let count = std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0);
            self.files_seen_at_start.lock().unwrap().push(count);
        }
        self.log.lock().unwrap().push(format!("start {}", name));

        tokio::fs::write(output, b"encoded media")
            .await
            .map_err(|e| EncoderError::failed(e.to_string()))?;

        if self.panic_once.swap(false, Ordering::SeqCst) {
            panic!("encoder crashed on {}", name);
        }

        if let Some(delay) = self.delays.get(&name) {
            tokio::select! {
                _ = tokio::time::sleep(*delay) => {}
                _ = stop.cancelled() => {
                    // Like ffmpeg, flush a last chunk before exiting
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    let mut file = tokio::fs::OpenOptions::new()
                        .create(true)
                        .append(true)
                        .open(output)
                        .await
                        .map_err(|e| EncoderError::failed(e.to_string()))?;
                    let _ = file.write_all(b" trailer").await;
                    self.log.lock().unwrap().push(format!("stopped {}", name));
                    return Err(EncoderError::Stopped);
                }
            }
        }

        if let Some(message) = &self.fail_with {
            self.log.lock().unwrap().push(format!("fail {}", name));
            return Err(EncoderError::Failed {
                message: message.clone(),
                exit_code: Some(1),
                stdout: String::new(),
                stderr: "Invalid data found when processing input".to_string(),
            });
        }

        self.log.lock().unwrap().push(format!("end {}", name));
        Ok(())
    }
}

#[async_trait]
impl Encoder for FakeEncoder {
    async fn transcode(
        &self,
        source: &Path,
        spec: &TranscodeSpec,
        output: &Path,
        stop: &CancellationToken,
    ) -> Result<(), EncoderError> {
        self.calls.lock().unwrap().push(EncoderCall::Transcode {
            source: source.to_path_buf(),
            spec: spec.clone(),
            output: output.to_path_buf(),
        });
        self.run(source, output, stop).await
    }

    async fn capture_frame(
        &self,
        source: &Path,
        offset: Duration,
        output: &Path,
        stop: &CancellationToken,
    ) -> Result<(), EncoderError> {
        self.calls.lock().unwrap().push(EncoderCall::Capture {
            source: source.to_path_buf(),
            offset,
            output: output.to_path_buf(),
        });
        self.run(source, output, stop).await
    }
}

#[derive(Debug, Clone)]
pub struct RecordedPut {
    pub bucket: String,
    pub key: String,
    pub acl: Option<String>,
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Object store double.
#[derive(Default)]
pub struct FakeStore {
    puts: Mutex<Vec<RecordedPut>>,
    fail_with: Option<String>,
    delay: Option<Duration>,
    sabotage_dir: Option<PathBuf>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// During the put, replace every file in `dir` with a non-empty
    /// directory so that deleting it afterwards fails.
    pub fn sabotaging(mut self, dir: &Path) -> Self {
        self.sabotage_dir = Some(dir.to_path_buf());
        self
    }

    pub fn puts(&self) -> Vec<RecordedPut> {
        self.puts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn put_object(&self, object: PutObject) -> Result<UploadReceipt, StoreError> {
        self.puts.lock().unwrap().push(RecordedPut {
            bucket: object.bucket.clone(),
            key: object.key.clone(),
            acl: object.acl.clone(),
            content_type: object.content_type.clone(),
            body: object.body.to_vec(),
        });

        if let Some(dir) = &self.sabotage_dir {
            for entry in std::fs::read_dir(dir).unwrap() {
                let path = entry.unwrap().path();
                std::fs::remove_file(&path).unwrap();
                std::fs::create_dir(&path).unwrap();
                std::fs::write(path.join("keep"), b"x").unwrap();
            }
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = &self.fail_with {
            return Err(StoreError::Service(message.clone()));
        }

        Ok(UploadReceipt {
            bucket: object.bucket,
            key: object.key,
            e_tag: Some("\"etag-1\"".to_string()),
            version_id: None,
        })
    }
}

pub struct Harness {
    pub dir: TempDir,
    pub encoder: Arc<FakeEncoder>,
    pub store: Option<Arc<FakeStore>>,
    pub dispatcher: Dispatcher,
}

impl Harness {
    pub fn scratch_files(&self) -> Vec<PathBuf> {
        scratch_files(self.dir.path())
    }
}

pub fn scratch_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect()
}

pub fn start(
    dir: TempDir,
    encoder: FakeEncoder,
    store: Option<FakeStore>,
    timeouts: StepTimeouts,
) -> Harness {
    let encoder = Arc::new(encoder);
    let store = store.map(Arc::new);
    let ctx = JobContext::new(
        ScratchSpace::new(dir.path()),
        encoder.clone(),
        store.clone().map(|s| s as Arc<dyn ObjectStore>),
    )
    .with_timeouts(timeouts);

    Harness {
        dir,
        encoder,
        store,
        dispatcher: Dispatcher::start(ctx),
    }
}

/// Harness backed by a real S3 client pointed at an unreachable endpoint.
/// Only useful for checks that must happen before any network call.
pub fn start_with_s3(dir: TempDir, encoder: FakeEncoder) -> Harness {
    let encoder = Arc::new(encoder);
    let s3 = StorageService::new(&StorageConfig {
        endpoint: Some("http://127.0.0.1:9".to_string()),
        region: "us-east-1".to_string(),
        access_key: "test".to_string(),
        secret_key: "test".to_string(),
    });
    let ctx = JobContext::new(
        ScratchSpace::new(dir.path()),
        encoder.clone(),
        Some(Arc::new(s3) as Arc<dyn ObjectStore>),
    );

    Harness {
        dir,
        encoder,
        store: None,
        dispatcher: Dispatcher::start(ctx),
    }
}

pub fn destination(key: &str) -> Destination {
    Destination {
        bucket: "bridge-video-staging".to_string(),
        key: key.to_string(),
        acl: Some("public-read".to_string()),
        content_type: None,
    }
}
