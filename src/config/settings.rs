use crate::config::env::{self, EnvKey, ProcessEnv, Source};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_ENCODE_TIMEOUT_SECS: u64 = 3600;
const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 600;

#[derive(Clone, Debug, Deserialize)]
pub struct StorageConfig {
    pub endpoint: Option<String>,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    pub work_dir: Option<PathBuf>,
    pub storage: Option<StorageConfig>,
    pub ffmpeg_path: String,
    pub encode_timeout_secs: u64,
    pub upload_timeout_secs: u64,
}

impl AppConfig {
    pub fn new() -> Self {
        Self::from_source(&ProcessEnv)
    }

    pub fn from_source(source: &impl Source) -> Self {
        // Uploads need both halves of the credential pair.
        let storage = match (
            env::get(source, EnvKey::AwsAccessKey),
            env::get(source, EnvKey::AwsSecretKey),
        ) {
            (Some(access_key), Some(secret_key)) => Some(StorageConfig {
                endpoint: env::get(source, EnvKey::S3Endpoint),
                region: env::get_or(source, EnvKey::AwsRegion, "us-east-1"),
                access_key,
                secret_key,
            }),
            _ => None,
        };

        Self {
            server_port: env::get_parsed(source, EnvKey::ServerPort, 3000),
            work_dir: env::get(source, EnvKey::WorkDir).map(PathBuf::from),
            storage,
            ffmpeg_path: env::get_or(source, EnvKey::FfmpegPath, "ffmpeg"),
            encode_timeout_secs: env::get_parsed(
                source,
                EnvKey::EncodeTimeoutSecs,
                DEFAULT_ENCODE_TIMEOUT_SECS,
            ),
            upload_timeout_secs: env::get_parsed(
                source,
                EnvKey::UploadTimeoutSecs,
                DEFAULT_UPLOAD_TIMEOUT_SECS,
            ),
        }
    }

    /// `None` when the limit is disabled with `0`.
    pub fn encode_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.encode_timeout_secs)
    }

    pub fn upload_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.upload_timeout_secs)
    }
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
