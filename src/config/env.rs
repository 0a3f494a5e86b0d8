use std::env;
use std::str::FromStr;

pub enum EnvKey {
    ServerPort,
    WorkDir,
    AwsAccessKey,
    AwsSecretKey,
    AwsRegion,
    S3Endpoint,
    FfmpegPath,
    EncodeTimeoutSecs,
    UploadTimeoutSecs,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::WorkDir => "WORK_DIR",
            EnvKey::AwsAccessKey => "AWS_ACCESS_KEY_ID",
            EnvKey::AwsSecretKey => "AWS_SECRET_ACCESS_KEY",
            EnvKey::AwsRegion => "AWS_REGION",
            EnvKey::S3Endpoint => "S3_ENDPOINT",
            EnvKey::FfmpegPath => "FFMPEG_PATH",
            EnvKey::EncodeTimeoutSecs => "ENCODE_TIMEOUT_SECS",
            EnvKey::UploadTimeoutSecs => "UPLOAD_TIMEOUT_SECS",
        }
    }
}

/// Where configuration values come from. The process environment in
/// production, a map in tests.
pub trait Source {
    fn var(&self, key: &str) -> Option<String>;
}

pub struct ProcessEnv;

impl Source for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

impl<F> Source for F
where
    F: Fn(&str) -> Option<String>,
{
    fn var(&self, key: &str) -> Option<String> {
        self(key)
    }
}

/// Blank values count as unset.
pub fn get(source: &impl Source, key: EnvKey) -> Option<String> {
    source
        .var(key.as_str())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn get_or(source: &impl Source, key: EnvKey, default: &str) -> String {
    get(source, key).unwrap_or_else(|| default.to_string())
}

pub fn get_parsed<T: FromStr>(source: &impl Source, key: EnvKey, default: T) -> T {
    match get(source, key) {
        Some(val) => val.parse::<T>().unwrap_or(default),
        None => default,
    }
}
