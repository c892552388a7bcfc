use std::path::Path;
use std::time::Duration;
use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use crate::WorkerError;
use crate::util::constants::CONFIG_FILE_STEM;
use crate::util::options::WorkerOptions;

/// On-disk overrides for [`WorkerOptions`]. Durations are in milliseconds.
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct WorkerConfigFile {
    // 任务队列
    pub queue_capacity: Option<usize>,
    pub enqueue_timeout_ms: Option<u64>,

    // 工作线程
    pub poll_interval_ms: Option<u64>,
    pub thread_name: Option<String>,

    // 分发
    pub dispatch_interval_ms: Option<u64>,

    // 生命周期
    pub stop_timeout_ms: Option<u64>,

    pub log_target: Option<String>,
}

/// Reads `worker.yaml`, falling back to `worker.json` and then `worker.ini`,
/// from `dir`. A directory with none of them yields an empty override set.
pub fn load_worker_config(dir: &Path) -> Result<WorkerConfigFile, WorkerError> {
    let mut cfg = Config::builder();

    let yaml = dir.join(format!("{}.yaml", CONFIG_FILE_STEM));
    let json = dir.join(format!("{}.json", CONFIG_FILE_STEM));
    let ini = dir.join(format!("{}.ini", CONFIG_FILE_STEM));

    if yaml.exists() {
        cfg = cfg.add_source(File::from(yaml.as_path()).format(FileFormat::Yaml));
    } else if json.exists() {
        cfg = cfg.add_source(File::from(json.as_path()).format(FileFormat::Json));
    } else if ini.exists() {
        cfg = cfg.add_source(File::from(ini.as_path()).format(FileFormat::Ini));
    }

    let cfg = cfg.build().map_err(WorkerError::Config)?;
    cfg.try_deserialize().map_err(WorkerError::Config)
}

impl WorkerConfigFile {
    pub fn to_options(self) -> WorkerOptions {
        let file = self;
        let mut opts = WorkerOptions::default();

        macro_rules! apply {
            ($f:ident) => {
                if let Some(v) = file.$f {
                    opts.$f = v;
                }
            };
            ($f:ident, $ms:ident) => {
                if let Some(v) = file.$ms {
                    opts.$f = Duration::from_millis(v);
                }
            };
        }

        apply!(queue_capacity);
        apply!(enqueue_timeout, enqueue_timeout_ms);
        apply!(poll_interval, poll_interval_ms);
        apply!(thread_name);
        apply!(dispatch_interval, dispatch_interval_ms);
        apply!(stop_timeout, stop_timeout_ms);
        apply!(log_target);

        opts
    }
}
