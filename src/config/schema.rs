use serde::{Serialize, Deserialize};

use crate::core::worker::WorkerSpec;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub workflow: WorkflowSettings,

    #[serde(default)]
    pub logging: LoggingSettings,

    #[serde(default)]
    pub workers: Vec<WorkerSpec>,
}

/// Dispatch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSettings {
    pub name: String,
    /// Concurrency limit for both pools; 0 means one slot per CPU
    #[serde(default)]
    pub max_workers: usize,
    pub batch_size: usize,
    /// Default per-job deadline for single-task process runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<f64>,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    #[serde(default = "default_ansi")]
    pub ansi: bool,
}

fn default_ansi() -> bool {
    true
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            name: "erysa".to_string(),
            max_workers: 0,
            batch_size: 5,
            timeout_secs: None,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: default_ansi(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workflow: WorkflowSettings::default(),
            logging: LoggingSettings::default(),
            workers: vec![WorkerSpec::Echo {
                name: "echo".to_string(),
                prefix: String::new(),
            }],
        }
    }
}
