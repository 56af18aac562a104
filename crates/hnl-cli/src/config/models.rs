use hnlyield::engine::config::PipelineConfig;
use hnlyield::workflows::scan::{ScanGrid, ScanOptions};
use std::path::PathBuf;

pub struct ScanSettings {
    pub grid: ScanGrid,
    pub log_path: PathBuf,
    pub options: ScanOptions,
}

pub struct AppConfig {
    pub pipeline: PipelineConfig,
    pub scan: ScanSettings,
}
