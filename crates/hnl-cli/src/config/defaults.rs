pub struct DefaultsConfig {
    pub experiment: String,
    pub events_to_inject: usize,
    pub output_dir: String,
    pub seed: u64,
    pub scan_log: String,
    pub mass_range: (f64, f64),
    pub coupling_range: (f64, f64),
    pub mass_points: usize,
    pub coupling_points: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            experiment: "ND280UPGRD".to_string(),
            events_to_inject: 1000,
            output_dir: "output".to_string(),
            seed: 1,
            scan_log: "recording.txt".to_string(),
            mass_range: (0.02, 0.4),
            coupling_range: (5e-8, 1e-2),
            mass_points: 10,
            coupling_points: 10,
        }
    }
}
