use crate::mods::{
    error::SimError,
    metropolis::SweepMode,
    simulation::SimulationPlan,
};
use std::{borrow::Cow, error::Error, fmt, path::PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub dir_prefix: String,
    pub seed: u64,

    pub rows: usize,
    pub cols: usize,
    pub coupling: f64,

    pub min_t: f64,
    pub max_t: f64,
    pub num_measurements: usize,

    pub num_eq_iters: u64,
    pub num_avg_iters: u64,
    pub sweep_mode: SweepMode,

    pub print_i: u64,

    pub src_path: PathBuf,
    pub dst_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dir_prefix: "Ising".to_string(),
            seed: 1012,

            rows: 32,
            cols: 32,
            coupling: 1.0,

            min_t: 1.1,
            max_t: 3.0,
            num_measurements: 32,

            num_eq_iters: 256,
            num_avg_iters: 512,
            sweep_mode: SweepMode::Random,

            print_i: 1,

            src_path: PathBuf::new(),
            dst_path: PathBuf::new(),
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plan(&self) -> SimulationPlan {
        SimulationPlan {
            rows: self.rows,
            cols: self.cols,
            coupling: self.coupling,
            min_t: self.min_t,
            max_t: self.max_t,
            num_measurements: self.num_measurements,
            num_eq_iters: self.num_eq_iters,
            num_avg_iters: self.num_avg_iters,
            sweep_mode: self.sweep_mode,
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.dir_prefix.trim().is_empty() {
            return Err(SettingsError::simple("DirPrefix", "cannot be empty"));
        }
        if self.rows == 0 {
            return Err(SettingsError::simple("Rows", "must be > 0"));
        }
        if self.cols == 0 {
            return Err(SettingsError::simple("Cols", "must be > 0"));
        }
        if self.min_t.is_nan() || self.min_t <= 0.0 {
            return Err(SettingsError::simple("MinT", "must be > 0"));
        }
        if self.max_t.is_nan() || self.max_t <= 0.0 {
            return Err(SettingsError::simple("MaxT", "must be > 0"));
        }
        if self.num_measurements == 0 {
            return Err(SettingsError::simple("NumMeasurements", "must be > 0"));
        }
        if self.num_eq_iters == 0 {
            return Err(SettingsError::simple("NumEqIters", "must be > 0"));
        }
        if self.num_avg_iters == 0 {
            return Err(SettingsError::simple("NumAvgIters", "must be > 0"));
        }
        self.plan().validate()?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct SettingsError {
    pub key: Option<Cow<'static, str>>,
    pub value: Option<String>,
    pub source: Box<dyn Error + Send + Sync>,
}

impl SettingsError {
    pub fn new<K: Into<Cow<'static, str>>, V: Into<String>, E: Error + Send + Sync + 'static>(
        key: K,
        value: V,
        source: E,
    ) -> Self {
        Self {
            key: Some(key.into()),
            value: Some(value.into()),
            source: Box::new(source),
        }
    }

    pub fn simple<K: Into<Cow<'static, str>>, M: Into<String>>(key: K, message: M) -> Self {
        Self {
            key: Some(key.into()),
            value: None,
            source: Box::new(SimpleMsg(message.into())),
        }
    }

    pub fn from_io(err: std::io::Error) -> Self {
        Self {
            key: None,
            value: None,
            source: Box::new(err),
        }
    }
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.key, &self.value) {
            (Some(key), Some(value)) => {
                write!(
                    f,
                    "Failed to parse '{}' with value '{}': {}",
                    key, value, self.source
                )
            }
            (Some(key), None) => {
                write!(f, "Invalid value for '{}': {}", key, self.source)
            }
            _ => write!(f, "Settings error: {}", self.source),
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.source)
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(err: std::io::Error) -> Self {
        Self::from_io(err)
    }
}

impl From<SimError> for SettingsError {
    fn from(err: SimError) -> Self {
        Self {
            key: None,
            value: None,
            source: Box::new(err),
        }
    }
}

#[derive(Debug)]
struct SimpleMsg(String);

impl fmt::Display for SimpleMsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for SimpleMsg {}
