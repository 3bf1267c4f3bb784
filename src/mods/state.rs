use crate::mods::{constants::SIM_LOG_FILE_NAME, io_handler, simulation::TemperatureResult};

use std::{
    fmt::Debug,
    fs::File,
    io::{BufWriter, Error as IoError, ErrorKind, Result as IoResult, Write},
    path::PathBuf,
};

pub struct LogEntry<T: Debug + 'static> {
    pub val: T,
    pub log: Vec<T>,
    pub is_on: bool,
    pub format_f: Box<dyn Fn(T) -> String + 'static>,
}

impl<T: Debug + 'static> Debug for LogEntry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogEntry")
            .field("val", &self.val)
            .field("log", &self.log)
            .field("is_on", &self.is_on)
            .field("format_f", &"<closure>")
            .finish()
    }
}

impl<T: Debug + Copy + 'static> LogEntry<T> {
    pub fn new<F>(val: T, is_on: bool, format_f: F) -> Self
    where
        F: Fn(T) -> String + 'static,
    {
        Self {
            val,
            log: Vec::new(),
            is_on,
            format_f: Box::new(format_f),
        }
    }

    pub fn push_if_enabled(&mut self) {
        if self.is_on {
            self.log.push(self.val);
        }
    }
}

/// Per-temperature observable series, appended in temperature order.
#[derive(Debug)]
pub struct SimLog {
    pub temperature: LogEntry<f64>,
    pub magnetization: LogEntry<f64>,
    pub abs_magnetization: LogEntry<f64>,
    pub energy: LogEntry<f64>,
    pub acceptance: LogEntry<f64>,

    pub path_out_file: Option<PathBuf>,
    pub out_file_buf: Option<BufWriter<File>>,
}

impl Default for SimLog {
    fn default() -> Self {
        Self::new()
    }
}

impl SimLog {
    pub fn new() -> Self {
        let fmt_t = |v: f64| format!("{:.10e}", v);
        let fmt_obs = |v: f64| format!("{:.15e}", v);

        Self {
            temperature: LogEntry::new(0.0, true, fmt_t),
            magnetization: LogEntry::new(0.0, true, fmt_obs),
            abs_magnetization: LogEntry::new(0.0, true, fmt_obs),
            energy: LogEntry::new(0.0, true, fmt_obs),
            acceptance: LogEntry::new(0.0, true, fmt_obs),

            path_out_file: None,
            out_file_buf: None,
        }
    }

    pub fn create_out_file(&mut self, path_dst: PathBuf) -> IoResult<()> {
        let path_out_file = path_dst.join(SIM_LOG_FILE_NAME);

        let out_file_buf = BufWriter::new(File::create(&path_out_file).map_err(|e| {
            IoError::new(
                e.kind(),
                format!("Failed to create file '{}': {}", path_out_file.display(), e),
            )
        })?);

        self.path_out_file = Some(path_out_file);
        self.out_file_buf = Some(out_file_buf);

        Ok(())
    }

    pub fn record(&mut self, result: &TemperatureResult) {
        self.temperature.val = result.temperature;
        self.magnetization.val = result.magnetization;
        self.abs_magnetization.val = result.abs_magnetization;
        self.energy.val = result.energy;
        self.acceptance.val = result.acceptance;

        self.add_log_point();
    }

    pub fn add_log_point(&mut self) {
        self.temperature.push_if_enabled();
        self.magnetization.push_if_enabled();
        self.abs_magnetization.push_if_enabled();
        self.energy.push_if_enabled();
        self.acceptance.push_if_enabled();
    }

    /// Number of recorded temperatures.
    pub fn len(&self) -> usize {
        self.temperature.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One `:`-separated line per series, in field order.
    pub fn write_log<W: Write>(&self, buf: &mut W) -> IoResult<()> {
        io_handler::write_state_uni(buf, &self.temperature.log, &self.temperature.format_f)?;
        io_handler::write_state_uni(buf, &self.magnetization.log, &self.magnetization.format_f)?;
        io_handler::write_state_uni(
            buf,
            &self.abs_magnetization.log,
            &self.abs_magnetization.format_f,
        )?;
        io_handler::write_state_uni(buf, &self.energy.log, &self.energy.format_f)?;
        io_handler::write_state_uni(buf, &self.acceptance.log, &self.acceptance.format_f)?;
        Ok(())
    }

    pub fn write_log_to_file(&mut self) -> IoResult<()> {
        let Some(mut buf) = self.out_file_buf.take() else {
            eprintln!("❌ Error: Log file not initialized!");
            return Err(IoError::new(ErrorKind::Other, "Log file not initialized"));
        };

        let res = self.write_log(&mut buf).and_then(|_| buf.flush());
        self.out_file_buf = Some(buf);
        res
    }
}
