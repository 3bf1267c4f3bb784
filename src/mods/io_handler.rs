use crate::mods::{
    constants::{
        COMMENT_LINE, CONFIG_FILE_NAME, RUN_INFO_FILE_NAME, STATE_FILE_EXT, STATE_FILE_PREFIX,
    },
    lattice::Lattice,
    metropolis::SweepMode,
    settings::{Settings, SettingsError},
};
use chrono::Utc;
use std::{
    collections::HashMap,
    env::current_exe,
    fs::{self, File},
    io::{BufRead, BufReader, BufWriter, Error as IoError, ErrorKind, Result as IoResult, Write},
    path::{Path, PathBuf},
};

use evalexpr::eval_number;

type Parser = Box<dyn Fn(&str, &mut Settings) -> Result<(), SettingsError>>;

macro_rules! parse_and_assign_eval {
    ($map:expr, $field:ident, $type:ty, $key:expr) => {
        $map.insert(
            $key,
            Box::new(|v: &str, s: &mut Settings| {
                let val = eval_number(v).map_err(|e| SettingsError::new($key, v, e))?;
                s.$field = val as $type;
                Ok(())
            }),
        );
    };
}

fn build_dispatch() -> HashMap<&'static str, Parser> {
    let mut dispatch: HashMap<&'static str, Parser> = HashMap::new();

    dispatch.insert(
        "DirPrefix",
        Box::new(|v: &str, s: &mut Settings| {
            s.dir_prefix = v.to_string();
            Ok(())
        }),
    );
    parse_and_assign_eval!(dispatch, seed, u64, "Seed");

    dispatch.insert(
        "Size",
        Box::new(|v: &str, s: &mut Settings| {
            let val = eval_number(v).map_err(|e| SettingsError::new("Size", v, e))?;
            s.rows = val as usize;
            s.cols = val as usize;
            Ok(())
        }),
    );
    parse_and_assign_eval!(dispatch, rows, usize, "Rows");
    parse_and_assign_eval!(dispatch, cols, usize, "Cols");
    parse_and_assign_eval!(dispatch, coupling, f64, "J");

    parse_and_assign_eval!(dispatch, min_t, f64, "MinT");
    parse_and_assign_eval!(dispatch, max_t, f64, "MaxT");
    parse_and_assign_eval!(dispatch, num_measurements, usize, "NumMeasurements");

    parse_and_assign_eval!(dispatch, num_eq_iters, u64, "NumEqIters");
    parse_and_assign_eval!(dispatch, num_avg_iters, u64, "NumAvgIters");
    dispatch.insert(
        "SweepMode",
        Box::new(|v: &str, s: &mut Settings| {
            s.sweep_mode =
                SweepMode::try_from(v).map_err(|e| SettingsError::simple("SweepMode", e))?;
            Ok(())
        }),
    );

    parse_and_assign_eval!(dispatch, print_i, u64, "PrintI");

    dispatch
}

/// Load `IsingSettings.ini` from `cfg.src_path`, keeping defaults when it is absent.
pub fn load_config(cfg: &mut Settings) -> Result<(), SettingsError> {
    let path = cfg.src_path.join(CONFIG_FILE_NAME);

    if !path.exists() {
        eprintln!(
            "⚠️ Warning: Configuration file '{}' not found, using defaults.",
            path.display()
        );
        return Ok(());
    }

    load_config_file(&path, cfg)
}

/// Apply every `Key: value` line of `path` to `cfg`, stopping at the comment marker.
pub fn load_config_file(path: &Path, cfg: &mut Settings) -> Result<(), SettingsError> {
    let reader = BufReader::new(File::open(path)?);
    let dispatch = build_dispatch();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        let trimmed = line.trim();

        if trimmed == COMMENT_LINE {
            break;
        }

        let mut parts = trimmed.splitn(2, ':');
        let key = parts.next().unwrap_or("").trim();
        let value = parts.next().unwrap_or("").trim();

        if key.is_empty() || value.is_empty() {
            #[cfg(debug_assertions)]
            if !trimmed.is_empty() {
                eprintln!("⚠️ Warning: Malformed line {}: '{}'", line_num + 1, line);
            }
            continue;
        }

        if let Some(parser) = dispatch.get(key) {
            parser(value, cfg)?;
        } else {
            #[cfg(debug_assertions)]
            eprintln!(
                "⚠️ Warning: Unknown cfg key '{}' found on line {}: '{}'",
                key,
                line_num + 1,
                line
            );
        }
    }

    Ok(())
}

pub fn get_exe_dir() -> IoResult<PathBuf> {
    current_exe()
        .map_err(|e| {
            IoError::new(
                ErrorKind::Other,
                format!("Failed to get executable path: {}", e),
            )
        })?
        .parent()
        .map(PathBuf::from)
        .ok_or_else(|| IoError::new(ErrorKind::Other, "Failed to get executable directory"))
}

fn create_dir_name(cfg: &Settings, timestamp: i64) -> String {
    format!(
        "{}_{}_R{}C{}_T{:e}-{:e}_N{}",
        timestamp,
        cfg.dir_prefix,
        cfg.rows,
        cfg.cols,
        cfg.min_t,
        cfg.max_t,
        cfg.num_measurements
    )
}

pub fn prepare_dir(cfg: &mut Settings) -> IoResult<()> {
    let timestamp = Utc::now().timestamp_micros();
    let dir_name = create_dir_name(cfg, timestamp);
    let res_dir = cfg.src_path.join(&dir_name);

    fs::create_dir_all(&res_dir).map_err(|e| {
        IoError::new(
            e.kind(),
            format!("Failed to create directory '{}': {}", res_dir.display(), e),
        )
    })?;

    cfg.dst_path = res_dir;

    Ok(())
}

/// Copy the configuration next to the results, when there is one.
pub fn prepare_files(cfg: &Settings) -> IoResult<()> {
    let path_src_config = cfg.src_path.join(CONFIG_FILE_NAME);
    let path_dst_config = cfg.dst_path.join(CONFIG_FILE_NAME);

    if path_src_config.exists() {
        fs::copy(&path_src_config, &path_dst_config).map_err(|e| {
            IoError::new(
                e.kind(),
                format!(
                    "Failed to copy config from '{}' to '{}': {}",
                    path_src_config.display(),
                    path_dst_config.display(),
                    e
                ),
            )
        })?;
    }

    Ok(())
}

pub fn state_file_path(dst_dir: &Path, index: usize) -> PathBuf {
    dst_dir.join(format!("{}{:05}.{}", STATE_FILE_PREFIX, index, STATE_FILE_EXT))
}

/// One line per lattice row, spins separated by `:`.
pub fn write_state<W: Write>(writer: &mut W, lattice: &Lattice) -> IoResult<()> {
    for i in 0..lattice.rows() {
        write_state_uni(writer, lattice.row(i), &|s: i8| s.to_string())?;
    }
    Ok(())
}

/// Persist the terminal lattice of temperature `index` under `dst_dir`.
pub fn save_state(dst_dir: &Path, index: usize, lattice: &Lattice) -> IoResult<PathBuf> {
    let path = state_file_path(dst_dir, index);

    let mut buf = BufWriter::new(File::create(&path).map_err(|e| {
        IoError::new(
            e.kind(),
            format!("Failed to create file '{}': {}", path.display(), e),
        )
    })?);
    write_state(&mut buf, lattice)?;
    buf.flush()?;

    Ok(path)
}

/// Rebuild a lattice from a snapshot written by [`save_state`].
pub fn read_state(path: &Path, coupling: f64) -> IoResult<Lattice> {
    let reader = BufReader::new(File::open(path)?);

    let mut spins = Vec::new();
    let mut rows = 0;
    let mut cols = None;

    for (i, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let row = trimmed
            .split(':')
            .map(|s| {
                s.trim().parse::<i8>().map_err(|e| {
                    IoError::new(
                        ErrorKind::InvalidData,
                        format!("Failed to parse spin value '{}' on line {}: {}", s, i + 1, e),
                    )
                })
            })
            .collect::<IoResult<Vec<i8>>>()?;

        match cols {
            None => cols = Some(row.len()),
            Some(expected) if expected != row.len() => {
                return Err(IoError::new(
                    ErrorKind::InvalidData,
                    format!(
                        "Line {} has incorrect number of values: expected {}, got {}",
                        i + 1,
                        expected,
                        row.len()
                    ),
                ));
            }
            Some(_) => {}
        }

        spins.extend(row);
        rows += 1;
    }

    Lattice::from_spins(rows, cols.unwrap_or(0), coupling, spins)
        .map_err(|e| IoError::new(ErrorKind::InvalidData, format!("{}: {}", path.display(), e)))
}

/// Write the run metadata in the config format so [`load_config_file`] reads it back.
pub fn write_run_info(cfg: &Settings) -> IoResult<PathBuf> {
    let path = cfg.dst_path.join(RUN_INFO_FILE_NAME);
    let mut buf = BufWriter::new(File::create(&path).map_err(|e| {
        IoError::new(
            e.kind(),
            format!("Failed to create file '{}': {}", path.display(), e),
        )
    })?);

    write_run_info_to(&mut buf, cfg)?;
    buf.flush()?;

    Ok(path)
}

pub fn write_run_info_to<W: Write>(writer: &mut W, cfg: &Settings) -> IoResult<()> {
    if cfg.rows == cfg.cols {
        writeln!(writer, "Size: {}", cfg.rows)?;
    }
    writeln!(writer, "Rows: {}", cfg.rows)?;
    writeln!(writer, "Cols: {}", cfg.cols)?;
    writeln!(writer, "J: {:?}", cfg.coupling)?;
    writeln!(writer, "MinT: {:?}", cfg.min_t)?;
    writeln!(writer, "MaxT: {:?}", cfg.max_t)?;
    writeln!(writer, "NumMeasurements: {}", cfg.num_measurements)?;
    writeln!(writer, "NumEqIters: {}", cfg.num_eq_iters)?;
    writeln!(writer, "NumAvgIters: {}", cfg.num_avg_iters)?;
    writeln!(writer, "SweepMode: {}", cfg.sweep_mode)?;
    writeln!(writer, "Seed: {}", cfg.seed)?;
    writeln!(writer, "{}", COMMENT_LINE)?;
    writeln!(writer, "Created: {}", Utc::now().to_rfc3339())?;
    Ok(())
}

/// Recover the run parameters stored by [`write_run_info`].
pub fn read_run_info(path: &Path) -> Result<Settings, SettingsError> {
    let mut cfg = Settings::new();
    load_config_file(path, &mut cfg)?;
    Ok(cfg)
}

pub fn write_state_uni<W, T, F>(writer: &mut W, state: &[T], formatter: &F) -> IoResult<()>
where
    W: Write,
    T: Copy,
    F: Fn(T) -> String + ?Sized,
{
    let mut first = true;
    for &v in state {
        if !first {
            writer.write_all(b":")?;
        } else {
            first = false;
        }
        writer.write_all(formatter(v).as_bytes())?;
    }
    writer.write_all(b"\n")?;

    Ok(())
}
