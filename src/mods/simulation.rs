use crate::mods::{
    energy,
    error::{SimError, SimResult},
    lattice::{Lattice, check_shape},
    metropolis::{Beta, SweepMode, sweep_with},
    state::SimLog,
};
use rand::Rng;

/// Parameters of one temperature scan, read-only for the whole run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationPlan {
    pub rows: usize,
    pub cols: usize,
    pub coupling: f64,
    pub min_t: f64,
    pub max_t: f64,
    pub num_measurements: usize,
    pub num_eq_iters: u64,
    pub num_avg_iters: u64,
    pub sweep_mode: SweepMode,
}

impl SimulationPlan {
    pub fn validate(&self) -> SimResult<()> {
        check_shape(self.rows, self.cols)?;
        if !self.coupling.is_finite() {
            return Err(SimError::InvalidCoupling(self.coupling));
        }
        Beta::from_temperature(self.min_t)?;
        Beta::from_temperature(self.max_t)?;
        if self.num_measurements == 0 || self.min_t > self.max_t {
            return Err(SimError::EmptyTemperatureRange {
                min_t: self.min_t,
                max_t: self.max_t,
                num_measurements: self.num_measurements,
            });
        }
        if self.num_eq_iters == 0 {
            return Err(SimError::InvalidIterations("num_eq_iters"));
        }
        if self.num_avg_iters == 0 {
            return Err(SimError::InvalidIterations("num_avg_iters"));
        }
        Ok(())
    }

    pub fn temperatures(&self) -> Vec<f64> {
        temperature_grid(self.min_t, self.max_t, self.num_measurements)
    }
}

/// `n` equally spaced points from `min_t` to `max_t`, both ends included.
pub fn temperature_grid(min_t: f64, max_t: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![min_t],
        _ => {
            let step = (max_t - min_t) / (n - 1) as f64;
            (0..n)
                .map(|k| if k == n - 1 { max_t } else { min_t + step * k as f64 })
                .collect()
        }
    }
}

/// Terminal state and sweep-averaged observables of one temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureResult {
    pub index: usize,
    pub temperature: f64,
    pub lattice: Lattice,
    pub magnetization: f64,
    pub abs_magnetization: f64,
    /// Mean energy per site.
    pub energy: f64,
    /// Accepted / attempted flips during measurement.
    pub acceptance: f64,
}

#[derive(Debug, Default)]
struct Measurement {
    mag_sum: f64,
    abs_mag_sum: f64,
    energy_sum: f64,
    accepted: u64,
    attempted: u64,
    sweeps: u64,
}

impl Measurement {
    fn add_sweep(&mut self, lattice: &Lattice, accepted: u64) {
        let mag = lattice.magnetization();
        self.mag_sum += mag;
        self.abs_mag_sum += mag.abs();
        self.energy_sum += energy::energy_per_site(lattice);
        self.accepted += accepted;
        self.attempted += lattice.size() as u64;
        self.sweeps += 1;
    }

    fn finish(self, index: usize, temperature: f64, lattice: Lattice) -> TemperatureResult {
        let sweeps = self.sweeps as f64;
        TemperatureResult {
            index,
            temperature,
            lattice,
            magnetization: self.mag_sum / sweeps,
            abs_magnetization: self.abs_mag_sum / sweeps,
            energy: self.energy_sum / sweeps,
            acceptance: self.accepted as f64 / self.attempted as f64,
        }
    }
}

/// Equilibrate a fresh lattice at `temperature`, then measure over
/// `num_avg_iters` sweeps.
pub fn run_temperature<R: Rng + ?Sized>(
    plan: &SimulationPlan,
    index: usize,
    temperature: f64,
    rng: &mut R,
) -> SimResult<TemperatureResult> {
    let beta = Beta::from_temperature(temperature)?;
    if plan.num_avg_iters == 0 {
        return Err(SimError::InvalidIterations("num_avg_iters"));
    }

    let mut lattice = Lattice::new(plan.rows, plan.cols, plan.coupling, rng)?;

    for _ in 0..plan.num_eq_iters {
        sweep_with(plan.sweep_mode, &mut lattice, beta, rng);
    }

    let mut measurement = Measurement::default();
    for _ in 0..plan.num_avg_iters {
        let accepted = sweep_with(plan.sweep_mode, &mut lattice, beta, rng);
        measurement.add_sweep(&lattice, accepted);
    }

    Ok(measurement.finish(index, temperature, lattice))
}

/// Scan the temperature grid in ascending order.
///
/// The plan is validated before any sweep runs. Each finished temperature is
/// appended to `simlog` and then handed to `on_result`, which may persist it;
/// an error from `on_result` stops the scan.
pub fn run_calculations<R, E, F>(
    plan: &SimulationPlan,
    rng: &mut R,
    simlog: &mut SimLog,
    mut on_result: F,
) -> Result<(), E>
where
    R: Rng + ?Sized,
    E: From<SimError>,
    F: FnMut(&TemperatureResult) -> Result<(), E>,
{
    plan.validate()?;

    for (index, temperature) in plan.temperatures().into_iter().enumerate() {
        let result = run_temperature(plan, index, temperature, rng)?;
        simlog.record(&result);
        on_result(&result)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn plan(size: usize, t: f64, eq: u64, avg: u64) -> SimulationPlan {
        SimulationPlan {
            rows: size,
            cols: size,
            coupling: 1.0,
            min_t: t,
            max_t: t,
            num_measurements: 1,
            num_eq_iters: eq,
            num_avg_iters: avg,
            sweep_mode: SweepMode::Random,
        }
    }

    fn scan(plan: &SimulationPlan, seed: u64) -> (SimLog, Vec<TemperatureResult>) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut simlog = SimLog::new();
        let mut results = Vec::new();
        run_calculations::<_, SimError, _>(plan, &mut rng, &mut simlog, |r| {
            results.push(r.clone());
            Ok(())
        })
        .unwrap();
        (simlog, results)
    }

    #[test]
    fn grid_includes_both_endpoints() {
        let grid = temperature_grid(1.1, 3.0, 32);
        assert_eq!(grid.len(), 32);
        assert_eq!(grid[0], 1.1);
        assert_eq!(grid[31], 3.0);
        assert!(grid.windows(2).all(|w| w[0] < w[1]));
        assert_relative_eq!(grid[1] - grid[0], 1.9 / 31.0, epsilon = 1e-12);

        assert_eq!(temperature_grid(2.0, 4.0, 3), vec![2.0, 3.0, 4.0]);
        assert_eq!(temperature_grid(2.0, 4.0, 1), vec![2.0]);
        assert!(temperature_grid(2.0, 4.0, 0).is_empty());
    }

    #[test]
    fn validate_rejects_bad_configurations() {
        let good = SimulationPlan {
            min_t: 1.0,
            max_t: 2.0,
            num_measurements: 4,
            ..plan(4, 1.0, 10, 10)
        };
        assert!(good.validate().is_ok());

        let cases = [
            (
                SimulationPlan { rows: 0, ..good.clone() },
                SimError::InvalidShape { rows: 0, cols: 4 },
            ),
            (
                SimulationPlan { min_t: 0.0, ..good.clone() },
                SimError::InvalidTemperature(0.0),
            ),
            (
                SimulationPlan { max_t: -1.0, ..good.clone() },
                SimError::InvalidTemperature(-1.0),
            ),
            (
                SimulationPlan { num_measurements: 0, ..good.clone() },
                SimError::EmptyTemperatureRange {
                    min_t: 1.0,
                    max_t: 2.0,
                    num_measurements: 0,
                },
            ),
            (
                SimulationPlan { min_t: 3.0, ..good.clone() },
                SimError::EmptyTemperatureRange {
                    min_t: 3.0,
                    max_t: 2.0,
                    num_measurements: 4,
                },
            ),
            (
                SimulationPlan { num_eq_iters: 0, ..good.clone() },
                SimError::InvalidIterations("num_eq_iters"),
            ),
            (
                SimulationPlan { num_avg_iters: 0, ..good.clone() },
                SimError::InvalidIterations("num_avg_iters"),
            ),
            (
                SimulationPlan { coupling: f64::INFINITY, ..good.clone() },
                SimError::InvalidCoupling(f64::INFINITY),
            ),
        ];

        for (bad, expected) in cases {
            assert_eq!(bad.validate(), Err(expected));
        }
    }

    #[test]
    fn invalid_plan_aborts_before_any_work() {
        let bad = plan(4, 0.0, 10, 10);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let reference = rng.clone();
        let mut simlog = SimLog::new();
        let mut calls = 0;

        let res = run_calculations::<_, SimError, _>(&bad, &mut rng, &mut simlog, |_| {
            calls += 1;
            Ok(())
        });

        assert_eq!(res, Err(SimError::InvalidTemperature(0.0)));
        assert_eq!(calls, 0);
        assert!(simlog.is_empty());
        assert_eq!(rng, reference);
    }

    #[test]
    fn run_temperature_rejects_zero_temperature() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(
            run_temperature(&plan(4, 1.0, 1, 1), 0, 0.0, &mut rng),
            Err(SimError::InvalidTemperature(0.0))
        );
    }

    #[test]
    fn scan_yields_one_result_per_temperature_in_order() {
        let p = SimulationPlan {
            min_t: 1.0,
            max_t: 4.0,
            num_measurements: 4,
            ..plan(6, 1.0, 5, 5)
        };
        let (simlog, results) = scan(&p, 3);

        assert_eq!(results.len(), 4);
        assert_eq!(simlog.len(), 4);
        for (k, r) in results.iter().enumerate() {
            assert_eq!(r.index, k);
            assert_eq!(r.temperature, 1.0 + k as f64);
            assert_eq!(simlog.magnetization.log[k], r.magnetization);
            assert_eq!(r.lattice.rows(), 6);
            assert!(r.lattice.spins().iter().all(|&s| s == 1 || s == -1));
            assert!((-1.0..=1.0).contains(&r.magnetization));
            assert!(r.abs_magnetization >= r.magnetization.abs() - 1e-12);
            assert!((0.0..=1.0).contains(&r.acceptance));
        }
    }

    #[test]
    fn callback_error_stops_scan() {
        let p = SimulationPlan {
            min_t: 1.0,
            max_t: 2.0,
            num_measurements: 5,
            ..plan(4, 1.0, 2, 2)
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut simlog = SimLog::new();
        let mut seen = 0;

        let res = run_calculations::<_, SimError, _>(&p, &mut rng, &mut simlog, |r| {
            seen += 1;
            if r.index == 1 {
                return Err(SimError::InvalidSpin(0));
            }
            Ok(())
        });

        assert_eq!(res, Err(SimError::InvalidSpin(0)));
        assert_eq!(seen, 2);
        assert_eq!(simlog.len(), 2);
    }

    #[test]
    fn identical_seeds_give_identical_runs() {
        let p = SimulationPlan {
            min_t: 1.5,
            max_t: 3.5,
            num_measurements: 3,
            ..plan(8, 1.0, 20, 20)
        };

        let (log_a, res_a) = scan(&p, 99);
        let (log_b, res_b) = scan(&p, 99);

        assert_eq!(res_a, res_b);
        assert_eq!(log_a.magnetization.log, log_b.magnetization.log);

        let (_, res_c) = scan(&p, 100);
        assert_ne!(res_a, res_c);
    }

    #[test]
    fn high_temperature_is_disordered() {
        let p = plan(4, 100.0, 50, 50);
        let mut total = 0.0;
        let runs = 40;

        for seed in 0..runs {
            let (_, results) = scan(&p, seed);
            let m = results[0].magnetization;
            assert!(m.abs() < 0.6, "seed {seed}: m = {m}");
            total += m.abs();
        }

        let mean_abs = total / runs as f64;
        assert!(mean_abs < 0.3, "mean |m| = {mean_abs}");
    }

    #[test]
    fn low_temperature_orders() {
        // A few quenches freeze into two-domain stripes (energy -1 per site)
        // instead of the ordered ground state (-2 per site).
        let p = plan(4, 0.1, 500, 50);
        let runs = 40;
        let mut ordered = 0;

        for seed in 0..runs {
            let (_, results) = scan(&p, 1000 + seed);
            let r = &results[0];
            if r.magnetization.abs() > 0.8 {
                ordered += 1;
            }
            assert!(r.energy <= -1.0 + 1e-9, "seed {seed}: energy = {}", r.energy);
        }

        assert!(ordered >= 28, "only {ordered}/{runs} runs ordered");
    }

    #[test]
    fn checkerboard_mode_orders_at_low_temperature() {
        let p = SimulationPlan {
            sweep_mode: SweepMode::Checkerboard,
            ..plan(8, 0.5, 500, 50)
        };
        let runs = 20;
        let mut ordered = 0;

        for seed in 0..runs {
            let (_, results) = scan(&p, seed);
            if results[0].abs_magnetization > 0.8 {
                ordered += 1;
            }
        }

        assert!(ordered >= 10, "only {ordered}/{runs} runs ordered");
    }

    #[test]
    fn overflowing_shape_fails_validation() {
        let huge = usize::MAX / 2 + 1;
        let p = SimulationPlan {
            rows: huge,
            cols: 2,
            ..plan(4, 1.0, 10, 10)
        };
        assert_eq!(
            p.validate(),
            Err(SimError::InvalidShape { rows: huge, cols: 2 })
        );
    }

    #[test]
    fn observables_average_every_measurement_sweep() {
        let p = plan(6, 2.0, 5, 40);
        let (_, results) = scan(&p, 31);

        // Replay the same draws and accumulate by hand.
        let mut rng = ChaCha8Rng::seed_from_u64(31);
        let beta = Beta::from_temperature(2.0).unwrap();
        let mut lat = Lattice::new(6, 6, 1.0, &mut rng).unwrap();
        for _ in 0..5 {
            sweep_with(p.sweep_mode, &mut lat, beta, &mut rng);
        }

        let mut mags = Vec::new();
        let mut energies = Vec::new();
        for _ in 0..40 {
            sweep_with(p.sweep_mode, &mut lat, beta, &mut rng);
            mags.push(lat.magnetization());
            energies.push(energy::energy_per_site(&lat));
        }
        let mean = |v: &[f64]| v.iter().sum::<f64>() / v.len() as f64;
        let abs_mags: Vec<f64> = mags.iter().map(|m| m.abs()).collect();

        let res = &results[0];
        assert_eq!(res.lattice, lat);
        assert_relative_eq!(res.magnetization, mean(&mags), epsilon = 1e-12);
        assert_relative_eq!(res.abs_magnetization, mean(&abs_mags), epsilon = 1e-12);
        assert_relative_eq!(res.energy, mean(&energies), epsilon = 1e-12);
        assert!(mags.windows(2).any(|w| w[0] != w[1]));
    }
}
