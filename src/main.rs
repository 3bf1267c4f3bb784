use ising_mc::mods::{
    io_handler, settings::Settings, simulation::run_calculations, state::SimLog,
};

use std::{error::Error, time::Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn main() -> Result<(), Box<dyn Error>> {
    let sta1 = Instant::now();

    let sta2 = Instant::now();

    let mut cfg = Settings::new();
    cfg.src_path = io_handler::get_exe_dir().unwrap_or_else(|e| {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1)
    });

    match io_handler::load_config(&mut cfg).and_then(|_| cfg.validate()) {
        Ok(_) => { /* println!("✅ Settings loaded and validated!") */ }
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1)
        }
    }

    let mut rng = ChaCha8Rng::seed_from_u64(cfg.seed);

    io_handler::prepare_dir(&mut cfg).unwrap_or_else(|e| {
        eprintln!("❌ Failed to create output directory: {}", e);
        std::process::exit(1);
    });
    println!("📁 DST Path: {}", cfg.dst_path.display());

    io_handler::prepare_files(&cfg).unwrap_or_else(|e| {
        eprintln!("❌ Failed to prepare files: {}", e);
        std::process::exit(1);
    });

    let mut simlog = SimLog::new();
    simlog.create_out_file(cfg.dst_path.clone())?;
    io_handler::write_run_info(&cfg)?;

    let fin2 = sta2.elapsed();
    println!("✅ Preparation DONE! (Time: {:?})", fin2);

    println!("DirPrefix: {:?}", cfg.dir_prefix);
    println!("Seed: {:?};", cfg.seed);
    println!("Rows: {:?}; Cols: {:?}; J: {:.5e};", cfg.rows, cfg.cols, cfg.coupling);
    println!(
        "MinT: {:.5e}; MaxT: {:.5e}; NumMeasurements: {:?};",
        cfg.min_t, cfg.max_t, cfg.num_measurements
    );
    println!(
        "NumEqIters: {:?}; NumAvgIters: {:?}; SweepMode: {};",
        cfg.num_eq_iters, cfg.num_avg_iters, cfg.sweep_mode
    );
    println!("PrintI: {:?};", cfg.print_i);

    let plan = cfg.plan();
    let num_temps = plan.num_measurements;
    let print_i = cfg.print_i.max(1) as usize;

    run_calculations::<_, Box<dyn Error>, _>(&plan, &mut rng, &mut simlog, |res| {
        io_handler::save_state(&cfg.dst_path, res.index, &res.lattice)?;

        let done = res.index + 1;
        if done % print_i == 0 || done == num_temps {
            println!(
                "Temperatures: {}/{} (T = {:.5e}, <m> = {:.5e}, <|m|> = {:.5e}, <e> = {:.5e})",
                done,
                num_temps,
                res.temperature,
                res.magnetization,
                res.abs_magnetization,
                res.energy
            );
        }
        Ok(())
    })?;

    simlog.write_log_to_file()?;

    let fin1 = sta1.elapsed();
    println!("✅ All DONE! (Time: {:?})", fin1);

    Ok(())
}
