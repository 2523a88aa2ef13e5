use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing_subscriber::EnvFilter;
use voicebank_batch::*;

/// Pretends to resample and pack a voice bank.
struct SimulatedConverter;

impl JobProcessor for SimulatedConverter {
    fn process(&self, job: &Job) -> anyhow::Result<JobResult> {
        let samples = job.config["samples"].as_u64().unwrap_or(20);
        thread::sleep(Duration::from_millis(samples * 10));

        if job.voice_bank_name.contains("broken") {
            anyhow::bail!("missing oto.ini in {}", job.input_path.display());
        }

        Ok(JobResult::success()
            .with_input_files(samples as usize)
            .with_output_size(samples * 48_000)
            .with_quality(0.92)
            .with_compression_ratio(3.5))
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let config = BatchConfig::builder()
        .with_threads(4)
        .with_batch_size(3)
        .with_progress_interval(Duration::from_millis(50))
        .build();
    let progress_interval = config.progress_update_interval();

    let engine = BatchEngine::new(config, SimulatedConverter)?;
    engine.set_observer(Arc::new(ConsoleReporter::new(progress_interval)));

    if !engine.check_system_resources() {
        println!("Warning: less memory available than the configured limit");
    }

    let banks = [
        ("kasane_teto_cv", 30),
        ("momone_momo_vcv", 45),
        ("broken_bank", 10),
        ("namine_ritsu_act3", 60),
        ("yokune_ruko_cv", 25),
        ("defoko_cv", 15),
    ];
    for (name, samples) in banks {
        engine.add_job(
            format!("/voicebanks/{}", name),
            format!("/converted/{}.nvm", name),
            serde_json::json!({ "samples": samples }),
        )?;
    }

    engine.start_batch();

    // Pause briefly to show that in-flight conversions finish first
    thread::sleep(Duration::from_millis(400));
    engine.pause_batch();
    thread::sleep(Duration::from_millis(300));
    engine.resume_batch();

    let state = engine.wait_for_completion(Duration::from_secs(60));
    println!("Final state: {:?}", state);

    for line in engine.get_error_log() {
        println!("  {}", line);
    }
    Ok(())
}
