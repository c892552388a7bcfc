use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use log::{info, warn};
use pcopt::{load_worker_config, LoopScheduler, Outcome, StopSignal, TaskError, TaskId, TaskRunner, WorkerError,
            WorkerOptions};

const RUN_DEADLINE: Duration = Duration::from_secs(60);

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = match std::env::args().nth(1) {
        Some(dir) => {
            if !Path::new(&dir).is_dir() {
                warn!("config directory {} does not exist; using defaults", dir);
            }
            load_worker_config(Path::new(&dir))?.to_options()
        }
        None => WorkerOptions::default(),
    };

    let runner = Arc::new(TaskRunner::new(options)?);
    runner.start()?;

    let remaining = Arc::new(AtomicUsize::new(0));
    let queue = |name: &'static str, res: Result<TaskId, WorkerError>| match res {
        Ok(id) => {
            info!("queued {} as task {}", name, id);
            remaining.fetch_add(1, Ordering::SeqCst);
        }
        Err(e) => warn!("failed to queue {}: {}", name, e),
    };

    queue("temp usage", runner.add_task(scan_temp_dir, report("temp usage", &remaining)));
    queue("startup programs", runner.add_task(list_startup_programs, report("startup programs", &remaining)));
    queue("temp cleanup (dry run)", runner.add_cancellable_task(
        simulate_cleanup,
        report("temp cleanup (dry run)", &remaining),
    ));

    let scheduler = LoopScheduler::new();
    runner.pump(&scheduler);

    let done = scheduler.run_until(Instant::now() + RUN_DEADLINE, || remaining.load(Ordering::SeqCst) == 0);
    if !done {
        warn!("gave up waiting for {} task(s)", remaining.load(Ordering::SeqCst));
    }

    scheduler.shutdown();
    runner.stop(runner.options().stop_timeout);
    Ok(())
}

fn report(name: &'static str, remaining: &Arc<AtomicUsize>) -> impl FnOnce(Outcome<String>) + Send + use<> {
    let remaining = Arc::clone(remaining);
    move |outcome| {
        match &outcome {
            Outcome::Completed(summary) => println!("[ok]        {}: {}", name, summary),
            Outcome::Cancelled(_) => println!("[cancelled] {}", name),
            Outcome::Failed(_) => println!("[error]     {}: {}", name, outcome.error().unwrap_or_default()),
        }
        remaining.fetch_sub(1, Ordering::SeqCst);
    }
}

fn scan_temp_dir() -> Result<String, TaskError> {
    let dir = std::env::temp_dir();
    let mut files = 0usize;
    let mut bytes = 0u64;
    for entry in fs::read_dir(&dir)? {
        let meta = match entry.and_then(|e| e.metadata()) {
            Ok(m) => m,
            Err(_) => continue,
        };
        if meta.is_file() {
            files += 1;
            bytes += meta.len();
        }
    }
    Ok(format!("{} file(s), {:.1} MiB in {}", files, bytes as f64 / (1024.0 * 1024.0), dir.display()))
}

fn startup_dir() -> Result<PathBuf, TaskError> {
    let appdata = std::env::var("APPDATA")?;
    Ok(Path::new(&appdata).join(r"Microsoft\Windows\Start Menu\Programs\Startup"))
}

fn list_startup_programs() -> Result<String, TaskError> {
    let dir = startup_dir()?;
    let mut names: Vec<String> = fs::read_dir(&dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    if names.is_empty() {
        Ok("no startup programs".to_string())
    } else {
        Ok(names.join(", "))
    }
}

/// Walks the temp directory without deleting anything, checking the stop
/// signal between entries.
fn simulate_cleanup(signal: &StopSignal) -> Result<String, TaskError> {
    let mut candidates = 0usize;
    for entry in fs::read_dir(std::env::temp_dir())? {
        signal.check()?;
        if let Ok(entry) = entry {
            if entry.file_name().to_string_lossy().ends_with(".tmp") {
                candidates += 1;
            }
        }
        thread::sleep(Duration::from_millis(1));
    }
    Ok(format!("{} *.tmp file(s) would be removed", candidates))
}
