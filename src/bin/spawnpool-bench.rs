use clap::Parser;
use crossbeam_utils::sync::WaitGroup;
use log::{LevelFilter, info, warn};
use spawnpool::{ElasticThreadPool, PoolConfig, Result, ThreadPool, payload_message};
use std::path::PathBuf;
use std::process::exit;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[clap(
    name = "spawnpool-bench",
    version,
    about = "Schedules synthetic tasks on an elastic pool and reports the outcome"
)]
struct Opt {
    #[clap(long, value_name = "FILE", help = "Reads pool settings from a TOML file")]
    config: Option<PathBuf>,

    #[clap(long, default_value_t = 1000, help = "Number of tasks to schedule")]
    tasks: usize,

    #[clap(long, default_value_t = 1, help = "How long each task sleeps, in milliseconds")]
    task_ms: u64,

    #[clap(long, default_value_t = 0, help = "Makes every Nth task panic, 0 for none")]
    panic_every: usize,

    #[clap(long, help = "Queued tasks per worker")]
    batch_size: Option<usize>,

    #[clap(long, help = "Workers kept alive while idle")]
    standby: Option<usize>,

    #[clap(long, help = "Worker ceiling, 0 for none")]
    max_workers: Option<usize>,

    #[clap(long, help = "Task queue capacity")]
    capacity: Option<usize>,

    #[clap(
        long,
        default_value_t = 1000,
        help = "How long a submission may wait for queue space, in milliseconds"
    )]
    submit_timeout_ms: u64,
}

fn main() {
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let opt = Opt::parse();
    if let Err(e) = run(opt) {
        eprintln!("{}", e);
        exit(1);
    }
}

fn run(opt: Opt) -> Result<()> {
    let mut config = match &opt.config {
        Some(path) => PoolConfig::load(path)?,
        None => PoolConfig::default(),
    };
    if let Some(batch_size) = opt.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(standby) = opt.standby {
        config.standby_workers = standby;
    }
    if let Some(max_workers) = opt.max_workers {
        config.max_workers = max_workers;
    }
    if let Some(capacity) = opt.capacity {
        config.queue_capacity = capacity;
    }
    // workers leave as soon as the queue is drained after close
    config.close_queue_on_close = true;
    info!("pool config: {:?}", config);

    let pool = ElasticThreadPool::from_config(config)?;
    pool.set_panic_handler(|payload| {
        warn!("task failed: {}", payload_message(payload.as_ref()));
    });

    let started = Instant::now();
    let timeout = Duration::from_millis(opt.submit_timeout_ms);
    let task_time = Duration::from_millis(opt.task_ms);
    let wg = WaitGroup::new();
    let mut rejected = 0;

    for i in 0..opt.tasks {
        let wg = wg.clone();
        let fail = opt.panic_every > 0 && (i + 1) % opt.panic_every == 0;
        let job = move || {
            let _wg = wg;
            if !task_time.is_zero() {
                thread::sleep(task_time);
            }
            if fail {
                panic!("synthetic failure in task {}", i);
            }
        };
        if let Err(e) = pool.schedule_with_timeout(job, timeout) {
            warn!("task {} rejected: {}", i, e);
            rejected += 1;
        }
    }
    let peak = pool.worker_count();
    wg.wait();

    pool.close();
    while pool.worker_count() > 0 {
        thread::sleep(Duration::from_millis(5));
    }

    println!(
        "scheduled={} completed={} panicked={} rejected={} workers_after_submit={} elapsed_ms={}",
        opt.tasks - rejected,
        pool.completed_tasks(),
        pool.panicked_tasks(),
        rejected,
        peak,
        started.elapsed().as_millis()
    );
    Ok(())
}
