use std::process::ExitCode;
use std::time::Duration;

use shape_mesher::kernel::analytic::AnalyticKernel;
use shape_mesher::worker::{Admission, Dispatcher, WorkerThread};
use shape_mesher::MesherSettings;
use shared::{WorkerRequest, WorkerResponse};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shape_mesher=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let Some(path) = args.requests else {
        eprintln!("usage: shape-mesher --requests <path> [--resolution <f64>]");
        return ExitCode::from(2);
    };

    let requests = match load_requests(&path) {
        Ok(requests) => requests,
        Err(e) => {
            tracing::error!("Failed to load requests from {path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut settings = MesherSettings::load();
    if let Some(resolution) = args.resolution {
        settings = settings.with_resolution(resolution);
    }

    let worker = match WorkerThread::spawn(AnalyticKernel::new, settings) {
        Ok(worker) => worker,
        Err(e) => {
            tracing::error!("Failed to start kernel worker: {e}");
            return ExitCode::FAILURE;
        }
    };
    let mut dispatcher = Dispatcher::new(worker);
    print_responses(&dispatcher.wait(REQUEST_TIMEOUT));

    let mut failures = 0;
    for request in requests {
        let name = request.name().to_string();
        if dispatcher.execute(request) != Admission::Accepted {
            tracing::error!("Worker rejected '{name}'");
            failures += 1;
            continue;
        }
        let responses = dispatcher.wait(REQUEST_TIMEOUT);
        if dispatcher.is_busy() {
            tracing::error!("Timed out waiting for '{name}'");
            return ExitCode::FAILURE;
        }
        failures += responses.iter().filter(|r| matches!(r, WorkerResponse::Error(_))).count();
        print_responses(&responses);
    }

    if failures > 0 {
        tracing::warn!("{failures} request(s) failed");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[derive(Default)]
struct Args {
    requests: Option<String>,
    resolution: Option<f64>,
}

impl Args {
    fn parse() -> Self {
        let mut parsed = Self::default();
        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--requests" => parsed.requests = args.next(),
                "--resolution" => match args.next().map(|v| v.parse::<f64>()) {
                    Some(Ok(r)) if r > 0.0 => parsed.resolution = Some(r),
                    _ => tracing::warn!("Ignoring invalid --resolution"),
                },
                other => tracing::warn!("Ignoring unknown argument {other}"),
            }
        }
        parsed
    }
}

fn load_requests(path: &str) -> Result<Vec<WorkerRequest>, Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(path)?;
    let requests: Vec<WorkerRequest> = serde_json::from_str(&json)?;
    tracing::info!("Loaded {} requests from {path}", requests.len());
    Ok(requests)
}

/// One JSON message per line on stdout
fn print_responses(responses: &[WorkerResponse]) {
    for response in responses {
        match serde_json::to_string(response) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::error!("Failed to serialize response: {e}"),
        }
    }
}
