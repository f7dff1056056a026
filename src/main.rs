use std::time::Duration;

use barcode_studio::camera::ImageSequenceSource;
use barcode_studio::cli::{
    self, Args, Command, InteractiveArgs, Interrupt, LiveScanner, ScanArgs,
};
use barcode_studio::config::Config;
use barcode_studio::error::AppError;
use barcode_studio::permissions::{print_permission_error, AlwaysGranted};
use barcode_studio::render::RenderOptions;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Frame pacing when replaying still images as a camera feed.
const REPLAY_INTERVAL: Duration = Duration::from_millis(33);

fn init_logging() {
    // Also picks up `log` records from the library
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "barcode_studio=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn install_interrupt() -> Result<Interrupt, AppError> {
    Interrupt::install().map_err(|e| AppError::Io(std::io::Error::other(e)))
}

fn runtime() -> Result<tokio::runtime::Runtime, AppError> {
    Ok(tokio::runtime::Runtime::new()?)
}

/// Returns how many codes were found.
fn run_scan(config: &Config, args: ScanArgs) -> Result<usize, AppError> {
    let mut config = config.clone();
    if !args.formats.is_empty() {
        config.scan.formats = args.formats.clone();
    }
    let mut interrupt = install_interrupt()?;

    if !args.camera {
        let scans = cli::scan_files(&config, &args.files, || interrupt.is_set());
        return Ok(cli::print_file_scans(&scans));
    }

    let timeout = args.timeout.map(Duration::from_secs);
    scan_camera(config, &args, &mut interrupt, timeout)
}

#[cfg(feature = "camera")]
fn scan_camera(
    config: Config,
    args: &ScanArgs,
    interrupt: &mut Interrupt,
    timeout: Option<Duration>,
) -> Result<usize, AppError> {
    use barcode_studio::camera::NativeCameraSource;
    use barcode_studio::permissions::CameraProbe;

    runtime()?.block_on(async {
        let mut scanner =
            LiveScanner::new(CameraProbe, NativeCameraSource::new, config, args.continuous)
                .with_device(args.device);
        cli::run_camera_scan(&mut scanner, interrupt, timeout).await
    })
}

#[cfg(not(feature = "camera"))]
fn scan_camera(
    _config: Config,
    _args: &ScanArgs,
    _interrupt: &mut Interrupt,
    _timeout: Option<Duration>,
) -> Result<usize, AppError> {
    Err(cli::camera_unavailable())
}

fn run_interactive(config: &Config, args: InteractiveArgs) -> Result<(), AppError> {
    let mut interrupt = install_interrupt()?;
    let opts = RenderOptions {
        invert: args.invert,
        ..RenderOptions::default()
    };
    let config = config.clone();

    runtime()?.block_on(async {
        if !args.replay.is_empty() {
            let paths = args.replay.clone();
            let replay = move || {
                ImageSequenceSource::from_paths(paths.clone())
                    .looping(true)
                    .interval(REPLAY_INTERVAL)
            };
            let mut scanner = LiveScanner::new(AlwaysGranted, replay, config, true);
            return cli::run_interactive(&mut scanner, &mut interrupt, opts).await;
        }

        interactive_camera(config, args.device, &mut interrupt, opts).await
    })
}

#[cfg(feature = "camera")]
async fn interactive_camera(
    config: Config,
    device: Option<u32>,
    interrupt: &mut Interrupt,
    opts: RenderOptions,
) -> Result<(), AppError> {
    use barcode_studio::camera::NativeCameraSource;
    use barcode_studio::permissions::CameraProbe;

    let mut scanner =
        LiveScanner::new(CameraProbe, NativeCameraSource::new, config, true).with_device(device);
    cli::run_interactive(&mut scanner, interrupt, opts).await
}

#[cfg(not(feature = "camera"))]
async fn interactive_camera(
    config: Config,
    _device: Option<u32>,
    interrupt: &mut Interrupt,
    opts: RenderOptions,
) -> Result<(), AppError> {
    use barcode_studio::camera::UnavailableSource;

    let unavailable =
        || UnavailableSource::new("this build has no camera support (try --replay <FILES>)");
    let mut scanner = LiveScanner::new(AlwaysGranted, unavailable, config, true);
    cli::run_interactive(&mut scanner, interrupt, opts).await
}

fn report(err: &AppError) {
    match err {
        AppError::PermissionDenied(denied) => print_permission_error(denied),
        AppError::EncodeFailed { guidance, .. } => {
            eprintln!("Error: {}", err);
            if let Some(guidance) = guidance {
                eprintln!("{}", guidance);
            }
        }
        AppError::CameraInitFailed(_) => {
            eprintln!("Error: {}", err);
            eprintln!("Check the camera connection and try again.");
        }
        _ => eprintln!("Error: {}", err),
    }
}

fn main() {
    init_logging();

    let args = Args::parse();

    let config = match Config::load(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match args.command {
        Command::Generate(generate) => cli::generate(&config, &generate).map(|_| ()),
        Command::Scan(scan) => match run_scan(&config, scan) {
            Ok(0) => {
                eprintln!("No barcode found.");
                std::process::exit(1);
            }
            Ok(_) => Ok(()),
            Err(e) => Err(e),
        },
        Command::Formats => {
            cli::list_formats();
            Ok(())
        }
        Command::ListCameras => cli::list_cameras(),
        Command::Interactive(interactive) => run_interactive(&config, interactive),
        Command::Config { action } => {
            cli::handle_config_action(action, &config, args.config.as_deref())
        }
    };

    if let Err(e) = result {
        report(&e);
        std::process::exit(1);
    }
}
