use std::error::Error;
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use nalgebra::Matrix4;
use serde::Serialize;

use rigview_core::{pick, RotationState};
use rigview_project::{Project, ZoneLayout};

/// Inspection tools for face-capture review directories.
#[derive(Debug, Parser)]
#[command(name = "rigview", version, about = "Inspect and validate face-capture directories")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Log warnings and errors only.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print a one-screen summary of a capture directory.
    Info {
        /// Capture root containing cam.xml.
        root: PathBuf,
    },
    /// Check a capture directory for problems a review session would hit.
    Validate {
        /// Capture root containing cam.xml.
        root: PathBuf,
        /// Emit the report as JSON on stdout.
        #[arg(long)]
        json: bool,
    },
}

/// What `validate` found. Serialized as-is for `--json`.
#[derive(Debug, Serialize)]
struct ValidationReport {
    root: PathBuf,
    cameras: usize,
    zone_layout: ZoneLayout,
    photos_found: usize,
    landmarks_loaded: usize,
    warnings: Vec<String>,
    errors: Vec<String>,
}

fn log_level(args: &Args) -> LevelFilter {
    if args.quiet {
        LevelFilter::Warn
    } else {
        match args.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

fn layout_name(layout: ZoneLayout) -> &'static str {
    match layout {
        ZoneLayout::Single => "single",
        ZoneLayout::FaceAndEars => "face_and_ears",
    }
}

fn print_info(project: &Project) {
    let photos = project.photos.iter().filter(|p| p.path.is_some()).count();
    let annotated = project.landmarks.iter().filter(|s| s.is_loaded()).count();

    let mut none = 0;
    let mut cw = 0;
    let mut ccw = 0;
    for rot in &project.rotations {
        match rot {
            RotationState::None => none += 1,
            RotationState::Clockwise => cw += 1,
            RotationState::CounterClockwise => ccw += 1,
        }
    }

    println!("capture   : {}", project.root.display());
    println!("cameras   : {}", project.camera_count());
    println!("layout    : {}", layout_name(project.zone_layout));
    println!("mesh      : {}", project.mesh_path.display());
    println!("photos    : {photos}/{} on disk", project.camera_count());
    println!("landmarks : {annotated}/{} annotated", project.camera_count());
    println!("rotations : {none} none, {cw} cw, {ccw} ccw");
}

fn validate(project: &Project) -> ValidationReport {
    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    if project.camera_count() > pick::MAX_CAMERA_ID + 1 {
        warnings.push(format!(
            "rig has {} cameras; hover picking addresses at most {}",
            project.camera_count(),
            pick::MAX_CAMERA_ID + 1
        ));
    }

    for (index, cam) in project.projections.iter().enumerate() {
        let drift = (cam.view * cam.inv_view - Matrix4::identity()).abs().max();
        if drift > 1e-3 {
            errors.push(format!(
                "camera {index}: view inverse drifts by {drift:.2e}"
            ));
        }

        let photo = &project.photos[index];
        if photo.path.is_none() {
            warnings.push(format!("camera {index}: no photo on disk"));
        } else {
            let s = &cam.intrinsics;
            if (photo.width, photo.height) != (s.width, s.height) {
                warnings.push(format!(
                    "camera {index}: photo is {}x{} but the sensor is {}x{}",
                    photo.width, photo.height, s.width, s.height
                ));
            }
        }

        let set = &project.landmarks[index];
        if set.is_loaded() {
            let (w, h) = project.photo_dims(index);
            let outside = set
                .coords()
                .iter()
                .filter(|p| p.x < 0.0 || p.y < 0.0 || p.x > w as f32 || p.y > h as f32)
                .count();
            if outside > 0 {
                errors.push(format!(
                    "camera {index}: {outside} landmarks outside the photo"
                ));
            }
        } else {
            warnings.push(format!("camera {index}: landmarks not annotated"));
        }
    }

    ValidationReport {
        root: project.root.clone(),
        cameras: project.camera_count(),
        zone_layout: project.zone_layout,
        photos_found: project.photos.iter().filter(|p| p.path.is_some()).count(),
        landmarks_loaded: project.landmarks.iter().filter(|s| s.is_loaded()).count(),
        warnings,
        errors,
    }
}

fn print_report(report: &ValidationReport) {
    println!(
        "{}: {} cameras, {} photos on disk, {} annotated",
        report.root.display(),
        report.cameras,
        report.photos_found,
        report.landmarks_loaded
    );
    for warning in &report.warnings {
        println!("warning: {warning}");
    }
    for error in &report.errors {
        println!("error: {error}");
    }
    if report.warnings.is_empty() && report.errors.is_empty() {
        println!("ok");
    }
}

fn run(args: &Args) -> Result<i32, Box<dyn Error>> {
    match &args.command {
        Command::Info { root } => {
            let project = Project::load(root)?;
            print_info(&project);
            Ok(0)
        }
        Command::Validate { root, json } => {
            let project = Project::load(root)?;
            let report = validate(&project);
            if *json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            Ok(if report.errors.is_empty() { 0 } else { 2 })
        }
    }
}

fn main() {
    let args = Args::parse();
    let _ = rigview_core::init_with_level(log_level(&args));

    match run(&args) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}
