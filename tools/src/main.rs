use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use engine_core::logging::{self, LogLevel};
use physics_rapier::{PhysicsWorld, SurfaceTag};
use player_controller::body::{CharacterBody, RapierCharacter};
use player_controller::config::LocomotionConfig;
use player_controller::input::{DirectInputAdapter, RawInput};
use player_controller::signals::{AnimTrigger, RecordingSink};
use player_controller::{LocomotionController, LocomotionState};
use rapier3d::prelude::*;
use test_map::TestMap;

const EXIT_SUCCESS: i32 = 0;
const EXIT_USAGE: i32 = 2;
const EXIT_INVALID: i32 = 10;

const CAPSULE_HALF_HEIGHT: Real = 0.5;
const CAPSULE_RADIUS: Real = 0.3;

#[derive(Parser)]
#[command(name = "tools", version, about = "Locomotion tools CLI")]
struct Cli {
    #[arg(long, value_enum, default_value_t = LogLevelArg::Info)]
    log_level: LogLevelArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the controller headless against a scene.
    Simulate(SimulateArgs),
    CheckConfig {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    CheckMap {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
}

#[derive(Parser)]
struct SimulateArgs {
    #[arg(long, value_name = "PATH")]
    map: PathBuf,

    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 120)]
    ticks: u32,

    #[arg(long, default_value_t = 60.0)]
    hz: f32,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    move_x: f32,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    move_y: f32,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    look_x: f32,

    #[arg(long)]
    run: bool,

    /// Ticks on which the jump button is pressed.
    #[arg(long, value_delimiter = ',')]
    jump_at: Vec<u32>,

    /// Ticks on which the roll button is pressed.
    #[arg(long, value_delimiter = ',')]
    roll_at: Vec<u32>,
}

#[derive(ValueEnum, Clone, Copy)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
}

impl From<LogLevelArg> for LogLevel {
    fn from(value: LogLevelArg) -> Self {
        match value {
            LogLevelArg::Error => LogLevel::Error,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Debug => LogLevel::Debug,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    logging::set_max_level(cli.log_level.into());
    let exit_code = match cli.command {
        Commands::Simulate(args) => run_simulate(args),
        Commands::CheckConfig { path } => run_check_config(&path),
        Commands::CheckMap { path } => run_check_map(&path),
    };
    std::process::exit(exit_code);
}

fn run_check_config(path: &Path) -> i32 {
    let config = match LocomotionConfig::load(path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            return EXIT_INVALID;
        }
    };
    let validation = config.validate();
    report(&validation.errors, &validation.warnings);
    if !validation.is_ok() {
        return EXIT_INVALID;
    }
    println!(
        "config ok: walk {} run {} roll {}s (cooldown {}s)",
        config.movement.walk_speed,
        config.movement.run_speed,
        config.roll.duration,
        config.effective_roll_cooldown()
    );
    EXIT_SUCCESS
}

fn run_check_map(path: &Path) -> i32 {
    let map = match TestMap::load(path) {
        Ok(map) => map,
        Err(err) => {
            eprintln!("{}", err);
            return EXIT_INVALID;
        }
    };
    let validation = map.validate();
    report(&validation.errors, &validation.warnings);
    if !validation.is_ok() {
        return EXIT_INVALID;
    }
    println!(
        "map ok: {} ({} solids, {} ladders)",
        map.name,
        map.solids.len(),
        map.solids_tagged("ladder").count()
    );
    EXIT_SUCCESS
}

fn report(errors: &[String], warnings: &[String]) {
    for warning in warnings {
        println!("warning: {}", warning);
    }
    for error in errors {
        println!("error: {}", error);
    }
}

fn run_simulate(args: SimulateArgs) -> i32 {
    if !args.hz.is_finite() || args.hz <= 0.0 {
        eprintln!("--hz must be > 0");
        return EXIT_USAGE;
    }
    let map = match TestMap::load(&args.map) {
        Ok(map) => map,
        Err(err) => {
            eprintln!("{}", err);
            return EXIT_INVALID;
        }
    };
    let map_validation = map.validate();
    if !map_validation.is_ok() {
        report(&map_validation.errors, &map_validation.warnings);
        return EXIT_INVALID;
    }
    let config = match &args.config {
        Some(path) => match LocomotionConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("{}", err);
                return EXIT_INVALID;
            }
        },
        None => LocomotionConfig::default(),
    };

    let (mut world, handle) = build_world(&map);
    let mut controller = match LocomotionController::from_config(
        config,
        DirectInputAdapter::default(),
        RecordingSink::default(),
    ) {
        Ok(controller) => controller,
        Err(err) => {
            eprintln!("{}", err);
            return EXIT_INVALID;
        }
    };
    controller
        .camera_mut()
        .set_look(map.spawn.yaw_deg.to_radians(), 0.0);

    let dt = 1.0 / args.hz;
    let mut character = match RapierCharacter::attach(&mut world, handle) {
        Ok(character) => character,
        Err(err) => {
            eprintln!("{}", err);
            return EXIT_INVALID;
        }
    };
    let mut states: BTreeMap<&'static str, u32> = BTreeMap::new();
    let mut rolling_ticks = 0u32;
    for tick in 0..args.ticks {
        let raw = RawInput {
            move_x: args.move_x,
            move_y: args.move_y,
            look_delta: [args.look_x, 0.0],
            jump: args.jump_at.contains(&tick),
            run: args.run,
            roll: args.roll_at.contains(&tick),
        };
        let frame = controller.tick(&mut character, raw, dt);
        character.step(dt);
        *states.entry(state_name(frame.locomotion)).or_insert(0) += 1;
        if frame.state.rolling {
            rolling_ticks += 1;
        }
    }

    let position = character.position();
    println!("simulate {} ({} ticks @ {} Hz)", map.name, args.ticks, args.hz);
    println!(
        "final position: [{:.3}, {:.3}, {:.3}] heading {:.3}",
        position.x,
        position.y,
        position.z,
        controller.state().heading
    );
    for (name, count) in &states {
        println!("{:>10} {}", name, count);
    }
    println!("{:>10} {}", "rolling", rolling_ticks);
    let sink = controller.sink();
    for trigger in [
        AnimTrigger::Jump,
        AnimTrigger::EndJump,
        AnimTrigger::Roll,
        AnimTrigger::EndRoll,
    ] {
        println!("trigger {:<9} {}", trigger.name(), sink.fired(trigger));
    }
    EXIT_SUCCESS
}

fn build_world(map: &TestMap) -> (PhysicsWorld, RigidBodyHandle) {
    let mut world = PhysicsWorld::new(vector![0.0, -9.81, 0.0]);
    for solid in &map.solids {
        let [hx, hy, hz] = solid.half_extents();
        let [x, y, z] = solid.pos;
        let collider = ColliderBuilder::cuboid(hx, hy, hz)
            .position(Isometry::new(vector![x, y, z], vector![0.0, -solid.yaw_rad(), 0.0]))
            .build();
        let tags: Vec<SurfaceTag> = solid
            .tags
            .iter()
            .filter_map(|tag| SurfaceTag::parse(tag))
            .collect();
        world.insert_surface(collider, &tags);
    }
    let [x, y, z] = map.spawn.pos;
    let handle = world.insert_character(
        vector![x, y, z],
        ColliderBuilder::capsule_y(CAPSULE_HALF_HEIGHT, CAPSULE_RADIUS).build(),
    );
    world.refresh_queries();
    (world, handle)
}

fn state_name(state: LocomotionState) -> &'static str {
    match state {
        LocomotionState::Idle => "idle",
        LocomotionState::Walk => "walk",
        LocomotionState::Run => "run",
        LocomotionState::ClimbUp => "climb_up",
        LocomotionState::ClimbDown => "climb_down",
        LocomotionState::ClimbHold => "climb_hold",
        LocomotionState::Airborne => "airborne",
    }
}
