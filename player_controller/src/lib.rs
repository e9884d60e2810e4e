//! Third-person locomotion state machine (input + camera + probes + motor).
//!
//! One `tick` per simulation step. Phases run in a fixed order and thread a
//! single [`CharacterState`] value through:
//! timers, input, camera, ladder latch, velocity, heading, ground, jump, roll,
//! and finally the animation signals.
#![forbid(unsafe_code)]

pub mod body;
pub mod config;
pub mod input;
pub mod signals;
pub mod timers;

use std::fmt;

use character_motor_tps::{
    heading_of, turn_toward, ClimbDirection, TpsMotor, TpsMotorInput, TpsMotorState,
};
use character_probe::{ProbeProfile, SpatialQuery};
use engine_core::{logging, observability};
use player_camera::{CameraPose, OrbitCamera};
use rapier3d::math::Vector;
use rapier3d::prelude::Real;

use crate::body::CharacterBody;
use crate::config::LocomotionConfig;
use crate::input::{InputAdapter, InputIntent, RawInput};
use crate::signals::{AnimFlag, AnimParam, AnimTrigger, AnimationSink};
use crate::timers::{TimerAction, TimerManager};

pub(crate) const LOG_TARGET: &str = "player_controller";

#[derive(Debug)]
pub enum ControllerError {
    InvalidConfig(Vec<String>),
    MissingBody,
    BodyNotDynamic,
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::InvalidConfig(errors) => {
                write!(f, "invalid locomotion config: {}", errors.join("; "))
            }
            ControllerError::MissingBody => write!(f, "character body not found in physics world"),
            ControllerError::BodyNotDynamic => write!(f, "character body is not dynamic"),
        }
    }
}

impl std::error::Error for ControllerError {}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LadderAttachment {
    #[default]
    Detached,
    Attached(ClimbDirection),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CharacterState {
    pub move_input: [Real; 2],
    pub forward_dir: Vector<Real>,
    pub right_dir: Vector<Real>,
    pub grounded: bool,
    pub ladder: LadderAttachment,
    /// Direction the ladder probe casts along; frozen while attached.
    pub ladder_check_direction: Vector<Real>,
    pub rolling: bool,
    pub roll_ready: bool,
    pub heading: Real,
}

impl CharacterState {
    fn new(forward_dir: Vector<Real>, right_dir: Vector<Real>) -> Self {
        Self {
            move_input: [0.0, 0.0],
            forward_dir,
            right_dir,
            grounded: false,
            ladder: LadderAttachment::Detached,
            ladder_check_direction: forward_dir,
            rolling: false,
            roll_ready: true,
            heading: 0.0,
        }
    }

    pub fn stick_to_ladder(&self) -> bool {
        matches!(self.ladder, LadderAttachment::Attached(_))
    }

    pub fn climb(&self) -> Option<ClimbDirection> {
        match self.ladder {
            LadderAttachment::Attached(direction) => Some(direction),
            LadderAttachment::Detached => None,
        }
    }

    pub fn climbing_up(&self) -> bool {
        self.climb() == Some(ClimbDirection::Up)
    }

    pub fn climbing_down(&self) -> bool {
        self.climb() == Some(ClimbDirection::Down)
    }

    pub fn is_moving(&self) -> bool {
        self.move_input != [0.0, 0.0]
    }
}

/// Animation-facing locomotion state, derived each tick. Rolling overlays any of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocomotionState {
    Idle,
    Walk,
    Run,
    ClimbUp,
    ClimbDown,
    ClimbHold,
    Airborne,
}

#[derive(Clone, Copy, Debug)]
pub struct LocomotionFrame {
    pub state: CharacterState,
    pub velocity: Vector<Real>,
    pub camera: CameraPose,
    pub locomotion: LocomotionState,
}

pub struct LocomotionController<A: InputAdapter, S: AnimationSink> {
    config: LocomotionConfig,
    input: A,
    sink: S,
    camera: OrbitCamera,
    motor: TpsMotor,
    probe: ProbeProfile,
    timers: TimerManager,
    state: CharacterState,
    locomotion: LocomotionState,
    jump_impulse: Real,
    roll_duration: Real,
    roll_cooldown: Real,
}

impl<A: InputAdapter, S: AnimationSink> LocomotionController<A, S> {
    /// Builds a controller around an injected camera rig. An invalid config is
    /// a fatal configuration error, reported once here.
    pub fn new(
        config: LocomotionConfig,
        camera: OrbitCamera,
        input: A,
        sink: S,
    ) -> Result<Self, ControllerError> {
        let validation = config.validate();
        if !validation.is_ok() {
            let err = ControllerError::InvalidConfig(validation.errors);
            observability::set_sticky_error(LOG_TARGET, err.to_string());
            return Err(err);
        }
        for warning in &validation.warnings {
            logging::warn(LOG_TARGET, warning);
        }
        let (forward_dir, right_dir) = camera.planar_basis();
        logging::info(
            LOG_TARGET,
            format!(
                "locomotion controller ready (walk {}, run {}, roll {}s/{}s)",
                config.movement.walk_speed,
                config.movement.run_speed,
                config.roll.duration,
                config.effective_roll_cooldown()
            ),
        );
        Ok(Self {
            motor: TpsMotor::new(config.motor_config()),
            probe: config.probe_profile(),
            timers: TimerManager::default(),
            state: CharacterState::new(forward_dir, right_dir),
            locomotion: LocomotionState::Airborne,
            jump_impulse: config.jump.impulse,
            roll_duration: config.roll.duration,
            roll_cooldown: config.effective_roll_cooldown(),
            config,
            input,
            sink,
            camera,
        })
    }

    /// Builds the camera rig from the config's camera section.
    pub fn from_config(config: LocomotionConfig, input: A, sink: S) -> Result<Self, ControllerError> {
        let camera = OrbitCamera::new(config.camera_config());
        Self::new(config, camera, input, sink)
    }

    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    pub fn state(&self) -> &CharacterState {
        &self.state
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn timers(&self) -> &TimerManager {
        &self.timers
    }

    /// State reported by the most recent tick.
    pub fn locomotion(&self) -> LocomotionState {
        self.locomotion
    }

    pub fn tick<P>(&mut self, physics: &mut P, raw: RawInput, dt: Real) -> LocomotionFrame
    where
        P: SpatialQuery + CharacterBody + ?Sized,
    {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let mut state = self.run_timers(self.state, dt);

        let intent = self.input.intent(raw);
        let position = physics.position();
        let body_velocity = physics.velocity();

        self.camera.apply_orbit_delta(intent.look_delta, dt);
        let camera = self.camera.update_from_target(position, &*physics);

        state = self.ladder_phase(state, &intent, &*physics, position);
        let (forward_dir, right_dir) = self.camera.planar_basis();
        state.forward_dir = forward_dir;
        state.right_dir = right_dir;

        let velocity = self.compose_velocity(&state, &intent, body_velocity);
        physics.set_velocity(velocity);
        state.heading = self.orient(&state, velocity, dt);
        physics.set_heading(state.heading);

        state = self.ground_phase(state, &*physics, position, body_velocity);
        state = self.jump_phase(state, &intent, physics);
        state = self.roll_phase(state, &intent);

        let running = self.motor.is_running(intent.run_held);
        self.publish_signals(&state, running);
        self.state = state;
        self.locomotion = derive_locomotion(&state, running);
        LocomotionFrame {
            state,
            velocity,
            camera,
            locomotion: self.locomotion,
        }
    }

    fn run_timers(&mut self, mut state: CharacterState, dt: Real) -> CharacterState {
        for action in self.timers.advance(dt) {
            match action {
                TimerAction::EndRoll => {
                    state.rolling = false;
                    self.sink.fire(AnimTrigger::EndRoll);
                    logging::debug(LOG_TARGET, "roll ended");
                }
                TimerAction::RollReady => {
                    state.roll_ready = true;
                }
            }
        }
        state
    }

    fn ladder_phase<Q: SpatialQuery + ?Sized>(
        &mut self,
        mut state: CharacterState,
        intent: &InputIntent,
        query: &Q,
        position: Vector<Real>,
    ) -> CharacterState {
        state.move_input = intent.move_axis;
        let was_attached = state.stick_to_ladder();
        if !was_attached {
            state.ladder_check_direction = state.forward_dir;
        }
        let attached = self
            .probe
            .ladder(query, position, state.heading, state.ladder_check_direction);
        state.ladder = if attached {
            LadderAttachment::Attached(ClimbDirection::from_axis(intent.move_axis[1]))
        } else {
            LadderAttachment::Detached
        };
        if was_attached && !attached {
            // Losing the ladder drops the character back into the airborne animation.
            self.sink.reset(AnimTrigger::EndJump);
            self.sink.fire(AnimTrigger::Jump);
            logging::debug(LOG_TARGET, "released ladder");
        } else if !was_attached && attached {
            logging::debug(LOG_TARGET, "attached to ladder");
        }
        state
    }

    fn compose_velocity(
        &self,
        state: &CharacterState,
        intent: &InputIntent,
        body_velocity: Vector<Real>,
    ) -> Vector<Real> {
        self.motor
            .step(
                TpsMotorInput {
                    move_axis: state.move_input,
                    run: intent.run_held,
                    forward: state.forward_dir,
                    right: state.right_dir,
                    climb: state.climb(),
                },
                TpsMotorState {
                    velocity: body_velocity,
                },
            )
            .next_velocity
    }

    fn orient(&self, state: &CharacterState, velocity: Vector<Real>, dt: Real) -> Real {
        if !state.is_moving() {
            return state.heading;
        }
        let target_dir = if state.stick_to_ladder() {
            state.ladder_check_direction
        } else {
            velocity
        };
        match heading_of(target_dir) {
            Some(target) => turn_toward(
                state.heading,
                target,
                self.motor.config().rotate_speed,
                dt,
            ),
            None => state.heading,
        }
    }

    fn ground_phase<Q: SpatialQuery + ?Sized>(
        &mut self,
        mut state: CharacterState,
        query: &Q,
        position: Vector<Real>,
        body_velocity: Vector<Real>,
    ) -> CharacterState {
        state.grounded = self.probe.ground(query, position, state.heading);
        // Falling while the feet box still overlaps ground counts as landing, even
        // when a short hop never left the box.
        if state.grounded && body_velocity.y < 0.0 {
            self.sink.reset(AnimTrigger::Jump);
            self.sink.fire(AnimTrigger::EndJump);
        }
        state
    }

    fn jump_phase<P: CharacterBody + ?Sized>(
        &mut self,
        state: CharacterState,
        intent: &InputIntent,
        body: &mut P,
    ) -> CharacterState {
        if intent.jump_pressed && state.grounded {
            body.apply_impulse(Vector::y() * self.jump_impulse);
            self.sink.reset(AnimTrigger::EndJump);
            self.sink.fire(AnimTrigger::Jump);
        }
        state
    }

    fn roll_phase(&mut self, mut state: CharacterState, intent: &InputIntent) -> CharacterState {
        if !intent.roll_pressed || !state.roll_ready {
            return state;
        }
        state.rolling = true;
        state.roll_ready = false;
        self.sink.fire(AnimTrigger::Roll);
        self.timers.schedule(self.roll_duration, TimerAction::EndRoll);
        self.timers.schedule(self.roll_cooldown, TimerAction::RollReady);
        logging::debug(LOG_TARGET, "roll started");
        state
    }

    fn publish_signals(&mut self, state: &CharacterState, running: bool) {
        let moving = state.is_moving();
        let attached = state.stick_to_ladder();
        self.sink
            .set_flag(AnimFlag::Walking, moving && !running && !attached);
        self.sink
            .set_flag(AnimFlag::Running, moving && running && !attached);
        self.sink.set_flag(AnimFlag::Idle, !moving && !attached);
        self.sink.set_flag(AnimFlag::Climbing, attached);
        let climb_speed = state.climb().map(ClimbDirection::signal).unwrap_or(0.0);
        self.sink.set_value(AnimParam::ClimbSpeed, climb_speed);
    }
}

fn derive_locomotion(state: &CharacterState, running: bool) -> LocomotionState {
    match state.climb() {
        Some(ClimbDirection::Up) => LocomotionState::ClimbUp,
        Some(ClimbDirection::Down) => LocomotionState::ClimbDown,
        Some(ClimbDirection::Hold) => LocomotionState::ClimbHold,
        None if !state.grounded => LocomotionState::Airborne,
        None if !state.is_moving() => LocomotionState::Idle,
        None if running => LocomotionState::Run,
        None => LocomotionState::Walk,
    }
}

impl<A: InputAdapter, S: AnimationSink> Drop for LocomotionController<A, S> {
    fn drop(&mut self) {
        self.timers.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::RapierCharacter;
    use crate::input::DirectInputAdapter;
    use crate::signals::{RecordingSink, TriggerEvent};
    use physics_rapier::{PhysicsWorld, SurfaceMask, SurfaceTag};
    use rapier3d::prelude::*;

    const DT: Real = 1.0 / 60.0;

    /// Serializes tests that assert on the process-wide sticky error.
    pub(crate) fn sticky_guard() -> std::sync::MutexGuard<'static, ()> {
        static STICKY_TESTS: std::sync::Mutex<()> = std::sync::Mutex::new(());
        match STICKY_TESTS.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Scripted stand-in for the physics collaborator.
    #[derive(Default)]
    struct ScriptedPhysics {
        ground: bool,
        ladder: bool,
        position: Vector<Real>,
        velocity: Vector<Real>,
        heading: Real,
        impulses: Vec<Vector<Real>>,
    }

    impl SpatialQuery for ScriptedPhysics {
        fn overlap_box(
            &self,
            _center: Vector<Real>,
            _half_extents: Vector<Real>,
            mask: SurfaceMask,
        ) -> bool {
            self.ground && mask.contains(SurfaceTag::Ground)
        }

        fn cast_ray(
            &self,
            _origin: Vector<Real>,
            _dir: Vector<Real>,
            _max_toi: Real,
            mask: SurfaceMask,
        ) -> Option<Real> {
            if self.ladder && mask.contains(SurfaceTag::Ladder) {
                Some(0.3)
            } else {
                None
            }
        }
    }

    impl CharacterBody for ScriptedPhysics {
        fn position(&self) -> Vector<Real> {
            self.position
        }

        fn velocity(&self) -> Vector<Real> {
            self.velocity
        }

        fn set_velocity(&mut self, velocity: Vector<Real>) {
            self.velocity = velocity;
        }

        fn apply_impulse(&mut self, impulse: Vector<Real>) {
            self.impulses.push(impulse);
        }

        fn set_heading(&mut self, heading: Real) {
            self.heading = heading;
        }
    }

    type TestController = LocomotionController<DirectInputAdapter, RecordingSink>;

    fn controller(config: LocomotionConfig) -> TestController {
        LocomotionController::from_config(
            config,
            DirectInputAdapter::default(),
            RecordingSink::default(),
        )
        .expect("valid config")
    }

    fn forward() -> RawInput {
        RawInput {
            move_y: 1.0,
            ..Default::default()
        }
    }

    fn planar_speed(v: Vector<Real>) -> Real {
        (v.x * v.x + v.z * v.z).sqrt()
    }

    #[test]
    fn grounded_forward_input_walks_at_walk_speed() {
        let mut controller = controller(LocomotionConfig::default());
        let mut physics = ScriptedPhysics {
            ground: true,
            velocity: vector![0.0, -0.25, 0.0],
            ..Default::default()
        };
        let frame = controller.tick(&mut physics, forward(), DT);
        assert!(controller.sink().flag(AnimFlag::Walking));
        assert!(!controller.sink().flag(AnimFlag::Running));
        assert!(!controller.sink().flag(AnimFlag::Idle));
        assert_eq!(frame.velocity.y, -0.25);
        assert!((planar_speed(frame.velocity) - 2.5).abs() < 1.0e-5);
        // Camera yaw 0 looks down -Z.
        assert!(frame.velocity.z < 0.0);
        assert_eq!(frame.locomotion, LocomotionState::Walk);
    }

    #[test]
    fn run_modifier_switches_speed_and_flags() {
        let mut controller = controller(LocomotionConfig::default());
        let mut physics = ScriptedPhysics {
            ground: true,
            ..Default::default()
        };
        let frame = controller.tick(
            &mut physics,
            RawInput {
                move_x: 1.0,
                move_y: 1.0,
                run: true,
                ..Default::default()
            },
            DT,
        );
        assert!(controller.sink().flag(AnimFlag::Running));
        assert!(!controller.sink().flag(AnimFlag::Walking));
        assert!((planar_speed(frame.velocity) - 5.0).abs() < 1.0e-5);
        assert_eq!(frame.locomotion, LocomotionState::Run);
        assert_eq!(controller.locomotion(), frame.locomotion);

        let frame = controller.tick(&mut physics, forward(), DT);
        assert_eq!(frame.locomotion, LocomotionState::Walk);
        assert_eq!(controller.locomotion(), LocomotionState::Walk);
    }

    #[test]
    fn ladder_climb_up_overrides_vertical_velocity() {
        let mut controller = controller(LocomotionConfig::default());
        let mut physics = ScriptedPhysics {
            ground: true,
            ladder: true,
            velocity: vector![0.0, -3.0, 0.0],
            ..Default::default()
        };
        let frame = controller.tick(&mut physics, forward(), DT);
        assert_eq!(frame.velocity, vector![0.0, 2.0, 0.0]);
        assert_eq!(controller.sink().value(AnimParam::ClimbSpeed), 1.0);
        assert!(controller.sink().flag(AnimFlag::Climbing));
        assert!(!controller.sink().flag(AnimFlag::Walking));
        assert!(frame.state.climbing_up());
        assert!(!frame.state.climbing_down());
        assert_eq!(frame.locomotion, LocomotionState::ClimbUp);

        let frame = controller.tick(
            &mut physics,
            RawInput {
                move_y: -1.0,
                ..Default::default()
            },
            DT,
        );
        assert_eq!(frame.velocity, vector![0.0, -3.0, 0.0]);
        assert_eq!(controller.sink().value(AnimParam::ClimbSpeed), -1.0);
        assert_eq!(frame.locomotion, LocomotionState::ClimbDown);
    }

    #[test]
    fn partial_vertical_input_holds_on_ladder() {
        let mut controller = controller(LocomotionConfig::default());
        let mut physics = ScriptedPhysics {
            ladder: true,
            velocity: vector![0.0, -3.0, 0.0],
            ..Default::default()
        };
        let frame = controller.tick(
            &mut physics,
            RawInput {
                move_y: 0.9,
                ..Default::default()
            },
            DT,
        );
        assert_eq!(frame.velocity.y, 0.0);
        assert_eq!(frame.locomotion, LocomotionState::ClimbHold);
        assert_eq!(controller.sink().value(AnimParam::ClimbSpeed), 0.0);
    }

    #[test]
    fn falling_off_ladder_fires_once() {
        let mut controller = controller(LocomotionConfig::default());
        let mut physics = ScriptedPhysics {
            ladder: true,
            ..Default::default()
        };
        for _ in 0..3 {
            controller.tick(&mut physics, forward(), DT);
        }
        assert_eq!(controller.sink().fired(AnimTrigger::Jump), 0);
        physics.ladder = false;
        for _ in 0..5 {
            controller.tick(&mut physics, forward(), DT);
        }
        assert_eq!(controller.sink().fired(AnimTrigger::Jump), 1);
        let events = controller.sink().events();
        assert_eq!(events[0], TriggerEvent::Reset(AnimTrigger::EndJump));
        assert_eq!(events[1], TriggerEvent::Fired(AnimTrigger::Jump));
        assert!(!controller.state().stick_to_ladder());
    }

    #[test]
    fn ladder_direction_stays_latched_while_attached() {
        let mut controller = controller(LocomotionConfig::default());
        let mut physics = ScriptedPhysics {
            ladder: true,
            ..Default::default()
        };
        controller.tick(&mut physics, forward(), DT);
        let latched = controller.state().ladder_check_direction;
        let turn = RawInput {
            move_y: 1.0,
            look_delta: [10.0, 0.0],
            ..Default::default()
        };
        for _ in 0..10 {
            controller.tick(&mut physics, turn, DT);
        }
        assert_eq!(controller.state().ladder_check_direction, latched);
        assert!((controller.state().forward_dir - latched).norm() > 0.1);

        physics.ladder = false;
        controller.tick(&mut physics, turn, DT);
        controller.tick(&mut physics, turn, DT);
        assert!((controller.state().ladder_check_direction - latched).norm() > 0.1);
    }

    #[test]
    fn jump_needs_ground_and_a_fresh_press() {
        let mut controller = controller(LocomotionConfig::default());
        let mut physics = ScriptedPhysics {
            ground: true,
            ..Default::default()
        };
        let held = RawInput {
            jump: true,
            ..Default::default()
        };
        for _ in 0..5 {
            controller.tick(&mut physics, held, DT);
        }
        assert_eq!(physics.impulses.len(), 1);
        assert_eq!(physics.impulses[0], vector![0.0, 5.0, 0.0]);
        controller.tick(&mut physics, RawInput::default(), DT);
        controller.tick(&mut physics, held, DT);
        assert_eq!(physics.impulses.len(), 2);

        physics.ground = false;
        controller.tick(&mut physics, RawInput::default(), DT);
        controller.tick(&mut physics, held, DT);
        assert_eq!(physics.impulses.len(), 2);
        assert_eq!(controller.sink().fired(AnimTrigger::Jump), 2);
        assert_eq!(controller.locomotion(), LocomotionState::Airborne);
    }

    #[test]
    fn end_jump_fires_only_while_grounded_and_falling() {
        let mut controller = controller(LocomotionConfig::default());
        let mut physics = ScriptedPhysics {
            velocity: vector![0.0, -4.0, 0.0],
            ..Default::default()
        };
        controller.tick(&mut physics, RawInput::default(), DT);
        assert_eq!(controller.sink().fired(AnimTrigger::EndJump), 0);
        physics.ground = true;
        controller.tick(&mut physics, RawInput::default(), DT);
        assert_eq!(controller.sink().fired(AnimTrigger::EndJump), 1);
        physics.velocity = vector![0.0, 0.0, 0.0];
        controller.tick(&mut physics, RawInput::default(), DT);
        assert_eq!(controller.sink().fired(AnimTrigger::EndJump), 1);
    }

    #[test]
    fn short_hop_inside_ground_box_still_lands() {
        let mut controller = controller(LocomotionConfig::default());
        let mut physics = ScriptedPhysics {
            ground: true,
            ..Default::default()
        };
        controller.tick(
            &mut physics,
            RawInput {
                jump: true,
                ..Default::default()
            },
            DT,
        );
        assert_eq!(physics.impulses.len(), 1);
        physics.velocity = vector![0.0, 1.0, 0.0];
        controller.tick(&mut physics, RawInput::default(), DT);
        assert_eq!(controller.sink().fired(AnimTrigger::EndJump), 0);
        physics.velocity = vector![0.0, -1.0, 0.0];
        controller.tick(&mut physics, RawInput::default(), DT);
        let sink = controller.sink();
        assert_eq!(sink.fired(AnimTrigger::Jump), 1);
        assert_eq!(sink.fired(AnimTrigger::EndJump), 1);
        assert_eq!(
            sink.events().last(),
            Some(&TriggerEvent::Fired(AnimTrigger::EndJump))
        );
    }

    #[test]
    fn roll_window_follows_duration_and_cooldown() {
        let dt = 0.05;
        let mut controller = controller(LocomotionConfig::default());
        let mut physics = ScriptedPhysics {
            ground: true,
            ..Default::default()
        };
        let press = RawInput {
            roll: true,
            ..Default::default()
        };
        for tick in 0..=22 {
            let raw = if tick == 0 || tick == 10 {
                press
            } else {
                RawInput::default()
            };
            let frame = controller.tick(&mut physics, raw, dt);
            let state = frame.state;
            assert!(!(state.rolling && state.roll_ready));
            match tick {
                0 => {
                    assert!(state.rolling);
                    assert!(!state.roll_ready);
                    assert_eq!(controller.timers().pending(), 2);
                }
                7 => assert!(state.rolling),
                9 => assert!(!state.rolling),
                10 => assert!(!state.roll_ready),
                19 => assert!(!state.roll_ready),
                21 => assert!(state.roll_ready),
                _ => {}
            }
        }
        let sink = controller.sink();
        assert_eq!(sink.fired(AnimTrigger::Roll), 1);
        assert_eq!(sink.fired(AnimTrigger::EndRoll), 1);
        assert_eq!(controller.timers().pending(), 0);
    }

    #[test]
    fn short_cooldown_cannot_reopen_a_roll_in_progress() {
        let mut config = LocomotionConfig::default();
        config.roll.duration = 0.5;
        config.roll.cooldown = 0.1;
        let mut controller = controller(config);
        let mut physics = ScriptedPhysics::default();
        let dt = 0.05;
        let mut pressed = false;
        for tick in 0..20 {
            pressed = !pressed;
            let frame = controller.tick(
                &mut physics,
                RawInput {
                    roll: pressed,
                    ..Default::default()
                },
                dt,
            );
            assert!(!(frame.state.rolling && frame.state.roll_ready), "tick {}", tick);
        }
        assert_eq!(controller.sink().fired(AnimTrigger::Roll), 2);
    }

    #[test]
    fn heading_holds_without_input_and_turns_toward_motion() {
        let mut controller = controller(LocomotionConfig::default());
        let mut physics = ScriptedPhysics {
            ground: true,
            ..Default::default()
        };
        controller.tick(&mut physics, RawInput::default(), DT);
        assert_eq!(controller.state().heading, 0.0);

        let strafe = RawInput {
            move_x: 1.0,
            ..Default::default()
        };
        let target = std::f32::consts::FRAC_PI_2;
        let mut remaining = target;
        for _ in 0..30 {
            controller.tick(&mut physics, strafe, DT);
            let next = (target - controller.state().heading).abs();
            assert!(next < remaining);
            remaining = next;
        }
        assert!(controller.state().heading <= target);
        assert_eq!(physics.heading, controller.state().heading);
    }

    #[test]
    fn invalid_config_is_fatal_at_construction() {
        let _guard = sticky_guard();
        observability::clear_sticky_error();
        let mut config = LocomotionConfig::default();
        config.movement.run_speed = Real::NAN;
        let result = LocomotionController::from_config(
            config,
            DirectInputAdapter::default(),
            RecordingSink::default(),
        );
        assert!(matches!(result, Err(ControllerError::InvalidConfig(_))));
        let sticky = observability::sticky_error().expect("sticky error");
        assert!(sticky.message.contains("movement.run_speed"));
    }

    fn build_scene() -> (PhysicsWorld, RigidBodyHandle) {
        let mut world = PhysicsWorld::new(vector![0.0, -9.81, 0.0]);
        let floor = ColliderBuilder::cuboid(20.0, 0.1, 20.0)
            .translation(vector![0.0, -0.1, 0.0])
            .build();
        world.insert_surface(floor, &[SurfaceTag::Ground]);
        let ladder = ColliderBuilder::cuboid(0.5, 3.0, 0.05)
            .translation(vector![6.0, 3.0, -0.7])
            .build();
        world.insert_surface(ladder, &[SurfaceTag::Ladder]);
        let handle = world.insert_character(
            vector![0.0, 0.8, 0.0],
            ColliderBuilder::capsule_y(0.5, 0.3).build(),
        );
        world.step(DT);
        (world, handle)
    }

    fn scene_config() -> LocomotionConfig {
        let mut config = LocomotionConfig::default();
        config.probe.feet_offset = [0.0, -0.8, 0.0];
        config
    }

    #[test]
    fn rapier_character_walks_forward_on_floor() {
        let (mut world, handle) = build_scene();
        let mut controller = controller(scene_config());
        let mut character = RapierCharacter::attach(&mut world, handle).expect("attach");
        let mut frame = None;
        for _ in 0..60 {
            frame = Some(controller.tick(&mut character, forward(), DT));
            character.step(DT);
        }
        let frame = frame.expect("frame");
        let position = character.position();
        assert!(frame.state.grounded);
        assert_eq!(frame.locomotion, LocomotionState::Walk);
        assert!(position.z < -1.5);
        assert!(position.x.abs() < 0.1);
        assert!(frame.camera.eye.z > position.z);
    }

    #[test]
    fn rapier_character_climbs_ladder() {
        let (mut world, handle) = build_scene();
        if let Some(body) = world.body_mut(handle) {
            body.set_translation(vector![6.0, 0.8, 0.0], true);
        }
        world.step(DT);
        let mut controller = controller(scene_config());
        let mut character = RapierCharacter::attach(&mut world, handle).expect("attach");
        for _ in 0..30 {
            controller.tick(&mut character, forward(), DT);
            character.step(DT);
        }
        let position = character.position();
        assert!(controller.state().stick_to_ladder());
        assert!(position.y > 1.5);
        assert_eq!(controller.locomotion(), LocomotionState::ClimbUp);
    }
}
