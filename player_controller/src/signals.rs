//! Animation-facing signals as closed enums.

use rapier3d::prelude::Real;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimFlag {
    Walking,
    Running,
    Idle,
    Climbing,
}

impl AnimFlag {
    pub fn name(self) -> &'static str {
        match self {
            AnimFlag::Walking => "walking",
            AnimFlag::Running => "running",
            AnimFlag::Idle => "idle",
            AnimFlag::Climbing => "climbing",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimParam {
    /// 1 climbing up, -1 climbing down, 0 otherwise.
    ClimbSpeed,
}

impl AnimParam {
    pub fn name(self) -> &'static str {
        match self {
            AnimParam::ClimbSpeed => "climb_speed",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimTrigger {
    Jump,
    EndJump,
    Roll,
    EndRoll,
}

impl AnimTrigger {
    pub fn name(self) -> &'static str {
        match self {
            AnimTrigger::Jump => "jump",
            AnimTrigger::EndJump => "end_jump",
            AnimTrigger::Roll => "roll",
            AnimTrigger::EndRoll => "end_roll",
        }
    }
}

pub trait AnimationSink {
    fn set_flag(&mut self, flag: AnimFlag, value: bool);
    fn set_value(&mut self, param: AnimParam, value: Real);
    fn fire(&mut self, trigger: AnimTrigger);
    /// Clears a pending trigger that has not been consumed yet.
    fn reset(&mut self, trigger: AnimTrigger);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerEvent {
    Fired(AnimTrigger),
    Reset(AnimTrigger),
}

/// Keeps the latest flag and parameter values plus every trigger event in order.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    flags: [bool; 4],
    climb_speed: Real,
    events: Vec<TriggerEvent>,
}

impl RecordingSink {
    pub fn flag(&self, flag: AnimFlag) -> bool {
        self.flags[flag_index(flag)]
    }

    pub fn value(&self, param: AnimParam) -> Real {
        match param {
            AnimParam::ClimbSpeed => self.climb_speed,
        }
    }

    pub fn events(&self) -> &[TriggerEvent] {
        &self.events
    }

    pub fn fired(&self, trigger: AnimTrigger) -> usize {
        self.events
            .iter()
            .filter(|event| **event == TriggerEvent::Fired(trigger))
            .count()
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}

impl AnimationSink for RecordingSink {
    fn set_flag(&mut self, flag: AnimFlag, value: bool) {
        self.flags[flag_index(flag)] = value;
    }

    fn set_value(&mut self, param: AnimParam, value: Real) {
        match param {
            AnimParam::ClimbSpeed => self.climb_speed = value,
        }
    }

    fn fire(&mut self, trigger: AnimTrigger) {
        self.events.push(TriggerEvent::Fired(trigger));
    }

    fn reset(&mut self, trigger: AnimTrigger) {
        self.events.push(TriggerEvent::Reset(trigger));
    }
}

fn flag_index(flag: AnimFlag) -> usize {
    match flag {
        AnimFlag::Walking => 0,
        AnimFlag::Running => 1,
        AnimFlag::Idle => 2,
        AnimFlag::Climbing => 3,
    }
}
