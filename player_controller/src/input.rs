use rapier3d::prelude::Real;

/// One tick of sampled input. Buttons are level-held.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawInput {
    pub move_x: Real,
    pub move_y: Real,
    pub look_delta: [Real; 2],
    pub jump: bool,
    pub run: bool,
    pub roll: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputIntent {
    pub move_axis: [Real; 2],
    pub look_delta: [Real; 2],
    /// Rising edge of the jump button.
    pub jump_pressed: bool,
    pub run_held: bool,
    /// Rising edge of the roll button.
    pub roll_pressed: bool,
}

pub trait InputAdapter {
    fn intent(&mut self, raw: RawInput) -> InputIntent;
}

#[derive(Clone, Copy, Debug, Default)]
struct ButtonState {
    jump: bool,
    roll: bool,
}

/// Clamps axes to `[-1, 1]` without renormalizing, so full deflection stays
/// exactly `1.0`, and turns held buttons into rising edges.
#[derive(Default)]
pub struct DirectInputAdapter {
    previous: ButtonState,
}

impl DirectInputAdapter {
    fn clamp_axis(value: Real) -> Real {
        if value.is_nan() {
            0.0
        } else {
            value.clamp(-1.0, 1.0)
        }
    }

    fn finite_or_zero(value: Real) -> Real {
        if value.is_finite() {
            value
        } else {
            0.0
        }
    }
}

impl InputAdapter for DirectInputAdapter {
    fn intent(&mut self, raw: RawInput) -> InputIntent {
        let intent = InputIntent {
            move_axis: [Self::clamp_axis(raw.move_x), Self::clamp_axis(raw.move_y)],
            look_delta: [
                Self::finite_or_zero(raw.look_delta[0]),
                Self::finite_or_zero(raw.look_delta[1]),
            ],
            jump_pressed: raw.jump && !self.previous.jump,
            run_held: raw.run,
            roll_pressed: raw.roll && !self.previous.roll,
        };
        self.previous = ButtonState {
            jump: raw.jump,
            roll: raw.roll,
        };
        intent
    }
}
