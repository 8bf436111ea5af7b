use bevy::prelude::*;
use leafwing_input_manager::prelude::*;

#[derive(Reflect, Actionlike, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayerAction {
    /// Directional input. The vertical axis also arms drop-through on
    /// one-way platforms.
    #[actionlike(DualAxis)]
    Move,
    Jump,
}

pub fn plugin(app: &mut App) {
    app.add_plugins(InputManagerPlugin::<PlayerAction>::default());

    app.register_type::<PlayerAction>();

    let mut input_map = InputMap::<PlayerAction>::default();
    input_map.insert_dual_axis(PlayerAction::Move, VirtualDPad::wasd());
    input_map.insert_dual_axis(PlayerAction::Move, VirtualDPad::arrow_keys());
    input_map.insert_dual_axis(PlayerAction::Move, GamepadStick::LEFT);
    input_map.insert(PlayerAction::Jump, KeyCode::Space);
    input_map.insert(PlayerAction::Jump, GamepadButton::South);
    app.insert_resource(input_map);
    app.insert_resource(ActionState::<PlayerAction>::default());
}
