//! Equality Explorer - headless demo
//!
//! Builds a preset scene, plays a few gestures through the drag protocol and
//! logs what the scale does. Run with `RUST_LOG=info` (or `debug`).

use glam::Vec2;

use equality_explorer::ModelResult;
use equality_explorer::model::{
    CreatorId, Interaction, Operator, Scene, SceneEvent, Side, Sign, UniversalOperation, VariableId,
};
use equality_explorer::presets;
use equality_explorer::view::{TermViewFactory, TextViewFactory};

const FRAME: f32 = 1.0 / 60.0;

fn settle(scene: &mut Scene) -> ModelResult<()> {
    for _ in 0..10_000 {
        if !scene.has_active_drags() {
            break;
        }
        scene.step(FRAME)?;
    }
    Ok(())
}

/// Drag a new unit term from a creator's toolbox and drop it above its plate
fn drop_on_plate(scene: &mut Scene, creator: CreatorId, sign: Sign) -> ModelResult<()> {
    let side = scene.creator(creator)?.side;
    let start = scene.toolbox_position(creator, sign)?;
    let Some(id) = scene.create_term_from_toolbox(creator, sign, Interaction { pointer: 0, position: start })? else {
        log::warn!("{} refused", creator);
        return Ok(());
    };
    let above_plate = scene.plate(side).position() - Vec2::new(0.0, 120.0);
    scene.drag(id, above_plate)?;
    scene.end_drag(id)?;
    settle(scene)?;
    log::info!("{} -> {:?}", id, scene.drag_outcome(id));
    Ok(())
}

fn describe(scene: &mut Scene, label: &str) {
    for side in [Side::Left, Side::Right] {
        let terms: Vec<String> = scene
            .plate(side)
            .terms()
            .into_iter()
            .filter_map(|t| scene.term(t).ok())
            .map(|t| TextViewFactory.create_term_node(t))
            .collect();
        log::info!(
            "[{}] {} plate (weight {}): {}",
            label,
            side,
            scene.plate_weight(side),
            terms.join(", ")
        );
    }
    log::info!("[{}] angle {:.2}°", label, scene.angle().to_degrees());
    for event in scene.drain_events() {
        match event {
            SceneEvent::SumToZero { side, .. } => log::info!("[{}] sum to zero on the {} side", label, side),
            SceneEvent::MaxIntegerExceeded { .. } | SceneEvent::SideFull { .. } => {
                log::warn!("[{}] {:?}", label, event)
            }
            _ => log::debug!("[{}] {:?}", label, event),
        }
    }
}

fn variables_demo() -> ModelResult<()> {
    let mut scene = presets::variables()?;
    scene.initialize_default_toolbox_positions()?;
    let x_left = scene.creator_id(Side::Left, 0)?;
    let constant_right = scene.creator_id(Side::Right, 1)?;

    // x = 3, built term by term
    drop_on_plate(&mut scene, x_left, Sign::Positive)?;
    for _ in 0..3 {
        drop_on_plate(&mut scene, constant_right, Sign::Positive)?;
    }
    describe(&mut scene, "variables");

    scene.set_variable_value(VariableId(0), 3)?;
    describe(&mut scene, "variables x=3");

    // Lock on: what goes on one side goes on the other
    scene.set_locked(true)?;
    let constant_left = scene.creator_id(Side::Left, 1)?;
    drop_on_plate(&mut scene, constant_left, Sign::Negative)?;
    scene.organize()?;
    describe(&mut scene, "variables locked");
    Ok(())
}

fn operations_demo() -> ModelResult<()> {
    let mut scene = presets::operations()?;
    scene.initialize_default_toolbox_positions()?;
    let x_left = scene.creator_id(Side::Left, 0)?;
    let constant_left = scene.creator_id(Side::Left, 1)?;

    // 2x + 1 = 7
    for _ in 0..2 {
        drop_on_plate(&mut scene, x_left, Sign::Positive)?;
    }
    drop_on_plate(&mut scene, constant_left, Sign::Positive)?;
    let seven = UniversalOperation::constant(Operator::Plus, 7);
    scene.apply_universal_operation(&seven)?;
    let minus_one = UniversalOperation::constant(Operator::Minus, 1);
    scene.apply_universal_operation(&minus_one)?;
    // Clear the left constant by hand, one -1 at a time
    for _ in 0..7 {
        drop_on_plate(&mut scene, constant_left, Sign::Negative)?;
    }
    describe(&mut scene, "operations 2x = 6");

    let snapshot = scene.save_snapshot()?;
    scene.apply_universal_operation(&UniversalOperation::constant(Operator::Divide, 2))?;
    describe(&mut scene, "operations x = 3");

    if let Some(slot) = snapshot {
        scene.restore_snapshot(slot)?;
        describe(&mut scene, "operations restored");
    }
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Equality Explorer (headless) starting...");
    for (name, demo) in [
        ("variables", variables_demo as fn() -> ModelResult<()>),
        ("operations", operations_demo),
    ] {
        if let Err(e) = demo() {
            log::error!("{} demo failed: {}", name, e);
            std::process::exit(1);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}
