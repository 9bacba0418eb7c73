use crate::natives::{expect_arity, property, redirect_to, require_not_null, setter};
use crate::runtime::error::RuntimeError;
use crate::runtime::evaluation::Evaluation;
use crate::runtime::fqn;
use crate::runtime::object::{InnerValue, ObjectId};

/// How long a said message stays on screen, in milliseconds.
const MESSAGE_WINDOW_MS: f64 = 2000.0;

pub(crate) fn add_visual(
    evaluation: &mut Evaluation,
    receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    expect_arity("addVisual", 1, args)?;
    push_visual(evaluation, "addVisual", receiver, args[0])?;
    evaluation.push_operand(evaluation.void_id());
    Ok(())
}

pub(crate) fn add_visual_in(
    evaluation: &mut Evaluation,
    receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    expect_arity("addVisualIn", 2, args)?;
    require_not_null(evaluation, "addVisualIn", args[0])?;
    require_not_null(evaluation, "addVisualIn", args[1])?;
    evaluation.instance_mut(args[0])?.set("position", args[1]);
    push_visual(evaluation, "addVisualIn", receiver, args[0])?;
    evaluation.push_operand(evaluation.void_id());
    Ok(())
}

pub(crate) fn add_visual_character(
    evaluation: &mut Evaluation,
    _receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    redirect_to(evaluation, fqn::GAME_MIRROR, "addVisualCharacter", args)
}

pub(crate) fn add_visual_character_in(
    evaluation: &mut Evaluation,
    _receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    redirect_to(evaluation, fqn::GAME_MIRROR, "addVisualCharacterIn", args)
}

pub(crate) fn when_collide_do(
    evaluation: &mut Evaluation,
    _receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    redirect_to(evaluation, fqn::GAME_MIRROR, "whenCollideDo", args)
}

pub(crate) fn on_collide_do(
    evaluation: &mut Evaluation,
    _receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    redirect_to(evaluation, fqn::GAME_MIRROR, "onCollideDo", args)
}

pub(crate) fn on_tick(
    evaluation: &mut Evaluation,
    _receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    redirect_to(evaluation, fqn::GAME_MIRROR, "onTick", args)
}

pub(crate) fn schedule(
    evaluation: &mut Evaluation,
    _receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    redirect_to(evaluation, fqn::GAME_MIRROR, "schedule", args)
}

pub(crate) fn when_key_pressed_do(
    evaluation: &mut Evaluation,
    _receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    expect_arity("whenKeyPressedDo", 2, args)?;
    redirect_to(evaluation, fqn::IO, "addEventHandler", args)
}

pub(crate) fn remove_tick_event(
    evaluation: &mut Evaluation,
    _receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    expect_arity("removeTickEvent", 1, args)?;
    redirect_to(evaluation, fqn::IO, "removeTimeHandler", args)
}

pub(crate) fn remove_visual(
    evaluation: &mut Evaluation,
    receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    expect_arity("removeVisual", 1, args)?;
    if let Some(list) = evaluation.instance(receiver)?.get("visuals") {
        let visual = args[0];
        evaluation
            .instance_mut(list)?
            .assert_is_collection_mut()?
            .retain(|&element| element != visual);
    }
    evaluation.push_operand(evaluation.void_id());
    Ok(())
}

pub(crate) fn all_visuals(
    evaluation: &mut Evaluation,
    receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    expect_arity("allVisuals", 0, args)?;
    let elements = current_visuals(evaluation, receiver)?;
    let copy = evaluation.create_instance(fqn::LIST, Some(InnerValue::Collection(elements)));
    evaluation.push_operand(copy);
    Ok(())
}

pub(crate) fn has_visual(
    evaluation: &mut Evaluation,
    receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    expect_arity("hasVisual", 1, args)?;
    require_not_null(evaluation, "hasVisual", args[0])?;
    let present = current_visuals(evaluation, receiver)?.contains(&args[0]);
    evaluation.push_operand(evaluation.boolean(present));
    Ok(())
}

pub(crate) fn get_objects_in(
    evaluation: &mut Evaluation,
    receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    expect_arity("getObjectsIn", 1, args)?;
    require_not_null(evaluation, "getObjectsIn", args[0])?;
    let mut found = Vec::new();
    for visual in current_visuals(evaluation, receiver)? {
        let visual_position = position_of(evaluation, visual)?;
        if same_position(evaluation, visual_position, args[0])? {
            found.push(visual);
        }
    }
    let list = evaluation.create_instance(fqn::LIST, Some(InnerValue::Collection(found)));
    evaluation.push_operand(list);
    Ok(())
}

pub(crate) fn colliders(
    evaluation: &mut Evaluation,
    receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    expect_arity("colliders", 1, args)?;
    require_not_null(evaluation, "colliders", args[0])?;
    let visual = args[0];
    let origin = position_of(evaluation, visual)?;
    let mut found = Vec::new();
    for other in current_visuals(evaluation, receiver)? {
        if other == visual {
            continue;
        }
        let other_position = position_of(evaluation, other)?;
        if same_position(evaluation, origin, other_position)? {
            found.push(other);
        }
    }
    let list = evaluation.create_instance(fqn::LIST, Some(InnerValue::Collection(found)));
    evaluation.push_operand(list);
    Ok(())
}

pub(crate) fn say(
    evaluation: &mut Evaluation,
    _receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    expect_arity("say", 2, args)?;
    require_not_null(evaluation, "say", args[0])?;
    let io = evaluation.singleton(fqn::IO)?;
    evaluation.send_message("currentTime", io, &[])?;
    let now_id = evaluation.pop_operand()?;
    let now = evaluation.instance(now_id)?.assert_is_number()?;
    let message_time = evaluation.create_instance(
        fqn::NUMBER,
        Some(InnerValue::Number(now + MESSAGE_WINDOW_MS)),
    );
    let visual = evaluation.instance_mut(args[0])?;
    visual.set("message", args[1]);
    visual.set("messageTime", message_time);
    evaluation.push_operand(evaluation.void_id());
    Ok(())
}

pub(crate) fn clear(
    evaluation: &mut Evaluation,
    receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    expect_arity("clear", 0, args)?;
    let io = evaluation.singleton(fqn::IO)?;
    evaluation.send_message("clear", io, &[])?;
    evaluation.pop_operand()?;
    let fresh = evaluation.create_instance(fqn::LIST, Some(InnerValue::Collection(Vec::new())));
    evaluation.instance_mut(receiver)?.set("visuals", fresh);
    evaluation.push_operand(evaluation.void_id());
    Ok(())
}

pub(crate) fn title(
    evaluation: &mut Evaluation,
    receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    property(evaluation, "title", "title", receiver, args)
}

pub(crate) fn width(
    evaluation: &mut Evaluation,
    receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    property(evaluation, "width", "width", receiver, args)
}

pub(crate) fn height(
    evaluation: &mut Evaluation,
    receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    property(evaluation, "height", "height", receiver, args)
}

pub(crate) fn ground(
    evaluation: &mut Evaluation,
    receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    setter(evaluation, "ground", "ground", receiver, args)
}

pub(crate) fn board_ground(
    evaluation: &mut Evaluation,
    receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    setter(evaluation, "boardGround", "boardGround", receiver, args)
}

pub(crate) fn do_cell_size(
    evaluation: &mut Evaluation,
    receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    setter(evaluation, "doCellSize", "cellSize", receiver, args)
}

pub(crate) fn error_reporter(
    evaluation: &mut Evaluation,
    receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    setter(evaluation, "errorReporter", "errorReporter", receiver, args)
}

pub(crate) fn hide_attributes(
    evaluation: &mut Evaluation,
    receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    setter(evaluation, "hideAttributes", "hideAttributes", receiver, args)
}

pub(crate) fn show_attributes(
    evaluation: &mut Evaluation,
    receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    setter(evaluation, "showAttributes", "showAttributes", receiver, args)
}

pub(crate) fn stop(
    evaluation: &mut Evaluation,
    receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    expect_arity("stop", 0, args)?;
    let flag = evaluation.false_id();
    evaluation.instance_mut(receiver)?.set("running", flag);
    evaluation.push_operand(evaluation.void_id());
    Ok(())
}

pub(crate) fn do_start(
    evaluation: &mut Evaluation,
    receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    expect_arity("doStart", 1, args)?;
    let flag = evaluation.true_id();
    evaluation.instance_mut(receiver)?.set("running", flag);
    evaluation.push_operand(evaluation.void_id());
    Ok(())
}

fn push_visual(
    evaluation: &mut Evaluation,
    selector: &'static str,
    receiver: ObjectId,
    visual: ObjectId,
) -> Result<(), RuntimeError> {
    require_visual(evaluation, selector, visual)?;
    let list = visuals_list(evaluation, receiver)?;
    let elements = evaluation.instance_mut(list)?.assert_is_collection_mut()?;
    if elements.contains(&visual) {
        return Err(RuntimeError::DuplicateVisual);
    }
    elements.push(visual);
    Ok(())
}

/// A visual must be non-null and able to answer `position`: either it
/// already carries a `position` attribute, or its module resolves a
/// zero-argument `position` method.
fn require_visual(
    evaluation: &Evaluation,
    selector: &'static str,
    visual: ObjectId,
) -> Result<(), RuntimeError> {
    require_not_null(evaluation, selector, visual)?;
    let object = evaluation.instance(visual)?;
    if object.get("position").is_some()
        || evaluation
            .environment()
            .resolves_method(object.module_fqn(), "position", 0)
    {
        Ok(())
    } else {
        Err(RuntimeError::NotAVisual {
            module: object.module_fqn().to_string(),
        })
    }
}

fn visuals_list(
    evaluation: &mut Evaluation,
    receiver: ObjectId,
) -> Result<ObjectId, RuntimeError> {
    if let Some(existing) = evaluation.instance(receiver)?.get("visuals") {
        return Ok(existing);
    }
    let created = evaluation.create_instance(fqn::LIST, Some(InnerValue::Collection(Vec::new())));
    evaluation.instance_mut(receiver)?.set("visuals", created);
    Ok(created)
}

fn current_visuals(
    evaluation: &Evaluation,
    receiver: ObjectId,
) -> Result<Vec<ObjectId>, RuntimeError> {
    match evaluation.instance(receiver)?.get("visuals") {
        Some(list) => Ok(evaluation.instance(list)?.assert_is_collection()?.to_vec()),
        None => Ok(Vec::new()),
    }
}

/// Where a visual is: its `position` attribute when present, otherwise the
/// result of sending it `position`. Fields take precedence over methods.
fn position_of(evaluation: &mut Evaluation, visual: ObjectId) -> Result<ObjectId, RuntimeError> {
    if let Some(attribute) = evaluation.instance(visual)?.get("position") {
        return Ok(attribute);
    }
    evaluation.send_message("position", visual, &[])?;
    evaluation.pop_operand()
}

/// Two positions coincide when their `x` and `y` attributes are the same
/// objects, by id.
fn same_position(
    evaluation: &Evaluation,
    first: ObjectId,
    second: ObjectId,
) -> Result<bool, RuntimeError> {
    let first = evaluation.instance(first)?;
    let second = evaluation.instance(second)?;
    Ok(first.get("x") == second.get("x") && first.get("y") == second.get("y"))
}
