//! Host implementations of the `game` and `Sound` modules.
//!
//! Calling convention: a native receives the evaluation, the receiver id and
//! the already-evaluated argument ids, and must push exactly one id onto the
//! current frame's operand stack before returning (the void sentinel when
//! the method has nothing to say). Natives may re-enter the interpreter
//! synchronously through `Evaluation::send_message`.
pub mod game;
pub mod sound;

use crate::runtime::error::RuntimeError;
use crate::runtime::evaluation::Evaluation;
use crate::runtime::fqn;
use crate::runtime::object::ObjectId;

pub type Native =
    fn(&mut Evaluation, ObjectId, &[ObjectId]) -> Result<(), RuntimeError>;

/// Resolve the native bound to a module and selector.
pub fn lookup(module_fqn: &str, selector: &str) -> Option<Native> {
    let native: Native = match (module_fqn, selector) {
        (fqn::GAME, "addVisual") => game::add_visual,
        (fqn::GAME, "addVisualIn") => game::add_visual_in,
        (fqn::GAME, "addVisualCharacter") => game::add_visual_character,
        (fqn::GAME, "addVisualCharacterIn") => game::add_visual_character_in,
        (fqn::GAME, "whenCollideDo") => game::when_collide_do,
        (fqn::GAME, "onCollideDo") => game::on_collide_do,
        (fqn::GAME, "onTick") => game::on_tick,
        (fqn::GAME, "schedule") => game::schedule,
        (fqn::GAME, "whenKeyPressedDo") => game::when_key_pressed_do,
        (fqn::GAME, "removeTickEvent") => game::remove_tick_event,
        (fqn::GAME, "removeVisual") => game::remove_visual,
        (fqn::GAME, "allVisuals") => game::all_visuals,
        (fqn::GAME, "hasVisual") => game::has_visual,
        (fqn::GAME, "getObjectsIn") => game::get_objects_in,
        (fqn::GAME, "colliders") => game::colliders,
        (fqn::GAME, "say") => game::say,
        (fqn::GAME, "clear") => game::clear,
        (fqn::GAME, "title") => game::title,
        (fqn::GAME, "width") => game::width,
        (fqn::GAME, "height") => game::height,
        (fqn::GAME, "ground") => game::ground,
        (fqn::GAME, "boardGround") => game::board_ground,
        (fqn::GAME, "doCellSize") => game::do_cell_size,
        (fqn::GAME, "errorReporter") => game::error_reporter,
        (fqn::GAME, "hideAttributes") => game::hide_attributes,
        (fqn::GAME, "showAttributes") => game::show_attributes,
        (fqn::GAME, "stop") => game::stop,
        (fqn::GAME, "doStart") => game::do_start,
        (fqn::SOUND, "play") => sound::play,
        (fqn::SOUND, "stop") => sound::stop,
        (fqn::SOUND, "pause") => sound::pause,
        (fqn::SOUND, "resume") => sound::resume,
        (fqn::SOUND, "played") => sound::played,
        (fqn::SOUND, "paused") => sound::paused,
        (fqn::SOUND, "volume") => sound::volume,
        (fqn::SOUND, "shouldLoop") => sound::should_loop,
        _ => return None,
    };
    Some(native)
}

/// Dispatch a native call, enforcing the push-exactly-one post-condition.
pub fn call(
    evaluation: &mut Evaluation,
    module_fqn: &str,
    selector: &str,
    receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    let native = lookup(module_fqn, selector).ok_or_else(|| RuntimeError::UnknownNative {
        module: module_fqn.to_string(),
        selector: selector.to_string(),
    })?;
    let depth = evaluation.operand_depth();
    native(evaluation, receiver, args)?;
    debug_assert_eq!(
        evaluation.operand_depth(),
        depth + 1,
        "native '{selector}' must push exactly one operand"
    );
    Ok(())
}

fn expect_arity(
    selector: &'static str,
    expected: usize,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    if args.len() != expected {
        return Err(RuntimeError::ArityMismatch {
            selector,
            expected,
            found: args.len(),
        });
    }
    Ok(())
}

fn require_not_null(
    evaluation: &Evaluation,
    selector: &'static str,
    argument: ObjectId,
) -> Result<(), RuntimeError> {
    if argument == evaluation.null_id() {
        return Err(RuntimeError::NullArgument { selector });
    }
    Ok(())
}

/// Getter/setter pair sharing one selector, told apart by arity: no argument
/// reads the attribute (null when absent), one argument writes it and
/// returns void.
fn property(
    evaluation: &mut Evaluation,
    selector: &'static str,
    attribute: &str,
    receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    match args {
        [] => {
            let current = evaluation
                .instance(receiver)?
                .get(attribute)
                .unwrap_or(evaluation.null_id());
            evaluation.push_operand(current);
            Ok(())
        }
        [value] => {
            evaluation.instance_mut(receiver)?.set(attribute, *value);
            evaluation.push_operand(evaluation.void_id());
            Ok(())
        }
        _ => Err(RuntimeError::ArityMismatch {
            selector,
            expected: 1,
            found: args.len(),
        }),
    }
}

fn setter(
    evaluation: &mut Evaluation,
    selector: &'static str,
    attribute: &str,
    receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    expect_arity(selector, 1, args)?;
    evaluation.instance_mut(receiver)?.set(attribute, args[0]);
    evaluation.push_operand(evaluation.void_id());
    Ok(())
}

/// Forward a command to another module's singleton by re-sending. The inner
/// result is discarded and replaced with void.
fn redirect_to(
    evaluation: &mut Evaluation,
    target_fqn: &str,
    selector: &str,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    let target = evaluation.singleton(target_fqn)?;
    evaluation.send_message(selector, target, args)?;
    evaluation.pop_operand()?;
    evaluation.push_operand(evaluation.void_id());
    Ok(())
}
