use crate::natives::{expect_arity, property};
use crate::runtime::error::RuntimeError;
use crate::runtime::evaluation::Evaluation;
use crate::runtime::fqn;
use crate::runtime::object::{InnerValue, ObjectId};

/// Lifecycle of a sound, read from and written to its `status` attribute.
/// A sound with no status yet has never been played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Idle,
    Played,
    Paused,
    Stopped,
}

impl Status {
    fn describe(self) -> &'static str {
        match self {
            Status::Idle => "not yet played",
            Status::Played => "played",
            Status::Paused => "paused",
            Status::Stopped => "stopped",
        }
    }
}

pub(crate) fn play(
    evaluation: &mut Evaluation,
    receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    expect_arity("play", 0, args)?;
    let game = evaluation.singleton(fqn::GAME)?;
    if evaluation.instance(game)?.get("running") != Some(evaluation.true_id()) {
        return Err(RuntimeError::GameNotRunning);
    }
    match status_of(evaluation, receiver)? {
        Status::Idle | Status::Stopped => {
            set_status(evaluation, receiver, "played")?;
            let sounds = sounds_list(evaluation, game)?;
            let elements = evaluation.instance_mut(sounds)?.assert_is_collection_mut()?;
            if !elements.contains(&receiver) {
                elements.push(receiver);
            }
        }
        state => {
            return Err(RuntimeError::IllegalSoundTransition {
                event: "play",
                state: state.describe(),
            });
        }
    }
    evaluation.push_operand(evaluation.void_id());
    Ok(())
}

pub(crate) fn stop(
    evaluation: &mut Evaluation,
    receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    expect_arity("stop", 0, args)?;
    match status_of(evaluation, receiver)? {
        Status::Played => {
            set_status(evaluation, receiver, "stopped")?;
            let game = evaluation.singleton(fqn::GAME)?;
            if let Some(sounds) = evaluation.instance(game)?.get("sounds") {
                evaluation
                    .instance_mut(sounds)?
                    .assert_is_collection_mut()?
                    .retain(|&element| element != receiver);
            }
        }
        state => {
            return Err(RuntimeError::IllegalSoundTransition {
                event: "stop",
                state: state.describe(),
            });
        }
    }
    evaluation.push_operand(evaluation.void_id());
    Ok(())
}

pub(crate) fn pause(
    evaluation: &mut Evaluation,
    receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    expect_arity("pause", 0, args)?;
    match status_of(evaluation, receiver)? {
        Status::Played => set_status(evaluation, receiver, "paused")?,
        state => {
            return Err(RuntimeError::IllegalSoundTransition {
                event: "pause",
                state: state.describe(),
            });
        }
    }
    evaluation.push_operand(evaluation.void_id());
    Ok(())
}

pub(crate) fn resume(
    evaluation: &mut Evaluation,
    receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    expect_arity("resume", 0, args)?;
    match status_of(evaluation, receiver)? {
        Status::Paused => set_status(evaluation, receiver, "played")?,
        state => {
            return Err(RuntimeError::IllegalSoundTransition {
                event: "resume",
                state: state.describe(),
            });
        }
    }
    evaluation.push_operand(evaluation.void_id());
    Ok(())
}

pub(crate) fn played(
    evaluation: &mut Evaluation,
    receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    expect_arity("played", 0, args)?;
    let answer = status_of(evaluation, receiver)? == Status::Played;
    evaluation.push_operand(evaluation.boolean(answer));
    Ok(())
}

pub(crate) fn paused(
    evaluation: &mut Evaluation,
    receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    expect_arity("paused", 0, args)?;
    let answer = status_of(evaluation, receiver)? == Status::Paused;
    evaluation.push_operand(evaluation.boolean(answer));
    Ok(())
}

pub(crate) fn volume(
    evaluation: &mut Evaluation,
    receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    if let [value] = args {
        let volume = evaluation.instance(*value)?.assert_is_number()?;
        if !(0.0..=1.0).contains(&volume) {
            return Err(RuntimeError::VolumeOutOfRange { value: volume });
        }
    }
    property(evaluation, "volume", "volume", receiver, args)
}

pub(crate) fn should_loop(
    evaluation: &mut Evaluation,
    receiver: ObjectId,
    args: &[ObjectId],
) -> Result<(), RuntimeError> {
    property(evaluation, "shouldLoop", "shouldLoop", receiver, args)
}

fn status_of(evaluation: &Evaluation, sound: ObjectId) -> Result<Status, RuntimeError> {
    let Some(status) = evaluation.instance(sound)?.get("status") else {
        return Ok(Status::Idle);
    };
    match evaluation.instance(status)?.assert_is_string()? {
        "played" => Ok(Status::Played),
        "paused" => Ok(Status::Paused),
        "stopped" => Ok(Status::Stopped),
        other => Err(RuntimeError::UnknownSoundStatus {
            status: other.to_string(),
        }),
    }
}

fn set_status(
    evaluation: &mut Evaluation,
    sound: ObjectId,
    status: &str,
) -> Result<(), RuntimeError> {
    let value = evaluation.create_instance(fqn::STRING, Some(InnerValue::String(status.to_string())));
    evaluation.instance_mut(sound)?.set("status", value);
    Ok(())
}

fn sounds_list(evaluation: &mut Evaluation, game: ObjectId) -> Result<ObjectId, RuntimeError> {
    if let Some(existing) = evaluation.instance(game)?.get("sounds") {
        return Ok(existing);
    }
    let created = evaluation.create_instance(fqn::LIST, Some(InnerValue::Collection(Vec::new())));
    evaluation.instance_mut(game)?.set("sounds", created);
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::environment::EnvironmentBuilder;
    use crate::natives;
    use crate::runtime::error::ErrorKind;
    use std::rc::Rc;

    struct Jukebox {
        evaluation: Evaluation,
        game: ObjectId,
        sound: ObjectId,
    }

    fn jukebox() -> Jukebox {
        let environment = Rc::new(EnvironmentBuilder::new().build(vec![]));
        let mut evaluation = Evaluation::new(environment);
        let game = evaluation.create_singleton(fqn::GAME);
        let sound = evaluation.create_instance(fqn::SOUND, None);
        Jukebox {
            evaluation,
            game,
            sound,
        }
    }

    fn started_jukebox() -> Jukebox {
        let mut jukebox = jukebox();
        let running = jukebox.evaluation.true_id();
        jukebox
            .evaluation
            .instance_mut(jukebox.game)
            .expect("game registered")
            .set("running", running);
        jukebox
    }

    fn run(
        jukebox: &mut Jukebox,
        selector: &str,
        args: &[ObjectId],
    ) -> Result<ObjectId, RuntimeError> {
        natives::call(
            &mut jukebox.evaluation,
            fqn::SOUND,
            selector,
            jukebox.sound,
            args,
        )?;
        jukebox.evaluation.pop_operand()
    }

    fn status_text(jukebox: &Jukebox) -> Option<String> {
        let status = jukebox
            .evaluation
            .instance(jukebox.sound)
            .expect("sound registered")
            .get("status")?;
        Some(
            jukebox
                .evaluation
                .instance(status)
                .expect("status instance")
                .assert_is_string()
                .expect("string payload")
                .to_string(),
        )
    }

    fn game_sounds(jukebox: &Jukebox) -> Vec<ObjectId> {
        match jukebox
            .evaluation
            .instance(jukebox.game)
            .expect("game registered")
            .get("sounds")
        {
            Some(list) => jukebox
                .evaluation
                .instance(list)
                .expect("sounds list")
                .assert_is_collection()
                .expect("list payload")
                .to_vec(),
            None => Vec::new(),
        }
    }

    #[test]
    fn play_then_stop_walks_the_status_machine() {
        let mut jukebox = started_jukebox();

        run(&mut jukebox, "play", &[]).expect("play");
        assert_eq!(status_text(&jukebox).as_deref(), Some("played"));
        assert_eq!(game_sounds(&jukebox), vec![jukebox.sound]);
        assert_eq!(
            run(&mut jukebox, "played", &[]).expect("played query"),
            jukebox.evaluation.true_id()
        );

        run(&mut jukebox, "stop", &[]).expect("stop");
        assert_eq!(status_text(&jukebox).as_deref(), Some("stopped"));
        assert_eq!(game_sounds(&jukebox), vec![]);

        let error = run(&mut jukebox, "pause", &[]).expect_err("pause after stop");
        assert_eq!(
            error,
            RuntimeError::IllegalSoundTransition {
                event: "pause",
                state: "stopped",
            }
        );
        assert_eq!(error.kind(), ErrorKind::State);
    }

    #[test]
    fn stopped_sounds_can_be_played_again() {
        let mut jukebox = started_jukebox();
        run(&mut jukebox, "play", &[]).expect("play");
        run(&mut jukebox, "stop", &[]).expect("stop");
        run(&mut jukebox, "play", &[]).expect("replay");
        assert_eq!(status_text(&jukebox).as_deref(), Some("played"));
        assert_eq!(game_sounds(&jukebox), vec![jukebox.sound]);
    }

    #[test]
    fn pause_and_resume_round_trip() {
        let mut jukebox = started_jukebox();
        run(&mut jukebox, "play", &[]).expect("play");
        run(&mut jukebox, "pause", &[]).expect("pause");
        assert_eq!(status_text(&jukebox).as_deref(), Some("paused"));
        assert_eq!(
            run(&mut jukebox, "paused", &[]).expect("paused query"),
            jukebox.evaluation.true_id()
        );

        run(&mut jukebox, "resume", &[]).expect("resume");
        assert_eq!(status_text(&jukebox).as_deref(), Some("played"));

        let error = run(&mut jukebox, "resume", &[]).expect_err("resume while playing");
        assert_eq!(
            error,
            RuntimeError::IllegalSoundTransition {
                event: "resume",
                state: "played",
            }
        );
    }

    #[test]
    fn play_requires_a_running_game() {
        let mut jukebox = jukebox();
        let error = run(&mut jukebox, "play", &[]).expect_err("game never started");
        assert_eq!(error, RuntimeError::GameNotRunning);
        assert_eq!(error.kind(), ErrorKind::State);
        assert_eq!(status_text(&jukebox), None);
    }

    #[test]
    fn playing_twice_is_an_illegal_transition() {
        let mut jukebox = started_jukebox();
        run(&mut jukebox, "play", &[]).expect("play");
        let error = run(&mut jukebox, "play", &[]).expect_err("already playing");
        assert_eq!(
            error,
            RuntimeError::IllegalSoundTransition {
                event: "play",
                state: "played",
            }
        );
    }

    #[test]
    fn volume_is_range_checked_on_write() {
        let mut jukebox = jukebox();
        assert_eq!(
            run(&mut jukebox, "volume", &[]).expect("unset getter"),
            jukebox.evaluation.null_id()
        );

        let half = jukebox
            .evaluation
            .create_instance(fqn::NUMBER, Some(InnerValue::Number(0.5)));
        run(&mut jukebox, "volume", &[half]).expect("setter");
        assert_eq!(run(&mut jukebox, "volume", &[]).expect("getter"), half);

        let eleven = jukebox
            .evaluation
            .create_instance(fqn::NUMBER, Some(InnerValue::Number(1.5)));
        let error = run(&mut jukebox, "volume", &[eleven]).expect_err("out of range");
        assert_eq!(error, RuntimeError::VolumeOutOfRange { value: 1.5 });
        assert_eq!(error.kind(), ErrorKind::Range);
        // The rejected write must not land.
        assert_eq!(run(&mut jukebox, "volume", &[]).expect("getter"), half);
    }

    #[test]
    fn should_loop_is_a_boolean_property() {
        let mut jukebox = jukebox();
        assert_eq!(
            run(&mut jukebox, "shouldLoop", &[]).expect("unset getter"),
            jukebox.evaluation.null_id()
        );
        let looping = jukebox.evaluation.true_id();
        run(&mut jukebox, "shouldLoop", &[looping]).expect("setter");
        assert_eq!(
            run(&mut jukebox, "shouldLoop", &[]).expect("getter"),
            jukebox.evaluation.true_id()
        );
    }
}
