//! Crossfade controller scenarios
//!
//! Drives the controller with explicit session times and checks the calls
//! it makes on a recording backend.

mod helpers;

use emosonic_ap::playback::{ChannelEvent, CrossfadeController};
use emosonic_common::config::InstallationConfig;
use emosonic_common::events::{ChannelRole, ChannelState};
use emosonic_common::{Emotion, RankedEmotion};
use helpers::{default_bank, ms, BackendCall, RecordingBackend};
use std::time::Duration;

const EPSILON: f32 = 1e-4;

fn ranked(emotion: Emotion, value: f32) -> Option<RankedEmotion> {
    Some(RankedEmotion::new(emotion, value))
}

fn ready_controller() -> CrossfadeController<RecordingBackend> {
    let mut controller =
        CrossfadeController::new(&InstallationConfig::default(), RecordingBackend::new());
    controller.install_samples(default_bank());
    controller
}

/// Feed the same input every `step` from `from` to `to` inclusive
fn run(
    controller: &mut CrossfadeController<RecordingBackend>,
    primary: Option<RankedEmotion>,
    secondary: Option<RankedEmotion>,
    from: u64,
    to: u64,
    step: u64,
) -> Vec<(ChannelRole, ChannelEvent)> {
    let mut events = Vec::new();
    let mut t = from;
    while t <= to {
        controller.handle_emotions(primary, secondary, ms(t));
        events.extend(controller.tick(ms(t)));
        t += step;
    }
    events
}

fn completions(events: &[(ChannelRole, ChannelEvent)], emotion: Emotion) -> usize {
    events
        .iter()
        .filter(|(_, e)| *e == ChannelEvent::FadeOutCompleted { emotion })
        .count()
}

#[test]
fn test_sustained_happy_on_primary() {
    let mut controller = ready_controller();
    let happy = ranked(Emotion::Happy, 0.9);

    // Ten frames at 30 fps
    for n in 0..10u64 {
        let now = Duration::from_nanos(n * 33_333_333);
        controller.handle_emotions(happy, None, now);
        controller.tick(now);
    }
    let primary = controller.channel(ChannelRole::Primary);
    assert_eq!(primary.state(), ChannelState::FadingIn);
    assert_eq!(primary.current_emotion(), Some(Emotion::Happy));
    assert_eq!(controller.backend().play_count(), 0, "voices wait for the stagger delay");

    // Voices start 0.75 s after the first frame, at gain 0, centred
    run(&mut controller, happy, None, 740, 740, 10);
    assert_eq!(controller.backend().play_count(), 0);
    let events = run(&mut controller, happy, None, 750, 750, 10);
    assert!(events.contains(&(
        ChannelRole::Primary,
        ChannelEvent::VoicesStarted { emotion: Emotion::Happy, voices: 2 }
    )));
    let backend = controller.backend();
    let plays: Vec<_> = backend
        .calls
        .iter()
        .filter_map(|c| match c {
            BackendCall::Play { gain, pan, .. } => Some((*gain, *pan)),
            _ => None,
        })
        .collect();
    assert_eq!(plays, vec![(0.0, 0.0), (0.0, 0.0)]);

    // Linear ramp reaches the primary target gain at the end of fade-in
    run(&mut controller, happy, None, 1350, 1350, 10);
    let forest = controller.backend().voices_for("forest")[0];
    let mid = controller.backend().gain(forest).unwrap();
    assert!((mid - 0.7).abs() < 0.01, "mid-ramp gain {}", mid);

    run(&mut controller, happy, None, 1950, 1950, 10);
    let backend = controller.backend();
    for name in ["forest", "flute"] {
        let voice = backend.voices_for(name)[0];
        assert!((backend.gain(voice).unwrap() - 1.4).abs() < EPSILON);
    }
    assert_eq!(
        controller.channel(ChannelRole::Primary).state(),
        ChannelState::Sustained
    );

    run(&mut controller, happy, None, 2000, 3000, 100);
    assert_eq!(
        controller.channel(ChannelRole::Primary).state(),
        ChannelState::Sustained
    );
    assert_eq!(controller.backend().play_count(), 2);
}

#[test]
fn test_switch_to_sad_fades_happy_exponentially() {
    let mut controller = ready_controller();
    run(&mut controller, ranked(Emotion::Happy, 0.9), None, 0, 2000, 50);
    let happy_voices = [
        controller.backend().voices_for("forest")[0],
        controller.backend().voices_for("flute")[0],
    ];

    let switch_mark = controller.backend().calls.len();
    let sad = ranked(Emotion::Sad, 0.85);
    let mut events = run(&mut controller, sad, None, 2000, 2000, 50);

    let primary = controller.channel(ChannelRole::Primary);
    assert_eq!(primary.current_emotion(), Some(Emotion::Sad));
    assert_eq!(primary.fading_emotions(), vec![Emotion::Happy]);
    assert_eq!(primary.state(), ChannelState::FadingIn);

    // Halfway through the 2 s fade the gain sits at the geometric midpoint
    events.extend(run(&mut controller, sad, None, 2050, 3000, 50));
    let expected_mid = (1.4f32 * 0.001).sqrt();
    let mid = controller.backend().gain(happy_voices[0]).unwrap();
    assert!((mid - expected_mid).abs() < 1e-3, "mid-fade gain {}", mid);

    // Sad started after the stagger delay
    assert_eq!(controller.backend().voices_for("violin").len(), 1);

    events.extend(run(&mut controller, sad, None, 3050, 3950, 50));
    assert_eq!(controller.backend().live_voices(), 3);
    assert_eq!(completions(&events, Emotion::Happy), 0);

    events.extend(run(&mut controller, sad, None, 4000, 5000, 50));
    let backend = controller.backend();
    for voice in happy_voices {
        assert_eq!(backend.stop_count(voice), 1);
        // Monotonic decay after the switch, then a hard zero
        let after_switch: Vec<f32> = backend.calls[switch_mark..]
            .iter()
            .filter_map(|c| match c {
                BackendCall::SetGain { voice: v, gain } if *v == voice => Some(*gain),
                _ => None,
            })
            .collect();
        assert!((after_switch[0] - 1.4).abs() < EPSILON);
        assert!(after_switch.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(after_switch.last(), Some(&0.0));
        assert_eq!(backend.gain_history(voice).last(), Some(&0.0));
    }
    assert_eq!(backend.live_voices(), 1);
    assert_eq!(completions(&events, Emotion::Happy), 1);
    assert_eq!(
        controller.channel(ChannelRole::Primary).state(),
        ChannelState::Sustained
    );
}

#[test]
fn test_fade_out_is_reported_once_even_when_triggered_twice() {
    let mut controller = ready_controller();
    run(&mut controller, ranked(Emotion::Happy, 0.9), None, 0, 2000, 100);
    let voices = controller.backend().voices_for("forest");

    // Input disappears, then disappears again, then a forced stop re-ramps
    let mut events = run(&mut controller, None, None, 2100, 2200, 100);
    controller.stop_all(ms(2300));
    events.extend(controller.tick(ms(2300)));
    events.extend(run(&mut controller, None, None, 2400, 6000, 100));

    assert_eq!(completions(&events, Emotion::Happy), 1);
    assert_eq!(controller.backend().stop_count(voices[0]), 1);
    assert_eq!(controller.backend().live_voices(), 0);
    assert!(controller.is_quiet());
    assert_eq!(
        controller.channel(ChannelRole::Primary).state(),
        ChannelState::Idle
    );
}

#[test]
fn test_never_two_labels_sustained_on_one_channel() {
    let mut controller = ready_controller();
    let inputs = [
        (Emotion::Happy, 0.9),
        (Emotion::Sad, 0.95),
        (Emotion::Neutral, 0.85),
        (Emotion::Happy, 0.9),
    ];

    let mut t = 0;
    for (emotion, value) in inputs {
        for _ in 0..25 {
            controller.handle_emotions(ranked(emotion, value), None, ms(t));
            controller.tick(ms(t));

            let primary = controller.channel(ChannelRole::Primary);
            // Only the current label may ramp or sustain
            if let Some(current) = primary.current_emotion() {
                assert_eq!(current, emotion);
            }
            // Voices that are not current are fading, never rising
            assert!(primary.fading_emotions().len() <= 3);
            t += 100;
        }
    }
    assert_eq!(
        controller.channel(ChannelRole::Primary).state(),
        ChannelState::Sustained
    );
}

#[test]
fn test_secondary_lower_bound_is_inclusive() {
    let mut controller = ready_controller();
    run(&mut controller, None, ranked(Emotion::Sad, 0.05), 0, 1000, 50);
    let secondary = controller.channel(ChannelRole::Secondary);
    assert_eq!(secondary.current_emotion(), Some(Emotion::Sad));

    // Secondary voices pan off-centre at the secondary gain
    let backend = controller.backend();
    let violin = backend.voices_for("violin")[0];
    assert!((backend.voice(violin).unwrap().pan - 0.5).abs() < EPSILON);

    let mut controller = ready_controller();
    run(&mut controller, None, ranked(Emotion::Sad, 0.049), 0, 1000, 50);
    assert_eq!(
        controller.channel(ChannelRole::Secondary).current_emotion(),
        None
    );
    assert_eq!(controller.backend().play_count(), 0);
}

#[test]
fn test_threshold_boundaries_at_point_eight() {
    let mut controller = ready_controller();
    run(
        &mut controller,
        ranked(Emotion::Happy, 0.8),
        ranked(Emotion::Sad, 0.8),
        0,
        1000,
        50,
    );
    assert_eq!(
        controller.channel(ChannelRole::Primary).current_emotion(),
        Some(Emotion::Happy)
    );
    assert_eq!(
        controller.channel(ChannelRole::Secondary).current_emotion(),
        None
    );
}

#[test]
fn test_confidence_leaving_gate_fades_out() {
    let mut controller = ready_controller();
    run(&mut controller, ranked(Emotion::Happy, 0.9), None, 0, 2000, 100);
    run(&mut controller, ranked(Emotion::Happy, 0.7), None, 2100, 2100, 100);

    let primary = controller.channel(ChannelRole::Primary);
    assert_eq!(primary.current_emotion(), None);
    assert_eq!(primary.state(), ChannelState::FadingOut);
}

#[test]
fn test_activation_ignored_until_samples_loaded() {
    let mut controller =
        CrossfadeController::new(&InstallationConfig::default(), RecordingBackend::new());
    assert!(!controller.is_ready());

    run(&mut controller, ranked(Emotion::Happy, 0.9), None, 0, 1000, 100);
    assert_eq!(
        controller.channel(ChannelRole::Primary).state(),
        ChannelState::Idle
    );
    assert_eq!(controller.backend().play_count(), 0);

    controller.install_samples(default_bank());
    run(&mut controller, ranked(Emotion::Happy, 0.9), None, 1100, 1100, 100);
    assert_eq!(
        controller.channel(ChannelRole::Primary).current_emotion(),
        Some(Emotion::Happy)
    );
}

#[test]
fn test_label_without_buffers_keeps_prior_state() {
    let mut controller = ready_controller();
    run(&mut controller, ranked(Emotion::Happy, 0.9), None, 0, 2000, 100);

    // No samples for angry in the bank
    run(&mut controller, ranked(Emotion::Angry, 0.95), None, 2100, 3000, 100);
    let primary = controller.channel(ChannelRole::Primary);
    assert_eq!(primary.current_emotion(), Some(Emotion::Happy));
    assert!(primary.fading_emotions().is_empty());
    assert_eq!(primary.state(), ChannelState::Sustained);
}

#[test]
fn test_superseded_activation_never_plays() {
    let mut controller = ready_controller();
    let mut events = run(&mut controller, ranked(Emotion::Happy, 0.9), None, 0, 0, 100);
    events.extend(run(&mut controller, ranked(Emotion::Sad, 0.9), None, 100, 1500, 100));

    assert!(events.contains(&(
        ChannelRole::Primary,
        ChannelEvent::ActivationCancelled { emotion: Emotion::Happy }
    )));
    let backend = controller.backend();
    assert!(backend.voices_for("forest").is_empty());
    assert!(backend.voices_for("flute").is_empty());
    assert_eq!(backend.voices_for("violin").len(), 1);
    assert_eq!(completions(&events, Emotion::Happy), 0);
}

#[test]
fn test_channels_run_independently() {
    let mut controller = ready_controller();
    run(
        &mut controller,
        ranked(Emotion::Happy, 0.9),
        ranked(Emotion::Sad, 0.3),
        0,
        2500,
        100,
    );
    assert_eq!(
        controller.channel(ChannelRole::Primary).state(),
        ChannelState::Sustained
    );
    assert_eq!(
        controller.channel(ChannelRole::Secondary).state(),
        ChannelState::Sustained
    );

    // Secondary target gain for sad comes from the table
    let backend = controller.backend();
    let violin = backend.voices_for("violin")[0];
    assert!((backend.gain(violin).unwrap() - 0.5).abs() < EPSILON);
}
