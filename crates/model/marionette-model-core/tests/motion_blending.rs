use std::sync::Arc;

use marionette_model_core::{
    assets::{CurveData, ExpressionData, Keyframe, ModelData, MotionData},
    config::MotionConfig,
    motion::{player::MotionPlayer, Motion},
    model::Model,
    params::{ParameterDef, ParameterStore},
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn haru_params() -> ParameterStore {
    let data: ModelData =
        marionette_test_fixtures::models::load("haru").expect("load haru model fixture");
    Model::from_data(data)
        .expect("build haru model")
        .params()
        .clone()
}

fn fixture_motion(name: &str) -> Arc<Motion> {
    let data: MotionData =
        marionette_test_fixtures::motions::load(name).expect("load motion fixture");
    Arc::new(Motion::standard_from_data(data).expect("build motion"))
}

fn constant(param: &str, v: f32, fade_in: f32, fade_out: f32) -> Arc<Motion> {
    Arc::new(
        Motion::standard_from_data(MotionData {
            fade_in_ms: Some(fade_in),
            fade_out_ms: Some(fade_out),
            looping: true,
            duration_ms: Some(1000.0),
            curves: vec![CurveData {
                param: param.to_string(),
                keys: vec![Keyframe::new(0.0, v)],
            }],
        })
        .unwrap(),
    )
}

#[test]
fn cross_fade_is_weighted_sum_of_both_motions() {
    let mut p = ParameterStore::from_defs(&[ParameterDef::new("P", -100.0, 100.0, 50.0)]).unwrap();
    let mut player = MotionPlayer::new("main", &MotionConfig::default());

    player.start_motion(constant("P", 0.0, 0.0, 200.0), true);
    player.update(&mut p, 0);
    approx(p.value("P").unwrap(), 0.0, 1e-6);

    player.start_motion(constant("P", 10.0, 200.0, 200.0), true);
    player.update(&mut p, 100);
    approx(p.value("P").unwrap(), 0.0, 1e-6);

    // quarter of the way in: 0.75 * 0 + 0.25 * 10
    player.update(&mut p, 150);
    approx(p.value("P").unwrap(), 2.5, 1e-5);

    // midpoint
    player.update(&mut p, 200);
    approx(p.value("P").unwrap(), 5.0, 1e-5);

    player.update(&mut p, 300);
    approx(p.value("P").unwrap(), 10.0, 1e-5);
    assert_eq!(player.entries().len(), 1);
}

#[test]
fn non_looping_motion_ends_on_final_key() {
    let mut p = haru_params();
    let mut player = MotionPlayer::new("main", &MotionConfig::default());
    let wave = fixture_motion("wave");
    assert_eq!(wave.duration_ms(), Some(1000.0));

    player.start_motion(Arc::clone(&wave), true);
    assert!(player.update(&mut p, 0));
    assert!(player.update(&mut p, 500));
    approx(p.value("PARAM_ARM_L").unwrap(), 10.0, 1e-5);

    let playing = player.update(&mut p, 1000);
    assert!(!playing);
    assert!(player.is_finished());
    approx(p.value("PARAM_ARM_L").unwrap(), 5.0, 1e-5);
    approx(p.value("PARAM_ANGLE_X").unwrap(), -20.0, 1e-5);
    assert!(player.entries().is_empty());
}

#[test]
fn kept_entry_holds_final_key_past_duration() {
    let mut p = haru_params();
    let mut player = MotionPlayer::new("main", &MotionConfig::default());
    let handle = player
        .start_motion(fixture_motion("wave"), false)
        .expect("start wave");

    player.update(&mut p, 0);
    player.update(&mut p, 5000);
    assert!(player.is_finished_handle(handle));
    assert_eq!(player.entries().len(), 1);

    p.reset_to_defaults();
    player.update(&mut p, 9000);
    approx(p.value("PARAM_ARM_L").unwrap(), 5.0, 1e-5);
}

#[test]
fn looping_motion_wraps_and_never_finishes() {
    let mut p = haru_params();
    let mut player = MotionPlayer::new("main", &MotionConfig::default());
    player.start_motion(fixture_motion("idle"), true);

    player.update(&mut p, 0);
    // 2500 ms wraps to 500 ms: halfway up the 0 -> 10 ramp
    assert!(player.update(&mut p, 2500));
    approx(p.value("PARAM_ANGLE_X").unwrap(), 5.0, 1e-4);
    assert!(!player.is_finished());
}

#[test]
fn stop_all_clears_queue() {
    let mut p = haru_params();
    let mut player = MotionPlayer::new("main", &MotionConfig::default());
    player.start_motion(fixture_motion("idle"), true);
    player.start_motion(fixture_motion("wave"), true);
    player.update(&mut p, 0);
    player.stop_all_motions();
    assert!(player.is_finished());
    assert!(!player.update(&mut p, 100));
}

#[test]
fn expression_overlay_fades_out_on_replacement() {
    let mut p = haru_params();
    let mut player = MotionPlayer::new("expression", &MotionConfig::default());
    let smile: ExpressionData =
        marionette_test_fixtures::expressions::load("smile").expect("load smile");
    let smile = Arc::new(Motion::expression_from_data(smile).unwrap());
    let plain = Arc::new(Motion::expression_from_data(ExpressionData::default()).unwrap());

    player.start_motion(smile, false);
    player.update(&mut p, 0);
    p.reset_to_defaults();
    player.update(&mut p, 300);
    approx(p.value("PARAM_MOUTH_FORM").unwrap(), 1.0, 1e-6);
    approx(p.value("PARAM_BROW_L_Y").unwrap(), 0.5, 1e-6);

    // empty expressions are ignored rather than clearing the overlay
    assert!(player.start_motion(plain, false).is_none());
    assert!(!player.entries()[0].is_fading_out());
}

#[test]
fn finished_motion_keeps_fading_out_under_its_successor() {
    let mut p = ParameterStore::from_defs(&[ParameterDef::new("P", -100.0, 100.0, 50.0)]).unwrap();
    let mut player = MotionPlayer::new("main", &MotionConfig::default());
    let short = Arc::new(
        Motion::standard_from_data(MotionData {
            fade_in_ms: Some(0.0),
            fade_out_ms: Some(400.0),
            looping: false,
            duration_ms: Some(1000.0),
            curves: vec![CurveData {
                param: "P".to_string(),
                keys: vec![Keyframe::new(0.0, 0.0)],
            }],
        })
        .unwrap(),
    );

    player.start_motion(short, true);
    player.update(&mut p, 0);
    player.start_motion(constant("P", 10.0, 400.0, 400.0), true);
    player.update(&mut p, 900);

    // the first motion ends at 1000 but still holds 0.75 of the blend
    player.update(&mut p, 1000);
    approx(p.value("P").unwrap(), 2.5, 1e-5);
    assert_eq!(player.entries().len(), 2);
    assert!(player.entries()[0].is_finished());

    player.update(&mut p, 1016);
    approx(p.value("P").unwrap(), 2.9, 1e-5);
    assert_eq!(player.entries().len(), 2);

    player.update(&mut p, 1300);
    approx(p.value("P").unwrap(), 10.0, 1e-5);
    assert_eq!(player.entries().len(), 1);
}

#[test]
fn zero_length_motion_finishes_after_its_fade_in() {
    let mut p = ParameterStore::from_defs(&[ParameterDef::new("P", -100.0, 100.0, 0.0)]).unwrap();
    let mut player = MotionPlayer::new("main", &MotionConfig::default());
    let pose = Arc::new(
        Motion::standard_from_data(MotionData {
            fade_in_ms: Some(100.0),
            fade_out_ms: None,
            looping: false,
            duration_ms: Some(0.0),
            curves: vec![CurveData {
                param: "P".to_string(),
                keys: vec![Keyframe::new(0.0, 4.0)],
            }],
        })
        .unwrap(),
    );

    player.start_motion(pose, true);
    assert!(player.update(&mut p, 0));
    assert_eq!(player.entries().len(), 1);

    assert!(player.update(&mut p, 50));
    approx(p.value("P").unwrap(), 2.0, 1e-6);

    assert!(!player.update(&mut p, 100));
    approx(p.value("P").unwrap(), 4.0, 1e-6);
    assert!(player.entries().is_empty());
}
