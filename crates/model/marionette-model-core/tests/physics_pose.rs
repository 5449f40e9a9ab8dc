use marionette_model_core::{
    assets::{
        ModelData, PhysicsData, PhysicsHairData, PhysicsSetupData, PhysicsSourceData,
        PhysicsSourceKind, PhysicsTargetData, PhysicsTargetKind, PoseData,
    },
    config::{PhysicsConfig, PoseConfig},
    inputs::InputState,
    model::Model,
    params::{ParameterDef, ParameterStore},
    physics::Physics,
    pose::Pose,
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

fn pendulum_params() -> ParameterStore {
    ParameterStore::from_defs(&[
        ParameterDef::new("PARAM_ANGLE_X", -30.0, 30.0, 0.0),
        ParameterDef::new("PARAM_HAIR", -90.0, 90.0, 0.0),
    ])
    .unwrap()
}

fn pendulum() -> PhysicsData {
    PhysicsData {
        gravity: 9.8,
        physics_hair: vec![PhysicsHairData {
            comment: Some("single".into()),
            setup: PhysicsSetupData {
                length: 1.0,
                regist: 2.0,
                mass: 1.0,
            },
            src: vec![PhysicsSourceData {
                id: "PARAM_ANGLE_X".into(),
                ptype: PhysicsSourceKind::X,
                scale: 0.01,
                weight: 1.0,
            }],
            targets: vec![PhysicsTargetData {
                id: "PARAM_HAIR".into(),
                ptype: PhysicsTargetKind::Angle,
                scale: 1.0,
                weight: 1.0,
            }],
        }],
    }
}

#[test]
fn tilt_settles_at_rotated_gravity() {
    let cfg = PhysicsConfig::default();
    let mut p = pendulum_params();
    let mut physics = Physics::from_data(pendulum(), &cfg, &p);
    assert!(physics.is_enabled());

    let input = InputState {
        accel: [1.0, 0.0, 0.0],
        drag: [0.0, 0.0],
    };
    for t in (0..10_000u64).step_by(16) {
        physics.update(&mut p, &input, t);
    }
    approx(p.value("PARAM_HAIR").unwrap(), cfg.accel_gravity_deg, 1.0);
    approx(physics.hairs()[0].angle_deg(), cfg.accel_gravity_deg, 1.0);
}

#[test]
fn moving_anchor_swings_tip_the_other_way() {
    let mut p = pendulum_params();
    let mut physics = Physics::from_data(pendulum(), &PhysicsConfig::default(), &p);
    physics.update(&mut p, &InputState::default(), 0);
    p.set_value("PARAM_ANGLE_X", 30.0, 1.0);
    physics.update(&mut p, &InputState::default(), 16);
    physics.update(&mut p, &InputState::default(), 32);
    // the anchor moved towards +x, so the tip trails behind
    assert!(p.value("PARAM_HAIR").unwrap() < 0.0);
}

#[test]
fn long_frames_are_capped_and_stay_stable() {
    let mut p = pendulum_params();
    let mut physics = Physics::from_data(pendulum(), &PhysicsConfig::default(), &p);
    let input = InputState {
        accel: [1.0, 1.0, 1.0],
        drag: [0.0, 0.0],
    };
    physics.update(&mut p, &input, 0);
    physics.update(&mut p, &input, 1_000_000);
    physics.update(&mut p, &input, 5_000_000);
    let angle = physics.hairs()[0].angle_deg();
    assert!(angle.is_finite());
    assert!(angle.abs() <= 180.0);
}

#[test]
fn physics_fixtures_enable_and_disable() {
    let p = haru_params();
    let cfg = PhysicsConfig::default();
    let ok: PhysicsData = marionette_test_fixtures::physics::load("haru").unwrap();
    let broken: PhysicsData = marionette_test_fixtures::physics::load("broken").unwrap();

    let physics = Physics::from_data(ok, &cfg, &p);
    assert!(physics.is_enabled());
    assert_eq!(physics.hairs().len(), 2);
    assert!(!Physics::from_data(broken, &cfg, &p).is_enabled());
}

#[test]
fn reset_returns_to_rest() {
    let mut p = pendulum_params();
    let mut physics = Physics::from_data(pendulum(), &PhysicsConfig::default(), &p);
    let tilt = InputState {
        accel: [1.0, 0.0, 0.0],
        drag: [0.0, 0.0],
    };
    for t in (0..1_000u64).step_by(16) {
        physics.update(&mut p, &tilt, t);
    }
    assert!(physics.hairs()[0].angle_deg() > 1.0);
    physics.reset();
    assert_eq!(physics.hairs()[0].angle_deg(), 0.0);
    assert_eq!(physics.hairs()[0].tip(), [0.0, -1.0]);
}

#[test]
fn pose_switch_completes_after_fade() {
    let mut p = haru_params();
    let data: PoseData = marionette_test_fixtures::poses::load("haru").unwrap();
    let mut pose = Pose::from_data(data, &PoseConfig::default(), &p).unwrap();
    assert_eq!(pose.fade_ms(), 500.0);

    pose.update(&mut p, 0);
    let right_a = p.part_opacity("PARTS_01_ARM_R_A");
    let right_b = p.part_opacity("PARTS_01_ARM_R_B");
    assert_eq!(p.part_opacity("PARTS_01_ARM_L_A"), Some(1.0));
    assert_eq!(p.part_opacity("PARTS_01_SLEEVE_L_A"), Some(1.0));

    pose.set_pose("arm_l", 1).unwrap();
    pose.update(&mut p, 1000);
    pose.update(&mut p, 1250);
    approx(p.part_opacity("PARTS_01_ARM_L_A").unwrap(), 0.5, 1e-6);
    approx(p.part_opacity("PARTS_01_ARM_L_B").unwrap(), 0.5, 1e-6);

    pose.update(&mut p, 1500);
    assert_eq!(p.part_opacity("PARTS_01_ARM_L_A"), Some(0.0));
    assert_eq!(p.part_opacity("PARTS_01_ARM_L_B"), Some(1.0));
    assert_eq!(p.part_opacity("PARTS_01_SLEEVE_L_A"), Some(0.0));
    assert_eq!(p.part_opacity("PARTS_01_ARM_R_A"), right_a);
    assert_eq!(p.part_opacity("PARTS_01_ARM_R_B"), right_b);
    assert_eq!(pose.group("arm_l").unwrap().previous_index(), Some(0));
}

#[test]
fn unnamed_group_is_keyed_by_first_part() {
    let p = haru_params();
    let data: PoseData = marionette_test_fixtures::poses::load("haru").unwrap();
    let mut pose = Pose::from_data(data, &PoseConfig::default(), &p).unwrap();
    assert!(pose.group("PARTS_01_ARM_R_A").is_some());
    pose.set_pose_by_part("PARTS_01_ARM_R_B").unwrap();
    assert_eq!(pose.group("PARTS_01_ARM_R_A").unwrap().active_index(), 1);
    // reselecting the active part cancels the pending switch
    pose.set_pose("PARTS_01_ARM_R_A", 0).unwrap();
    assert_eq!(pose.group("PARTS_01_ARM_R_A").unwrap().active_index(), 0);
}
