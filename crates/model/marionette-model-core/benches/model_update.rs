use criterion::{black_box, criterion_group, criterion_main, Criterion};
use marionette_model_core::{
    config::Config, motion::player::MotionPriority, platform::MemoryPlatform, BaseModel,
};
use marionette_test_fixtures as fixtures;

fn loaded_model() -> BaseModel<MemoryPlatform> {
    let mut platform = MemoryPlatform::new();
    for (path, bytes) in fixtures::all_files().expect("read fixtures") {
        platform.insert(path, bytes);
    }
    let mut model = BaseModel::new(platform, Config::default());
    model
        .load_model_data(&fixtures::models::rel("haru").unwrap())
        .expect("load model");
    model
        .load_motion(Some("idle"), &fixtures::motions::rel("idle").unwrap())
        .expect("load idle");
    model
        .load_expression("smile", &fixtures::expressions::rel("smile").unwrap())
        .expect("load smile");
    model
        .load_physics(&fixtures::physics::rel("haru").unwrap())
        .expect("load physics");
    model
        .load_pose(&fixtures::poses::rel("haru").unwrap())
        .expect("load pose");
    model
}

fn bench_model_update(c: &mut Criterion) {
    let mut model = loaded_model();
    model.start_motion("idle", MotionPriority::Idle);
    model.set_expression("smile");
    model.set_accel(0.3, -0.2, 0.1);
    model.set_drag(0.4, 0.1);

    let mut now = 0u64;
    c.bench_function("model_update_frame", |b| {
        b.iter(|| {
            now += 16;
            model.update(black_box(now));
        })
    });
}

criterion_group!(benches, bench_model_update);
criterion_main!(benches);
