//! # Kinematics Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use arm_lib::arm_ctrl::{
    compute_end_effector, end_effector_transform, solve, ArmGeometry, JointAngles,
};
use nalgebra::Point3;

fn kinematics_benchmark(c: &mut Criterion) {
    let geometry = ArmGeometry::default();
    let angles = JointAngles::new(35.0, -40.0, -70.0, 0.5);
    let target = Point3::new(15.0, 0.75, 0.0);

    c.bench_function("forward_kinematics::compute_end_effector", |b| {
        b.iter(|| compute_end_effector(black_box(&angles), black_box(&geometry)))
    });

    c.bench_function("forward_kinematics::end_effector_transform", |b| {
        b.iter(|| end_effector_transform(black_box(&angles), black_box(&geometry)))
    });

    c.bench_function("inverse_kinematics::solve", |b| {
        b.iter(|| solve(black_box(&target), black_box(&geometry)))
    });

    // Out of reach targets take the clamping path
    let far_target = Point3::new(60.0, 10.0, -20.0);
    c.bench_function("inverse_kinematics::solve::clamped", |b| {
        b.iter(|| solve(black_box(&far_target), black_box(&geometry)))
    });
}

criterion_group!(benches, kinematics_benchmark);
criterion_main!(benches);
