use criterion::{Criterion, black_box, criterion_group, criterion_main};

use wollok_host::ast::environment::{Environment, EnvironmentBuilder};
use wollok_host::validator;

/// One package of `classes` classes, each with a field, an accessor pair and
/// a program exercising them. Roughly the shape of a student project.
fn synthetic_environment(classes: usize) -> Environment {
    let mut builder = EnvironmentBuilder::new();
    let mut members = Vec::new();
    for index in 0..classes {
        let initializer = builder.number(index as f64);
        let energy = builder.field("energy", initializer);
        let reference = builder.reference("energy");
        let getter_body = builder.body(vec![reference]);
        let getter = builder.method("currentEnergy", vec![], Some(getter_body));
        let amount = builder.parameter("amount");
        let target = builder.reference("energy");
        let value = builder.reference("amount");
        let assignment = builder.assignment(target, value);
        let setter_body = builder.body(vec![assignment]);
        let setter = builder.method("currentEnergy", vec![amount], Some(setter_body));
        let class = builder.class(
            &format!("Bird{index}"),
            None,
            vec![],
            vec![energy, getter, setter],
        );
        members.push(class);
    }
    let game_reference = builder.reference("game");
    let start = builder.send(game_reference, "doStart", vec![]);
    let program_body = builder.body(vec![start]);
    let program = builder.program("main", program_body);
    members.push(program);
    let package = builder.package("aviary", members);
    builder.build(vec![package])
}

fn bench_validate(c: &mut Criterion) {
    for classes in [10usize, 100] {
        let environment = synthetic_environment(classes);
        c.bench_function(&format!("validate_{classes}_classes"), |b| {
            b.iter(|| {
                let problems = validator::validate(black_box(&environment));
                black_box(problems);
            })
        });
    }
}

fn bench_link(c: &mut Criterion) {
    c.bench_function("link_100_classes", |b| {
        b.iter(|| {
            let environment = synthetic_environment(black_box(100));
            black_box(environment);
        })
    });
}

criterion_group!(benches, bench_validate, bench_link);
criterion_main!(benches);
