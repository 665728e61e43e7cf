use super::*;

#[test]
fn draws_250w_and_completes() {
    let tunables = base_tunables();
    let arena = arena_with_jobs(1, &tunables);
    let mut module = grower(&arena, &tunables);
    let power = bus(&tunables);
    let job = arena.handles().next().unwrap();
    module.enqueue(job);

    for t in 0..u64::from(tunables.growth_ticks) {
        let row = step(&mut module, t, &tunables, &power).unwrap();
        assert_eq!(row.module, Stage::CrystalGrowth);
        assert_eq!(row.phase_index, 2);
    }

    assert!(matches!(module.state(), ModuleState::Completed { .. }));
    let phase = arena.phase_snapshot(job, Stage::CrystalGrowth);
    assert_eq!(
        phase.energy_used,
        u64::from(tunables.growth_ticks) * u64::from(tunables.growth_w)
    );
}

#[test]
fn never_calibrates_or_cools_down() {
    let tunables = base_tunables();
    let arena = arena_with_jobs(1, &tunables);
    let mut module = grower(&arena, &tunables);
    let power = bus(&tunables);
    module.enqueue(arena.handles().next().unwrap());

    let mut t = 0;
    while !matches!(module.state(), ModuleState::Completed { .. }) {
        let row = step(&mut module, t, &tunables, &power).unwrap();
        assert!(!row.calibrating);
        assert_eq!(row.cooldown_remaining, 0);
        t += 1;
    }
    module.take_finished().unwrap();
    assert!(
        matches!(module.state(), ModuleState::Idle),
        "growth goes straight back to idle after handoff"
    );
}

#[test]
fn outage_interrupts_without_poisoning() {
    let tunables = Tunables {
        battery_capacity_mwh: 0,
        solar_sunlight_w: 0,
        solar_eclipse_w: 0,
        ..base_tunables()
    };
    let arena = arena_with_jobs(1, &tunables);
    let mut module = grower(&arena, &tunables);
    let power = bus(&tunables);
    let job = arena.handles().next().unwrap();
    module.enqueue(job);

    step(&mut module, 0, &tunables, &power).unwrap();
    let phase = arena.phase_snapshot(job, Stage::CrystalGrowth);
    assert!(phase.was_interrupted);
    assert!(
        !phase.defective,
        "growth tolerates outages, unlike the implanter"
    );
}
