use super::*;

fn power_tunables() -> Tunables {
    // Small battery so drain effects are visible quickly.
    Tunables {
        battery_capacity_mwh: 1_000,
        solar_sunlight_w: 300,
        solar_eclipse_w: 0,
        max_battery_draw_w: 300,
        ..base_tunables()
    }
}

#[test]
fn refresh_budget_is_solar_plus_capped_battery_draw() {
    let mut power = PowerSubsystem::new(&power_tunables());
    power.refresh(0, OrbitPhase::Sunlight);
    // 300 solar + min(300, 1000 battery) = 600
    assert_eq!(power.budget_this_tick_w(), 600);
    assert_eq!(power.produced_this_tick_w(), 300);
}

#[test]
fn refresh_in_eclipse_budget_is_battery_only() {
    let mut power = PowerSubsystem::new(&power_tunables());
    power.refresh(0, OrbitPhase::Eclipse);
    assert_eq!(power.produced_this_tick_w(), 0);
    assert_eq!(power.budget_this_tick_w(), 300);
}

#[test]
fn refresh_battery_draw_limited_by_remaining_charge() {
    let tunables = Tunables {
        battery_capacity_mwh: 100,
        ..power_tunables()
    };
    let mut power = PowerSubsystem::new(&tunables);
    power.refresh(0, OrbitPhase::Eclipse);
    assert_eq!(
        power.budget_this_tick_w(),
        100,
        "draw potential is the lesser of cap and charge"
    );
}

#[test]
fn refresh_is_idempotent_before_any_consume() {
    let mut power = PowerSubsystem::new(&power_tunables());
    power.refresh(0, OrbitPhase::Sunlight);
    let battery = power.battery_mwh();
    let budget = power.budget_this_tick_w();
    power.refresh(0, OrbitPhase::Sunlight);
    assert_eq!(power.battery_mwh(), battery, "no double battery credit");
    assert_eq!(power.budget_this_tick_w(), budget);
}

#[test]
fn consume_spends_solar_before_battery() {
    let mut power = PowerSubsystem::new(&power_tunables());
    power.refresh(0, OrbitPhase::Sunlight);
    let battery_before = power.battery_mwh();

    // 200 W fits entirely in the 300 W solar output.
    power.consume(200).unwrap();
    assert_eq!(power.battery_mwh(), battery_before, "solar covers it all");

    // The next 200 W only has 100 W of solar left; 100 comes from battery.
    power.consume(200).unwrap();
    assert_eq!(power.battery_mwh(), battery_before - 100);
}

#[test]
fn consume_order_does_not_change_aggregate_outcome() {
    let run = |draws: &[u32]| {
        let mut power = PowerSubsystem::new(&power_tunables());
        power.refresh(0, OrbitPhase::Sunlight);
        for &w in draws {
            power.consume(w).unwrap();
        }
        (power.battery_mwh(), power.budget_this_tick_w())
    };
    assert_eq!(run(&[300, 200]), run(&[200, 300]));
}

#[test]
fn consume_failure_leaves_state_unchanged() {
    let mut power = PowerSubsystem::new(&power_tunables());
    power.refresh(0, OrbitPhase::Eclipse);
    let battery = power.battery_mwh();
    let budget = power.budget_this_tick_w();

    let err = power.consume(budget + 1).unwrap_err();
    assert_eq!(
        err,
        PowerError::Insufficient {
            requested: budget + 1,
            budget,
        }
    );
    assert_eq!(power.battery_mwh(), battery);
    assert_eq!(power.budget_this_tick_w(), budget);
}

#[test]
fn consumed_total_equals_budget_delta() {
    let mut power = PowerSubsystem::new(&power_tunables());
    power.refresh(0, OrbitPhase::Sunlight);
    let budget_after_refresh = power.budget_this_tick_w();

    let draws = [300_u32, 200, 100];
    let mut consumed = 0;
    for w in draws {
        if power.consume(w).is_ok() {
            consumed += w;
        }
    }
    assert_eq!(
        consumed,
        budget_after_refresh - power.budget_this_tick_w(),
        "accepted reservations account for the whole budget delta"
    );
}

#[test]
fn battery_never_exceeds_capacity_or_goes_negative() {
    let tunables = power_tunables();
    let mut power = PowerSubsystem::new(&tunables);
    for t in 0..400 {
        let phase = orbit_phase(t, &tunables);
        power.refresh(t, phase);
        // Alternate a heavy and a light consumer.
        let _ = power.consume(300);
        let _ = power.consume(200);
        assert!(power.battery_mwh() <= tunables.battery_capacity_mwh);
        // u64 battery cannot be negative; the meaningful check is that the
        // budget never underflows either.
        assert!(power.budget_this_tick_w() <= 600);
    }
}

#[test]
fn eclipse_drains_battery_at_the_draw_cap() {
    let mut power = PowerSubsystem::new(&power_tunables());
    // 1000 mWh battery, 300 W draws: 300, 300, 300, then only 100 left.
    for t in 0..3 {
        power.refresh(t, OrbitPhase::Eclipse);
        power.consume(300).unwrap();
    }
    assert_eq!(power.battery_mwh(), 100);

    power.refresh(3, OrbitPhase::Eclipse);
    assert_eq!(power.budget_this_tick_w(), 100);
    assert!(!power.can_satisfy(300));
    assert!(power.consume(300).is_err(), "only 100 mWh remains");
}

#[test]
fn full_sunlight_steady_draw_never_touches_battery() {
    let tunables = Tunables {
        battery_capacity_mwh: 250_000,
        ..power_tunables()
    };
    let mut power = PowerSubsystem::new(&tunables);
    for t in 0..45 {
        power.refresh(t, OrbitPhase::Sunlight);
        power.consume(300).unwrap();
    }
    assert_eq!(
        power.battery_mwh(),
        250_000,
        "a 300 W load under 300 W sun leaves the battery untouched"
    );
}

#[test]
fn shared_bus_trait_consumes_atomically() {
    let power = bus(&power_tunables());
    power.lock().refresh(0, OrbitPhase::Sunlight);

    let source: &dyn PowerSource = &power;
    assert!(source.can_satisfy(600));
    source.try_consume(600).unwrap();
    assert!(source.try_consume(1).is_err());
    assert_eq!(source.reading().budget_this_tick_w, 0);
}
