//! Fixed timestep simulation tick
//!
//! Order within one tick:
//! 1. Drain the control commands queued by the input source
//! 2. Advance the ocean (control smoothing + clock)
//! 3. Treasures (hover, collection, cooldowns) - collections start a reward
//! 4. Reward timers - an expired reward ends the firework finale
//! 5. Firework engine (mode transitions, salvo, apex, physics)

use super::control::ControlCommand;
use super::mode::ModeEvent;
use super::scene::Scene;
use super::treasure::Collected;
use crate::camera::Projector;

/// What happened during one tick
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub collected: Vec<Collected>,
    pub reward_started: bool,
    pub reward_ended: bool,
}

/// Advance the scene by one fixed timestep
pub fn tick(scene: &mut Scene, projector: &dyn Projector, dt: f32) -> TickReport {
    let mut report = TickReport::default();
    scene.clock += dt as f64;
    scene.tick_count += 1;
    let now = scene.clock;

    // 1. Commands
    let commands: Vec<ControlCommand> = scene.control.drain_commands().collect();
    for command in commands {
        match command {
            ControlCommand::TriggerFirework => scene.fireworks.send(ModeEvent::Fire),
            ControlCommand::TriggerExplode => scene.fireworks.send(ModeEvent::Explode),
            ControlCommand::TriggerTreasureSequence => {
                let event = scene.reward.trigger(now);
                scene.fireworks.send(event);
                report.reward_started = true;
            }
            ControlCommand::SetOceanSpeed(speed) => scene.ocean.set_speed(speed),
            ControlCommand::SetWaveHeight(height) => scene.ocean.set_wave_height(height),
            ControlCommand::SetOceanFlow(rotation) => scene.ocean.set_flow(rotation),
        }
    }

    // 2. Ocean
    scene.ocean.advance(dt);

    // 3. Treasures
    report.collected = scene.treasures.update(
        &mut scene.rng,
        now,
        dt,
        &scene.ocean,
        &scene.control,
        projector,
    );
    if !report.collected.is_empty() {
        let event = scene.reward.trigger(now);
        scene.fireworks.send(event);
        report.reward_started = true;
    }

    // 4. Reward timers
    if scene.reward.update(now) {
        scene.fireworks.end_finale();
        report.reward_ended = true;
    }

    // 5. Fireworks
    scene.fireworks.step(&mut scene.rng, dt);

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::OrbitCamera;
    use crate::consts::SIM_DT;
    use crate::sim::control::Gesture;
    use crate::sim::fireworks::SparkMode;
    use crate::sim::mode::FireworkMode;
    use crate::sim::treasure::TreasureVariant;
    use crate::tuning::{OceanTuning, Tuning};
    use glam::Vec2;

    fn scene() -> Scene {
        let tuning = Tuning {
            ocean: OceanTuning {
                particle_count: 32,
                ..Default::default()
            },
            ..Default::default()
        };
        Scene::new(7, tuning, TreasureVariant::Anchored)
    }

    #[test]
    fn test_fire_command_launches_cluster() {
        let mut scene = scene();
        let camera = OrbitCamera::new(1.0);
        scene.control.trigger_firework();
        tick(&mut scene, &camera, SIM_DT);
        assert!(scene.fireworks.active_rockets() >= 4);
        assert_eq!(scene.mode(), FireworkMode::Idle);
    }

    #[test]
    fn test_explode_command_bursts_airborne_rockets() {
        let mut scene = scene();
        let camera = OrbitCamera::new(1.0);
        scene.control.trigger_firework();
        tick(&mut scene, &camera, SIM_DT);
        tick(&mut scene, &camera, SIM_DT);
        scene.control.trigger_explode();
        tick(&mut scene, &camera, SIM_DT);
        assert_eq!(scene.fireworks.active_rockets(), 0);
        assert!(scene.fireworks.sparks_in_mode(SparkMode::Explosion) > 0);
    }

    #[test]
    fn test_ocean_commands_apply() {
        let mut scene = scene();
        let camera = OrbitCamera::new(1.0);
        scene.control.set_ocean_speed(0.0);
        scene.control.set_wave_height(2.0);
        tick(&mut scene, &camera, SIM_DT);
        assert_eq!(scene.ocean.speed(), 0.0);
        assert_eq!(scene.ocean.time(), 0.0);
        assert!(scene.ocean.height() > 1.0);
    }

    #[test]
    fn test_reward_runs_full_cycle() {
        let mut scene = scene();
        let camera = OrbitCamera::new(1.0);
        scene.control.trigger_treasure_sequence();
        let report = tick(&mut scene, &camera, SIM_DT);
        assert!(report.reward_started);
        assert_eq!(scene.mode(), FireworkMode::Continuous);
        assert!(scene.reward.banner_open());

        let mut ended_at = None;
        for _ in 0..(25 * 60) {
            let report = tick(&mut scene, &camera, SIM_DT);
            if report.reward_ended {
                assert!(ended_at.is_none(), "reward ended twice");
                ended_at = Some(scene.clock);
            }
        }
        let ended_at = ended_at.expect("reward never ended");
        assert!((ended_at - 20.0).abs() < 0.05);
        assert_eq!(scene.mode(), FireworkMode::Idle);
        assert!(!scene.reward.banner_open());
    }

    #[test]
    fn test_collecting_treasure_starts_reward() {
        let mut scene = scene();
        let camera = OrbitCamera::new(1.0);

        // Aim at the centre treasure by searching the cursor plane
        let anchor = scene.treasures.treasures()[1].anchor;
        let y = scene.ocean.surface_height(anchor.x, anchor.y) + 0.3;
        let target = camera.world_to_screen(crate::scene_to_world(glam::Vec3::new(anchor.x, y, anchor.y)));
        let mut best = (f32::MAX, Vec2::ZERO);
        for xi in -100..=100 {
            for yi in -60..=60 {
                let c = Vec2::new(xi as f32 * 0.25, yi as f32 * 0.25);
                let d = camera.world_to_screen(c.extend(0.0)).distance_squared(target);
                if d < best.0 {
                    best = (d, c);
                }
            }
        }
        scene.control.cursor = best.1;
        scene.control.gesture = Gesture::Pinch;

        let mut started = false;
        for _ in 0..10 {
            let report = tick(&mut scene, &camera, SIM_DT);
            started |= report.reward_started;
        }
        assert!(started);
        assert_eq!(scene.treasures.collected(), 1);
        assert_eq!(scene.mode(), FireworkMode::Continuous);
    }
}
