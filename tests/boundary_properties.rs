mod common;

use common::{row, ScriptedCore};
use lockstep_gym::{wrap, WrapperState, REWARD_METRIC};
use ndarray::Array2;
use proptest::prelude::*;

/// A script of `steps` rows over `lanes` lanes: (done flags, rewards in multiples of 0.5).
fn script(max_lanes: usize, max_steps: usize) -> impl Strategy<Value = (Vec<Vec<f32>>, Vec<Vec<f32>>)> {
    (1..=max_lanes, 1..=max_steps).prop_flat_map(|(lanes, steps)| {
        let done = proptest::collection::vec(proptest::collection::vec(prop_oneof![Just(0.0f32), Just(1.0f32)], lanes), steps);
        let reward = proptest::collection::vec(proptest::collection::vec((-8i32..8).prop_map(|r| r as f32 * 0.5), lanes), steps);
        (done, reward)
    })
}

fn run(core: ScriptedCore, actions: &[Array2<f32>]) -> Vec<WrapperState> {
    let lanes = core.lane_ids.len();
    let (mut state, wrapper) = wrap(core, lanes, 0).unwrap();
    let mut states = Vec::with_capacity(actions.len() + 1);
    states.push(state.clone());
    for a in actions {
        state = wrapper.step(&state, a.view()).unwrap();
        states.push(state.clone());
    }
    states
}

fn actions_for(done: &[Vec<f32>]) -> Vec<Array2<f32>> {
    done.iter()
        .enumerate()
        .map(|(t, d)| Array2::from_shape_fn((d.len(), 2), |(i, j)| ((t + i + j) % 5) as f32 * 0.5 - 1.0))
        .collect()
}

proptest! {
    // completed episodes equal the number of done lane-steps
    #[test]
    fn completed_count_matches_done_flags((done, reward) in script(6, 12)) {
        let expected: u64 = done.iter().flatten().map(|&d| d as u64).sum();
        let actions = actions_for(&done);
        let states = run(ScriptedCore::new(done, reward), &actions);
        prop_assert_eq!(states.last().unwrap().statistics.completed_episode_count, expected);
        for pair in states.windows(2) {
            prop_assert!(pair[1].statistics.completed_episode_count >= pair[0].statistics.completed_episode_count);
            prop_assert!(pair[1].statistics.completed_episode_step_total >= pair[0].statistics.completed_episode_step_total);
        }
    }

    // an imperative per-lane replay agrees with the masked accumulator
    #[test]
    fn totals_match_imperative_replay((done, reward) in script(5, 10)) {
        let lanes = done[0].len();
        let mut running = vec![0.0f64; lanes];
        let mut steps = vec![0u64; lanes];
        let mut total = 0.0f64;
        let mut step_total = 0u64;
        for (d, r) in done.iter().zip(&reward) {
            for i in 0..lanes {
                running[i] += f64::from(r[i]);
                steps[i] += 1;
                if d[i] == 1.0 {
                    total += running[i];
                    step_total += steps[i];
                    running[i] = f64::from(r[i]);
                    steps[i] = 0;
                }
            }
        }
        let actions = actions_for(&done);
        let end = run(ScriptedCore::new(done, reward), &actions).pop().unwrap();
        prop_assert_eq!(end.statistics.completed_episode_metric_totals[REWARD_METRIC], total);
        prop_assert_eq!(end.statistics.completed_episode_step_total, step_total);
        let lane_sums: Vec<f64> = end.statistics.running_episode_metrics[REWARD_METRIC].iter().map(|&v| f64::from(v)).collect();
        prop_assert_eq!(lane_sums, running);
    }

    // carried-forward fields come from the core for live lanes and from the snapshot for finished ones
    #[test]
    fn finished_lanes_hold_snapshot_values((done, reward) in script(6, 8)) {
        let actions = actions_for(&done);
        let states = run(ScriptedCore::new(done.clone(), reward.clone()), &actions);
        let first = &states[0].simulation;
        for (t, pair) in states.windows(2).enumerate() {
            let (prev, next) = (&pair[0].simulation, &pair[1].simulation);
            for i in 0..done[t].len() {
                prop_assert_eq!(next.done[i], done[t][i]);
                prop_assert_eq!(next.reward[i], reward[t][i]);
                prop_assert_eq!(next.metrics[REWARD_METRIC][i], reward[t][i]);
                prop_assert_eq!(next.metrics["bonus"][i], 2.0 * reward[t][i]);
                if done[t][i] == 1.0 {
                    prop_assert_eq!(row(&next.observation, i), row(&first.observation, i));
                    prop_assert_eq!(next.step_count[i], first.step_count[i]);
                } else {
                    let advanced: Vec<f32> = row(&prev.observation, i).iter().map(|v| v + 1.0).collect();
                    prop_assert_eq!(row(&next.observation, i), advanced);
                    prop_assert_eq!(next.step_count[i], prev.step_count[i] + 1);
                }
            }
        }
    }

    // permuting lanes permutes per-lane outputs and leaves global totals alone
    #[test]
    fn lane_permutation_is_equivariant((done, reward) in script(5, 8), rotate in 0usize..5) {
        let lanes = done[0].len();
        let perm: Vec<usize> = (0..lanes).map(|i| (i + rotate) % lanes).collect();
        let permute = |rows: &[Vec<f32>]| -> Vec<Vec<f32>> {
            rows.iter().map(|r| perm.iter().map(|&p| r[p]).collect()).collect()
        };
        let actions = actions_for(&done);
        let permuted_actions: Vec<Array2<f32>> = actions
            .iter()
            .map(|a| Array2::from_shape_fn(a.dim(), |(i, j)| a[[perm[i], j]]))
            .collect();

        let base = run(ScriptedCore::new(done.clone(), reward.clone()), &actions).pop().unwrap();
        let ids: Vec<u64> = perm.iter().map(|&p| p as u64).collect();
        let core = ScriptedCore::new(permute(&done), permute(&reward)).with_lane_ids(ids);
        let moved = run(core, &permuted_actions).pop().unwrap();

        prop_assert_eq!(&moved.statistics.completed_episode_metric_totals, &base.statistics.completed_episode_metric_totals);
        prop_assert_eq!(moved.statistics.completed_episode_count, base.statistics.completed_episode_count);
        prop_assert_eq!(moved.statistics.completed_episode_step_total, base.statistics.completed_episode_step_total);
        for (i, &p) in perm.iter().enumerate() {
            prop_assert_eq!(row(&moved.simulation.observation, i), row(&base.simulation.observation, p));
            prop_assert_eq!(moved.simulation.step_count[i], base.simulation.step_count[p]);
            prop_assert_eq!(
                moved.statistics.running_episode_metrics[REWARD_METRIC][i],
                base.statistics.running_episode_metrics[REWARD_METRIC][p]
            );
        }
    }

    // identical inputs give identical outputs
    #[test]
    fn stepping_is_deterministic((done, reward) in script(4, 6)) {
        let actions = actions_for(&done);
        let a = run(ScriptedCore::new(done.clone(), reward.clone()), &actions);
        let b = run(ScriptedCore::new(done, reward), &actions);
        prop_assert_eq!(a, b);
    }
}
