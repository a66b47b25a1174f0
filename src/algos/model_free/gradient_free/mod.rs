pub mod off_policy;
pub mod on_policy;

use super::MdpSimulator;
use crate::common::defs::*;
use crate::error::Result;
use tracing::{debug, info};

/// One step of a sampled episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeEvent {
    pub s: Discrete,
    pub a: Discrete,
    pub r: Continous,
}

/// Resets the simulator and steps it with `choose` until it reports done or
/// `max_steps` steps have been taken.
pub(crate) fn generate_episode<F>(
    env: &mut dyn MdpSimulator,
    max_steps: Option<usize>,
    mut choose: F,
) -> Result<Vec<EpisodeEvent>>
where
    F: FnMut(Discrete) -> Discrete,
{
    let mut episode = vec![];
    let mut s = env.reset();
    loop {
        let a = choose(s);
        let si = env.step(a)?;
        episode.push(EpisodeEvent { s, a, r: si.reward });
        s = si.next_state;

        if si.done || max_steps.is_some_and(|m| episode.len() >= m) {
            return Ok(episode);
        }
    }
}

pub(crate) fn log_progress(
    solver: &'static str,
    episode: usize,
    n_episodes: usize,
    reward: Continous,
) {
    if episode % 1000 == 0 {
        info!(solver, episode, n_episodes, reward, "training");
    } else if episode % 100 == 0 {
        debug!(solver, episode, reward, "training");
    }
}
