// Reward resolver - maps a level onto the role rewards it has earned.
//
// Rewards are sticky: every threshold at or below the level counts, so the
// caller can re-evaluate on every gain and diff against the roles the member
// already holds instead of tracking what was granted.

use super::leveling_models::Reward;

/// All rewards whose threshold is at or below `level`, ordered by level then role id.
pub fn earned_rewards(level: u32, rewards: &[Reward]) -> Vec<Reward> {
    let mut earned: Vec<Reward> = rewards
        .iter()
        .filter(|reward| reward.reward_level <= level)
        .cloned()
        .collect();
    sort_rewards(&mut earned);
    earned
}

/// Rewards crossed while moving from `previous_level` to `current_level`.
/// Used for level-up announcements; empty when the level did not go up.
pub fn newly_earned(previous_level: u32, current_level: u32, rewards: &[Reward]) -> Vec<Reward> {
    let mut crossed: Vec<Reward> = rewards
        .iter()
        .filter(|reward| {
            reward.reward_level > previous_level && reward.reward_level <= current_level
        })
        .cloned()
        .collect();
    sort_rewards(&mut crossed);
    crossed
}

/// The lowest reward still above `level`, if any.
pub fn next_reward(level: u32, rewards: &[Reward]) -> Option<&Reward> {
    rewards
        .iter()
        .filter(|reward| reward.reward_level > level)
        .min_by_key(|reward| (reward.reward_level, reward.role_id))
}

pub fn sort_rewards(rewards: &mut [Reward]) {
    rewards.sort_by_key(|reward| (reward.reward_level, reward.role_id));
}
