// Draft tracking: picks, seat order, rosters, derived state, and the feed poller.

pub mod order;
pub mod pick;
pub mod roster;
pub mod state;
pub mod tracker;
