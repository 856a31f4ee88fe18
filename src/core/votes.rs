//! Reaction tallying for posted questions.
//!
//! A posted question carries a 👍 and a 👎 reaction added by the bot itself.
//! Those seed reactions are not counted. When downvotes lead upvotes by the
//! configured margin the question is skipped.

/// Reaction counted as an upvote.
pub const UPVOTE: char = '👍';
/// Reaction counted as a downvote.
pub const DOWNVOTE: char = '👎';

/// Net votes on one question message, excluding the bot's own reactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteTally {
    /// People who reacted 👍
    pub up: u64,
    /// People who reacted 👎
    pub down: u64,
}

/// What to do with the current question after a re-tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDecision {
    /// Leave the question up until the next scheduled post
    Keep,
    /// Replace it with the next question right away
    Skip,
}

/// One reaction group as reported by Discord: the emoji, how many users
/// reacted, and whether the bot is among them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionCount<'a> {
    /// Unicode emoji (custom emoji never count)
    pub emoji: &'a str,
    /// Total users who reacted with it
    pub count: u64,
    /// Whether the bot itself reacted
    pub me: bool,
}

impl VoteTally {
    /// Builds a tally from the reaction groups on a message.
    #[must_use]
    pub fn from_reactions(reactions: &[ReactionCount<'_>]) -> Self {
        reactions.iter().fold(Self::default(), |mut tally, r| {
            let people = r.count.saturating_sub(u64::from(r.me));
            if is_emoji(r.emoji, UPVOTE) {
                tally.up += people;
            } else if is_emoji(r.emoji, DOWNVOTE) {
                tally.down += people;
            }
            tally
        })
    }

    /// Upvotes minus downvotes.
    #[must_use]
    pub fn score(&self) -> i64 {
        i64::try_from(self.up).unwrap_or(i64::MAX) - i64::try_from(self.down).unwrap_or(i64::MAX)
    }

    /// `Skip` once downvotes lead by at least `skip_margin`.
    #[must_use]
    pub fn decide(&self, skip_margin: u64) -> VoteDecision {
        if self.down >= self.up.saturating_add(skip_margin) && self.down > 0 {
            VoteDecision::Skip
        } else {
            VoteDecision::Keep
        }
    }
}

// Skin-tone variants are treated as the base emoji.
fn is_emoji(emoji: &str, target: char) -> bool {
    emoji.starts_with(target)
}
