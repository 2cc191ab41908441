//! Host's binary reply to an alternative-time offer

use serde::{Deserialize, Serialize};

const AFFIRMATIVE: &[&str] = &["yes", "y", "yeah", "yep", "sure", "ok", "okay", "accept", "reschedule"];
const NEGATIVE: &[&str] = &["no", "n", "nope", "reject", "keep", "decline"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostDecision {
    /// Adopt the alternative and start a new round
    Accept,
    /// Keep the original proposal without the declining attendee
    Reject,
}

impl HostDecision {
    /// Word-level match; input carrying both or neither kind of token is `None`
    pub fn parse(input: &str) -> Option<Self> {
        let lowered = input.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        let yes = words.iter().any(|w| AFFIRMATIVE.contains(w));
        let no = words.iter().any(|w| NEGATIVE.contains(w));
        match (yes, no) {
            (true, false) => Some(HostDecision::Accept),
            (false, true) => Some(HostDecision::Reject),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("yes", Some(HostDecision::Accept))]
    #[case("  YES!  ", Some(HostDecision::Accept))]
    #[case("Yes, reschedule please", Some(HostDecision::Accept))]
    #[case("no", Some(HostDecision::Reject))]
    #[case("No thanks, keep it", Some(HostDecision::Reject))]
    #[case("I don't know", None)]
    #[case("yes and no", None)]
    #[case("", None)]
    #[case("nothing", None)]
    fn test_parse_decision(#[case] input: &str, #[case] expected: Option<HostDecision>) {
        assert_eq!(HostDecision::parse(input), expected);
    }
}
