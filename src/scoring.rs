use crate::models::matches::Outcome;

/// Pure scoring rule: a correct pick earns a point, a wrong one costs one.
/// Total over every legal (choice, result) pair; callers are expected to
/// filter out result-less matches before calling.
pub fn score(choice: Outcome, result: Outcome) -> i32 {
    if choice == result {
        1
    } else {
        -1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Outcome; 3] = [Outcome::Home, Outcome::Draw, Outcome::Away];

    #[test]
    fn exact_pick_scores_plus_one() {
        for outcome in ALL {
            assert_eq!(score(outcome, outcome), 1);
        }
    }

    #[test]
    fn wrong_pick_scores_minus_one() {
        for choice in ALL {
            for result in ALL {
                if choice != result {
                    assert_eq!(score(choice, result), -1);
                }
            }
        }
    }
}
