use crate::models::matches::Outcome;

/// Text commands understood by the bot. Anything else parses to Unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Matches,
    Menu,
    Poll { match_id: Option<String> },
    Predictions { match_id: Option<String> },
    CreateMatch {
        id: String,
        team_a: String,
        team_b: String,
        time: String,
    },
    Predict {
        match_id: String,
        choice: Option<Outcome>,
    },
    Result {
        match_id: String,
        result: Option<Outcome>,
    },
    Score,
    Unknown,
}

pub fn parse(text: &str) -> Command {
    let parts: Vec<&str> = text.trim().split_whitespace().collect();
    let cmd = match parts.first() {
        Some(p) => p.to_lowercase(),
        None => return Command::Unknown,
    };

    match cmd.as_str() {
        "/start" => Command::Start,
        "/matches" => Command::Matches,
        "/menu" | "/actions" => Command::Menu,
        "/poll" => Command::Poll {
            match_id: parts.get(1).map(|s| s.to_string()),
        },
        "/predictions" | "/preds" => Command::Predictions {
            match_id: parts.get(1).map(|s| s.to_string()),
        },
        "/score" => Command::Score,
        // /match M1 Wydad Raja 20:00
        "/match" if parts.len() >= 4 => Command::CreateMatch {
            id: parts[1].to_string(),
            team_a: parts[2].to_string(),
            team_b: parts[3].to_string(),
            time: parts.get(4).unwrap_or(&"20:00").to_string(),
        },
        // /result M1 1  (1X2 wire form)
        "/result" if parts.len() >= 3 => Command::Result {
            match_id: parts[1].to_string(),
            result: Outcome::parse_wire(parts[2]),
        },
        // /predict M1 1  (keypad form: 1 = home, 2 = draw, 3 = away)
        "/predict" if parts.len() >= 3 => Command::Predict {
            match_id: parts[1].to_string(),
            choice: Outcome::parse_keypad(parts[2]),
        },
        _ => Command::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_commands() {
        assert_eq!(parse("/start"), Command::Start);
        assert_eq!(parse("  /matches  "), Command::Matches);
        assert_eq!(parse("/actions"), Command::Menu);
        assert_eq!(parse("/score"), Command::Score);
        assert_eq!(parse("/preds"), Command::Predictions { match_id: None });
    }

    #[test]
    fn parses_match_creation_with_default_time() {
        assert_eq!(
            parse("/match M1 Wydad Raja"),
            Command::CreateMatch {
                id: "M1".into(),
                team_a: "Wydad".into(),
                team_b: "Raja".into(),
                time: "20:00".into(),
            }
        );
        assert_eq!(
            parse("/match M1 Wydad Raja 18:30"),
            Command::CreateMatch {
                id: "M1".into(),
                team_a: "Wydad".into(),
                team_b: "Raja".into(),
                time: "18:30".into(),
            }
        );
    }

    #[test]
    fn predict_uses_keypad_mapping() {
        assert_eq!(
            parse("/predict M1 2"),
            Command::Predict {
                match_id: "M1".into(),
                choice: Some(Outcome::Draw),
            }
        );
        assert_eq!(
            parse("/predict M1 3"),
            Command::Predict {
                match_id: "M1".into(),
                choice: Some(Outcome::Away),
            }
        );
        assert_eq!(
            parse("/predict M1 7"),
            Command::Predict {
                match_id: "M1".into(),
                choice: None,
            }
        );
    }

    #[test]
    fn result_uses_wire_mapping() {
        assert_eq!(
            parse("/result M1 2"),
            Command::Result {
                match_id: "M1".into(),
                result: Some(Outcome::Away),
            }
        );
        assert_eq!(
            parse("/result M1 X"),
            Command::Result {
                match_id: "M1".into(),
                result: Some(Outcome::Draw),
            }
        );
    }

    #[test]
    fn garbage_is_unknown() {
        assert_eq!(parse(""), Command::Unknown);
        assert_eq!(parse("salam"), Command::Unknown);
        assert_eq!(parse("/match M1"), Command::Unknown);
        assert_eq!(parse("/predict M1"), Command::Unknown);
    }
}
