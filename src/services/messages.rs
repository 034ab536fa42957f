// Moroccan Darija reply templates and meme library.

use rand::seq::SliceRandom;

use crate::errors::AppError;
use crate::models::matches::Outcome;

pub const WELCOME: &str = "Mar7ba bik f Takhmin! ⚽\n\
    /matches - chof matchat lyoum\n\
    /predict <match> <1|2|3> - dir prediction (1=home, 2=draw, 3=away)\n\
    /score - classement dyal l-group\n\
    /menu - kolchi li kayn";

pub const MENU: &str = "📋 Quick actions:\n\
    /matches - matchat jayin\n\
    /poll <match> - poll dyal match\n\
    /predictions <match> - chkoun dar ach\n\
    /predict <match> <1|2|3>\n\
    /result <match> <1|X|2>\n\
    /score - classement";

// Match Announcement
pub const MATCH_ANNOUNCEMENT: &[&str] = &[
    "Mabrouk! صباح الخير... اليوم عندكم فرصة تخسرو نقط جداد! 🎊",
    "Yallah prepare iw9a3 flous! يالاه حضرو الفلوس 💰",
    "Lyoum nchofkom chkoun ghadi ytayeb predictions! اليوم نشوفكم 👀",
];

// Lock warnings (15m before kickoff)
pub const LOCK: &[&str] = &[
    "L7abs tfermet! الحابس تفرمت! 🔒",
    "3ad ma b9ash wakt! عاد ما بقاش وقت! ⏰",
    "Predictions dyawlk wlaw m7absa! 🔐",
];

// Result not submitted (Admin reminder)
pub const NO_RESULT: &[&str] = &[
    "Wla nsa likom? ولا نساه ليكوم؟ 🤔",
    "Finek a Admin? فينك Admin?",
    "Dir result wla ma3andekch internet? 📡",
];

pub fn random<'a>(category: &'a [&'a str]) -> &'a str {
    category
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("")
}

pub fn match_created(team_a: &str, team_b: &str) -> String {
    format!("✅ Match tzad: {} 🆚 {}", team_a, team_b)
}

pub fn prediction_saved() -> &'static str {
    "✅ Prediction dyalek tsjjlat! Allah y3awnek 🍀"
}

pub fn result_saved(match_id: &str, result: Outcome) -> String {
    format!("✅ Result dyal {} tsjjel: {}", match_id, result)
}

pub fn leaderboard(ranking: &str) -> String {
    format!("🏆 Classement:\n{}", ranking)
}

pub fn empty_leaderboard() -> &'static str {
    "مازال تا واحد ما بدا التوقع."
}

pub fn invalid_command() -> &'static str {
    "Ma fhemt walo 🤷 Sift /menu bach tchof ach kayn."
}

pub fn invalid_choice() -> &'static str {
    "Choix machi s7i7. 1 = home, 2 = draw, 3 = away."
}

pub fn no_matches_today() -> &'static str {
    "Ma kayn 7ta match daba 😴"
}

/// Chat-facing rendition of a request-path rejection.
pub fn error_reply(err: &AppError) -> String {
    match err {
        AppError::MatchNotFound(id) => format!("Ma l9ina 7ta match b {} 🤔", id),
        AppError::MatchLocked(id) => format!("{} Match {} tferma!", random(LOCK), id),
        AppError::PredictionExists => "Deja derti prediction l had l-match! 🤡".to_string(),
        AppError::MatchExists(id) => format!("Match {} deja kayn!", id),
        AppError::ValidationError(msg) => format!("Chi 7aja machi s7i7a: {}", msg),
        _ => "Wa9e3 chi mouchkil, 3awed men b3d 🙏".to_string(),
    }
}
