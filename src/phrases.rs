use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use serde_json::from_str;
use std::error::Error;

use crate::mission::{DifficultyTier, LanguageMode};

static PHRASE_DIR: Dir = include_dir!("src/phrases");

const SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>/?";
const FLAG_TOKENS: [&str; 6] = ["--no-cache", "--force", "-recursive", "-v", "--debug", "-p 443"];

/// Embedded phrase bank for one language mode. Treated as an opaque
/// dictionary: callers ask for the next phrase and get back a string
/// already shaped for the mission difficulty.
#[allow(dead_code)]
#[derive(Deserialize, Clone, Debug)]
pub struct PhraseBank {
    pub name: String,
    pub size: u32,
    pub phrases: Vec<String>,
}

impl PhraseBank {
    pub fn load(mode: LanguageMode) -> Self {
        let file_name = match mode {
            LanguageMode::English => "english.json",
            LanguageMode::Code => "code.json",
        };
        read_bank_from_file(file_name).unwrap()
    }

    /// Uniform pick from the bank, then difficulty shaping.
    pub fn next_phrase<R: Rng>(&self, mode: LanguageMode, tier: DifficultyTier, rng: &mut R) -> String {
        let raw = self
            .phrases
            .choose(rng)
            .cloned()
            .unwrap_or_default();
        shape_phrase(raw, mode, tier, rng)
    }
}

fn read_bank_from_file(file_name: &str) -> Result<PhraseBank, Box<dyn Error>> {
    let file = PHRASE_DIR
        .get_file(file_name)
        .expect("Phrase bank file not found");

    let file_as_str = file
        .contents_utf8()
        .expect("Unable to interpret file as a string");

    let bank = from_str(file_as_str).expect("Unable to deserialize phrase bank json");

    Ok(bank)
}

/// Apply the difficulty transform to a raw phrase.
///
/// Basic shortens long phrases, Hard salts them with special
/// characters (plus a trailing flag token in code mode), Medium leaves
/// them untouched.
pub fn shape_phrase<R: Rng>(
    mut phrase: String,
    mode: LanguageMode,
    tier: DifficultyTier,
    rng: &mut R,
) -> String {
    match tier {
        DifficultyTier::Basic => {
            if phrase.chars().count() > 20 {
                let keep = (phrase.chars().count() / 2).max(15);
                phrase = phrase.chars().take(keep).collect();
            }
            phrase
        }
        DifficultyTier::Medium => phrase,
        DifficultyTier::Hard => {
            let specials: Vec<char> = SPECIAL_CHARS.chars().collect();
            for _ in 0..3 {
                let chars: Vec<char> = phrase.chars().collect();
                let pos = rng.gen_range(0..=chars.len());
                let special = *specials.choose(rng).unwrap();
                let mut salted: String = chars[..pos].iter().collect();
                salted.push(special);
                salted.extend(&chars[pos..]);
                phrase = salted;
            }
            if mode == LanguageMode::Code {
                let flag = FLAG_TOKENS.choose(rng).unwrap();
                phrase.push(' ');
                phrase.push_str(flag);
            }
            phrase
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn banks_load_for_both_modes() {
        let english = PhraseBank::load(LanguageMode::English);
        assert_eq!(english.name, "english");
        assert!(!english.phrases.is_empty());

        let code = PhraseBank::load(LanguageMode::Code);
        assert_eq!(code.name, "code");
        assert!(!code.phrases.is_empty());
    }

    #[test]
    fn next_phrase_comes_from_the_bank_on_medium() {
        let bank = PhraseBank::load(LanguageMode::Code);
        let mut rng = StdRng::seed_from_u64(7);
        let phrase = bank.next_phrase(LanguageMode::Code, DifficultyTier::Medium, &mut rng);
        assert!(bank.phrases.contains(&phrase));
    }

    #[test]
    fn seeded_generation_is_deterministic() {
        let bank = PhraseBank::load(LanguageMode::English);
        let a = bank.next_phrase(
            LanguageMode::English,
            DifficultyTier::Hard,
            &mut StdRng::seed_from_u64(42),
        );
        let b = bank.next_phrase(
            LanguageMode::English,
            DifficultyTier::Hard,
            &mut StdRng::seed_from_u64(42),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn basic_truncates_long_phrases() {
        let mut rng = StdRng::seed_from_u64(1);
        let long = "abcdefghijklmnopqrstuvwxyz abcdefghijklm".to_string(); // 40 chars
        let shaped = shape_phrase(long, LanguageMode::English, DifficultyTier::Basic, &mut rng);
        assert_eq!(shaped.chars().count(), 20);
    }

    #[test]
    fn basic_keeps_at_least_15_chars() {
        let mut rng = StdRng::seed_from_u64(1);
        // 22 chars long: len/2 = 11 would undershoot the floor
        let phrase = "abcdefghijklmnopqrstuv".to_string();
        let shaped = shape_phrase(phrase, LanguageMode::English, DifficultyTier::Basic, &mut rng);
        assert_eq!(shaped.chars().count(), 15);
    }

    #[test]
    fn basic_leaves_short_phrases_alone() {
        let mut rng = StdRng::seed_from_u64(1);
        let phrase = "short phrase".to_string();
        let shaped =
            shape_phrase(phrase.clone(), LanguageMode::English, DifficultyTier::Basic, &mut rng);
        assert_eq!(shaped, phrase);
    }

    #[test]
    fn hard_inserts_three_special_chars() {
        let mut rng = StdRng::seed_from_u64(3);
        let phrase = "plain words only".to_string();
        let shaped =
            shape_phrase(phrase.clone(), LanguageMode::English, DifficultyTier::Hard, &mut rng);
        assert_eq!(shaped.chars().count(), phrase.chars().count() + 3);

        let added = shaped
            .chars()
            .filter(|c| SPECIAL_CHARS.contains(*c))
            .count();
        assert!(added >= 3);
    }

    #[test]
    fn hard_code_mode_appends_a_flag_token() {
        let mut rng = StdRng::seed_from_u64(9);
        let shaped = shape_phrase(
            "run the job".to_string(),
            LanguageMode::Code,
            DifficultyTier::Hard,
            &mut rng,
        );
        assert!(
            FLAG_TOKENS.iter().any(|flag| shaped.ends_with(flag)),
            "expected a trailing flag token, got {shaped:?}"
        );
    }

    #[test]
    fn hard_english_mode_has_no_flag_token() {
        let mut rng = StdRng::seed_from_u64(9);
        let shaped = shape_phrase(
            "run the job".to_string(),
            LanguageMode::English,
            DifficultyTier::Hard,
            &mut rng,
        );
        assert!(!FLAG_TOKENS.iter().any(|flag| shaped.ends_with(flag)));
    }
}
