//! Game template catalog.
//!
//! Templates are read-only data loaded once at startup: the built-in set,
//! or a JSON file named by `GAME_CATALOG_PATH`. Sessions copy a template's
//! questions at start time, so later catalog changes never touch games
//! already in flight.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use database::GameQuestion;

/// Catalog loading errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read game catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse game catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Game catalog has no templates")]
    Empty,

    #[error("Game template '{0}' has no questions")]
    NoQuestions(String),
}

/// A playable game definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameTemplate {
    pub title: String,
    pub description: String,
    /// Offered only when both members of the couple are adults.
    #[serde(default)]
    pub adult_only: bool,
    pub questions: Vec<GameQuestion>,
}

/// All playable games, keyed by game type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameCatalog {
    templates: BTreeMap<String, GameTemplate>,
}

impl GameCatalog {
    /// The stock catalog compiled into the binary.
    pub fn builtin() -> Self {
        let mut templates = BTreeMap::new();

        templates.insert(
            "compatibility_quiz".to_string(),
            GameTemplate {
                title: "Compatibility Quiz".to_string(),
                description: "How well do you know your partner?".to_string(),
                adult_only: false,
                questions: vec![
                    question(
                        "What is your partner's favorite color?",
                        &["Red", "Blue", "Green", "Yellow", "Pink", "Black"],
                    ),
                    question(
                        "Where is your partner's dream vacation spot?",
                        &["Paris", "Tokyo", "Maldives", "New York", "Switzerland"],
                    ),
                    question(
                        "What is your partner's favorite food?",
                        &["Pizza", "Sushi", "Burger", "Pasta", "Indian Cuisine"],
                    ),
                    question(
                        "Which season does your partner love most?",
                        &["Spring", "Summer", "Autumn", "Winter"],
                    ),
                    question(
                        "What is your partner's favorite hobby?",
                        &["Reading", "Gaming", "Cooking", "Traveling", "Sports"],
                    ),
                ],
            },
        );

        templates.insert(
            "intimacy_quiz".to_string(),
            GameTemplate {
                title: "Intimacy Quiz".to_string(),
                description: "How deep does your connection go?".to_string(),
                adult_only: true,
                questions: vec![
                    question(
                        "What is your partner's love language?",
                        &[
                            "Words of Affirmation",
                            "Quality Time",
                            "Receiving Gifts",
                            "Acts of Service",
                            "Physical Touch",
                        ],
                    ),
                    question(
                        "What is your partner's idea of a perfect date night?",
                        &[
                            "Candlelit dinner",
                            "Movie night at home",
                            "Dancing",
                            "Stargazing",
                            "Long drive",
                        ],
                    ),
                    question(
                        "Which gesture does your partner find most romantic?",
                        &[
                            "Surprise gifts",
                            "Handwritten notes",
                            "Slow dancing",
                            "Breakfast in bed",
                        ],
                    ),
                    question(
                        "What first attracted your partner to you?",
                        &["Looks", "Humor", "Kindness", "Confidence", "Voice"],
                    ),
                    question(
                        "How does your partner prefer to make up after an argument?",
                        &["Talking it out", "A long hug", "Space first", "A shared meal"],
                    ),
                ],
            },
        );

        Self { templates }
    }

    /// Load a catalog from a JSON file, replacing the stock one.
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    fn parse(raw: &str) -> Result<Self, CatalogError> {
        let catalog: GameCatalog = serde_json::from_str(raw)?;
        if catalog.templates.is_empty() {
            return Err(CatalogError::Empty);
        }
        for (game_type, template) in &catalog.templates {
            if template.questions.is_empty() {
                return Err(CatalogError::NoQuestions(game_type.clone()));
            }
        }

        Ok(catalog)
    }

    /// Look up a template by game type.
    pub fn get(&self, game_type: &str) -> Option<&GameTemplate> {
        self.templates.get(game_type)
    }

    /// Templates a couple may see. Adult-only templates need both members
    /// to be adults.
    pub fn visible(&self, include_adult: bool) -> impl Iterator<Item = (&String, &GameTemplate)> {
        self.templates
            .iter()
            .filter(move |(_, template)| include_adult || !template.adult_only)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn question(question: &str, options: &[&str]) -> GameQuestion {
    GameQuestion {
        question: question.to_string(),
        options: options.iter().map(|s| s.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_templates() {
        let catalog = GameCatalog::builtin();
        assert_eq!(catalog.len(), 2);

        let quiz = catalog.get("compatibility_quiz").unwrap();
        assert_eq!(quiz.title, "Compatibility Quiz");
        assert_eq!(quiz.questions.len(), 5);
        assert!(!quiz.adult_only);

        assert!(catalog.get("intimacy_quiz").unwrap().adult_only);
        assert!(catalog.get("trivia_night").is_none());
    }

    #[test]
    fn test_visible_filters_adult_templates() {
        let catalog = GameCatalog::builtin();

        let everyone: Vec<&String> = catalog.visible(false).map(|(k, _)| k).collect();
        assert_eq!(everyone, vec!["compatibility_quiz"]);

        let adults: Vec<&String> = catalog.visible(true).map(|(k, _)| k).collect();
        assert_eq!(adults, vec!["compatibility_quiz", "intimacy_quiz"]);
    }

    #[test]
    fn test_parse_accepts_minimal_template() {
        let raw = r#"
        {
            "movie_night": {
                "title": "Movie Night",
                "description": "Pick together.",
                "questions": [
                    {"question": "Genre?", "options": ["Drama", "Comedy"]}
                ]
            }
        }
        "#;
        let catalog = GameCatalog::parse(raw).unwrap();
        let template = catalog.get("movie_night").unwrap();
        // adultOnly defaults to false when omitted
        assert!(!template.adult_only);
        assert_eq!(template.questions[0].options.len(), 2);
    }

    #[test]
    fn test_parse_rejects_empty_catalogs() {
        assert!(matches!(
            GameCatalog::parse("{}"),
            Err(CatalogError::Empty)
        ));

        let no_questions = r#"
        {
            "hollow": {"title": "Hollow", "description": "", "questions": []}
        }
        "#;
        assert!(matches!(
            GameCatalog::parse(no_questions),
            Err(CatalogError::NoQuestions(name)) if name == "hollow"
        ));

        assert!(matches!(
            GameCatalog::parse("not json"),
            Err(CatalogError::Parse(_))
        ));
    }
}
